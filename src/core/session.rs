//! 同步会话状态、事件和报告

use super::index::RemoteIndex;
use super::queue::TransferQueue;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// 引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    NotConfigured,
    Idle,
    Syncing,
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::NotConfigured => write!(f, "未配置"),
            SyncStatus::Idle => write!(f, "空闲"),
            SyncStatus::Syncing => write!(f, "同步中"),
            SyncStatus::Error => write!(f, "错误"),
        }
    }
}

/// 对外广播的同步事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    StatusChanged(SyncStatus),
    Progress { percent: u8, message: String },
    Finished { success: bool },
    Error(String),
}

/// 单次会话的结果汇总
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub session_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub success: bool,
    pub files_uploaded: u32,
    pub files_downloaded: u32,
    pub files_failed: u32,
    /// 毫秒
    pub duration: u64,
    pub errors: Vec<String>,
}

/// 一次同步运行的临时状态，会话结束即丢弃
#[derive(Debug)]
pub struct SyncSession {
    pub id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    started: Instant,
    pub remote: RemoteIndex,
    pub queue: TransferQueue,
    pub time_offset: i64,
    /// 计划的传输总数（进度按它计算）
    pub planned: usize,
    pub uploaded: u32,
    pub downloaded: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl SyncSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            started: Instant::now(),
            remote: RemoteIndex::default(),
            queue: TransferQueue::new(),
            time_offset: 0,
            planned: 0,
            uploaded: 0,
            downloaded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }

    /// 传输阶段的进度：60 到 90 之间按已完成数量线性推进
    pub fn transfer_progress(&self, done: usize) -> u8 {
        if self.planned == 0 {
            return 90;
        }
        let done = done.min(self.planned);
        (60 + 30 * done / self.planned) as u8
    }

    pub fn report(&self, success: bool) -> SyncReport {
        let end_time = chrono::Utc::now().timestamp();
        SyncReport {
            session_id: self.id.to_string(),
            start_time: self.started_at.timestamp(),
            end_time,
            success,
            files_uploaded: self.uploaded,
            files_downloaded: self.downloaded,
            files_failed: self.failed,
            duration: self.started.elapsed().as_millis() as u64,
            errors: self.errors.clone(),
        }
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}
