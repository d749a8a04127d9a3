//! 基于修改时间的冲突判定

use super::index::RemoteIndex;
use crate::config::SyncDirection;
use chrono::{DateTime, Utc};

/// 单个文件的同步动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Upload,
    Download,
    /// 两边一致，或者方向不允许
    Skip,
}

/// 时间戳比较策略
///
/// 远程时间加上时钟偏移后与本地时间比较，精确到秒：
/// - 上传：远程不存在，或 `本地 > 远程 + 偏移`
/// - 下载：本地不存在，或 `远程 + 偏移 > 本地`
#[derive(Debug, Clone, Copy)]
pub struct TimestampPolicy {
    pub direction: SyncDirection,
    /// 远程时钟相对本地的偏移（秒）
    pub offset_secs: i64,
}

impl TimestampPolicy {
    pub fn new(direction: SyncDirection, offset_secs: i64) -> Self {
        Self {
            direction,
            offset_secs,
        }
    }

    fn adjusted(&self, remote: DateTime<Utc>) -> i64 {
        remote.timestamp().saturating_add(self.offset_secs)
    }

    pub fn should_upload(
        &self,
        local: Option<DateTime<Utc>>,
        remote: Option<DateTime<Utc>>,
    ) -> bool {
        if !self.direction.allows_upload() {
            return false;
        }
        match (local, remote) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(l), Some(r)) => l.timestamp() > self.adjusted(r),
        }
    }

    pub fn should_download(
        &self,
        local: Option<DateTime<Utc>>,
        remote: Option<DateTime<Utc>>,
    ) -> bool {
        if !self.direction.allows_download() {
            return false;
        }
        match (local, remote) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(l), Some(r)) => self.adjusted(r) > l.timestamp(),
        }
    }

    /// 同一路径在一次会话里最多上传或下载其中之一
    pub fn decide(&self, local: Option<DateTime<Utc>>, remote: Option<DateTime<Utc>>) -> SyncAction {
        if self.should_upload(local, remote) {
            SyncAction::Upload
        } else if self.should_download(local, remote) {
            SyncAction::Download
        } else {
            SyncAction::Skip
        }
    }
}

/// 估算远程时钟偏移（秒）
///
/// 目前固定返回 0。
pub fn estimate_time_offset(_index: &RemoteIndex) -> i64 {
    0
}
