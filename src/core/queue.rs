//! 顺序传输队列：先清空上传，再开始下载

use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;

/// 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransferDirection {
    Upload,
    Download,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Upload => write!(f, "upload"),
            TransferDirection::Download => write!(f, "download"),
        }
    }
}

/// 传输内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 笔记数据库，传输前后需要关闭/重新打开
    Database,
    Image,
}

/// 待传输的单个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub remote_path: String,
    pub local_path: PathBuf,
    pub direction: TransferDirection,
    pub kind: TaskKind,
}

impl TransferTask {
    pub fn upload(remote_path: impl Into<String>, local_path: impl Into<PathBuf>, kind: TaskKind) -> Self {
        Self {
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            direction: TransferDirection::Upload,
            kind,
        }
    }

    pub fn download(remote_path: impl Into<String>, local_path: impl Into<PathBuf>, kind: TaskKind) -> Self {
        Self {
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            direction: TransferDirection::Download,
            kind,
        }
    }
}

/// 两个 FIFO 队列
#[derive(Debug, Default)]
pub struct TransferQueue {
    uploads: VecDeque<TransferTask>,
    downloads: VecDeque<TransferTask>,
    /// 本次会话已排队的远程路径，同一路径只能出现一次
    scheduled: HashSet<String>,
}

impl TransferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按方向加入队尾；路径已排队时返回 false
    pub fn push(&mut self, task: TransferTask) -> bool {
        if !self.scheduled.insert(task.remote_path.clone()) {
            return false;
        }
        match task.direction {
            TransferDirection::Upload => self.uploads.push_back(task),
            TransferDirection::Download => self.downloads.push_back(task),
        }
        true
    }

    /// 取下一个任务：上传优先，上传队列空了才轮到下载
    pub fn next(&mut self) -> Option<TransferTask> {
        self.uploads
            .pop_front()
            .or_else(|| self.downloads.pop_front())
    }

    pub fn pending_uploads(&self) -> Vec<String> {
        self.uploads.iter().map(|t| t.remote_path.clone()).collect()
    }

    pub fn pending_downloads(&self) -> Vec<String> {
        self.downloads.iter().map(|t| t.remote_path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.uploads.len() + self.downloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.downloads.is_empty()
    }
}
