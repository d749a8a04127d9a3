//! 同步引擎错误类型

use thiserror::Error;

/// 同步引擎对外暴露的错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 缺少服务器地址、用户名或密码
    #[error("WebDAV服务器未配置: 缺少 {0}")]
    Configuration(String),

    /// 已有同步会话在运行
    #[error("同步操作正在进行中")]
    Concurrency,

    /// 远程目录列表失败，整个会话中止
    #[error("无法连接到WebDAV服务器: {0}")]
    Connection(String),

    /// 单个文件上传/下载失败，队列继续
    #[error("文件传输失败 {path}: {message}")]
    Transfer { path: String, message: String },

    /// 传输后重新打开笔记数据库失败
    #[error("数据库重新打开失败: {0}")]
    DatabaseLock(String),

    /// 配置文件读写失败
    #[error("配置文件错误: {0}")]
    Config(String),

    /// 当前线程不在 tokio 运行时中
    #[error("没有可用的异步运行时")]
    NoRuntime,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub(crate) fn transfer(path: &str, err: impl std::fmt::Display) -> Self {
        SyncError::Transfer {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// 该错误是否只影响单个文件（会话继续）
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SyncError::Transfer { .. } | SyncError::DatabaseLock(_))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
