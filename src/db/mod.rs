//! 笔记存储（同步引擎只关心数据库文件和图片目录）

pub mod sqlite;

pub use sqlite::SqliteNoteStore;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 数据库文件名（本地和远程相同）
pub const DATABASE_FILE: &str = "notes.db";
/// 图片目录名，结构为 `images/{note_id}/{file}`
pub const IMAGES_DIR: &str = "images";

/// 数据库文件的独占窗口
///
/// 同步数据库时引擎持有租约，期间 `NoteStore::open()` 被拒绝。
#[derive(Debug, Default)]
pub struct ExclusiveWindow {
    lock: Arc<Mutex<()>>,
}

/// 持有期间其他调用方无法打开数据库
#[derive(Debug)]
pub struct WindowLease {
    _guard: OwnedMutexGuard<()>,
}

impl ExclusiveWindow {
    /// 等待并进入独占窗口
    pub async fn enter(&self) -> WindowLease {
        WindowLease {
            _guard: self.lock.clone().lock_owned().await,
        }
    }

    /// 窗口被占用时立即失败
    pub fn try_enter(&self) -> Result<WindowLease> {
        let guard = self
            .lock
            .clone()
            .try_lock_owned()
            .map_err(|_| anyhow::anyhow!("数据库正在同步，暂时无法访问"))?;
        Ok(WindowLease { _guard: guard })
    }

    pub fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

/// 笔记存储接口
///
/// 同步数据库文件时引擎先进入 `window()`，然后 `close()`，传输完成后用
/// 租约 `open_with()` 重新打开。
#[async_trait]
pub trait NoteStore: Send + Sync {
    fn is_open(&self) -> bool;

    /// 打开数据库；独占窗口期间返回错误
    async fn open(&self) -> Result<()> {
        let lease = self.window().try_enter()?;
        self.open_with(&lease).await
    }

    /// 在已持有的独占窗口内打开数据库
    async fn open_with(&self, lease: &WindowLease) -> Result<()>;

    async fn close(&self);

    fn window(&self) -> &ExclusiveWindow;

    /// 数据库文件的完整路径
    fn database_path(&self) -> &Path;

    /// 图片根目录
    fn images_dir(&self) -> &Path;
}
