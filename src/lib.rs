use std::path::PathBuf;
use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod storage;

pub use crate::config::{ConfigStore, ServerSettings, SyncConfig, SyncDirection};
pub use crate::core::{SyncEngine, SyncEvent, SyncReport, SyncStatus};
pub use crate::error::{SyncError, SyncResult};

use crate::db::{NoteStore, SqliteNoteStore};
use crate::storage::{StorageConnector, WebDavConnector};

/// 应用状态，在各个命令之间共享
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub note_store: Arc<SqliteNoteStore>,
    pub engine: Arc<SyncEngine>,
}

impl AppState {
    /// 使用 WebDAV 连接器初始化
    pub async fn new(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        Self::with_connector(data_dir, Arc::new(WebDavConnector)).await
    }

    pub async fn with_connector(
        data_dir: Option<PathBuf>,
        connector: Arc<dyn StorageConnector>,
    ) -> anyhow::Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_dir().ok_or_else(|| anyhow::anyhow!("无法确定数据目录"))?,
        };
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!("数据目录: {:?}", data_dir);

        let note_store = Arc::new(SqliteNoteStore::new(&data_dir));
        note_store.open().await?;

        let engine = SyncEngine::new(
            ConfigStore::in_data_dir(&data_dir),
            note_store.clone(),
            connector,
        )?;

        Ok(Self {
            data_dir,
            note_store,
            engine,
        })
    }

    /// 清理资源（退出时调用）
    pub async fn cleanup(&self) {
        tracing::info!("正在清理应用资源...");

        if let Err(e) = self.engine.shutdown() {
            tracing::warn!("保存同步配置失败: {}", e);
        }

        tracing::debug!("关闭笔记数据库...");
        self.note_store.close().await;

        tracing::info!("资源清理完成");
    }
}

/// 数据目录定位
pub mod dirs {
    use std::path::PathBuf;

    /// 覆盖数据目录的环境变量
    pub const DATA_DIR_ENV: &str = "NOTESYNC_DATA_DIR";
    const APP_NAME: &str = "notesync";

    /// 应用数据目录：环境变量优先，其次是平台默认位置
    pub fn data_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        platform_data_dir().map(|p| p.join(APP_NAME))
    }

    fn platform_data_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
        } else {
            // Linux
            std::env::var("XDG_DATA_HOME")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local").join("share"))
                })
        }
    }
}
