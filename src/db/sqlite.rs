use super::{ExclusiveWindow, NoteStore, WindowLease, DATABASE_FILE, IMAGES_DIR};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    content TEXT,
    create_time DATETIME,
    update_time DATETIME
)"#;

/// 基于 sqlx 连接池的笔记数据库
pub struct SqliteNoteStore {
    db_path: PathBuf,
    images_dir: PathBuf,
    pool: Mutex<Option<SqlitePool>>,
    window: ExclusiveWindow,
}

impl SqliteNoteStore {
    /// 数据目录下的 `notes.db` 和 `images/`（不会立即打开）
    pub fn new(data_dir: &Path) -> Self {
        Self {
            db_path: data_dir.join(DATABASE_FILE),
            images_dir: data_dir.join(IMAGES_DIR),
            pool: Mutex::new(None),
            window: ExclusiveWindow::default(),
        }
    }

    /// 当前连接池，关闭或同步独占期间返回 None
    pub fn pool(&self) -> Option<SqlitePool> {
        if self.window.is_held() {
            return None;
        }
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 笔记数量（用于状态显示）
    pub async fn note_count(&self) -> Result<i64> {
        let pool = self
            .pool()
            .ok_or_else(|| anyhow::anyhow!("数据库未打开"))?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
            .fetch_one(&pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    fn is_open(&self) -> bool {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn open_with(&self, _lease: &WindowLease) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        if let Some(parent) = self.db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 不使用 WAL，保证数据库始终是单个文件，关闭后可以直接上传
        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await?;

        if let Err(e) = sqlx::query(CREATE_NOTES_TABLE).execute(&pool).await {
            pool.close().await;
            return Err(e.into());
        }

        let previous = self
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pool);
        if let Some(previous) = previous {
            previous.close().await;
        }

        debug!("数据库已打开: {:?}", self.db_path);
        Ok(())
    }

    async fn close(&self) {
        let pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(pool) = pool {
            pool.close().await;
            debug!("数据库已关闭: {:?}", self.db_path);
        }
    }

    fn window(&self) -> &ExclusiveWindow {
        &self.window
    }

    fn database_path(&self) -> &Path {
        &self.db_path
    }

    fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}
