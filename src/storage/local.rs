use super::{
    normalize_remote_path, ConnectionSettings, RemoteEntry, RemoteStorage, StorageConnector,
};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use walkdir::WalkDir;

/// 用本地目录模拟 WebDAV 服务器（离线使用和测试）
pub struct LocalStorage {
    base_path: PathBuf,
    name: String,
}

impl LocalStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        if !base_path.exists() {
            std::fs::create_dir_all(&base_path)?;
        }
        let name = format!("local:{}", base_path.display());
        Ok(Self { base_path, name })
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = path.trim_start_matches('/').trim_start_matches('\\');
        if path.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(path)
        }
    }
}

#[async_trait]
impl RemoteStorage for LocalStorage {
    async fn list_dir(&self, path: &str, recursive: bool) -> Result<Vec<RemoteEntry>> {
        let base = self.resolve_path(path);
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let base_path = self.base_path.clone();

        // 使用 spawn_blocking 避免阻塞 async runtime
        let entries = tokio::task::spawn_blocking(move || {
            let mut walker = WalkDir::new(&base).follow_links(false);
            if !recursive {
                walker = walker.max_depth(1);
            }
            walker
                .into_iter()
                .filter_map(|e| e.ok())
                .filter_map(|entry| {
                    let metadata = entry.metadata().ok()?;
                    let relative = entry.path().strip_prefix(&base_path).ok()?.to_str()?;
                    // 写入中的临时文件不算服务器内容
                    if relative.ends_with(".tmp") {
                        return None;
                    }

                    let is_dir = metadata.is_dir();
                    let last_modified = if is_dir {
                        None
                    } else {
                        metadata.modified().ok().map(DateTime::<Utc>::from)
                    };

                    Some(RemoteEntry {
                        path: normalize_remote_path(relative, is_dir),
                        is_dir,
                        last_modified,
                    })
                })
                .collect::<Vec<_>>()
        })
        .await?;

        Ok(entries)
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        let data = fs::read(self.resolve_path(path)).await?;
        Ok(Bytes::from(data))
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let full_path = self.resolve_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // 使用临时文件写入，然后原子重命名
        let temp_path = temp_path_for(&full_path);
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &full_path).await?;

        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.resolve_path(path)).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// `a/b.png` -> `a/b.png.tmp`（保留原扩展名，避免和同名不同扩展名的文件冲突）
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// 把连接请求映射到本地目录
#[derive(Debug, Clone)]
pub struct LocalConnector {
    root: PathBuf,
}

impl LocalConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageConnector for LocalConnector {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn RemoteStorage>> {
        tracing::debug!("使用本地目录 {:?} 代替 {}", self.root, settings.host);
        Ok(Arc::new(LocalStorage::new(&self.root)?))
    }
}
