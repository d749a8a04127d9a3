use super::{
    normalize_remote_path, ConnectionSettings, RemoteEntry, RemoteStorage, StorageConnector,
    IO_TIMEOUT_SECS, OP_TIMEOUT_SECS,
};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use opendal::layers::TimeoutLayer;
use opendal::{Metakey, Operator};
use std::sync::Arc;
use std::time::Duration;

pub struct WebDavStorage {
    operator: Operator,
    name: String,
}

impl WebDavStorage {
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        use opendal::services::Webdav;

        let endpoint = settings.endpoint()?;
        let mut builder = Webdav::default()
            .endpoint(&endpoint)
            .username(&settings.username)
            .password(&settings.password);

        if !settings.base_path.is_empty() {
            builder = builder.root(&settings.base_path);
        }

        // 添加超时层
        let operator = Operator::new(builder)?
            .layer(
                TimeoutLayer::default()
                    .with_timeout(Duration::from_secs(OP_TIMEOUT_SECS))
                    .with_io_timeout(Duration::from_secs(IO_TIMEOUT_SECS)),
            )
            .finish();

        let name = format!("webdav://{}{}", endpoint.trim_end_matches('/'), settings.base_path);

        Ok(Self { operator, name })
    }

    /// opendal 使用相对于 root 的路径
    fn op_path(path: &str, is_dir: bool) -> String {
        match normalize_remote_path(path, is_dir).as_str() {
            "/" => "/".to_string(),
            p => p.trim_start_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RemoteStorage for WebDavStorage {
    async fn list_dir(&self, path: &str, recursive: bool) -> Result<Vec<RemoteEntry>> {
        let dir = Self::op_path(path, true);

        let mut lister = match self
            .operator
            .lister_with(&dir)
            .recursive(recursive)
            .metakey(Metakey::LastModified | Metakey::Mode)
            .await
        {
            Ok(lister) => lister,
            // 目录不存在：当作空目录，由调用方决定是否创建
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = lister.try_next().await? {
            let meta = entry.metadata();
            let is_dir = meta.is_dir();
            entries.push(RemoteEntry {
                path: normalize_remote_path(entry.path(), is_dir),
                is_dir,
                last_modified: meta.last_modified(),
            });
        }

        Ok(entries)
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        let data = self.operator.read(&Self::op_path(path, false)).await?;
        Ok(data.to_bytes())
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        self.operator.write(&Self::op_path(path, false), data).await?;
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        self.operator.create_dir(&Self::op_path(path, true)).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 通过 opendal 连接 WebDAV 服务器
#[derive(Debug, Default, Clone, Copy)]
pub struct WebDavConnector;

impl StorageConnector for WebDavConnector {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn RemoteStorage>> {
        Ok(Arc::new(WebDavStorage::new(settings)?))
    }
}
