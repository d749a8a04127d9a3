pub mod local;
pub mod webdav;

use crate::config::SyncConfig;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

pub use local::{LocalConnector, LocalStorage};
pub use webdav::{WebDavConnector, WebDavStorage};

// ============ 公共常量 ============

/// 非 IO 操作超时（秒）- list, mkdir 等
pub const OP_TIMEOUT_SECS: u64 = 60;
/// IO 操作超时（秒）- get, put 等
pub const IO_TIMEOUT_SECS: u64 = 300;

/// 远程目录条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// 服务器上的绝对路径，以 `/` 开头；目录以 `/` 结尾
    pub path: String,
    pub is_dir: bool,
    /// 服务器未返回修改时间时为 None
    pub last_modified: Option<DateTime<Utc>>,
}

impl RemoteEntry {
    pub fn file(path: &str, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: normalize_remote_path(path, false),
            is_dir: false,
            last_modified: Some(last_modified),
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            path: normalize_remote_path(path, true),
            is_dir: true,
            last_modified: None,
        }
    }
}

/// 远程存储抽象（只需要列表、下载、上传、建目录四种操作）
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// 列出目录，`recursive` 为 true 时包含所有子目录内容
    async fn list_dir(&self, path: &str, recursive: bool) -> Result<Vec<RemoteEntry>>;

    /// 下载整个文件
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// 上传整个文件
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// 创建目录
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// 获取存储名称（用于日志）
    fn name(&self) -> &str;
}

/// 根据连接参数创建存储实例
pub trait StorageConnector: Send + Sync {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn RemoteStorage>>;
}

/// 连接协议
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// 连接参数：scheme, host, basePath, username, password, port
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub scheme: Scheme,
    pub host: String,
    /// 服务器上 WebDAV 的根路径（例如 `/remote.php/dav`），可为空
    pub base_path: String,
    pub username: String,
    pub password: String,
    /// 0 表示协议默认端口
    pub port: u16,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("base_path", &self.base_path)
            .field("username", &self.username)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl ConnectionSettings {
    /// 从同步配置推导连接参数
    ///
    /// `serverUrl` 可以带协议和路径（`https://dav.example.com/dav`），也可以只写主机名；
    /// 勾选 SSL 或地址以 https 开头时使用 https，配置中的非零端口优先于地址中的端口。
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let raw = config.server_url.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            let scheme = if config.use_ssl { "https" } else { "http" };
            format!("{}://{}", scheme, raw)
        };

        let url = url::Url::parse(&with_scheme)
            .map_err(|e| anyhow::anyhow!("无效的服务器地址 {}: {}", raw, e))?;
        let scheme = match url.scheme() {
            "https" => Scheme::Https,
            "http" if config.use_ssl => Scheme::Https,
            "http" => Scheme::Http,
            other => anyhow::bail!("不支持的协议: {}", other),
        };
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("服务器地址缺少主机名: {}", raw))?
            .to_string();
        let port = if config.port != 0 {
            config.port
        } else {
            url.port().unwrap_or(0)
        };

        Ok(Self {
            scheme,
            host,
            base_path: url.path().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            port,
        })
    }

    /// 不含 basePath 的服务器地址，例如 `https://dav.example.com:8443`
    pub fn endpoint(&self) -> Result<String> {
        let mut url = url::Url::parse(&format!("{}://{}", self.scheme, self.host))?;
        if self.port != 0 {
            url.set_port(Some(self.port))
                .map_err(|_| anyhow::anyhow!("无法设置端口: {}", self.port))?;
        }
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

/// 规范化远程路径：统一使用 `/`，以 `/` 开头，目录以 `/` 结尾
pub fn normalize_remote_path(path: &str, is_dir: bool) -> String {
    let path = path.replace('\\', "/");
    let inner = path.trim_matches('/');
    match (inner.is_empty(), is_dir) {
        (true, _) => "/".to_string(),
        (false, true) => format!("/{}/", inner),
        (false, false) => format!("/{}", inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerSettings;

    fn config_for(url: &str, port: u16, ssl: bool) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.apply_server(
            ServerSettings::new(url, "alice", "x", "notes")
                .with_port(port)
                .with_ssl(ssl),
        );
        config
    }

    #[test]
    fn test_settings_from_full_url() {
        let settings =
            ConnectionSettings::from_config(&config_for("https://dav.example.com/remote.php/dav/", 0, false))
                .unwrap();
        assert_eq!(settings.scheme, Scheme::Https);
        assert_eq!(settings.host, "dav.example.com");
        assert_eq!(settings.base_path, "/remote.php/dav");
        assert_eq!(settings.port, 0);
        assert_eq!(settings.endpoint().unwrap(), "https://dav.example.com");
    }

    #[test]
    fn test_settings_from_bare_host() {
        let settings = ConnectionSettings::from_config(&config_for("nas.local", 5005, false)).unwrap();
        assert_eq!(settings.scheme, Scheme::Http);
        assert_eq!(settings.base_path, "");
        assert_eq!(settings.endpoint().unwrap(), "http://nas.local:5005");

        let secure = ConnectionSettings::from_config(&config_for("nas.local", 0, true)).unwrap();
        assert_eq!(secure.scheme, Scheme::Https);
    }

    #[test]
    fn test_config_port_overrides_url_port() {
        let settings =
            ConnectionSettings::from_config(&config_for("http://nas.local:8080", 9090, false)).unwrap();
        assert_eq!(settings.port, 9090);
    }

    #[test]
    fn test_debug_hides_password() {
        let settings = ConnectionSettings::from_config(&config_for("nas.local", 0, false)).unwrap();
        assert!(!format!("{:?}", settings).contains("password"));
    }

    #[test]
    fn test_normalize_remote_path() {
        assert_eq!(normalize_remote_path("notes/a.png", false), "/notes/a.png");
        assert_eq!(normalize_remote_path("/notes/images", true), "/notes/images/");
        assert_eq!(normalize_remote_path("notes\\images\\1\\", true), "/notes/images/1/");
        assert_eq!(normalize_remote_path("", true), "/");
    }
}
