//! WebDAV 同步配置
//!
//! 配置保存在数据目录下单独的 `webdav_config.ini` 中（不在 images 目录内，
//! 避免被自己同步上去），分组为 `[WebDAV]`。

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, SecondsFormat, Utc};
use ini::{EscapePolicy, Ini, ParseOption};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "webdav_config.ini";
/// INI 分组名
const SECTION: &str = "WebDAV";
/// 默认自动同步间隔（分钟）
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 30;

/// 同步方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncDirection {
    /// 本地到远程
    LocalToRemote,
    /// 远程到本地
    RemoteToLocal,
    /// 双向同步
    #[default]
    TwoWay,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::LocalToRemote => "LocalToRemote",
            SyncDirection::RemoteToLocal => "RemoteToLocal",
            SyncDirection::TwoWay => "TwoWay",
        }
    }

    pub fn allows_upload(&self) -> bool {
        matches!(self, SyncDirection::LocalToRemote | SyncDirection::TwoWay)
    }

    pub fn allows_download(&self) -> bool {
        matches!(self, SyncDirection::RemoteToLocal | SyncDirection::TwoWay)
    }

    /// 从配置文件读取，无法识别时回退为双向同步
    fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!("无法识别的同步方向 {:?}，使用默认值 TwoWay", raw);
            SyncDirection::TwoWay
        })
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = String;

    /// 接受名称（不区分大小写），也兼容旧版本写入的整数 0/1/2
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "localtoremote" | "local-to-remote" | "upload" | "0" => Ok(SyncDirection::LocalToRemote),
            "remotetolocal" | "remote-to-local" | "download" | "1" => Ok(SyncDirection::RemoteToLocal),
            "twoway" | "two-way" | "both" | "2" => Ok(SyncDirection::TwoWay),
            _ => Err(format!("无效的同步方向: {}", s)),
        }
    }
}

/// 服务器连接设置（`configure()` 的入参）
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub remote_folder: String,
    pub port: u16,
    pub use_ssl: bool,
}

impl ServerSettings {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        remote_folder: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
            remote_folder: remote_folder.into(),
            port: 0,
            use_ssl: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }
}

/// 同步配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub server_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// 始终以 `/` 开头和结尾
    pub remote_folder: String,
    /// 0 表示使用协议默认端口
    pub port: u16,
    pub use_ssl: bool,
    pub auto_sync: bool,
    pub sync_interval_minutes: u32,
    pub sync_direction: SyncDirection,
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            username: String::new(),
            password: String::new(),
            remote_folder: "/".to_string(),
            port: 0,
            use_ssl: false,
            auto_sync: false,
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            sync_direction: SyncDirection::TwoWay,
            last_sync_time: None,
        }
    }
}

impl SyncConfig {
    /// 服务器地址、用户名、密码都不为空时视为已配置
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.server_url.trim().is_empty() {
            missing.push("serverUrl");
        }
        if self.username.is_empty() {
            missing.push("username");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        missing
    }

    /// 未配置时返回 ConfigurationError
    pub fn validate(&self) -> SyncResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Configuration(missing.join(", ")))
        }
    }

    /// 应用新的连接设置
    pub fn apply_server(&mut self, settings: ServerSettings) {
        self.server_url = settings.server_url.trim().to_string();
        self.username = settings.username;
        self.password = settings.password;
        self.remote_folder = normalize_remote_folder(&settings.remote_folder);
        self.port = settings.port;
        self.use_ssl = settings.use_ssl;
    }

    /// 拼接远程路径 `{remoteFolder}{relative}`
    pub fn remote_path(&self, relative: &str) -> String {
        format!("{}{}", self.remote_folder, relative.trim_start_matches('/'))
    }
}

/// 规范化远程文件夹：保证以 `/` 开头并以 `/` 结尾
pub fn normalize_remote_folder(folder: &str) -> String {
    let trimmed = folder.trim().replace('\\', "/");
    let inner = trimmed.trim_matches('/');
    if inner.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", inner)
    }
}

/// 将 `SyncInterval` 修正到合法范围（小于 1 时回退为 30 分钟）
pub fn sanitize_interval(minutes: i64) -> u32 {
    if minutes < 1 {
        DEFAULT_SYNC_INTERVAL_MINUTES
    } else {
        minutes.min(u32::MAX as i64) as u32
    }
}

/// 配置文件存取
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 数据目录下的默认配置文件
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取配置，文件不存在时返回默认配置
    pub fn load(&self) -> SyncResult<SyncConfig> {
        if !self.path.exists() {
            debug!("配置文件不存在，使用默认配置: {:?}", self.path);
            return Ok(SyncConfig::default());
        }

        // 引号由 unquote_value 处理，反斜杠转义交给 rust-ini
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: true,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_file_opt(&self.path, options)
            .map_err(|e| SyncError::Config(format!("读取 {:?} 失败: {}", self.path, e)))?;

        let mut config = SyncConfig::default();
        let Some(section) = ini.section(Some(SECTION)) else {
            warn!("配置文件缺少 [{}] 分组: {:?}", SECTION, self.path);
            return Ok(config);
        };
        let get = |key: &str| section.get(key).unwrap_or("");

        config.server_url = unquote_value(get("ServerUrl")).to_string();
        config.username = unquote_value(get("Username")).to_string();
        config.password = unquote_value(get("Password")).to_string();
        config.remote_folder =
            normalize_remote_folder(unquote_value(section.get("RemoteFolder").unwrap_or("/")));
        config.port = get("Port").parse().unwrap_or_else(|_| {
            if !get("Port").is_empty() {
                warn!("无效的端口 {:?}，使用 0", get("Port"));
            }
            0
        });
        config.use_ssl = parse_bool(get("UseSSL"));
        config.auto_sync = parse_bool(get("AutoSync"));
        config.sync_interval_minutes = match get("SyncInterval").parse::<i64>() {
            Ok(minutes) => sanitize_interval(minutes),
            Err(_) => DEFAULT_SYNC_INTERVAL_MINUTES,
        };
        config.sync_direction = match section.get("SyncDirection") {
            Some(raw) => SyncDirection::parse_or_default(raw),
            None => SyncDirection::TwoWay,
        };
        config.last_sync_time = match get("LastSyncTime") {
            "" => None,
            raw => match DateTime::parse_from_rfc3339(raw) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    warn!("无法解析上次同步时间 {:?}: {}", raw, e);
                    None
                }
            },
        };

        Ok(config)
    }

    /// 保存配置（先写临时文件再重命名）
    pub fn save(&self, config: &SyncConfig) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some(SECTION))
            .set("ServerUrl", quote_value(&config.server_url))
            .set("Username", quote_value(&config.username))
            .set("Password", quote_value(&config.password))
            .set("RemoteFolder", quote_value(&config.remote_folder))
            .set("Port", config.port.to_string())
            .set("UseSSL", config.use_ssl.to_string())
            .set("AutoSync", config.auto_sync.to_string())
            .set("SyncInterval", config.sync_interval_minutes.to_string())
            .set("SyncDirection", config.sync_direction.as_str())
            .set(
                "LastSyncTime",
                config
                    .last_sync_time
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                    .unwrap_or_default(),
            );

        let temp_path = self.path.with_extension("ini.tmp");
        ini.write_to_file_policy(&temp_path, EscapePolicy::Basics)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("配置已保存: {:?}", self.path);
        Ok(())
    }

    /// 备份配置文件到指定目录；没有配置文件时什么都不做
    pub fn backup(&self, backup_dir: &Path) -> SyncResult<bool> {
        if !self.path.exists() {
            debug!("没有配置文件，无需备份");
            return Ok(false);
        }

        fs::create_dir_all(backup_dir)?;
        let target = backup_dir.join(CONFIG_FILE_NAME);
        fs::copy(&self.path, &target)?;
        info!("配置已备份到 {:?}", target);
        Ok(true)
    }

    /// 从指定目录还原配置文件；备份不存在时什么都不做
    pub fn restore(&self, backup_dir: &Path) -> SyncResult<bool> {
        let source = backup_dir.join(CONFIG_FILE_NAME);
        if !source.exists() {
            debug!("备份目录中没有配置文件: {:?}", backup_dir);
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        fs::copy(&source, &self.path)?;
        info!("配置已从 {:?} 还原", source);
        Ok(true)
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

/// 首尾有空白或本身带引号的值整体加一层引号，读取时去掉，保证原样读回
fn quote_value(value: &str) -> String {
    if value != value.trim() || is_quoted(value) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn unquote_value(raw: &str) -> &str {
    if is_quoted(raw) {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
