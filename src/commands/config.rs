//! 同步配置相关命令

use crate::config::{ServerSettings, SyncDirection};
use crate::error::SyncError;
use crate::AppState;
use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(value: Switch) -> Self {
        value == Switch::On
    }
}

/// 设置 WebDAV 服务器
#[derive(Debug, Args)]
pub struct ConfigureCommand {
    /// 服务器地址，例如 https://dav.example.com/remote.php/dav
    #[arg(long)]
    pub url: String,
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub password: String,
    /// 远程文件夹
    #[arg(long, default_value = "/")]
    pub folder: String,
    /// 端口（0 表示协议默认端口）
    #[arg(long, default_value_t = 0)]
    pub port: u16,
    /// 使用 HTTPS
    #[arg(long)]
    pub ssl: bool,
}

impl ConfigureCommand {
    pub fn execute(&self, state: &AppState) -> Result<()> {
        let settings = ServerSettings::new(&self.url, &self.user, &self.password, &self.folder)
            .with_port(self.port)
            .with_ssl(self.ssl);

        match state.engine.configure(settings) {
            Ok(()) => {
                let config = state.engine.config();
                println!("✓ 已保存服务器配置");
                println!("  {} -> {}", config.server_url, config.remote_folder);
                Ok(())
            }
            Err(SyncError::Configuration(missing)) => {
                eprintln!("✗ 配置未保存，缺少 {}", missing);
                Err(SyncError::Configuration(missing).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// 查看或修改同步选项
#[derive(Debug, Args)]
pub struct OptionsCommand {
    /// 自动同步开关
    #[arg(long, value_enum)]
    pub auto_sync: Option<Switch>,
    /// 自动同步间隔（分钟，小于 1 时使用 30）
    #[arg(long)]
    pub interval: Option<i64>,
    /// 同步方向: LocalToRemote, RemoteToLocal, TwoWay
    #[arg(long)]
    pub direction: Option<SyncDirection>,
}

impl OptionsCommand {
    pub fn execute(&self, state: &AppState) -> Result<()> {
        let current = state.engine.config();

        if self.auto_sync.is_some() || self.interval.is_some() || self.direction.is_some() {
            state.engine.set_sync_options(
                self.auto_sync.map(bool::from).unwrap_or(current.auto_sync),
                self.interval
                    .unwrap_or(i64::from(current.sync_interval_minutes)),
                self.direction.unwrap_or(current.sync_direction),
            )?;
            println!("✓ 同步选项已保存");
        }

        let config = state.engine.config();
        println!("  自动同步: {}", if config.auto_sync { "开启" } else { "关闭" });
        println!("  间隔: {} 分钟", config.sync_interval_minutes);
        println!("  方向: {}", config.sync_direction);
        Ok(())
    }
}

/// 备份配置文件到指定目录
#[derive(Debug, Args)]
pub struct BackupConfigCommand {
    pub dir: PathBuf,
}

impl BackupConfigCommand {
    pub fn execute(&self, state: &AppState) -> Result<()> {
        if state.engine.backup_config(&self.dir)? {
            println!("✓ 配置已备份到 {}", self.dir.display());
        } else {
            println!("  没有配置文件，无需备份");
        }
        Ok(())
    }
}

/// 从指定目录还原配置文件
#[derive(Debug, Args)]
pub struct RestoreConfigCommand {
    pub dir: PathBuf,
}

impl RestoreConfigCommand {
    pub fn execute(&self, state: &AppState) -> Result<()> {
        if state.engine.restore_config(&self.dir)? {
            println!("✓ 配置已还原");
        } else {
            println!("  {} 中没有备份的配置文件", self.dir.display());
        }
        Ok(())
    }
}
