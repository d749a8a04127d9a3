//! 日志配置命令

use crate::logging::{log_dir, LogConfig};
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// 查看或修改日志配置
#[derive(Debug, Args)]
pub struct LogCommand {
    /// 是否写入日志文件
    #[arg(long)]
    pub enabled: Option<bool>,
    /// 日志文件大小上限（MB，1-100）
    #[arg(long)]
    pub max_size_mb: Option<u32>,
    /// 日志级别: error, warn, info, debug, trace
    #[arg(long)]
    pub level: Option<String>,
}

impl LogCommand {
    pub fn execute(&self, data_dir: &Path) -> Result<()> {
        let mut config = LogConfig::load(data_dir);

        if self.enabled.is_some() || self.max_size_mb.is_some() || self.level.is_some() {
            config.update(self.enabled, self.max_size_mb, self.level.as_deref())?;
            config.save(data_dir)?;
            println!("✓ 日志配置已保存（下次启动生效）");
        }

        println!("  启用: {}", config.enabled);
        println!("  大小上限: {} MB", config.max_size_mb);
        println!("  级别: {}", config.level);
        println!("  目录: {}", log_dir(data_dir).display());
        Ok(())
    }
}
