//! 同步、状态和守护进程命令

use crate::core::{SyncEvent, SyncStatus};
use crate::AppState;
use anyhow::Result;
use clap::Args;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// 立即执行一次同步
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// 以 JSON 输出同步报告
    #[arg(long)]
    pub json: bool,
}

impl SyncCommand {
    pub async fn execute(&self, state: &AppState) -> Result<()> {
        let events = state.engine.subscribe();
        let quiet = self.json;
        let printer = tokio::spawn(async move { print_events(events, quiet).await });

        let result = state.engine.sync_now().await;

        match result {
            Ok(report) => {
                // 等待事件打印完
                let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
                if self.json {
                    crate::commands::print_json(&report)?;
                } else {
                    println!(
                        "✓ 同步完成: 上传 {} 个, 下载 {} 个, 失败 {} 个 ({} ms)",
                        report.files_uploaded,
                        report.files_downloaded,
                        report.files_failed,
                        report.duration
                    );
                    for error in &report.errors {
                        println!("  ⚠ {}", error);
                    }
                }
                Ok(())
            }
            Err(e) => {
                printer.abort();
                Err(e.into())
            }
        }
    }
}

/// 打印进度事件，收到 Finished 后退出
async fn print_events(mut events: broadcast::Receiver<SyncEvent>, quiet: bool) {
    loop {
        match events.recv().await {
            Ok(SyncEvent::Progress { percent, message }) if !quiet => {
                println!("[{:>3}%] {}", percent, message)
            }
            Ok(SyncEvent::Error(message)) if !quiet => eprintln!("  ✗ {}", message),
            Ok(SyncEvent::Finished { .. }) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// 查看同步状态
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// 以 JSON 输出当前配置
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, state: &AppState) -> Result<()> {
        let engine = &state.engine;
        let config = engine.config();

        if self.json {
            return crate::commands::print_json(&serde_json::json!({
                "status": engine.status(),
                "config": config,
                "lastError": engine.last_error(),
            }));
        }

        println!("状态: {}", engine.status());
        if engine.status() == SyncStatus::NotConfigured {
            println!("  运行 `notesync configure` 设置 WebDAV 服务器");
            return Ok(());
        }

        println!("  服务器: {}", config.server_url);
        println!("  用户: {}", config.username);
        println!("  远程文件夹: {}", config.remote_folder);
        println!("  同步方向: {}", config.sync_direction);
        println!(
            "  自动同步: {}",
            if config.auto_sync {
                format!("每 {} 分钟", config.sync_interval_minutes)
            } else {
                "关闭".to_string()
            }
        );
        match engine.last_sync_time() {
            Some(time) => println!("  上次同步: {}", time.with_timezone(&chrono::Local)),
            None => println!("  上次同步: 从未"),
        }
        if let Some(error) = engine.last_error() {
            println!("  上次错误: {}", error);
        }
        match state.note_store.note_count().await {
            Ok(count) => println!("  笔记数量: {}", count),
            Err(e) => println!("  笔记数据库不可用: {}", e),
        }
        Ok(())
    }
}

/// 在前台保持自动同步，直到 Ctrl-C
#[derive(Debug, Args)]
pub struct DaemonCommand {
    /// 启动时立即同步一次
    #[arg(long)]
    pub now: bool,
}

impl DaemonCommand {
    pub async fn execute(&self, state: &AppState) -> Result<()> {
        let engine = &state.engine;
        if !engine.config().auto_sync {
            anyhow::bail!("自动同步未开启，请先运行 `notesync options --auto-sync on`");
        }

        let mut events = engine.subscribe();
        if self.now {
            engine.start_sync()?;
        }
        info!(
            "自动同步运行中（每 {} 分钟），按 Ctrl-C 退出",
            engine.config().sync_interval_minutes
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("收到退出信号");
                    break;
                }
                event = events.recv() => match event {
                    Ok(SyncEvent::Finished { success }) => {
                        info!("同步结束: {}", if success { "成功" } else { "失败" });
                    }
                    Ok(SyncEvent::Error(message)) => tracing::warn!("{}", message),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("跳过 {} 个事件", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        Ok(())
    }
}
