use anyhow::Result;
use clap::{Parser, Subcommand};
use notesync_lib::commands::{
    config::{BackupConfigCommand, ConfigureCommand, OptionsCommand, RestoreConfigCommand},
    log::LogCommand,
    sync::{DaemonCommand, StatusCommand, SyncCommand},
    test::TestCommand,
};
use notesync_lib::logging::init_logging;
use notesync_lib::AppState;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "notesync", version, about = "WebDAV 笔记同步")]
struct Cli {
    /// 数据目录（默认使用系统数据目录，也可以用 NOTESYNC_DATA_DIR 指定）
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 输出更多日志（-v, -vv）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 设置 WebDAV 服务器
    Configure(ConfigureCommand),
    /// 查看或修改同步选项
    Options(OptionsCommand),
    /// 立即同步一次
    Sync(SyncCommand),
    /// 查看同步状态
    Status(StatusCommand),
    /// 测试服务器连接
    Test(TestCommand),
    /// 保持自动同步运行
    Daemon(DaemonCommand),
    /// 备份同步配置
    BackupConfig(BackupConfigCommand),
    /// 还原同步配置
    RestoreConfig(RestoreConfigCommand),
    /// 查看或修改日志配置
    Log(LogCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => notesync_lib::dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("无法确定数据目录，请使用 --data-dir 指定"))?,
    };
    std::fs::create_dir_all(&data_dir)?;
    init_logging(&data_dir, cli.verbose);

    // 日志配置不需要打开数据库
    if let Commands::Log(cmd) = &cli.command {
        return cmd.execute(&data_dir);
    }

    let state = AppState::new(Some(data_dir)).await?;

    let result = match &cli.command {
        Commands::Configure(cmd) => cmd.execute(&state),
        Commands::Options(cmd) => cmd.execute(&state),
        Commands::Sync(cmd) => cmd.execute(&state).await,
        Commands::Status(cmd) => cmd.execute(&state).await,
        Commands::Test(cmd) => cmd.execute(&state).await,
        Commands::Daemon(cmd) => cmd.execute(&state).await,
        Commands::BackupConfig(cmd) => cmd.execute(&state),
        Commands::RestoreConfig(cmd) => cmd.execute(&state),
        Commands::Log(_) => Ok(()),
    };

    state.cleanup().await;
    result
}
