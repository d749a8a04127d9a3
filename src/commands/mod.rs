//! 命令行子命令

pub mod config;
pub mod log;
pub mod sync;

/// 以 JSON 打印可序列化的结果
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
