//! # timings 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/timings.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 排序方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortOrder {
    Calls,
    TotalWallTime,
    TotalCpuTime,
    MeanWallTime,
    MeanCpuTime,
}

/// timings 子命令参数
#[derive(Args, Debug)]
pub struct TimingsArgs {
    /// Log file containing TIMER lines
    pub file: PathBuf,

    /// Sort order
    #[arg(short, long, value_enum, default_value_t = SortOrder::Calls)]
    pub order: SortOrder,

    /// Timing kinds to report, comma or colon separated: "wall", "cpu", "wall,cpu"
    #[arg(short, long, default_value = "wall")]
    pub kinds: String,

    /// Ascending order (default is largest first)
    #[arg(long, default_value_t = false)]
    pub no_reverse: bool,

    /// Export the summary as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
