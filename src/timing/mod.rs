//! # 计时日志分析模块
//!
//! 汇总 QUIP 输出中的 `TIMER` 行。
//!
//! ## 依赖关系
//! - 被 `commands/timings.rs` 使用
//! - 子模块: analyse, report

pub mod analyse;
pub mod report;

pub use analyse::{analyse_timing_file, TimingKind};
pub use report::{write_timings, TimingOrder};
