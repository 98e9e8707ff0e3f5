//! # timings 命令实现
//!
//! 汇总日志中的 TIMER 行并按指定顺序输出。
//!
//! ## 依赖关系
//! - 使用 `cli/timings.rs` 定义的参数
//! - 使用 `timing/` 统计与输出

use crate::cli::timings::{SortOrder, TimingsArgs};
use crate::error::{QvaspError, Result};
use crate::timing::{analyse_timing_file, report, write_timings, TimingKind, TimingOrder};
use crate::utils::output;
use crate::utils::params::parse_comma_colon_list;

use std::io;

impl From<SortOrder> for TimingOrder {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Calls => TimingOrder::Calls,
            SortOrder::TotalWallTime => TimingOrder::TotalWallTime,
            SortOrder::TotalCpuTime => TimingOrder::TotalCpuTime,
            SortOrder::MeanWallTime => TimingOrder::MeanWallTime,
            SortOrder::MeanCpuTime => TimingOrder::MeanCpuTime,
        }
    }
}

/// 解析计时类别列表，例如 `wall,cpu`
fn parse_kinds(s: &str) -> Result<Vec<TimingKind>> {
    let kinds = parse_comma_colon_list(s)
        .iter()
        .map(|k| match k.trim() {
            "wall" => Ok(TimingKind::Wall),
            "cpu" => Ok(TimingKind::Cpu),
            other => Err(QvaspError::InvalidArgument(format!(
                "Unknown timing kind '{}' (expected wall or cpu)",
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    if kinds.is_empty() {
        return Err(QvaspError::InvalidArgument("No timing kind given".to_string()));
    }
    Ok(kinds)
}

/// 执行 timings 命令
pub fn execute(args: TimingsArgs) -> Result<()> {
    if !args.file.is_file() {
        return Err(QvaspError::FileNotFound {
            path: args.file.display().to_string(),
        });
    }

    let (_, summary) = analyse_timing_file(&args.file)?;

    if summary.is_empty() {
        output::print_warning(&format!("No TIMER lines found in '{}'", args.file.display()));
        return Ok(());
    }

    let order = TimingOrder::from(args.order);
    let reverse = !args.no_reverse;
    let kinds = parse_kinds(&args.kinds)?;

    let stdout = io::stdout();
    write_timings(&mut stdout.lock(), &summary, order, &kinds, reverse).map_err(|e| {
        QvaspError::FileWriteError {
            path: "<stdout>".to_string(),
            source: e,
        }
    })?;

    if let Some(path) = &args.csv {
        report::to_csv(&summary, order, reverse, path)?;
        output::print_success(&format!("Timing summary saved to '{}'", path.display()));
    }

    Ok(())
}
