//! # 计时汇总输出
//!
//! 以定宽文本或 CSV 输出 `analyse_timings` 的汇总结果。
//!
//! ## 依赖关系
//! - 被 `commands/timings.rs` 使用
//! - 使用 `csv` 导出数据

use super::analyse::{LabelSummary, TimingKind, TimingSummary};
use crate::error::{QvaspError, Result};

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// 排序依据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingOrder {
    #[default]
    Calls,
    TotalWallTime,
    TotalCpuTime,
    MeanWallTime,
    MeanCpuTime,
}

impl TimingOrder {
    fn key(&self, s: &LabelSummary) -> f64 {
        match self {
            TimingOrder::Calls => s.wall.len as f64,
            TimingOrder::TotalWallTime => s.wall.sum,
            TimingOrder::TotalCpuTime => s.cpu.sum,
            TimingOrder::MeanWallTime => s.wall.mean,
            TimingOrder::MeanCpuTime => s.cpu.mean,
        }
    }
}

/// 按指定顺序排列汇总条目
pub fn sorted_entries(
    summary: &TimingSummary,
    order: TimingOrder,
    reverse: bool,
) -> Vec<(&str, &LabelSummary)> {
    let mut entries: Vec<(&str, &LabelSummary)> =
        summary.iter().map(|(k, v)| (k.as_str(), v)).collect();

    entries.sort_by(|a, b| order.key(a.1).total_cmp(&order.key(b.1)));
    if reverse {
        entries.reverse();
    }
    entries
}

/// 写出定宽文本汇总，每个标签、每种计时类别一行
pub fn write_timings<W: Write>(
    out: &mut W,
    summary: &TimingSummary,
    order: TimingOrder,
    kinds: &[TimingKind],
    reverse: bool,
) -> io::Result<()> {
    for (label, value) in sorted_entries(summary, order, reverse) {
        for &kind in kinds {
            let stats = value.get(kind);
            writeln!(
                out,
                "{:<20} calls {:<6} total {} {:6.2} mean {} {:6.2}",
                label, stats.len, kind, stats.sum, kind, stats.mean
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TimingRecord<'a> {
    label: &'a str,
    kind: TimingKind,
    calls: usize,
    total: f64,
    mean: f64,
}

/// 导出为 CSV 文件
pub fn to_csv(
    summary: &TimingSummary,
    order: TimingOrder,
    reverse: bool,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for (label, value) in sorted_entries(summary, order, reverse) {
        for kind in [TimingKind::Wall, TimingKind::Cpu] {
            let stats = value.get(kind);
            wtr.serialize(TimingRecord {
                label,
                kind,
                calls: stats.len,
                total: stats.sum,
                mean: stats.mean,
            })?;
        }
    }

    wtr.flush().map_err(|e| QvaspError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
