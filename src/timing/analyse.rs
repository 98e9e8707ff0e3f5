//! # TIMER 行统计
//!
//! 从 QUIP 输出中提取 `TIMER` 行，按标签汇总调用次数、总时间与平均时间。
//!
//! ## 行格式
//! ```text
//! TIMER: calc_connect          done in 0.12345 cpu secs, 0.12346 wall clock secs.
//! ```
//! 按空白切分后：字段 1 为标签，字段 4 为 CPU 时间，字段 7 为墙钟时间。
//!
//! ## 依赖关系
//! - 被 `timing/report.rs`, `commands/timings.rs` 使用

use crate::error::{QvaspError, Result};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 计时类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingKind {
    Wall,
    Cpu,
}

impl fmt::Display for TimingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingKind::Wall => write!(f, "wall"),
            TimingKind::Cpu => write!(f, "cpu"),
        }
    }
}

/// 单个标签的原始计时样本（按出现顺序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSamples {
    pub wall: Vec<f64>,
    pub cpu: Vec<f64>,
}

/// 统计量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub len: usize,
    pub sum: f64,
    pub mean: f64,
}

impl TimingStats {
    fn from_samples(samples: &[f64]) -> Self {
        let len = samples.len();
        let sum: f64 = samples.iter().sum();
        let mean = if len > 0 { sum / len as f64 } else { 0.0 };
        TimingStats { len, sum, mean }
    }
}

/// 单个标签的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LabelSummary {
    pub wall: TimingStats,
    pub cpu: TimingStats,
}

impl LabelSummary {
    pub fn get(&self, kind: TimingKind) -> &TimingStats {
        match kind {
            TimingKind::Wall => &self.wall,
            TimingKind::Cpu => &self.cpu,
        }
    }
}

pub type Timings = BTreeMap<String, TimingSamples>;
pub type TimingSummary = BTreeMap<String, LabelSummary>;

/// 分析 TIMER 行，返回 (原始样本, 汇总)
pub fn analyse_timings<I, S>(lines: I) -> Result<(Timings, TimingSummary)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut timings = Timings::new();

    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if !line.starts_with("TIMER") {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 11 {
            return Err(QvaspError::parse(
                "timer",
                "TIMER log",
                i + 1,
                format!("expected at least 11 fields, found {}", fields.len()),
            ));
        }

        let number = |idx: usize| -> Result<f64> {
            fields[idx].parse().map_err(|_| {
                QvaspError::parse(
                    "timer",
                    "TIMER log",
                    i + 1,
                    format!("'{}' is not a time", fields[idx]),
                )
            })
        };
        let cpu = number(4)?;
        let wall = number(7)?;

        let entry = timings.entry(fields[1].to_string()).or_default();
        entry.wall.push(wall);
        entry.cpu.push(cpu);
    }

    let summary = timings
        .iter()
        .map(|(label, samples)| {
            (
                label.clone(),
                LabelSummary {
                    wall: TimingStats::from_samples(&samples.wall),
                    cpu: TimingStats::from_samples(&samples.cpu),
                },
            )
        })
        .collect();

    Ok((timings, summary))
}

/// 读取文件并分析其中的 TIMER 行
pub fn analyse_timing_file(path: &Path) -> Result<(Timings, TimingSummary)> {
    let file = File::open(path).map_err(|e| QvaspError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .map_err(|e| QvaspError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

    analyse_timings(&lines)
}
