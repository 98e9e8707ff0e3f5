//! # convert 子命令 CLI 定义
//!
//! 读取 POSCAR，按固定格式重写或转为扩展 XYZ。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 支持的输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// VASP POSCAR (Selective Dynamics, Cartesian)
    Poscar,
    /// Extended XYZ
    Xyz,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Poscar => write!(f, "poscar"),
            OutputFormat::Xyz => write!(f, "xyz"),
        }
    }
}

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input POSCAR file or directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (single input) or directory (batch)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Target output format (inferred from the output name when omitted)
    #[arg(short, long, value_enum)]
    pub target: Option<OutputFormat>,

    /// Species names overriding the POSCAR species line, e.g. "Si O"
    #[arg(short, long)]
    pub species: Option<String>,

    /// Species ordering for POSCAR output as key=value pairs
    #[arg(long, default_value = "O=1 Si=2")]
    pub species_order: String,

    /// Multiply the lattice by the POSCAR scale factor
    #[arg(long, default_value_t = false)]
    pub apply_scale: bool,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Comma-separated glob patterns for input files
    #[arg(short, long, default_value = "POSCAR*,CONTCAR*,*.vasp")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
