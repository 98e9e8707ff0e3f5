//! # traj 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/traj.rs`

use clap::Args;
use std::path::PathBuf;

/// traj 子命令参数
#[derive(Args, Debug)]
pub struct TrajArgs {
    /// POSCAR file (frame 0)
    #[arg(long, default_value = "POSCAR")]
    pub poscar: PathBuf,

    /// OUTCAR file with the ionic steps
    #[arg(long)]
    pub outcar: Option<PathBuf>,

    /// Species names overriding the POSCAR species line, e.g. "Si O"
    #[arg(short, long)]
    pub species: Option<String>,

    /// Multiply the lattice by the POSCAR scale factor
    #[arg(long, default_value_t = false)]
    pub apply_scale: bool,

    /// Frame selection, Python slice syntax: "10:", ":100:5", "-1"
    #[arg(short, long, default_value = ":")]
    pub frames: String,

    /// Write selected frames as extended XYZ
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write per-frame summary as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Plot RMS displacement from frame 0 (PNG)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Print at most this many rows of the summary table (0 = none)
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}
