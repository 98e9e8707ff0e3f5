//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: POSCAR 重写 / 转为扩展 XYZ（单文件或目录批量）
//! - `traj`: 读取 POSCAR + OUTCAR 轨迹，导出 XYZ / CSV / 位移曲线
//! - `timings`: 汇总日志中的 TIMER 行
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, traj, timings

pub mod convert;
pub mod timings;
pub mod traj;

use clap::{Parser, Subcommand};

/// qvasp - VASP 结构与轨迹工具
#[derive(Parser)]
#[command(name = "qvasp")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Read and write VASP POSCAR/OUTCAR structures and trajectories", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite POSCAR files or convert them to extended XYZ
    Convert(convert::ConvertArgs),

    /// Read a POSCAR + OUTCAR trajectory and export its frames
    Traj(traj::TrajArgs),

    /// Summarise TIMER lines of a QUIP log
    Timings(timings::TimingsArgs),
}
