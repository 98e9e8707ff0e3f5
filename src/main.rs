//! # qvasp - VASP 结构与轨迹工具
//!
//! 读取 POSCAR / OUTCAR，写出固定格式的 POSCAR 与扩展 XYZ 轨迹。
//!
//! ## 子命令
//! - `convert` - POSCAR 重写 / 转为扩展 XYZ
//! - `traj`    - 读取 POSCAR + OUTCAR 轨迹并导出
//! - `timings` - 汇总 TIMER 日志
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (POSCAR / OUTCAR / XYZ 读写)
//!   │     ├── models/    (数据模型)
//!   │     ├── batch/     (批量并行处理)
//!   │     └── timing/    (TIMER 统计)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod timing;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
