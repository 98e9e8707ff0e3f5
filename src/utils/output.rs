//! # 终端状态输出
//!
//! 每条消息以带颜色的状态标签开头；错误与警告写到 stderr，
//! 以免混入 `timings` 写到 stdout 的报告。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate

use colored::{ColoredString, Colorize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Error,
    Warning,
    Info,
    Skip,
    Done,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Error => "[ERR]",
            Status::Warning => "[WARN]",
            Status::Info => "[*]",
            Status::Skip => "[SKIP]",
            Status::Done => "[DONE]",
        }
    }

    fn styled(self) -> ColoredString {
        let label = self.label();
        match self {
            Status::Ok | Status::Done => label.green().bold(),
            Status::Error => label.red().bold(),
            Status::Warning => label.yellow().bold(),
            Status::Info => label.blue().bold(),
            Status::Skip => label.dimmed(),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Status::Error | Status::Warning)
    }
}

fn emit(status: Status, msg: &str) {
    if status.to_stderr() {
        eprintln!("{} {}", status.styled(), msg);
    } else {
        println!("{} {}", status.styled(), msg);
    }
}

pub fn print_success(msg: &str) {
    emit(Status::Ok, msg);
}

pub fn print_error(msg: &str) {
    emit(Status::Error, msg);
}

pub fn print_warning(msg: &str) {
    emit(Status::Warning, msg);
}

pub fn print_info(msg: &str) {
    emit(Status::Info, msg);
}

pub fn print_skip(msg: &str) {
    emit(Status::Skip, msg);
}

pub fn print_done(msg: &str) {
    emit(Status::Done, msg);
}

/// 单文件转换结果: `[OK] POSCAR -> out/POSCAR.xyz`
pub fn print_conversion(from: &Path, to: &Path) {
    let msg = format!(
        "{} {} {}",
        from.display().to_string().dimmed(),
        "->".cyan(),
        to.display()
    );
    emit(Status::Ok, &msg);
}

/// 命令开头的标题栏
pub fn print_header(title: &str) {
    let rule = "─".repeat(60).dimmed();
    println!("\n{}\n  {}\n{}\n", rule, title.bold(), rule);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_routing() {
        assert!(Status::Error.to_stderr());
        assert!(Status::Warning.to_stderr());
        assert!(!Status::Info.to_stderr());
        assert!(!Status::Done.to_stderr());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Ok.label(), "[OK]");
        assert_eq!(Status::Skip.label(), "[SKIP]");
        colored::control::set_override(false);
        assert_eq!(Status::Warning.styled().to_string(), "[WARN]");
    }
}
