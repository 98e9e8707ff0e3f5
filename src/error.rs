//! # 统一错误处理模块
//!
//! 定义 qvasp 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 格式错误: `ParseError`（行内容不符合语法，数字字段无法解析）
//! - 截断错误: `TruncatedInput`（块读取到一半遇到文件结尾）
//! - 元素错误: `UnresolvedSpecies`（元素符号无法映射到原子序数）
//! - I/O 错误: `FileReadError` / `FileWriteError` / `FileNotFound`
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// qvasp 统一错误类型
#[derive(Error, Debug)]
pub enum QvaspError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unexpected end of {format} file: {path}\nExpected: {expected}")]
    TruncatedInput {
        format: String,
        path: String,
        expected: String,
    },

    #[error("Cannot resolve species '{label}' to an atomic number")]
    UnresolvedSpecies { label: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl QvaspError {
    /// 构造带行号的格式错误
    pub fn parse(format: &str, path: &str, line_no: usize, reason: impl Into<String>) -> Self {
        QvaspError::ParseError {
            format: format.to_string(),
            path: path.to_string(),
            reason: format!("line {}: {}", line_no, reason.into()),
        }
    }

    /// 构造截断错误
    pub fn truncated(format: &str, path: &str, expected: impl Into<String>) -> Self {
        QvaspError::TruncatedInput {
            format: format.to_string(),
            path: path.to_string(),
            expected: expected.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, QvaspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_mentions_line() {
        let err = QvaspError::parse("poscar", "POSCAR", 3, "expected 3 reals");
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("expected 3 reals"));
    }

    #[test]
    fn test_truncated_message() {
        let err = QvaspError::truncated("outcar", "OUTCAR", "3 lattice rows");
        assert!(err.to_string().contains("3 lattice rows"));
    }
}
