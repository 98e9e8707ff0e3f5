//! # 工具函数模块
//!
//! 提供美化输出、进度条与参数字符串解析。
//!
//! ## 依赖关系
//! - 被 `commands/`, `batch/`, `parsers/poscar.rs` 使用
//! - 子模块: output, params, progress

pub mod output;
pub mod params;
pub mod progress;
