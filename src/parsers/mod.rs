//! # 解析器模块
//!
//! 提供 VASP 结构文件与轨迹日志的读取、写出。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar, outcar, trajectory, xyz

pub mod outcar;
pub mod poscar;
pub mod trajectory;
pub mod xyz;

use crate::error::{QvaspError, Result};
use std::fmt;
use std::path::Path;

/// 已知文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Poscar,
    Outcar,
    Xyz,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Poscar => write!(f, "poscar"),
            FileFormat::Outcar => write!(f, "outcar"),
            FileFormat::Xyz => write!(f, "xyz"),
        }
    }
}

impl FileFormat {
    /// 按名称查找格式（不区分大小写）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.starts_with("poscar") || name.starts_with("contcar") {
            return Some(FileFormat::Poscar);
        }
        if name.starts_with("outcar") {
            return Some(FileFormat::Outcar);
        }
        match name.as_str() {
            "vasp" => Some(FileFormat::Poscar),
            "xyz" | "extxyz" => Some(FileFormat::Xyz),
            _ => None,
        }
    }
}

/// 推断读写格式
///
/// 显式给出的格式优先；否则看扩展名，没有扩展名时看文件名本身
/// （`POSCAR*` / `CONTCAR*` / `OUTCAR*`）。
pub fn infer_format(path: &Path, explicit: Option<&str>) -> Result<FileFormat> {
    if let Some(name) = explicit {
        return FileFormat::from_name(name)
            .ok_or_else(|| QvaspError::UnsupportedFormat(name.to_string()));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    // VASP 文件常带后缀: POSCAR.relax, OUTCAR.1
    if let Some(format) = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(FileFormat::from_name)
        .filter(|f| *f != FileFormat::Xyz)
    {
        return Ok(format);
    }

    path.extension()
        .and_then(|e| e.to_str())
        .and_then(FileFormat::from_name)
        .ok_or_else(|| {
            QvaspError::UnsupportedFormat(format!("Cannot determine format for: {}", file_name))
        })
}
