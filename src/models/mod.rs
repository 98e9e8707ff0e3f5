//! # 数据模型模块
//!
//! 定义统一的晶格、原子与单帧构型数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 子模块: structure, element

pub mod element;
pub mod structure;

pub use structure::{same_species, Atom, Configuration, Lattice};
