//! # 元素符号表
//!
//! 元素符号 → 原子序数查询。
//!
//! ## 符号规范化
//! POSCAR 第六行可能写成 `Si_pv`、`Fe_sv` 或 `Si/5a7b...`（VASP 6 的 POTCAR 哈希），
//! 查询前截掉 `_` / `/` 之后的部分，并将首字母大写、其余小写。
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs` 使用
//! - 纯静态数据，无外部依赖

use std::collections::HashMap;
use std::sync::LazyLock;

/// 按原子序数排列的元素符号 (Z = 下标 + 1)
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 符号 → 原子序数
static ATOMIC_NUMBERS: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, &sym)| (sym, i as u32 + 1))
        .collect()
});

/// 查询元素符号对应的原子序数
pub fn atomic_number(symbol: &str) -> Option<u32> {
    let base = symbol
        .trim()
        .split(|c| c == '_' || c == '/')
        .next()
        .unwrap_or("");

    let mut chars = base.chars();
    let first = chars.next()?;
    let canonical: String = first
        .to_uppercase()
        .chain(chars.flat_map(|c| c.to_lowercase()))
        .collect();

    ATOMIC_NUMBERS.get(canonical.as_str()).copied()
}
