//! # 晶体构型数据模型
//!
//! 定义轨迹中单帧的统一表示：晶格 + 按固定顺序排列的原子。
//!
//! ## 约定
//! - `Lattice::matrix[i]` 是第 i+1 个晶格矢量 (a1, a2, a3)，
//!   即矩阵 L 的第 i 列；分数坐标 f 对应笛卡尔坐标 L·f
//! - 原子位置一律存储为笛卡尔坐标 (Å)
//! - 原子下标从 0 开始
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 使用 `models/element.rs` 解析原子序数

use serde::{Deserialize, Serialize};

/// 晶格表示
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a1, a2, a3
    /// [[a1x, a1y, a1z], [a2x, a2y, a2z], [a3x, a3y, a3z]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(&a_vec);
        let b = norm(&b_vec);
        let c = norm(&c_vec);

        let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（带符号）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;

        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 按比例缩放所有晶格矢量
    pub fn scaled(&self, factor: f64) -> Self {
        let mut matrix = self.matrix;
        for row in matrix.iter_mut() {
            for x in row.iter_mut() {
                *x *= factor;
            }
        }
        Lattice { matrix }
    }

    /// 分数坐标转笛卡尔坐标: L·f = f1*a1 + f2*a2 + f3*a3
    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }

    /// 笛卡尔坐标转分数坐标
    ///
    /// 晶格退化（行列式接近 0）时返回 `None`。
    pub fn cart_to_frac(&self, cart: [f64; 3]) -> Option<[f64; 3]> {
        let m = self.matrix;
        let det = self.volume();

        if det.abs() < 1e-10 {
            return None;
        }

        // 倒格矢形式: f_i = (a_j × a_k)·r / V
        let b1 = cross(&m[1], &m[2]);
        let b2 = cross(&m[2], &m[0]);
        let b3 = cross(&m[0], &m[1]);

        Some([
            dot(&b1, &cart) / det,
            dot(&b2, &cart) / det,
            dot(&b3, &cart) / det,
        ])
    }

    /// 对位移矢量施加最小镜像约定
    ///
    /// 分数分量取到最近整数后的余量，再转回笛卡尔坐标。
    /// 对高度倾斜的晶胞这不一定是严格最短的镜像。
    pub fn min_image(&self, displacement: [f64; 3]) -> [f64; 3] {
        match self.cart_to_frac(displacement) {
            Some(frac) => self.frac_to_cart([
                frac[0] - frac[0].round(),
                frac[1] - frac[1].round(),
                frac[2] - frac[2].round(),
            ]),
            None => displacement,
        }
    }
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素标签（POSCAR 中的元素符号，或旧格式下的序号占位符）
    pub species: String,

    /// 原子序数
    pub atomic_number: u32,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(species: impl Into<String>, atomic_number: u32, position: [f64; 3]) -> Self {
        Atom {
            species: species.into(),
            atomic_number,
            position,
        }
    }
}

/// 单帧原子构型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// 注释行（POSCAR 第一行，原样保留）
    pub comment: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表，顺序在解析 POSCAR 时确定，后续帧保持不变
    pub atoms: Vec<Atom>,

    /// POSCAR 第二行的缩放因子（默认读取但不作用于晶格）
    pub scale_factor: f64,

    /// 每原子受力 (eV/Å)，仅 OUTCAR 帧含有
    pub forces: Option<Vec<[f64; 3]>>,

    /// 帧序号：POSCAR 为 0，OUTCAR 第 n 帧为 n
    pub frame_index: usize,
}

impl Configuration {
    pub fn new(comment: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Configuration {
            comment: comment.into(),
            lattice,
            atoms,
            scale_factor: 1.0,
            forces: None,
            frame_index: 0,
        }
    }

    /// 原子数
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn species_labels(&self) -> Vec<&str> {
        self.atoms.iter().map(|a| a.species.as_str()).collect()
    }

    pub fn atomic_numbers(&self) -> Vec<u32> {
        self.atoms.iter().map(|a| a.atomic_number).collect()
    }

    /// 原子 `index` 指向 `reference` 的最小镜像位移矢量（当前晶格下）
    pub fn diff_min_image(&self, index: usize, reference: [f64; 3]) -> [f64; 3] {
        let p = self.atoms[index].position;
        self.lattice
            .min_image([reference[0] - p[0], reference[1] - p[1], reference[2] - p[2]])
    }

    /// 计算化学式（按 POSCAR 元素块顺序）
    pub fn formula(&self) -> String {
        let mut order: Vec<(&str, usize)> = Vec::new();

        for atom in &self.atoms {
            let label = normalize_species(&atom.species);
            match order.iter_mut().find(|(el, _)| *el == label) {
                Some((_, count)) => *count += 1,
                None => order.push((label, 1)),
            }
        }

        order
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 相对参考构型的均方根位移 (Å)
    ///
    /// 原子数不一致或为空时返回 `None`。
    pub fn rms_displacement(&self, reference: &Configuration) -> Option<f64> {
        if self.atoms.is_empty() || self.atoms.len() != reference.atoms.len() {
            return None;
        }

        let sum: f64 = self
            .atoms
            .iter()
            .zip(&reference.atoms)
            .map(|(a, b)| {
                let d = [
                    a.position[0] - b.position[0],
                    a.position[1] - b.position[1],
                    a.position[2] - b.position[2],
                ];
                dot(&d, &d)
            })
            .sum();

        Some((sum / self.atoms.len() as f64).sqrt())
    }
}

/// 元素标签规范化：去掉两端空白/填充
pub fn normalize_species(label: &str) -> &str {
    label.trim()
}

/// 两个元素标签是否相同（规范化后忽略 ASCII 大小写）
pub fn same_species(a: &str, b: &str) -> bool {
    normalize_species(a).eq_ignore_ascii_case(normalize_species(b))
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
