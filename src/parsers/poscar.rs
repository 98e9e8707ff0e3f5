//! # VASP POSCAR 格式解析器与写出器
//!
//! 解析 VASP POSCAR/CONTCAR 文件格式，作为轨迹的第 0 帧。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line           # 原样保留
//! 1.0                    # scaling factor（读取，默认不作用于晶格）
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+，可省略)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! 第六行全部为整数时视为 VASP 4 旧格式：元素名取自调用方提供的覆盖串，
//! 否则使用 "1", "2", ... 作为占位标签，原子序数直接取占位标签的整数值。
//!
//! ## 写出格式
//! 写出器只输出笛卡尔坐标，元素顺序由 [`SpeciesOrder`] 决定；
//! 不在映射中的元素会被直接略去（沿用既有行为）。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `parsers/trajectory.rs`, `commands/` 使用
//! - 使用 `models/structure.rs`, `models/element.rs`, `utils/params.rs`

use crate::error::{QvaspError, Result};
use crate::models::{element, same_species, Atom, Configuration, Lattice};
use crate::utils::params::{parse_params, Params};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::Lines;

const FORMAT: &str = "poscar";

/// POSCAR 读取选项
#[derive(Debug, Clone, Default)]
pub struct PoscarOptions {
    /// 旧格式（无元素行）下使用的元素名，空白分隔，按元素块顺序对应
    pub species: Option<String>,

    /// 是否将第二行的缩放因子作用于晶格与笛卡尔坐标
    pub apply_scale: bool,
}

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path, options: &PoscarOptions) -> Result<Configuration> {
    let content = fs::read_to_string(path).map_err(|e| QvaspError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(&content, &path.display().to_string(), options)
}

/// 带行号的逐行读取游标
struct LineCursor<'a> {
    lines: Lines<'a>,
    line_no: usize,
    source: &'a str,
}

impl<'a> LineCursor<'a> {
    fn new(content: &'a str, source: &'a str) -> Self {
        LineCursor {
            lines: content.lines(),
            line_no: 0,
            source,
        }
    }

    /// 读取下一行；文件提前结束时报告期望内容
    fn next_line(&mut self, expected: &str) -> Result<&'a str> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(line)
            }
            None => Err(QvaspError::truncated(
                FORMAT,
                self.source,
                format!("{} at line {}", expected, self.line_no + 1),
            )),
        }
    }

    fn error(&self, reason: impl Into<String>) -> QvaspError {
        QvaspError::parse(FORMAT, self.source, self.line_no, reason)
    }

    /// 读取一行中前三个实数
    fn next_vector(&mut self, expected: &str) -> Result<[f64; 3]> {
        let line = self.next_line(expected)?;
        let mut tokens = line.split_whitespace();
        let mut v = [0.0; 3];

        for (k, slot) in v.iter_mut().enumerate() {
            let token = tokens
                .next()
                .ok_or_else(|| self.error(format!("{}: expected 3 reals, found {}", expected, k)))?;
            *slot = token.parse().map_err(|_| {
                self.error(format!("{}: '{}' is not a real number", expected, token))
            })?;
        }

        Ok(v)
    }
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(
    content: &str,
    source: &str,
    options: &PoscarOptions,
) -> Result<Configuration> {
    let mut cursor = LineCursor::new(content, source);

    // Line 1: Comment
    let comment = cursor.next_line("comment line")?.trim_end().to_string();

    // Line 2: Scaling factor
    let scale_line = cursor.next_line("scaling factor")?;
    let scale: f64 = scale_line
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| cursor.error(format!("invalid scaling factor '{}'", scale_line.trim())))?;

    // Lines 3-5: Lattice vectors
    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        *row = cursor.next_vector(&format!("lattice vector {}", i + 1))?;
    }
    let mut lattice = Lattice::from_vectors(matrix);

    // Line 6: Element symbols (VASP 5+) or atom counts (VASP 4)
    let line6 = cursor.next_line("species or counts line")?;
    let tokens: Vec<&str> = line6.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(cursor.error("empty species/counts line"));
    }

    let legacy_counts: Option<Vec<i64>> = tokens.iter().map(|s| s.parse::<i64>().ok()).collect();

    let (labels, counts, have_symbols) = match legacy_counts {
        Some(raw) => {
            let counts = raw
                .iter()
                .map(|&n| {
                    usize::try_from(n)
                        .map_err(|_| cursor.error(format!("negative atom count {}", n)))
                })
                .collect::<Result<Vec<usize>>>()?;
            // VASP 4 format: no element line, only counts
            let (labels, have_symbols): (Vec<String>, bool) = match &options.species {
                Some(species) => {
                    let names: Vec<&str> = species.split_whitespace().collect();
                    if names.len() < counts.len() {
                        return Err(cursor.error(format!(
                            "species override '{}' names {} species, file has {} blocks",
                            species,
                            names.len(),
                            counts.len()
                        )));
                    }
                    let labels = names[..counts.len()].iter().map(|s| s.to_string()).collect();
                    (labels, true)
                }
                None => ((1..=counts.len()).map(|i| i.to_string()).collect(), false),
            };
            (labels, counts, have_symbols)
        }
        None => {
            // VASP 5+ format: element symbols on line 6, counts on line 7
            let labels: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
            let count_line = cursor.next_line("atom counts line")?;
            let counts = count_line
                .split_whitespace()
                .map(|s| {
                    s.parse::<usize>()
                        .map_err(|_| cursor.error(format!("'{}' is not an atom count", s)))
                })
                .collect::<Result<Vec<usize>>>()?;
            if counts.len() != labels.len() {
                return Err(cursor.error(format!(
                    "{} species symbols but {} atom counts",
                    labels.len(),
                    counts.len()
                )));
            }
            (labels, counts, true)
        }
    };

    // 原子序数按元素块解析一次
    let atomic_numbers = labels
        .iter()
        .map(|label| {
            if have_symbols {
                element::atomic_number(label).ok_or_else(|| QvaspError::UnresolvedSpecies {
                    label: label.clone(),
                })
            } else {
                label.parse::<u32>().map_err(|_| QvaspError::UnresolvedSpecies {
                    label: label.clone(),
                })
            }
        })
        .collect::<Result<Vec<u32>>>()?;

    // Optional "Selective dynamics" line, then coordinate type line
    let mut coord_line = cursor.next_line("coordinate type line")?;
    if starts_with_ignore_case(coord_line, 's') {
        coord_line = cursor.next_line("coordinate type line")?;
    }
    let is_direct = starts_with_ignore_case(coord_line, 'd');

    let position_scale = if options.apply_scale {
        let factor = resolve_scale(scale, &lattice)?;
        lattice = lattice.scaled(factor);
        factor
    } else {
        1.0
    };

    // Atom positions；声明数量之后的行（如 CONTCAR 的速度块）不读取
    let total: usize = counts.iter().sum();
    let mut atoms: Vec<Atom> = Vec::with_capacity(total);

    for ((label, &count), &z) in labels.iter().zip(&counts).zip(&atomic_numbers) {
        for _ in 0..count {
            let expected = format!("position of atom {} of {}", atoms.len() + 1, total);
            let v = cursor.next_vector(&expected)?;
            let position = if is_direct {
                lattice.frac_to_cart(v)
            } else {
                [
                    v[0] * position_scale,
                    v[1] * position_scale,
                    v[2] * position_scale,
                ]
            };
            atoms.push(Atom::new(label.clone(), z, position));
        }
    }

    let mut config = Configuration::new(comment, lattice, atoms);
    config.scale_factor = scale;

    Ok(config)
}

/// 首个非空白字符是否为指定字母（忽略大小写）
fn starts_with_ignore_case(line: &str, c: char) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case(&c))
}

/// 缩放因子为负时表示目标体积
fn resolve_scale(scale: f64, lattice: &Lattice) -> Result<f64> {
    if scale > 0.0 {
        return Ok(scale);
    }
    let volume = lattice.volume().abs();
    if scale == 0.0 || volume < 1e-10 {
        return Err(QvaspError::InvalidArgument(format!(
            "cannot apply scaling factor {} to lattice of volume {}",
            scale, volume
        )));
    }
    Ok((scale.abs() / volume).cbrt())
}

// ─────────────────────────────────────────────────────────────
// 写出
// ─────────────────────────────────────────────────────────────

/// 元素 → 排序权重映射，决定写出时的元素块顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesOrder {
    ranks: Vec<(String, i64)>,
}

impl Default for SpeciesOrder {
    fn default() -> Self {
        SpeciesOrder {
            ranks: vec![("O".to_string(), 1), ("Si".to_string(), 2)],
        }
    }
}

impl SpeciesOrder {
    /// 从 key=value 参数串构建，例如 `"O=1 Si=2"`
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_params(&parse_params(s)?)
    }

    /// 写出时按忽略大小写匹配元素，因此只差大小写的键视为重复
    pub fn from_params(params: &Params) -> Result<Self> {
        if params.is_empty() {
            return Err(QvaspError::InvalidArgument(
                "Species order must name at least one species".to_string(),
            ));
        }

        let ranks: Vec<(String, i64)> = params
            .iter()
            .map(|(species, rank)| {
                rank.parse::<i64>()
                    .map(|r| (species.to_string(), r))
                    .map_err(|_| {
                        QvaspError::InvalidArgument(format!(
                            "Invalid rank '{}' for species '{}'",
                            rank, species
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        for (i, (species, _)) in ranks.iter().enumerate() {
            if let Some((other, _)) = ranks[..i].iter().find(|(o, _)| same_species(o, species)) {
                return Err(QvaspError::InvalidArgument(format!(
                    "Species '{}' and '{}' name the same element",
                    other, species
                )));
            }
        }

        Ok(SpeciesOrder { ranks })
    }

    /// 按权重升序排列的元素（权重相同时保持书写顺序）
    pub fn sorted_species(&self) -> Vec<&str> {
        let mut sorted: Vec<&(String, i64)> = self.ranks.iter().collect();
        sorted.sort_by_key(|(_, rank)| *rank);
        sorted.into_iter().map(|(s, _)| s.as_str()).collect()
    }

    /// 以空白分隔的元素名，可作为重新读取时的元素覆盖串
    pub fn species_line(&self) -> String {
        self.sorted_species().join(" ")
    }
}

/// POSCAR 写出器
#[derive(Debug, Clone, Default)]
pub struct PoscarWriter {
    species_order: SpeciesOrder,
}

impl PoscarWriter {
    pub fn new(species_order: SpeciesOrder) -> Self {
        PoscarWriter { species_order }
    }

    /// 写出单个构型
    pub fn write<W: Write>(&self, out: &mut W, config: &Configuration) -> io::Result<()> {
        writeln!(out, "System")?;

        // Lattice
        writeln!(out, "{:20.10}", 1.0)?;
        for v in &config.lattice.matrix {
            writeln!(out, "{:20.10}{:20.10}{:20.10}", v[0], v[1], v[2])?;
        }

        // 按映射排序统计元素数量
        let species = self.species_order.sorted_species();
        let counts: Vec<String> = species
            .iter()
            .map(|s| {
                config
                    .atoms
                    .iter()
                    .filter(|a| same_species(&a.species, s))
                    .count()
                    .to_string()
            })
            .collect();
        writeln!(out, "{}", counts.join(" "))?;

        writeln!(out, "Selective Dynamics")?;
        writeln!(out, "Cartesian")?;

        // Positions
        for s in &species {
            for atom in config.atoms.iter().filter(|a| same_species(&a.species, s)) {
                let p = atom.position;
                writeln!(out, "{:20.10}{:20.10}{:20.10} T  T  T", p[0], p[1], p[2])?;
            }
        }

        Ok(())
    }

    /// 写出到字符串
    pub fn to_string(&self, config: &Configuration) -> String {
        let mut buf = Vec::new();
        // 写入 Vec<u8> 不会失败
        let _ = self.write(&mut buf, config);
        String::from_utf8_lossy(&buf).into_owned()
    }

}


#[cfg(test)]
mod tests {
    use super::*;

    const SIO2_DIRECT: &str = r#"alpha quartz
1.0
4.9 0.0 0.0
0.0 5.0 0.0
0.0 0.0 5.4
Si O
1 2
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.25 0.5 1.0
"#;

    fn parse(content: &str) -> Result<Configuration> {
        parse_poscar_content(content, "test", &PoscarOptions::default())
    }

    fn with_species(species: &str) -> PoscarOptions {
        PoscarOptions {
            species: Some(species.to_string()),
            ..PoscarOptions::default()
        }
    }

    #[test]
    fn test_parse_poscar_vasp5() {
        let config = parse(SIO2_DIRECT).unwrap();
        assert_eq!(config.comment, "alpha quartz");
        assert_eq!(config.atom_count(), 3);
        assert_eq!(config.species_labels(), vec!["Si", "O", "O"]);
        assert_eq!(config.atomic_numbers(), vec![14, 8, 8]);
        assert_eq!(config.lattice.matrix[2], [0.0, 0.0, 5.4]);
    }

    #[test]
    fn test_direct_coordinates_are_lattice_product() {
        let content = r#"skewed
1.0
4.0 0.1 0.0
0.5 3.0 0.2
0.3 0.0 6.0
C
1
direct
0.25 0.5 0.75
"#;
        let config = parse(content).unwrap();
        let f = [0.25, 0.5, 0.75];
        let m = config.lattice.matrix;
        let p = config.atoms[0].position;
        for k in 0..3 {
            assert_eq!(p[k], f[0] * m[0][k] + f[1] * m[1][k] + f[2] * m[2][k]);
        }
    }

    #[test]
    fn test_cartesian_coordinates_used_as_is() {
        let content = "cart\n1.0\n5 0 0\n0 5 0\n0 0 5\nH\n1\nCartesian\n7.5 -1.0 2.0\n";
        let config = parse(content).unwrap();
        assert_eq!(config.atoms[0].position, [7.5, -1.0, 2.0]);
    }

    #[test]
    fn test_legacy_species_fallback() {
        let content = r#"legacy
1.0
5.0 0.0 0.0
0.0 5.0 0.0
0.0 0.0 5.0
2 1
Direct
0.0 0.0 0.0
0.5 0.5 0.5
0.5 0.0 0.0
"#;
        let config = parse(content).unwrap();
        assert_eq!(config.species_labels(), vec!["1", "1", "2"]);
        assert_eq!(config.atomic_numbers(), vec![1, 1, 2]);
    }

    #[test]
    fn test_legacy_species_override_is_positional() {
        let content = "legacy\n1.0\n5 0 0\n0 5 0\n0 0 5\n1 2\nCartesian\n0 0 0\n1 1 1\n2 2 2\n";
        let options = with_species("Si O");
        let config = parse_poscar_content(content, "test", &options).unwrap();
        assert_eq!(config.species_labels(), vec!["Si", "O", "O"]);
        assert_eq!(config.atomic_numbers(), vec![14, 8, 8]);
    }

    #[test]
    fn test_legacy_species_override_too_short() {
        let content = "legacy\n1.0\n5 0 0\n0 5 0\n0 0 5\n1 2\nCartesian\n0 0 0\n1 1 1\n2 2 2\n";
        let options = with_species("Si");
        let err = parse_poscar_content(content, "test", &options).unwrap_err();
        assert!(matches!(err, QvaspError::ParseError { .. }));
    }

    #[test]
    fn test_unknown_symbol_is_unresolved() {
        let content = "bad\n1.0\n5 0 0\n0 5 0\n0 0 5\nXq\n1\nCartesian\n0 0 0\n";
        let err = parse(content).unwrap_err();
        assert!(matches!(err, QvaspError::UnresolvedSpecies { ref label } if label == "Xq"));
    }

    #[test]
    fn test_selective_dynamics_line() {
        let content = r#"Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe
2
  selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
"#;
        let config = parse(content).unwrap();
        assert_eq!(config.atom_count(), 2);
        assert!((config.atoms[1].position[0] - 1.435).abs() < 1e-12);
    }

    #[test]
    fn test_scale_factor_read_but_not_applied() {
        let content = "Si\n2.0\n2.0 0.0 0.0\n0.0 2.0 0.0\n0.0 0.0 2.0\nSi\n1\nDirect\n0.5 0.5 0.5\n";
        let config = parse(content).unwrap();
        // 缩放因子只记录不生效，与下游已有行为保持一致
        assert_eq!(config.scale_factor, 2.0);
        assert_eq!(config.lattice.matrix[0], [2.0, 0.0, 0.0]);
        assert_eq!(config.atoms[0].position, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_scale_factor_applied_on_request() {
        let content = "Si\n2.0\n2.0 0.0 0.0\n0.0 2.0 0.0\n0.0 0.0 2.0\nSi\n1\nCartesian\n0.5 0.5 0.5\n";
        let options = PoscarOptions {
            apply_scale: true,
            ..Default::default()
        };
        let config = parse_poscar_content(content, "test", &options).unwrap();
        assert_eq!(config.lattice.matrix[0], [4.0, 0.0, 0.0]);
        assert_eq!(config.atoms[0].position, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_negative_scale_is_target_volume() {
        let content = "Si\n-64.0\n2.0 0.0 0.0\n0.0 2.0 0.0\n0.0 0.0 2.0\nSi\n1\nDirect\n0 0 0\n";
        let options = PoscarOptions {
            apply_scale: true,
            ..Default::default()
        };
        let config = parse_poscar_content(content, "test", &options).unwrap();
        assert!((config.lattice.volume() - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_lattice_names_line() {
        let content = "x\n1.0\n5.0 0.0 0.0\n0.0 abc 0.0\n0 0 5\nH\n1\nDirect\n0 0 0\n";
        match parse(content).unwrap_err() {
            QvaspError::ParseError { reason, .. } => {
                assert!(reason.contains("line 4"));
                assert!(reason.contains("lattice vector 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_atom_lines_is_truncated() {
        let content = "x\n1.0\n5 0 0\n0 5 0\n0 0 5\nH\n3\nDirect\n0 0 0\n0.5 0.5 0.5\n";
        let err = parse(content).unwrap_err();
        assert!(matches!(err, QvaspError::TruncatedInput { .. }));
    }

    #[test]
    fn test_count_symbol_mismatch() {
        let content = "x\n1.0\n5 0 0\n0 5 0\n0 0 5\nH O\n1\nDirect\n0 0 0\n";
        assert!(matches!(parse(content).unwrap_err(), QvaspError::ParseError { .. }));
    }

    #[test]
    fn test_writer_layout() {
        let config = parse(SIO2_DIRECT).unwrap();
        let text = PoscarWriter::default().to_string(&config);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "System");
        assert_eq!(lines[1], "        1.0000000000");
        assert_eq!(
            lines[2],
            "        4.9000000000        0.0000000000        0.0000000000"
        );
        // O 在前 (rank 1)，Si 在后 (rank 2)
        assert_eq!(lines[5], "2 1");
        assert_eq!(lines[6], "Selective Dynamics");
        assert_eq!(lines[7], "Cartesian");
        assert!(lines[8].ends_with(" T  T  T"));
        assert_eq!(lines.len(), 11);
        // 第一个 O: 分数 (0.5, 0.5, 0) → (2.45, 2.5, 0)
        assert!(lines[8].starts_with("        2.4500000000        2.5000000000"));
    }

    #[test]
    fn test_round_trip_cartesian() {
        let lattice = Lattice::from_vectors([[4.9, 0.0, 0.0], [-2.45, 4.24, 0.0], [0.0, 0.0, 5.4]]);
        let atoms = vec![
            Atom::new("O", 8, [0.123456789012, 1.5, 2.25]),
            Atom::new("Si", 14, [2.0, -0.333333333333, 4.1]),
            Atom::new("O", 8, [3.75, 2.5, 0.0000000001]),
        ];
        let config = Configuration::new("round trip", lattice, atoms);

        let writer = PoscarWriter::default();
        let text = writer.to_string(&config);

        let options = with_species(&SpeciesOrder::default().species_line());
        let parsed = parse_poscar_content(&text, "round_trip", &options).unwrap();

        assert_eq!(parsed.atom_count(), 3);
        assert_eq!(parsed.species_labels(), vec!["O", "O", "Si"]);

        // 写出按元素分组，因此与原始 O, O, Si 的顺序比较
        let expected = [atoms_by(&config, "O"), atoms_by(&config, "Si")].concat();
        for (p, e) in parsed.positions().iter().zip(&expected) {
            for k in 0..3 {
                assert!((p[k] - e[k]).abs() <= 1e-10);
            }
        }
        for k in 0..3 {
            for j in 0..3 {
                assert!((parsed.lattice.matrix[k][j] - config.lattice.matrix[k][j]).abs() <= 1e-10);
            }
        }
    }

    fn atoms_by(config: &Configuration, species: &str) -> Vec<[f64; 3]> {
        config
            .atoms
            .iter()
            .filter(|a| a.species == species)
            .map(|a| a.position)
            .collect()
    }

    #[test]
    fn test_writer_omits_unmapped_species() {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let atoms = vec![
            Atom::new("Si", 14, [1.0, 1.0, 1.0]),
            Atom::new("Al", 13, [3.1415926535, 2.0, 2.0]),
            Atom::new("O", 8, [0.5, 0.5, 0.5]),
        ];
        let config = Configuration::new("mixed", lattice, atoms);

        let text = PoscarWriter::default().to_string(&config);
        // 未在映射中的 Al 被静默略去
        assert!(!text.contains("3.1415926535"));
        assert_eq!(text.lines().nth(5), Some("1 1"));
        assert_eq!(text.lines().count(), 10);
    }

    #[test]
    fn test_writer_custom_order_and_case() {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let atoms = vec![
            Atom::new(" al ", 13, [1.0, 0.0, 0.0]),
            Atom::new("O", 8, [2.0, 0.0, 0.0]),
            Atom::new("Al", 13, [3.0, 0.0, 0.0]),
        ];
        let config = Configuration::new("alumina", lattice, atoms);

        let writer = PoscarWriter::new(SpeciesOrder::parse("O=2 Al=1").unwrap());
        let text = writer.to_string(&config);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[5], "2 1");
        assert!(lines[8].starts_with("        1.0000000000"));
        assert!(lines[9].starts_with("        3.0000000000"));
        assert!(lines[10].starts_with("        2.0000000000"));
    }

    #[test]
    fn test_species_order_rejects_case_duplicates() {
        let err = SpeciesOrder::parse("O=1 o=2").unwrap_err();
        assert!(matches!(err, QvaspError::InvalidArgument(_)));
        assert!(SpeciesOrder::parse("O=1 Si=2 SI=3").is_err());
    }

    #[test]
    fn test_writer_emits_each_atom_once() {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let atoms = vec![Atom::new("O", 8, [0.5, 0.5, 0.5]), Atom::new("o", 8, [1.0, 1.0, 1.0])];
        let config = Configuration::new("oxygen", lattice, atoms);

        let text = PoscarWriter::new(SpeciesOrder::parse("o=1 Si=2").unwrap()).to_string(&config);
        assert_eq!(text.matches(" T  T  T").count(), config.atom_count());
        assert_eq!(text.lines().nth(5), Some("2 0"));
    }

    #[test]
    fn test_negative_legacy_count_is_parse_error() {
        let content = "legacy\n1.0\n5 0 0\n0 5 0\n0 0 5\n-1 2\nCartesian\n0 0 0\n";
        let err = parse(content).unwrap_err();
        match err {
            QvaspError::ParseError { reason, .. } => assert!(reason.contains("negative atom count")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_lines_after_declared_atoms_are_ignored() {
        // CONTCAR: 位置之后还有空行与速度块
        let content = format!("{}\n0.1 0.2 0.3\n0.0 0.0 0.0\n0.0 0.0 0.0\n", SIO2_DIRECT);
        let config = parse(&content).unwrap();
        assert_eq!(config.atom_count(), 3);
        assert!((config.atoms[2].position[2] - 5.4).abs() < 1e-12);
    }

    #[test]
    fn test_species_order_parse() {
        let order = SpeciesOrder::parse("Si=2 O=1 Al=2").unwrap();
        assert_eq!(order.sorted_species(), vec!["O", "Si", "Al"]);
        assert!(SpeciesOrder::parse("Si=x").is_err());
        assert!(SpeciesOrder::parse("").is_err());
    }

    #[test]
    fn test_parse_and_write_file() {
        let dir = std::env::temp_dir().join(format!("qvasp_poscar_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("POSCAR");
        fs::write(&input, SIO2_DIRECT).unwrap();

        let config = parse_poscar_file(&input, &PoscarOptions::default()).unwrap();
        let output = dir.join("POSCAR.out");
        fs::write(&output, PoscarWriter::default().to_string(&config)).unwrap();
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("System\n"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = parse_poscar_file(Path::new("/nonexistent/POSCAR"), &PoscarOptions::default())
            .unwrap_err();
        assert!(matches!(err, QvaspError::FileReadError { .. }));
    }
}
