//! # VASP OUTCAR 轨迹扫描器
//!
//! 逐行扫描 OUTCAR，从每个离子步的晶格块与 `TOTAL-FORCE` 块中提取新一帧。
//!
//! ## 状态机
//! ```text
//!            "direct lattice vectors"
//!   Seek ─────────────────────────────▶ ReadLattice (3 行) ──▶ Seek
//!     │
//!     │ "TOTAL-FORCE (eV/Angst)"
//!     ▼
//!   SkipForceHeader (1 行) ──▶ ReadPositions (N 行) ──▶ 产出一帧 ──▶ Seek
//! ```
//!
//! 每帧完成时，用新晶格下的最小镜像位移把原子位置展开到第 0 帧附近，
//! 保证轨迹跨越周期边界时连续。
//!
//! 块读到一半遇到文件结尾属于截断错误，不会产出残缺帧。
//!
//! ## 依赖关系
//! - 被 `parsers/trajectory.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `regex` 处理数字间缺失空白的负号

use crate::error::{QvaspError, Result};
use crate::models::{Configuration, Lattice};

use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

const FORMAT: &str = "outcar";
const LATTICE_MARKER: &str = "direct lattice vectors";
const FORCE_MARKER: &str = "TOTAL-FORCE (eV/Angst)";

/// 紧跟在数字或小数点后的负号（OUTCAR 定宽输出时数字会粘连）
static GLUED_MINUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9.])-").unwrap());

/// 把粘连的负号拆开后按空白切分
pub fn split_signed_fields(line: &str) -> Vec<String> {
    GLUED_MINUS
        .replace_all(line, "$1 -")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// 扫描器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// 寻找晶格块或受力块标记
    Seek,
    /// 读取 3 行晶格矢量
    ReadLattice,
    /// 跳过受力块的表头分隔行
    SkipForceHeader,
    /// 读取 N 行位置/受力
    ReadPositions,
}

/// 正在累积的帧
#[derive(Debug, Clone)]
struct FrameBuffer {
    lattice: Lattice,
    positions: Vec<[f64; 3]>,
    forces: Vec<[f64; 3]>,
    has_forces: bool,
}

/// OUTCAR 有限状态扫描器
#[derive(Debug, Clone)]
pub struct OutcarScanner {
    state: ScanState,
    rows_remaining: usize,
    frame: FrameBuffer,
    reference: Configuration,
    frames_emitted: usize,
    source: String,
}

impl OutcarScanner {
    /// 以第 0 帧为参考创建扫描器
    pub fn new(reference: Configuration, source: impl Into<String>) -> Self {
        let n = reference.atom_count();
        OutcarScanner {
            state: ScanState::Seek,
            rows_remaining: 0,
            frame: FrameBuffer {
                lattice: reference.lattice,
                positions: reference.positions(),
                forces: vec![[0.0; 3]; n],
                has_forces: true,
            },
            reference,
            frames_emitted: 0,
            source: source.into(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[cfg(test)]
    pub fn rows_remaining(&self) -> usize {
        self.rows_remaining
    }

    #[cfg(test)]
    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }

    /// 输入一行；完成一帧时返回该帧
    pub fn feed(&mut self, line: &str, line_no: usize) -> Result<Option<Configuration>> {
        match self.state {
            ScanState::Seek => {
                if line.contains(LATTICE_MARKER) {
                    self.state = ScanState::ReadLattice;
                    self.rows_remaining = 3;
                } else if line.contains(FORCE_MARKER) {
                    self.state = ScanState::SkipForceHeader;
                    self.rows_remaining = 1;
                }
                Ok(None)
            }
            ScanState::ReadLattice => {
                let row = 3 - self.rows_remaining;
                let values = self.parse_row(line, line_no, 3)?;
                self.frame.lattice.matrix[row] = [values[0], values[1], values[2]];

                self.rows_remaining -= 1;
                if self.rows_remaining == 0 {
                    self.state = ScanState::Seek;
                }
                Ok(None)
            }
            ScanState::SkipForceHeader => {
                let n = self.reference.atom_count();
                if n == 0 {
                    return Ok(Some(self.finish_frame()));
                }
                self.state = ScanState::ReadPositions;
                self.rows_remaining = n;
                self.frame.has_forces = true;
                Ok(None)
            }
            ScanState::ReadPositions => {
                let index = self.reference.atom_count() - self.rows_remaining;
                let values = self.parse_row(line, line_no, 3)?;
                self.frame.positions[index] = [values[0], values[1], values[2]];
                if values.len() >= 6 {
                    self.frame.forces[index] = [values[3], values[4], values[5]];
                } else {
                    self.frame.has_forces = false;
                }

                self.rows_remaining -= 1;
                if self.rows_remaining == 0 {
                    return Ok(Some(self.finish_frame()));
                }
                Ok(None)
            }
        }
    }

    /// 输入结束时检查是否停在块中间
    pub fn finish(&self) -> Result<()> {
        let expected = match self.state {
            ScanState::Seek => return Ok(()),
            ScanState::ReadLattice => format!(
                "{} more lattice row(s) after '{}'",
                self.rows_remaining, LATTICE_MARKER
            ),
            ScanState::SkipForceHeader => format!("header line after '{}'", FORCE_MARKER),
            ScanState::ReadPositions => format!(
                "{} more position row(s) after '{}'",
                self.rows_remaining, FORCE_MARKER
            ),
        };
        Err(QvaspError::truncated(FORMAT, &self.source, expected))
    }

    /// 解析一行中的实数，至少需要 `min` 个
    fn parse_row(&self, line: &str, line_no: usize, min: usize) -> Result<Vec<f64>> {
        let fields = split_signed_fields(line);
        let values: Vec<f64> = fields
            .iter()
            .take(6)
            .map_while(|s| s.parse::<f64>().ok())
            .collect();

        if values.len() < min {
            return Err(QvaspError::parse(
                FORMAT,
                &self.source,
                line_no,
                format!("expected {} reals, got '{}'", min, line.trim()),
            ));
        }
        Ok(values)
    }

    /// 提交晶格并按最小镜像展开位置，产出快照
    fn finish_frame(&mut self) -> Configuration {
        self.state = ScanState::Seek;
        self.frames_emitted += 1;

        let mut current = self.reference.clone();
        current.lattice = self.frame.lattice;
        for (atom, raw) in current.atoms.iter_mut().zip(&self.frame.positions) {
            atom.position = *raw;
        }

        for i in 0..current.atom_count() {
            let p0 = self.reference.atoms[i].position;
            let dr = current.diff_min_image(i, p0);
            current.atoms[i].position = [p0[0] - dr[0], p0[1] - dr[1], p0[2] - dr[2]];
        }

        current.forces = self.frame.has_forces.then(|| self.frame.forces.clone());
        current.frame_index = self.frames_emitted;
        current
    }
}

/// OUTCAR 帧迭代器
///
/// 持有底层读取器，迭代器被丢弃时文件随之关闭；出错后不再产出任何帧。
pub struct OutcarFrames<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    scanner: OutcarScanner,
    done: bool,
}

impl<R: BufRead> OutcarFrames<R> {
    pub fn new(reader: R, reference: Configuration, source: impl Into<String>) -> Self {
        OutcarFrames {
            reader,
            buf: Vec::new(),
            line_no: 0,
            scanner: OutcarScanner::new(reference, source),
            done: false,
        }
    }

    fn fail(&mut self, err: QvaspError) -> Option<Result<Configuration>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for OutcarFrames<R> {
    type Item = Result<Configuration>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return match self.scanner.finish() {
                        Ok(()) => None,
                        Err(e) => Some(Err(e)),
                    };
                }
                Ok(_) => {
                    self.line_no += 1;
                    let line = String::from_utf8_lossy(&self.buf).into_owned();
                    match self.scanner.feed(line.trim_end(), self.line_no) {
                        Ok(Some(frame)) => return Some(Ok(frame)),
                        Ok(None) => continue,
                        Err(e) => return self.fail(e),
                    }
                }
                Err(e) => {
                    let err = QvaspError::FileReadError {
                        path: self.scanner.source.clone(),
                        source: e,
                    };
                    return self.fail(err);
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;
    use std::io::Cursor;

    fn reference() -> Configuration {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let atoms = vec![
            Atom::new("Si", 14, [1.0, 1.0, 1.0]),
            Atom::new("O", 8, [2.5, 2.5, 2.5]),
        ];
        Configuration::new("ref", lattice, atoms)
    }

    fn frames(text: &str) -> Vec<Result<Configuration>> {
        OutcarFrames::new(Cursor::new(text.as_bytes().to_vec()), reference(), "OUTCAR").collect()
    }

    const TWO_STEPS: &str = "\
 some header
      direct lattice vectors                 reciprocal lattice vectors
     6.000000000  0.000000000  0.000000000     0.166666667  0.000000000  0.000000000
     0.000000000  6.000000000  0.000000000     0.000000000  0.166666667  0.000000000
     0.000000000  0.000000000  6.000000000     0.000000000  0.000000000  0.166666667
 POSITION                                       TOTAL-FORCE (eV/Angst)
 -----------------------------------------------------------------------------------
      7.00000      1.00000      1.00000         0.010000     -0.020000      0.030000
      2.60000      2.40000      2.50000        -0.010000      0.020000     -0.030000
 -----------------------------------------------------------------------------------
 POSITION                                       TOTAL-FORCE (eV/Angst)
 -----------------------------------------------------------------------------------
      1.10000      1.00000     -4.90000         0.000000      0.000000      0.000000
      2.50000      2.50000      2.50000         0.000000      0.000000      0.000000
 -----------------------------------------------------------------------------------
";

    #[test]
    fn test_split_signed_fields() {
        assert_eq!(
            split_signed_fields("  1.00000000-2.50000000  3.0"),
            vec!["1.00000000", "-2.50000000", "3.0"]
        );
        assert_eq!(split_signed_fields("-1.0 -2.0"), vec!["-1.0", "-2.0"]);
        assert_eq!(split_signed_fields("1.0E-05 2"), vec!["1.0E-05", "2"]);
        assert_eq!(split_signed_fields("1-2-3"), vec!["1", "-2", "-3"]);
    }

    #[test]
    fn test_two_frames_with_forces() {
        let out: Vec<Configuration> = frames(TWO_STEPS).into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].frame_index, 1);
        assert_eq!(out[1].frame_index, 2);
        assert_eq!(out[0].lattice.matrix[0], [6.0, 0.0, 0.0]);
        assert_eq!(out[0].species_labels(), vec!["Si", "O"]);

        let forces = out[0].forces.as_ref().unwrap();
        assert_eq!(forces[0], [0.01, -0.02, 0.03]);

        // 第二帧沿用第一帧提交的晶格
        assert_eq!(out[1].lattice.matrix[2], [0.0, 0.0, 6.0]);
    }

    #[test]
    fn test_minimum_image_unwraps_full_lattice_jump() {
        let out: Vec<Configuration> = frames(TWO_STEPS).into_iter().map(|r| r.unwrap()).collect();

        // 原始位置 (7,1,1) = p0 + a1(新晶格) → 展开回 p0
        let p = out[0].atoms[0].position;
        for k in 0..3 {
            assert!((p[k] - 1.0).abs() < 1e-12);
        }
        let q = out[0].atoms[1].position;
        assert!((q[0] - 2.6).abs() < 1e-12);
        assert!((q[1] - 2.4).abs() < 1e-12);

        // (1.1, 1, -4.9) 在 z 方向跨过一个周期 → (1.1, 1, 1.1)
        let r = out[1].atoms[0].position;
        assert!((r[0] - 1.1).abs() < 1e-12);
        assert!((r[2] - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_truncated_lattice_block() {
        let text = "\
 direct lattice vectors
     6.0 0.0 0.0   0.1 0.0 0.0
     0.0 6.0 0.0   0.0 0.1 0.0
";
        let out = frames(text);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(QvaspError::TruncatedInput { .. })));
    }

    #[test]
    fn test_truncated_position_block() {
        let text = "\
 POSITION      TOTAL-FORCE (eV/Angst)
 --------------------------------------
      1.0 1.0 1.0   0.0 0.0 0.0
";
        let out = frames(text);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(QvaspError::TruncatedInput { .. })));
    }

    #[test]
    fn test_malformed_row_is_parse_error() {
        let text = "\
 direct lattice vectors
     6.0 0.0 0.0
     garbage
     0.0 0.0 6.0
";
        let mut it =
            OutcarFrames::new(Cursor::new(text.as_bytes().to_vec()), reference(), "OUTCAR");
        match it.next() {
            Some(Err(QvaspError::ParseError { reason, .. })) => assert!(reason.contains("line 3")),
            other => panic!("unexpected: {:?}", other.map(|r| r.is_ok())),
        }
        // 出错后迭代器结束
        assert!(it.next().is_none());
    }

    #[test]
    fn test_no_markers_yields_nothing() {
        assert!(frames("nothing to see\nhere\n").is_empty());
        assert!(frames("").is_empty());
    }

    #[test]
    fn test_missing_forces_columns() {
        let text = "\
 POSITION      TOTAL-FORCE (eV/Angst)
 --------------------------------------
      1.0 1.0 1.0
      2.5 2.5 2.5
";
        let out: Vec<Configuration> = frames(text).into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].forces.is_none());
    }

    #[test]
    fn test_scanner_state_transitions() {
        let mut scanner = OutcarScanner::new(reference(), "OUTCAR");
        assert_eq!(scanner.state(), ScanState::Seek);

        scanner.feed("  direct lattice vectors", 1).unwrap();
        assert_eq!(scanner.state(), ScanState::ReadLattice);
        assert_eq!(scanner.rows_remaining(), 3);
        assert!(scanner.finish().is_err());

        for i in 0..3 {
            scanner.feed("5.0 5.0 5.0", 2 + i).unwrap();
        }
        assert_eq!(scanner.state(), ScanState::Seek);
        assert!(scanner.finish().is_ok());

        scanner.feed("POSITION  TOTAL-FORCE (eV/Angst)", 5).unwrap();
        assert_eq!(scanner.state(), ScanState::SkipForceHeader);
        scanner.feed("-----", 6).unwrap();
        assert_eq!(scanner.state(), ScanState::ReadPositions);
        assert_eq!(scanner.rows_remaining(), 2);
        assert!(scanner.feed("1 1 1", 7).unwrap().is_none());
        assert!(scanner.feed("2 2 2", 8).unwrap().is_some());
        assert_eq!(scanner.frames_emitted(), 1);
    }

    #[test]
    fn test_partial_consumption() {
        let mut it = OutcarFrames::new(
            Cursor::new(TWO_STEPS.as_bytes().to_vec()),
            reference(),
            "OUTCAR",
        );
        let first = it.next().unwrap().unwrap();
        assert_eq!(first.frame_index, 1);
        drop(it);
    }
}
