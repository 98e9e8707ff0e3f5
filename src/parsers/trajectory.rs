//! # VASP 轨迹读取
//!
//! 将 POSCAR（第 0 帧）与可选的 OUTCAR（第 1..N 帧）串成一个惰性、只能向前的帧序列。
//!
//! ```text
//! let traj = read_vasp_trajectory(Path::new("POSCAR"), Some(Path::new("OUTCAR")), &options)?;
//! for frame in traj {
//!     let frame = frame?;
//!     // ...
//! }
//! ```
//!
//! 序列可以在任意位置停止消费；OUTCAR 文件句柄归迭代器所有，迭代器丢弃即关闭。
//!
//! ## 依赖关系
//! - 被 `commands/traj.rs` 使用
//! - 使用 `parsers/poscar.rs`, `parsers/outcar.rs`

use crate::error::{QvaspError, Result};
use crate::models::Configuration;
use crate::parsers::outcar::OutcarFrames;
use crate::parsers::poscar::{self, PoscarOptions};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// POSCAR + OUTCAR 帧序列
pub struct VaspTrajectory<R: BufRead = BufReader<File>> {
    first: Option<Configuration>,
    rest: Option<OutcarFrames<R>>,
}

impl<R: BufRead> VaspTrajectory<R> {
    /// 只有第 0 帧的轨迹
    pub fn single(first: Configuration) -> Self {
        VaspTrajectory {
            first: Some(first),
            rest: None,
        }
    }

    /// 以第 0 帧和 OUTCAR 读取器构建轨迹
    pub fn with_log(first: Configuration, log: R, source: impl Into<String>) -> Self {
        let rest = OutcarFrames::new(log, first.clone(), source);
        VaspTrajectory {
            first: Some(first),
            rest: Some(rest),
        }
    }
}

impl<R: BufRead> Iterator for VaspTrajectory<R> {
    type Item = Result<Configuration>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(first) = self.first.take() {
            return Some(Ok(first));
        }

        let frame = self.rest.as_mut()?.next();
        if !matches!(frame, Some(Ok(_))) {
            // 读完或出错即释放文件句柄
            self.rest = None;
        }
        frame
    }
}

/// 读取 POSCAR，并在给出 OUTCAR 时继续读取其中的轨迹
pub fn read_vasp_trajectory(
    poscar_path: &Path,
    outcar_path: Option<&Path>,
    options: &PoscarOptions,
) -> Result<VaspTrajectory> {
    let first = poscar::parse_poscar_file(poscar_path, options)?;

    match outcar_path {
        Some(path) => {
            let file = File::open(path).map_err(|e| QvaspError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            Ok(VaspTrajectory::with_log(
                first,
                BufReader::new(file),
                path.display().to_string(),
            ))
        }
        None => Ok(VaspTrajectory::single(first)),
    }
}
