//! # traj 命令实现
//!
//! 流式读取 POSCAR + OUTCAR 轨迹，按切片选帧后导出。
//!
//! ## 功能
//! - 扩展 XYZ 多帧输出
//! - 每帧摘要（体积、晶格长度、相对第 0 帧的 RMS 位移、最大受力）
//! - 终端表格、CSV 与位移曲线图
//!
//! 切片含负下标时需先读完整条轨迹才能确定帧号，此时帧会缓存在内存中；
//! 否则边读边写，越过 stop 后立即停止读取。
//!
//! ## 依赖关系
//! - 使用 `cli/traj.rs` 定义的参数
//! - 使用 `parsers/trajectory.rs`, `parsers/xyz.rs`
//! - 使用 `utils/params.rs` 解析切片, `utils/progress.rs` 显示进度

use crate::cli::traj::TrajArgs;
use crate::error::{QvaspError, Result};
use crate::models::Configuration;
use crate::parsers::poscar::PoscarOptions;
use crate::parsers::trajectory::read_vasp_trajectory;
use crate::parsers::xyz::to_extxyz_string;
use crate::utils::params::{parse_slice, FrameSlice};
use crate::utils::{output, progress};

use indicatif::ProgressBar;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 单帧摘要
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub frame: usize,
    pub atoms: usize,
    pub volume: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub rms_displacement: Option<f64>,
    pub max_force: Option<f64>,
}

impl FrameSummary {
    pub fn from_frame(frame: &Configuration, reference: &Configuration) -> Self {
        let (a, b, c, _, _, _) = frame.lattice.parameters();
        let max_force = frame.forces.as_ref().and_then(|forces| {
            forces
                .iter()
                .map(|f| (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt())
                .reduce(f64::max)
        });

        FrameSummary {
            frame: frame.frame_index,
            atoms: frame.atom_count(),
            volume: frame.lattice.volume().abs(),
            a,
            b,
            c,
            rms_displacement: frame.rms_displacement(reference),
            max_force,
        }
    }
}

/// 表格行
#[derive(Debug, Clone, Tabled)]
struct FrameRow {
    #[tabled(rename = "Frame")]
    frame: usize,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Volume (Å³)")]
    volume: String,
    #[tabled(rename = "a (Å)")]
    a: String,
    #[tabled(rename = "b (Å)")]
    b: String,
    #[tabled(rename = "c (Å)")]
    c: String,
    #[tabled(rename = "RMSD (Å)")]
    rmsd: String,
    #[tabled(rename = "max |F| (eV/Å)")]
    max_force: String,
}

impl From<&FrameSummary> for FrameRow {
    fn from(s: &FrameSummary) -> Self {
        let opt = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".into());
        FrameRow {
            frame: s.frame,
            atoms: s.atoms,
            volume: format!("{:.4}", s.volume),
            a: format!("{:.4}", s.a),
            b: format!("{:.4}", s.b),
            c: format!("{:.4}", s.c),
            rmsd: opt(s.rms_displacement),
            max_force: opt(s.max_force),
        }
    }
}

/// 选中帧的去处：可选 XYZ 文件 + 摘要列表
struct FrameSink {
    xyz: Option<(PathBuf, BufWriter<File>)>,
    summaries: Vec<FrameSummary>,
}

impl FrameSink {
    fn new(xyz_path: Option<&Path>) -> Result<Self> {
        let xyz = match xyz_path {
            Some(path) => {
                let file = File::create(path).map_err(|e| QvaspError::FileWriteError {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Some((path.to_path_buf(), BufWriter::new(file)))
            }
            None => None,
        };
        Ok(FrameSink {
            xyz,
            summaries: Vec::new(),
        })
    }

    fn accept(&mut self, frame: &Configuration, reference: &Configuration) -> Result<()> {
        if let Some((path, out)) = self.xyz.as_mut() {
            out.write_all(to_extxyz_string(frame).as_bytes())
                .map_err(|e| QvaspError::FileWriteError {
                    path: path.display().to_string(),
                    source: e,
                })?;
        }
        self.summaries.push(FrameSummary::from_frame(frame, reference));
        Ok(())
    }

    fn finish(self) -> Result<Vec<FrameSummary>> {
        if let Some((path, mut out)) = self.xyz {
            out.flush().map_err(|e| QvaspError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        Ok(self.summaries)
    }
}

/// 执行 traj 命令
pub fn execute(args: TrajArgs) -> Result<()> {
    output::print_header("Reading VASP trajectory");

    let slice = parse_slice(&args.frames)?;

    for path in std::iter::once(&args.poscar).chain(args.outcar.as_ref()) {
        if !path.is_file() {
            return Err(QvaspError::FileNotFound {
                path: path.display().to_string(),
            });
        }
    }

    let options = PoscarOptions {
        species: args.species.clone(),
        apply_scale: args.apply_scale,
    };
    let frames = read_vasp_trajectory(&args.poscar, args.outcar.as_deref(), &options)?;

    let mut sink = FrameSink::new(args.output.as_deref())?;
    let spinner = progress::create_spinner(&format!("reading {}", args.poscar.display()));
    let scanned = select_frames(frames, &slice, &mut sink, &spinner);
    spinner.finish_and_clear();
    let total_read = scanned?;
    let summaries = sink.finish()?;

    output::print_info(&format!(
        "Read {} frame(s), selected {} with slice '{}'",
        total_read,
        summaries.len(),
        slice
    ));

    if summaries.is_empty() {
        output::print_warning("No frames selected");
        return Ok(());
    }

    if args.top > 0 {
        let rows: Vec<FrameRow> = summaries.iter().take(args.top).map(FrameRow::from).collect();
        println!("{}", Table::new(&rows));
        if summaries.len() > args.top {
            output::print_info(&format!("... {} more frame(s)", summaries.len() - args.top));
        }
    }

    if let Some(path) = &args.output {
        output::print_success(&format!(
            "{} frame(s) written to '{}'",
            summaries.len(),
            path.display()
        ));
    }

    if let Some(path) = &args.csv {
        save_summary_csv(&summaries, path)?;
        output::print_success(&format!("Frame summary saved to '{}'", path.display()));
    }

    if let Some(path) = &args.plot {
        generate_plot(&summaries, path)?;
        output::print_success(&format!("RMSD plot saved to '{}'", path.display()));
    }

    Ok(())
}

/// 遍历帧序列，把切片选中的帧交给 sink，返回实际读取的帧数
fn select_frames<I>(
    frames: I,
    slice: &FrameSlice,
    sink: &mut FrameSink,
    spinner: &ProgressBar,
) -> Result<usize>
where
    I: Iterator<Item = Result<Configuration>>,
{
    let mut reference: Option<Configuration> = None;
    let mut buffered: Vec<Configuration> = Vec::new();
    let mut read = 0;

    for (index, frame) in frames.enumerate() {
        if !slice.needs_length() && slice.is_past_end(index) {
            break;
        }

        let frame = frame?;
        read += 1;
        spinner.inc(1);

        let reference = reference.get_or_insert_with(|| {
            spinner.set_message(frame.formula());
            frame.clone()
        });
        if slice.needs_length() {
            buffered.push(frame);
        } else if slice.selects(index) {
            sink.accept(&frame, reference)?;
        }
    }

    if let Some(reference) = &reference {
        for index in slice.resolve(buffered.len()) {
            sink.accept(&buffered[index], reference)?;
        }
    }

    Ok(read)
}

/// 保存每帧摘要到 CSV
fn save_summary_csv(summaries: &[FrameSummary], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for summary in summaries {
        wtr.serialize(summary)?;
    }

    wtr.flush().map_err(|e| QvaspError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 绘制 RMS 位移随帧号变化的曲线
fn generate_plot(summaries: &[FrameSummary], output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let plot_data: Vec<(f64, f64)> = summaries
        .iter()
        .filter_map(|s| s.rms_displacement.map(|r| (s.frame as f64, r)))
        .collect();

    if plot_data.is_empty() {
        return Err(QvaspError::Other("No data to plot".to_string()));
    }

    let x_min = plot_data.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
    let x_max = plot_data.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);
    let y_max = plot_data.iter().map(|(_, y)| *y).fold(0.0, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| QvaspError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("RMS displacement from frame 0", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((x_min - 0.5)..(x_max + 0.5), 0.0..y_top)
        .map_err(|e| QvaspError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Frame")
        .y_desc("RMSD (Å)")
        .draw()
        .map_err(|e| QvaspError::Other(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(plot_data.iter().copied(), BLUE.stroke_width(2)))
        .map_err(|e| QvaspError::Other(e.to_string()))?;

    chart
        .draw_series(
            plot_data
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())),
        )
        .map_err(|e| QvaspError::Other(e.to_string()))?;

    root.present()
        .map_err(|e| QvaspError::Other(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn frame(index: usize, x: f64) -> Configuration {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let mut c = Configuration::new("test", lattice, vec![Atom::new("Si", 14, [x, 0.0, 0.0])]);
        c.frame_index = index;
        c
    }

    fn frames(n: usize) -> Vec<Result<Configuration>> {
        (0..n).map(|i| Ok(frame(i, i as f64 * 0.1))).collect()
    }

    fn run(slice: &str, input: Vec<Result<Configuration>>) -> (Result<usize>, Vec<FrameSummary>) {
        let slice = parse_slice(slice).unwrap();
        let mut sink = FrameSink::new(None).unwrap();
        let read = select_frames(input.into_iter(), &slice, &mut sink, &ProgressBar::hidden());
        (read, sink.finish().unwrap())
    }

    #[test]
    fn test_select_all_frames() {
        let (read, summaries) = run(":", frames(4));
        assert_eq!(read.unwrap(), 4);
        let ids: Vec<usize> = summaries.iter().map(|s| s.frame).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!((summaries[3].rms_displacement.unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(summaries[0].rms_displacement, Some(0.0));
    }

    #[test]
    fn test_stop_reads_no_further() {
        let (read, summaries) = run("1:3", frames(10));
        assert_eq!(read.unwrap(), 3);
        let ids: Vec<usize> = summaries.iter().map(|s| s.frame).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_negative_index_buffers() {
        let (_, summaries) = run("-1", frames(5));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].frame, 4);
        assert!((summaries[0].rms_displacement.unwrap() - 0.4).abs() < 1e-12);

        let (_, summaries) = run("::2", frames(5));
        let ids: Vec<usize> = summaries.iter().map(|s| s.frame).collect();
        assert_eq!(ids, vec![0, 2, 4]);
    }

    #[test]
    fn test_error_stops_selection() {
        let mut input = frames(2);
        input.push(Err(QvaspError::truncated("outcar", "OUTCAR", "3 lattice rows")));
        let (read, _) = run(":", input);
        assert!(matches!(read, Err(QvaspError::TruncatedInput { .. })));
    }

    #[test]
    fn test_summary_max_force() {
        let mut f = frame(1, 0.0);
        f.forces = Some(vec![[3.0, 4.0, 0.0]]);
        let summary = FrameSummary::from_frame(&f, &frame(0, 0.0));
        assert_eq!(summary.max_force, Some(5.0));
        assert!((summary.volume - 125.0).abs() < 1e-9);
        assert!((summary.a - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_xyz_and_csv_output() {
        let dir = std::env::temp_dir().join(format!("qvasp_traj_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let xyz = dir.join("traj.xyz");
        let csv_path = dir.join("traj.csv");

        let slice = FrameSlice::default();
        let mut sink = FrameSink::new(Some(xyz.as_path())).unwrap();
        select_frames(frames(3).into_iter(), &slice, &mut sink, &ProgressBar::hidden()).unwrap();
        let summaries = sink.finish().unwrap();
        save_summary_csv(&summaries, &csv_path).unwrap();

        let text = std::fs::read_to_string(&xyz).unwrap();
        assert_eq!(text.matches("Lattice=").count(), 3);
        assert!(text.contains("frame=2"));

        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv_text.starts_with("frame,atoms,volume,a,b,c,rms_displacement,max_force"));
        assert_eq!(csv_text.lines().count(), 4);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
