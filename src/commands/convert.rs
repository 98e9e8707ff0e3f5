//! # convert 命令实现
//!
//! 读取 POSCAR 并以固定格式重写，或转为扩展 XYZ。
//!
//! ## 功能
//! - 单文件：直接写到 `--output`（若为目录则写入其中）
//! - 目录：按模式收集文件，并行转换，保持相对目录结构
//! - 已存在的输出默认跳过，`--overwrite` 覆盖
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `parsers/poscar.rs`, `parsers/xyz.rs`
//! - 使用 `batch/` 收集与并行执行

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::convert::{ConvertArgs, OutputFormat};
use crate::error::{QvaspError, Result};
use crate::parsers::poscar::{parse_poscar_file, PoscarOptions, PoscarWriter, SpeciesOrder};
use crate::parsers::{infer_format, FileFormat};
use crate::parsers::xyz::to_extxyz_string;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum ConvertStatus {
    Success,
    Skipped,
}

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    let target = resolve_target(args.target, &args.output)?;
    output::print_header(&format!("Converting to {} format", target));

    if !args.input.exists() {
        return Err(QvaspError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let species_order = SpeciesOrder::parse(&args.species_order)?;
    if target == OutputFormat::Poscar {
        output::print_info(&format!("Species order: {}", species_order.species_line()));
    }
    let writer = PoscarWriter::new(species_order);
    let options = PoscarOptions {
        species: args.species.clone(),
        apply_scale: args.apply_scale,
    };

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive);

    if collector.is_single_file() {
        let output_path = if args.output.is_dir() {
            args.output.join(output_name(&args.input, target))
        } else {
            args.output.clone()
        };

        match convert_file(
            &args.input,
            &output_path,
            target,
            &writer,
            &options,
            args.overwrite,
        )? {
            ConvertStatus::Success => output::print_conversion(&args.input, &output_path),
            ConvertStatus::Skipped => output::print_skip(&format!(
                "{} exists (use --overwrite)",
                output_path.display()
            )),
        }
        return Ok(());
    }

    let files = collector.collect();
    if files.is_empty() {
        output::print_warning(&format!(
            "No files matched '{}' under {}",
            args.pattern,
            args.input.display()
        ));
        return Ok(());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} files to convert ({} parallel jobs)",
        files.len(),
        runner.jobs()
    ));
    let result = runner.run(files, |path| {
        let output_path = batch_output_path(&args.input, &args.output, path, target);
        match convert_file(
            path,
            &output_path,
            target,
            &writer,
            &options,
            args.overwrite,
        ) {
            Ok(ConvertStatus::Success) => ProcessResult::Success,
            Ok(ConvertStatus::Skipped) => ProcessResult::Skipped,
            Err(e) => ProcessResult::Failed(path.display().to_string(), e.to_string()),
        }
    })?;

    for (path, err) in &result.failures {
        output::print_error(&format!("{}: {}", path, err));
    }

    output::print_done(&format!(
        "Converted {} of {} file(s) to '{}' in '{}' ({} skipped, {} failed)",
        result.success,
        result.total(),
        target,
        args.output.display(),
        result.skipped,
        result.failed
    ));

    Ok(())
}

/// 未指定 `--target` 时按输出路径推断，无法推断时写 POSCAR
fn resolve_target(explicit: Option<OutputFormat>, output_path: &Path) -> Result<OutputFormat> {
    if let Some(target) = explicit {
        return Ok(target);
    }

    match infer_format(output_path, None) {
        Ok(FileFormat::Xyz) => Ok(OutputFormat::Xyz),
        Ok(FileFormat::Outcar) => Err(QvaspError::UnsupportedFormat(
            "OUTCAR cannot be written".to_string(),
        )),
        Ok(FileFormat::Poscar) | Err(_) => Ok(OutputFormat::Poscar),
    }
}

/// 输出文件名：POSCAR 保持原名，XYZ 追加 `.xyz`
fn output_name(input: &Path, target: OutputFormat) -> String {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("POSCAR");

    match target {
        OutputFormat::Poscar => name.to_string(),
        OutputFormat::Xyz => format!("{}.xyz", name),
    }
}

/// 批量模式下的输出路径（保持相对输入目录的层级）
fn batch_output_path(
    input_dir: &Path,
    output_dir: &Path,
    file: &Path,
    target: OutputFormat,
) -> PathBuf {
    let relative = file.strip_prefix(input_dir).unwrap_or(file);
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    output_dir.join(parent).join(output_name(file, target))
}

/// 转换单个文件
fn convert_file(
    input_path: &Path,
    output_path: &Path,
    target: OutputFormat,
    writer: &PoscarWriter,
    options: &PoscarOptions,
    overwrite: bool,
) -> Result<ConvertStatus> {
    if output_path.exists() && !overwrite {
        return Ok(ConvertStatus::Skipped);
    }

    let config = parse_poscar_file(input_path, options)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| QvaspError::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let content = match target {
        OutputFormat::Poscar => writer.to_string(&config),
        OutputFormat::Xyz => to_extxyz_string(&config),
    };

    fs::write(output_path, content).map_err(|e| QvaspError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(ConvertStatus::Success)
}
