//! # 扩展 XYZ 写出器
//!
//! 将单帧构型写为 extended XYZ 格式，多帧直接顺序拼接即为轨迹文件。
//!
//! ```text
//! 2
//! Lattice="5.0 0.0 0.0 0.0 5.0 0.0 0.0 0.0 5.0" Properties=species:S:1:pos:R:3:Z:I:1 frame=0 comment="quartz"
//! Si   1.0000000000   1.0000000000   1.0000000000   14
//! O    2.5000000000   2.5000000000   2.5000000000    8
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs`, `commands/traj.rs` 使用
//! - 使用 `models/structure.rs`

use crate::models::Configuration;

/// 转换为扩展 XYZ 格式
pub fn to_extxyz_string(config: &Configuration) -> String {
    let mut result = String::new();
    result.push_str(&format!("{}\n", config.atom_count()));

    let lattice = config
        .lattice
        .matrix
        .iter()
        .flat_map(|v| v.iter())
        .map(|x| format!("{:.10}", x))
        .collect::<Vec<_>>()
        .join(" ");

    let forces = config
        .forces
        .as_ref()
        .filter(|f| f.len() == config.atom_count());

    let properties = if forces.is_some() {
        "species:S:1:pos:R:3:Z:I:1:forces:R:3"
    } else {
        "species:S:1:pos:R:3:Z:I:1"
    };

    result.push_str(&format!(
        "Lattice=\"{}\" Properties={} frame={} comment=\"{}\"\n",
        lattice,
        properties,
        config.frame_index,
        config.comment.replace('"', "'")
    ));

    let species = config.species_labels();
    let numbers = config.atomic_numbers();
    for (i, p) in config.positions().iter().enumerate() {
        result.push_str(&format!(
            "{:<4} {:16.10} {:16.10} {:16.10} {:4}",
            species[i].trim(),
            p[0],
            p[1],
            p[2],
            numbers[i]
        ));
        if let Some(f) = forces {
            result.push_str(&format!(
                " {:14.8} {:14.8} {:14.8}",
                f[i][0], f[i][1], f[i][2]
            ));
        }
        result.push('\n');
    }

    result
}
