//! # 参数字符串工具
//!
//! 提供 `key=value` 参数串、逗号/冒号列表以及切片表达式的解析。
//!
//! ## 参数串格式
//! ```text
//! O=1 Si=2 comment="two words" verbose
//! ```
//! - 以空白分隔的 `key=value` 对，保持书写顺序
//! - 值可用双引号包裹以包含空白
//! - 只有 `key` 没有 `=` 时值为 `true`
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs` (`SpeciesOrder`) 和 `cli/` 使用
//! - 无外部模块依赖

use crate::error::{QvaspError, Result};
use std::fmt;

/// 有序的 key=value 参数集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖参数（覆盖时保留原位置）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&args_str(self))
    }
}

/// 解析 key=value 参数串
pub fn parse_params(s: &str) -> Result<Params> {
    let mut params = Params::new();

    for token in tokenize(s)? {
        match token.split_once('=') {
            Some((key, value)) => {
                if key.is_empty() {
                    return Err(QvaspError::InvalidArgument(format!(
                        "Missing key before '=' in '{}'",
                        s
                    )));
                }
                params.insert(key, unquote(value));
            }
            None => params.insert(token, "true"),
        }
    }

    Ok(params)
}

/// 将参数集合还原为参数串
pub fn args_str(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| {
            if v.is_empty() || v.chars().any(char::is_whitespace) {
                format!("{}=\"{}\"", k, v)
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 按空白切分，双引号内的空白不切分
fn tokenize(s: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(QvaspError::InvalidArgument(format!(
            "Unterminated quote in '{}'",
            s
        )));
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

/// 解析逗号或冒号分隔的列表，统一转为小写
///
/// 含冒号时按冒号切分，否则含逗号时按逗号切分，否则整体作为单个元素。
pub fn parse_comma_colon_list(s: &str) -> Vec<String> {
    let items: Vec<&str> = if s.contains(':') {
        s.split(':').collect()
    } else if s.contains(',') {
        s.split(',').collect()
    } else {
        vec![s]
    };

    items.into_iter().map(|k| k.to_lowercase()).collect()
}

/// 帧选择切片 `[start]:[stop][:step]`，语义同 Python 切片（仅正步长）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: usize,
}

impl Default for FrameSlice {
    fn default() -> Self {
        FrameSlice {
            start: None,
            stop: None,
            step: 1,
        }
    }
}

impl FrameSlice {
    /// 是否包含负下标（需要知道总帧数才能确定）
    pub fn needs_length(&self) -> bool {
        self.start.is_some_and(|s| s < 0) || self.stop.is_some_and(|s| s < 0)
    }

    /// 在总帧数已知时解析出选中的帧下标
    pub fn resolve(&self, len: usize) -> Vec<usize> {
        let clamp = |v: isize| -> usize {
            if v < 0 {
                (len as isize + v).max(0) as usize
            } else {
                (v as usize).min(len)
            }
        };

        let start = self.start.map(clamp).unwrap_or(0);
        let stop = self.stop.map(clamp).unwrap_or(len);

        (start..stop).step_by(self.step).collect()
    }

    /// 非负切片下，判断帧下标是否被选中
    pub fn selects(&self, index: usize) -> bool {
        let start = self.start.unwrap_or(0).max(0) as usize;
        if index < start || self.is_past_end(index) {
            return false;
        }
        (index - start) % self.step == 0
    }

    /// 非负切片下，帧下标是否已越过 stop（之后不再有选中帧）
    pub fn is_past_end(&self, index: usize) -> bool {
        matches!(self.stop, Some(stop) if stop >= 0 && index >= stop as usize)
    }
}

impl fmt::Display for FrameSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: Option<isize>| v.map(|x| x.to_string()).unwrap_or_default();
        write!(f, "{}:{}:{}", opt(self.start), opt(self.stop), self.step)
    }
}

/// 解析切片表达式，例如 `10:`、`:100:5`、`-1`
pub fn parse_slice(s: &str) -> Result<FrameSlice> {
    let invalid = || QvaspError::InvalidRange(s.to_string());
    let parse_bound = |part: &str| -> Result<Option<isize>> {
        let part = part.trim();
        if part.is_empty() {
            Ok(None)
        } else {
            part.parse::<isize>().map(Some).map_err(|_| invalid())
        }
    };

    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.as_slice() {
        [single] => {
            let index = parse_bound(single)?.ok_or_else(invalid)?;
            // 单个下标 → 只选中该帧
            let stop = if index == -1 { None } else { Some(index + 1) };
            Ok(FrameSlice {
                start: Some(index),
                stop,
                step: 1,
            })
        }
        [start, stop] => Ok(FrameSlice {
            start: parse_bound(start)?,
            stop: parse_bound(stop)?,
            step: 1,
        }),
        [start, stop, step] => {
            let step = match parse_bound(step)? {
                None => 1,
                Some(v) if v > 0 => v as usize,
                Some(_) => return Err(invalid()),
            };
            Ok(FrameSlice {
                start: parse_bound(start)?,
                stop: parse_bound(stop)?,
                step,
            })
        }
        _ => Err(invalid()),
    }
}
