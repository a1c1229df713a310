//! # 结构文件读写模块
//!
//! 读取层结构输入，写出界面结构。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar

pub mod poscar;

use crate::error::{Result, TwistcellError};
use crate::models::Crystal;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<Crystal> {
    if !path.is_file() {
        return Err(TwistcellError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if matches!(ext.as_str(), "vasp" | "poscar")
        || name.starts_with("POSCAR")
        || name.starts_with("CONTCAR")
    {
        return poscar::parse_poscar_file(path);
    }

    Err(TwistcellError::UnsupportedFormat(format!(
        "Cannot determine format for: {} (expected POSCAR/CONTCAR or *.vasp)",
        path.display()
    )))
}
