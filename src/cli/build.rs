//! # build 子命令 CLI 定义
//!
//! 对一组旋转角运行完整流水线并输出去重后的界面结构。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/build.rs`

use super::LatticeArgs;
use clap::Args;
use std::path::PathBuf;

/// build 子命令参数
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Comma-separated twist angles in degrees (e.g., "0,13.17,21.79")
    #[arg(long, conflicts_with = "angle_range", allow_hyphen_values = true)]
    pub angles: Option<String>,

    /// Twist angle range in degrees (e.g., "0-30"), sampled with --angle-step
    #[arg(long)]
    pub angle_range: Option<String>,

    /// Step for --angle-range in degrees
    #[arg(long, default_value_t = 1.0)]
    pub angle_step: f64,

    /// Interpolation weight of the stacked cell (0 = bottom cell, 1 = top cell)
    #[arg(short, long, default_value_t = 0.5)]
    pub weight: f64,

    /// Interlayer distance (Å)
    #[arg(short, long, default_value_t = 4.0)]
    pub distance: f64,

    /// Keep the standardized cell in its original orientation
    #[arg(long, default_value_t = false)]
    pub no_idealize: bool,

    /// Symmetry precision for standardization (Å)
    #[arg(long, default_value_t = 1e-5)]
    pub symprec: f64,

    /// Angle tolerance for standardization in degrees (negative = default)
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
    pub angle_tolerance: f64,

    /// Output directory for interface structures and the summary CSV
    #[arg(short, long, default_value = "interfaces")]
    pub output: PathBuf,

    /// Number of interfaces to print in the summary table
    #[arg(long, default_value_t = 20)]
    pub top_n: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

/// 解析逗号分隔的角度列表（度）
pub fn parse_angle_list(input: &str) -> Result<Vec<f64>, String> {
    let angles = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("Invalid angle '{}' in list '{}'", s, input))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if angles.is_empty() {
        return Err(format!("Angle list '{}' is empty", input));
    }
    Ok(angles)
}

/// 解析角度范围 "START-END" 并按步长采样（包含端点）
pub fn parse_angle_range(range: &str, step: f64) -> Result<Vec<f64>, String> {
    let parts: Vec<&str> = range.split('-').collect();
    if parts.len() != 2 {
        return Err(format!("'{}' (expected START-END, e.g. 0-30)", range));
    }

    let start: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("'{}' (invalid start angle)", range))?;
    let end: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("'{}' (invalid end angle)", range))?;

    if start < 0.0 || end < start || end > 360.0 {
        return Err(format!("'{}' (must be 0 <= start <= end <= 360)", range));
    }
    if step <= 0.0 {
        return Err(format!("angle step must be positive, got {}", step));
    }

    // 整数步数避免浮点累加误差
    let count = ((end - start) / step + 1e-9).floor() as usize;
    Ok((0..=count).map(|i| start + i as f64 * step).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_angle_list() {
        assert_eq!(parse_angle_list("0, 13.17,21.79").unwrap(), vec![0.0, 13.17, 21.79]);
        assert_eq!(parse_angle_list("-5,5").unwrap(), vec![-5.0, 5.0]);
        assert!(parse_angle_list("1,abc").is_err());
        assert!(parse_angle_list(" , ").is_err());
    }

    #[test]
    fn test_parse_angle_range() {
        let angles = parse_angle_range("0-30", 10.0).unwrap();
        assert_eq!(angles, vec![0.0, 10.0, 20.0, 30.0]);

        let angles = parse_angle_range("0-1", 0.1).unwrap();
        assert_eq!(angles.len(), 11);
        assert!((angles[10] - 1.0).abs() < 1e-12);

        assert_eq!(parse_angle_range("5-5", 1.0).unwrap(), vec![5.0]);
    }

    #[test]
    fn test_parse_angle_range_invalid() {
        assert!(parse_angle_range("30", 1.0).is_err());
        assert!(parse_angle_range("30-10", 1.0).is_err());
        assert!(parse_angle_range("0-400", 1.0).is_err());
        assert!(parse_angle_range("0-30", 0.0).is_err());
        assert!(parse_angle_range("a-b", 1.0).is_err());
    }
}
