//! # search 子命令 CLI 定义
//!
//! 对单个旋转角搜索重合点并列出独立超胞矩阵对。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/search.rs`

use super::LatticeArgs;
use clap::Args;

/// search 子命令参数
#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub lattice: LatticeArgs,

    /// Twist angle of the top layer in degrees
    #[arg(short, long, allow_hyphen_values = true)]
    pub angle: f64,

    /// Number of matrix pairs to print (smallest supercells first)
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}
