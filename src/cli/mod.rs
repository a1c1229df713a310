//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `search`: 单个旋转角下的重合点与超胞矩阵对搜索
//! - `build`: 完整流水线（搜索 → 矩阵对 → 超胞堆叠 → 去重）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: search, build

pub mod build;
pub mod search;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// twistcell - 二维异质结/转角双层重合超胞搜索
#[derive(Parser)]
#[command(name = "twistcell")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Coincidence-site supercell search for twisted bilayers and heterostructures",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Search coincidence lattice points and supercell matrix pairs at one angle
    Search(search::SearchArgs),

    /// Build, standardize and deduplicate interfaces over a set of angles
    Build(build::BuildArgs),
}

/// 两个子命令共享的输入与搜索窗口参数
#[derive(Args, Debug, Clone)]
pub struct LatticeArgs {
    /// Bottom layer structure file (POSCAR/CONTCAR)
    #[arg(short, long)]
    pub bottom: PathBuf,

    /// Top layer structure file (POSCAR/CONTCAR)
    #[arg(short, long)]
    pub top: PathBuf,

    /// Lower bound of the integer coefficient window
    #[arg(long, default_value_t = -10, allow_hyphen_values = true)]
    pub nmin: i32,

    /// Upper bound of the integer coefficient window
    #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
    pub nmax: i32,

    /// Maximum distance between coinciding lattice points (Å)
    #[arg(long, default_value_t = 0.1)]
    pub tolerance: f64,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
