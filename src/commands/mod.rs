//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `coincidence/`, `parsers/`, `models/`, `utils/`
//! - 子模块: common, search, build

pub mod build;
pub mod common;
pub mod search;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Search(args) => search::execute(args),
        Commands::Build(args) => build::execute(args),
    }
}
