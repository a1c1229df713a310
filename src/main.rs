//! # twistcell - 二维转角双层重合超胞搜索
//!
//! 给定两个二维层结构和一组旋转角，搜索两层晶格的重合点，
//! 构建堆叠超胞并按对称性去重。
//!
//! ## 子命令
//! - `search` - 单个旋转角下的重合点与超胞矩阵对
//! - `build`  - 完整流水线，输出 POSCAR 与汇总 CSV
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/          (命令行参数定义)
//!   ├── commands/     (命令执行逻辑)
//!   │     ├── coincidence/ (搜索 → 矩阵对 → 超胞 → 去重)
//!   │     ├── parsers/     (POSCAR 读写)
//!   │     └── models/      (数据模型)
//!   ├── utils/        (工具函数)
//!   └── error.rs      (错误处理)
//! ```

mod cli;
mod coincidence;
mod commands;
mod error;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
