//! # 子命令共享逻辑
//!
//! 参数校验、读取两层结构、设置并行度。
//!
//! ## 依赖关系
//! - 被 `commands/search.rs` 和 `commands/build.rs` 使用
//! - 使用 `cli/mod.rs` 的 `LatticeArgs`

use crate::cli::LatticeArgs;
use crate::coincidence::checked_combination_count;
use crate::error::{Result, TwistcellError};
use crate::models::Crystal;
use crate::parsers;
use crate::utils::output;

/// 校验搜索窗口与容差
pub fn validate_lattice_args(args: &LatticeArgs) -> Result<()> {
    if args.nmin > args.nmax {
        return Err(TwistcellError::InvalidRange(format!(
            "nmin ({}) must not exceed nmax ({})",
            args.nmin, args.nmax
        )));
    }
    if checked_combination_count(args.nmin, args.nmax).is_none() {
        return Err(TwistcellError::InvalidRange(format!(
            "window [{}, {}] is too wide: (nmax - nmin + 1)^4 overflows",
            args.nmin, args.nmax
        )));
    }
    if args.tolerance.is_nan() || args.tolerance < 0.0 {
        return Err(TwistcellError::InvalidArgument(format!(
            "tolerance must be non-negative, got {}",
            args.tolerance
        )));
    }
    Ok(())
}

/// 读取底层与顶层结构并打印概要
pub fn load_layers(args: &LatticeArgs) -> Result<(Crystal, Crystal)> {
    let bottom = parsers::parse_structure_file(&args.bottom)?;
    let top = parsers::parse_structure_file(&args.top)?;

    for (label, layer) in [("Bottom", &bottom), ("Top", &top)] {
        let [a, b, _] = layer.lattice.lengths();
        output::print_kv(
            label,
            &format!(
                "{} ({} atoms, a = {:.4} Å, b = {:.4} Å)",
                layer.formula(),
                layer.num_atoms(),
                a,
                b
            ),
        );
    }

    for layer in [&bottom, &top] {
        if layer.area() < 1e-8 {
            return Err(TwistcellError::InvalidArgument(format!(
                "in-plane lattice vectors of '{}' are degenerate",
                layer.name
            )));
        }
    }

    Ok((bottom, top))
}

/// 设置全局 rayon 线程池，jobs = 0 时使用全部 CPU
pub fn configure_threads(jobs: usize) -> usize {
    let num_threads = if jobs == 0 { num_cpus::get() } else { jobs };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok();

    num_threads
}
