//! # search 命令实现
//!
//! 对单个旋转角运行重合点搜索与矩阵对提取，按超胞大小列出结果。
//!
//! ## 依赖关系
//! - 使用 `cli/search.rs` 定义的参数
//! - 使用 `coincidence/search.rs`, `coincidence/pairs.rs`
//! - 使用 `utils/output.rs`

use super::common;
use crate::cli::search::SearchArgs;
use crate::coincidence::{combination_count, find_coincidences, find_unique_pairs, SupercellPair};
use crate::error::Result;
use crate::models::Crystal;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 矩阵对表格行
#[derive(Debug, Clone, Tabled)]
struct PairRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "M")]
    m: String,
    #[tabled(rename = "N")]
    n: String,
    #[tabled(rename = "det M")]
    det_m: i64,
    #[tabled(rename = "det N")]
    det_n: i64,
    #[tabled(rename = "Area (Å²)")]
    area: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
}

/// 执行 search 命令
pub fn execute(args: SearchArgs) -> Result<()> {
    output::print_header(&format!("Coincidence Search at θ = {}°", args.angle));

    common::validate_lattice_args(&args.lattice)?;
    let (bottom, top) = common::load_layers(&args.lattice)?;
    let threads = common::configure_threads(args.lattice.jobs);

    let lattice = &args.lattice;
    output::print_info(&format!(
        "Doing {} combinations on {} threads",
        combination_count(lattice.nmin, lattice.nmax),
        threads
    ));

    let a = bottom.lattice.basis_2d();
    let b = top.lattice.basis_2d();
    let theta = args.angle.to_radians();
    let coincidences = find_coincidences(
        &a,
        &b,
        theta,
        lattice.nmin,
        lattice.nmax,
        lattice.tolerance,
    );
    output::print_kv("Coincidences", &coincidences.len().to_string());
    if !coincidences.is_empty() {
        let worst = coincidences
            .iter()
            .map(|c| c.mismatch(&a, &b, theta))
            .fold(0.0_f64, f64::max);
        output::print_kv("Max mismatch", &format!("{:.6} Å", worst));
    }

    let mut pairs = find_unique_pairs(&coincidences);
    output::print_kv("Unique pairs", &pairs.len().to_string());

    if pairs.is_empty() {
        output::print_warning("No supercell matrix pairs found at this angle");
        return Ok(());
    }

    // 超胞越小越靠前，相同大小保持原顺序
    pairs.sort_by_key(|p| (p.det_m(), p.det_n()));

    let rows: Vec<PairRow> = pairs
        .iter()
        .take(args.limit)
        .enumerate()
        .map(|(i, pair)| pair_row(i + 1, pair, &bottom, &top))
        .collect();

    output::print_header(&format!(
        "Smallest {} of {} Supercell Pairs",
        rows.len(),
        pairs.len()
    ));
    println!("{}", Table::new(&rows));

    Ok(())
}

fn pair_row(rank: usize, pair: &SupercellPair, bottom: &Crystal, top: &Crystal) -> PairRow {
    let det_m = pair.det_m();
    let det_n = pair.det_n();
    PairRow {
        rank,
        m: format_2x2(&pair.m_2x2()),
        n: format_2x2(&pair.n_2x2()),
        det_m,
        det_n,
        area: format!("{:.3}", det_m as f64 * bottom.area()),
        atoms: det_m as usize * bottom.num_atoms() + det_n as usize * top.num_atoms(),
    }
}

fn format_2x2(m: &[[i32; 2]; 2]) -> String {
    format!("[[{}, {}], [{}, {}]]", m[0][0], m[0][1], m[1][0], m[1][1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};

    fn layer(a: f64, natoms: usize) -> Crystal {
        let atoms = (0..natoms)
            .map(|i| Atom::new("C", [i as f64 / natoms as f64, 0.0, 0.5]))
            .collect();
        Crystal::new(
            "layer",
            Lattice::from_vectors([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, 20.0]]),
            atoms,
        )
    }

    #[test]
    fn test_pair_row_counts_atoms() {
        let pair = SupercellPair {
            m: [2, 1, -1, 1],
            n: [1, 0, 0, 2],
        };
        let row = pair_row(1, &pair, &layer(2.0, 2), &layer(3.0, 1));
        assert_eq!(row.det_m, 3);
        assert_eq!(row.det_n, 2);
        assert_eq!(row.atoms, 3 * 2 + 2);
        assert_eq!(row.area, "12.000");
        assert_eq!(row.m, "[[2, 1], [-1, 1]]");
    }
}
