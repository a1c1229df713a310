//! # build 命令实现
//!
//! 完整流水线：
//! 1. 对每个旋转角搜索重合点
//! 2. 提取独立超胞矩阵对，构成角度 → 矩阵对映射
//! 3. 构建、堆叠并对称化所有候选界面
//! 4. 去重后输出 POSCAR 与汇总 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/build.rs` 定义的参数
//! - 使用 `coincidence/`, `parsers/poscar.rs`, `models/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use super::common;
use crate::cli::build::{parse_angle_list, parse_angle_range, BuildArgs};
use crate::coincidence::{
    build_all_supercells, combination_count, filter_supercells, find_coincidences,
    find_unique_pairs, AnglePairs, MoyoStandardizer, StackingParams, SymmetrySettings,
};
use crate::error::{Result, TwistcellError};
use crate::models::Interface;
use crate::parsers::poscar::write_poscar_file;
use crate::utils::{output, progress};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

const SUMMARY_CSV: &str = "interfaces.csv";

/// 界面汇总表格行
#[derive(Debug, Clone, Tabled)]
struct InterfaceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "θ (°)")]
    angle: String,
    #[tabled(rename = "Space group")]
    space_group: u32,
    #[tabled(rename = "Area (Å²)")]
    area: String,
    #[tabled(rename = "Atoms")]
    atoms: usize,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Strain (%)")]
    strain: String,
}

/// interfaces.csv 记录
#[derive(Debug, Clone, Serialize)]
struct InterfaceRecord {
    index: usize,
    file: String,
    angle_deg: f64,
    space_group: u32,
    area_a2: f64,
    num_atoms: usize,
    formula: String,
    strain: f64,
    m: String,
    n: String,
}

/// 执行 build 命令
pub fn execute(args: BuildArgs) -> Result<()> {
    output::print_header("Building Twisted Interfaces");

    let angles = resolve_angles(&args)?;
    let params = stacking_params(&args)?;
    common::validate_lattice_args(&args.lattice)?;
    check_output(&args.output, args.overwrite)?;

    let (bottom, top) = common::load_layers(&args.lattice)?;
    let threads = common::configure_threads(args.lattice.jobs);

    let lattice = &args.lattice;
    let a = bottom.lattice.basis_2d();
    let b = top.lattice.basis_2d();

    // 1-2. 逐角度搜索并提取矩阵对
    output::print_stage(1, 4, "Searching coincidence lattice points");
    output::print_info(&format!(
        "Doing {} combinations per angle for {} angle(s) on {} threads",
        combination_count(lattice.nmin, lattice.nmax),
        angles.len(),
        threads
    ));

    let pb = progress::create_progress_bar(angles.len() as u64, "Searching");
    let mut angle_pairs = AnglePairs::new();
    let mut total_coincidences = 0usize;
    for &degrees in &angles {
        let theta = degrees.to_radians();
        let coincidences =
            find_coincidences(&a, &b, theta, lattice.nmin, lattice.nmax, lattice.tolerance);
        total_coincidences += coincidences.len();

        let pairs = find_unique_pairs(&coincidences);
        if !pairs.is_empty() {
            angle_pairs.insert(theta, pairs);
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    output::print_stage(2, 4, "Extracting unique supercell pairs");
    output::print_kv("Coincidences", &total_coincidences.to_string());
    output::print_kv(
        "Unique pairs",
        &format!(
            "{} over {} angle(s)",
            angle_pairs.total_pairs(),
            angle_pairs.len()
        ),
    );

    if angle_pairs.is_empty() {
        output::print_warning("No interfaces found");
        return Ok(());
    }

    // 3. 构建与对称化
    output::print_stage(3, 4, "Building and standardizing supercells");
    let spinner = progress::create_spinner(&format!(
        "Standardizing {} candidate(s)",
        angle_pairs.total_pairs()
    ));
    let candidates = build_all_supercells(&bottom, &top, &angle_pairs, &params, &MoyoStandardizer);
    spinner.finish_and_clear();
    let candidates = candidates?;
    output::print_kv("Candidates", &candidates.len().to_string());

    // 4. 去重
    output::print_stage(4, 4, "Filtering equivalent interfaces");
    let interfaces = filter_supercells(candidates);

    if interfaces.is_empty() {
        output::print_warning("No interfaces found");
        return Ok(());
    }
    output::print_kv("Distinct interfaces", &interfaces.len().to_string());

    let rows: Vec<InterfaceRow> = interfaces
        .iter()
        .take(args.top_n)
        .enumerate()
        .map(|(i, iface)| interface_row(i, iface))
        .collect();
    output::print_header(&format!(
        "Top {} of {} Interfaces",
        rows.len(),
        interfaces.len()
    ));
    println!("{}", Table::new(&rows));

    write_outputs(&interfaces, &args.output)?;
    output::print_success(&format!(
        "Summary saved to '{}'",
        args.output.join(SUMMARY_CSV).display()
    ));
    output::print_done(&format!(
        "Wrote {} interface structure(s) to '{}'",
        interfaces.len(),
        args.output.display()
    ));

    Ok(())
}

/// 由 --angles 或 --angle-range 得到角度列表（度）
fn resolve_angles(args: &BuildArgs) -> Result<Vec<f64>> {
    match (&args.angles, &args.angle_range) {
        (Some(list), _) => parse_angle_list(list).map_err(TwistcellError::InvalidArgument),
        (None, Some(range)) => {
            parse_angle_range(range, args.angle_step).map_err(TwistcellError::InvalidRange)
        }
        (None, None) => Err(TwistcellError::InvalidArgument(
            "one of --angles or --angle-range is required".to_string(),
        )),
    }
}

fn stacking_params(args: &BuildArgs) -> Result<StackingParams> {
    if !(0.0..=1.0).contains(&args.weight) {
        return Err(TwistcellError::InvalidArgument(format!(
            "weight must be within [0, 1], got {}",
            args.weight
        )));
    }
    if args.distance.is_nan() || args.distance < 0.0 {
        return Err(TwistcellError::InvalidArgument(format!(
            "distance must be non-negative, got {}",
            args.distance
        )));
    }
    if args.symprec.is_nan() || args.symprec <= 0.0 {
        return Err(TwistcellError::InvalidArgument(format!(
            "symprec must be positive, got {}",
            args.symprec
        )));
    }

    Ok(StackingParams {
        weight: args.weight,
        distance: args.distance,
        symmetry: SymmetrySettings {
            symprec: args.symprec,
            angle_tolerance: args.angle_tolerance,
            idealize: !args.no_idealize,
        },
    })
}

/// 输出目录中已有汇总文件时，除非 --overwrite 否则拒绝
fn check_output(dir: &Path, overwrite: bool) -> Result<()> {
    let summary = dir.join(SUMMARY_CSV);
    if summary.exists() && !overwrite {
        return Err(TwistcellError::OutputExists {
            path: summary.display().to_string(),
        });
    }
    Ok(())
}

/// POSCAR 文件名，如 `POSCAR_003_21.7868`
fn poscar_name(index: usize, interface: &Interface) -> String {
    format!("POSCAR_{:03}_{}", index, interface.angle)
}

fn interface_row(index: usize, interface: &Interface) -> InterfaceRow {
    InterfaceRow {
        index,
        angle: interface.angle.to_string(),
        space_group: interface.space_group,
        area: format!("{:.3}", interface.stack.area()),
        atoms: interface.stack.num_atoms(),
        formula: interface.stack.formula(),
        strain: format!("{:.3}", interface.strain() * 100.0),
    }
}

fn format_3x3(m: &[[i32; 3]; 3]) -> String {
    let rows: Vec<String> = m
        .iter()
        .map(|r| format!("[{} {} {}]", r[0], r[1], r[2]))
        .collect();
    rows.join(" ")
}

fn interface_record(index: usize, interface: &Interface) -> InterfaceRecord {
    InterfaceRecord {
        index,
        file: poscar_name(index, interface),
        angle_deg: interface.angle_degrees(),
        space_group: interface.space_group,
        area_a2: interface.stack.area(),
        num_atoms: interface.stack.num_atoms(),
        formula: interface.stack.formula(),
        strain: interface.strain(),
        m: format_3x3(&interface.m),
        n: format_3x3(&interface.n),
    }
}

/// 写出每个界面的 POSCAR 与 interfaces.csv
fn write_outputs(interfaces: &[Interface], dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| TwistcellError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let csv_path: PathBuf = dir.join(SUMMARY_CSV);
    let mut wtr = csv::Writer::from_path(&csv_path)?;

    for (index, interface) in interfaces.iter().enumerate() {
        let record = interface_record(index, interface);
        let comment = format!(
            "{} theta={} sg={} M={} N={}",
            interface.stack.formula(),
            interface.angle,
            interface.space_group,
            record.m,
            record.n
        );
        write_poscar_file(&interface.stack, &comment, &dir.join(&record.file))?;
        wtr.serialize(&record)?;
    }

    wtr.flush().map_err(|e| TwistcellError::FileWriteError {
        path: csv_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LatticeArgs;
    use crate::models::{AngleKey, Atom, Crystal, Lattice};
    use crate::parsers::poscar::parse_poscar_file;

    fn build_args() -> BuildArgs {
        BuildArgs {
            lattice: LatticeArgs {
                bottom: PathBuf::from("POSCAR_A"),
                top: PathBuf::from("POSCAR_B"),
                nmin: -2,
                nmax: 2,
                tolerance: 0.1,
                jobs: 1,
            },
            angles: None,
            angle_range: None,
            angle_step: 1.0,
            weight: 0.5,
            distance: 4.0,
            no_idealize: false,
            symprec: 1e-5,
            angle_tolerance: 5.0,
            output: PathBuf::from("interfaces"),
            top_n: 20,
            overwrite: false,
        }
    }

    fn interface(theta_deg: f64) -> Interface {
        let layer = Crystal::new(
            "layer",
            Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 20.0]]),
            vec![Atom::new("Mo", [0.0, 0.0, 0.5])],
        );
        let identity = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];
        Interface {
            bottom: layer.clone(),
            top: layer.clone(),
            stack: layer,
            angle: AngleKey::from_degrees(theta_deg),
            theta: theta_deg.to_radians(),
            m: identity,
            n: identity,
            space_group: 123,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("twistcell-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_resolve_angles() {
        let mut args = build_args();
        assert!(matches!(
            resolve_angles(&args),
            Err(TwistcellError::InvalidArgument(_))
        ));

        args.angles = Some("0,30".to_string());
        assert_eq!(resolve_angles(&args).unwrap(), vec![0.0, 30.0]);

        args.angles = None;
        args.angle_range = Some("0-2".to_string());
        assert_eq!(resolve_angles(&args).unwrap(), vec![0.0, 1.0, 2.0]);

        args.angle_step = 0.0;
        assert!(matches!(
            resolve_angles(&args),
            Err(TwistcellError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_stacking_params_validation() {
        let mut args = build_args();
        let params = stacking_params(&args).unwrap();
        assert!(params.symmetry.idealize);

        args.weight = 1.5;
        assert!(stacking_params(&args).is_err());

        args.weight = 1.0;
        args.distance = -1.0;
        assert!(stacking_params(&args).is_err());

        args.distance = 3.0;
        args.no_idealize = true;
        let params = stacking_params(&args).unwrap();
        assert!(!params.symmetry.idealize);
        assert_eq!(params.distance, 3.0);
    }

    #[test]
    fn test_poscar_name() {
        assert_eq!(poscar_name(3, &interface(21.786789)), "POSCAR_003_21.7868");
    }

    #[test]
    fn test_write_outputs_and_refuse_existing() {
        let dir = temp_dir("write");
        let interfaces = vec![interface(0.0), interface(30.0)];

        assert!(check_output(&dir, false).is_ok());
        write_outputs(&interfaces, &dir).unwrap();

        let first = parse_poscar_file(&dir.join("POSCAR_000_0.0000")).unwrap();
        assert_eq!(first.num_atoms(), 1);
        assert!(dir.join("POSCAR_001_30.0000").is_file());

        let csv_text = fs::read_to_string(dir.join(SUMMARY_CSV)).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("index,file,angle_deg,space_group"));
        assert!(lines[2].contains("POSCAR_001_30.0000"));

        assert!(matches!(
            check_output(&dir, false),
            Err(TwistcellError::OutputExists { .. })
        ));
        assert!(check_output(&dir, true).is_ok());

        let _ = fs::remove_dir_all(&dir);
    }
}
