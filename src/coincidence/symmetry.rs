//! # 结构对称化
//!
//! 通过 `Standardizer` trait 抽象晶体学标准化：输入堆叠结构，输出标准化后的
//! 原胞和空间群号。无法确定空间群（数值退化等）时返回 `None`，调用方静默丢弃，
//! 不作为错误处理。
//!
//! 默认实现 `MoyoStandardizer` 基于 `moyo`（纯 Rust 的 spglib 等价实现）。
//!
//! ## 依赖关系
//! - 被 `coincidence/builder.rs` 和 `commands/build.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `moyo` 和 `nalgebra`

use crate::models::{Atom, Crystal, Lattice};

use moyo::base::{AngleTolerance, Cell, Lattice as MoyoLattice};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::{Matrix3, Vector3};

/// 对称化参数
#[derive(Debug, Clone, Copy)]
pub struct SymmetrySettings {
    /// 原子位置容差 (Å)
    pub symprec: f64,
    /// 角度容差（度），负值表示使用默认值
    pub angle_tolerance: f64,
    /// 是否将标准化晶胞旋转到理想取向
    pub idealize: bool,
}

impl Default for SymmetrySettings {
    fn default() -> Self {
        SymmetrySettings {
            symprec: 1e-5,
            angle_tolerance: 5.0,
            idealize: true,
        }
    }
}

/// 标准化结果
#[derive(Debug, Clone)]
pub struct Standardized {
    pub crystal: Crystal,
    /// 空间群号 (1-230)
    pub space_group: u32,
}

/// 晶体学标准化器
pub trait Standardizer: Sync {
    /// 标准化结构，无法确定空间群时返回 None
    fn standardize(&self, crystal: &Crystal, settings: &SymmetrySettings) -> Option<Standardized>;
}

/// 基于 moyo 的标准化器，输出标准化原胞
#[derive(Debug, Clone, Copy, Default)]
pub struct MoyoStandardizer;

impl Standardizer for MoyoStandardizer {
    fn standardize(&self, crystal: &Crystal, settings: &SymmetrySettings) -> Option<Standardized> {
        if crystal.atoms.is_empty() {
            return None;
        }

        // 元素符号 → 种类编号（按首次出现顺序）
        let mut species: Vec<&str> = Vec::new();
        let numbers: Vec<i32> = crystal
            .atoms
            .iter()
            .map(|atom| {
                let idx = match species.iter().position(|s| *s == atom.element) {
                    Some(idx) => idx,
                    None => {
                        species.push(&atom.element);
                        species.len() - 1
                    }
                };
                idx as i32
            })
            .collect();

        let m = &crystal.lattice.matrix;
        let row_basis = Matrix3::new(
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        );
        let positions = crystal
            .atoms
            .iter()
            .map(|a| Vector3::new(a.position[0], a.position[1], a.position[2]))
            .collect();
        let cell = Cell::new(MoyoLattice::new(row_basis), positions, numbers);

        let angle_tolerance = if settings.angle_tolerance < 0.0 {
            AngleTolerance::Default
        } else {
            AngleTolerance::Radian(settings.angle_tolerance.to_radians())
        };

        let dataset =
            MoyoDataset::new(&cell, settings.symprec, angle_tolerance, Setting::Spglib).ok()?;

        if dataset.number <= 0 {
            return None;
        }

        let std_cell = &dataset.prim_std_cell;
        // 标准化晶胞已被刚性旋转到理想取向，不理想化时转回输入取向
        let basis = if settings.idealize {
            std_cell.lattice.basis
        } else {
            dataset.std_rotation_matrix.transpose() * std_cell.lattice.basis
        };
        let vector = |i: usize| [basis[(0, i)], basis[(1, i)], basis[(2, i)]];
        let lattice = Lattice::from_vectors([vector(0), vector(1), vector(2)]);

        let atoms = std_cell
            .positions
            .iter()
            .zip(std_cell.numbers.iter())
            .map(|(p, &n)| {
                let element = species.get(n as usize).copied().unwrap_or("X");
                Atom::new(element, [p[0], p[1], p[2]])
            })
            .collect();

        Some(Standardized {
            crystal: Crystal::new(crystal.name.clone(), lattice, atoms).wrapped(),
            space_group: dataset.number as u32,
        })
    }
}
