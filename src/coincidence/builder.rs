//! # 超胞与界面构建
//!
//! 对角度 → 矩阵对映射中的每个 (θ, M, N)：
//! 1. 将 2x2 矩阵嵌入 3x3（z 方向单位变换）
//! 2. 底层按 M、顶层按 N 展开超胞
//! 3. 顶层超胞绕 z 轴旋转 θ
//! 4. 按 weight / distance 堆叠，晶胞 C = A + weight · (B - A)
//! 5. 对称化，空间群无法确定的候选被静默丢弃
//!
//! 角度按键升序串行处理，每个角度内的矩阵对由 rayon 并行构建。
//! 输出按 (角度键, 矩阵对顺序) 排列，与线程数无关。
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 调用，结果交给 `coincidence/filter.rs`
//! - 使用 `models/`、`coincidence/pairs.rs`、`coincidence/symmetry.rs`

use super::pairs::SupercellPair;
use super::symmetry::{Standardizer, SymmetrySettings};
use crate::error::Result;
use crate::models::{AngleKey, Crystal, Interface};

use rayon::prelude::*;
use std::collections::BTreeMap;

/// 单个角度下的矩阵对
#[derive(Debug, Clone, Default)]
pub struct AngleEntry {
    /// 旋转角（弧度）
    pub theta: f64,
    pub pairs: Vec<SupercellPair>,
}

/// 角度 → 矩阵对映射，按离散化角度键排序
#[derive(Debug, Clone, Default)]
pub struct AnglePairs {
    entries: BTreeMap<AngleKey, AngleEntry>,
}

impl AnglePairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入角度 theta（弧度）下的矩阵对，同一角度键的结果合并
    pub fn insert(&mut self, theta: f64, pairs: Vec<SupercellPair>) {
        let entry = self
            .entries
            .entry(AngleKey::from_radians(theta))
            .or_insert_with(|| AngleEntry {
                theta,
                pairs: Vec::new(),
            });
        entry.pairs.extend(pairs);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AngleKey, &AngleEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有角度下的矩阵对总数
    pub fn total_pairs(&self) -> usize {
        self.entries.values().map(|e| e.pairs.len()).sum()
    }
}

/// 堆叠与对称化参数
#[derive(Debug, Clone, Copy)]
pub struct StackingParams {
    /// 堆叠晶胞插值权重，0 为底层晶胞，1 为顶层晶胞
    pub weight: f64,
    /// 层间距 (Å)
    pub distance: f64,
    pub symmetry: SymmetrySettings,
}

impl Default for StackingParams {
    fn default() -> Self {
        StackingParams {
            weight: 0.5,
            distance: 4.0,
            symmetry: SymmetrySettings::default(),
        }
    }
}

/// 为映射中的每个 (角度, 矩阵对) 构建界面
///
/// 对称化失败（空间群为 0）的候选被静默丢弃；超胞构建失败作为错误返回。
/// 映射为空时返回空集合。
pub fn build_all_supercells(
    bottom: &Crystal,
    top: &Crystal,
    angles: &AnglePairs,
    params: &StackingParams,
    standardizer: &dyn Standardizer,
) -> Result<Vec<Interface>> {
    let mut interfaces = Vec::new();

    for (&angle, entry) in angles.iter() {
        let theta = entry.theta;
        let built: Vec<Option<Interface>> = entry
            .pairs
            .par_iter()
            .map(|pair| build_interface(bottom, top, angle, theta, pair, params, standardizer))
            .collect::<Result<_>>()?;
        interfaces.extend(built.into_iter().flatten());
    }

    Ok(interfaces)
}

/// 构建单个界面；对称化失败时返回 Ok(None)
pub fn build_interface(
    bottom: &Crystal,
    top: &Crystal,
    angle: AngleKey,
    theta: f64,
    pair: &SupercellPair,
    params: &StackingParams,
    standardizer: &dyn Standardizer,
) -> Result<Option<Interface>> {
    let m = pair.m_3x3();
    let n = pair.n_3x3();

    let bottom_layer = bottom.make_supercell(&m)?;
    let top_layer = top.make_supercell(&n)?.rotate_around_z(theta);
    let stacked = bottom_layer.stack(&top_layer, params.weight, params.distance);

    let standardized = match standardizer.standardize(&stacked, &params.symmetry) {
        Some(s) if s.space_group != 0 => s,
        _ => return Ok(None),
    };

    Ok(Some(Interface {
        bottom: bottom_layer,
        top: top_layer,
        stack: standardized.crystal,
        angle,
        theta,
        m,
        n,
        space_group: standardized.space_group,
    }))
}
