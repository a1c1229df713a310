//! # 重合点搜索
//!
//! 对给定旋转角 θ，在整数窗口 [nmin, nmax]^4 内求解
//!
//! ```text
//! |i·A1 + j·A2 - R(θ)·(k·B1 + l·B2)| < tolerance
//! ```
//!
//! 并排除 i == j == k == l 的平凡解（包括零向量）。
//!
//! 四重循环被展平为一个线性索引空间交给 rayon 并行。每个工作线程写自己的
//! 缓冲区，有序 collect 按索引顺序合并，因此结果总是按 (i, j, k, l)
//! 字典序排列，与线程数无关。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用，结果交给 `coincidence/pairs.rs`
//! - 使用 `coincidence/geometry.rs`

use super::geometry::{basis_dot, distance, rotate_2d};
use crate::models::Basis2D;

use rayon::prelude::*;

/// 一组重合系数：i·A1 + j·A2 ≈ R(θ)·(k·B1 + l·B2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coincidence {
    pub i: i32,
    pub j: i32,
    pub k: i32,
    pub l: i32,
}

impl Coincidence {
    pub fn new(i: i32, j: i32, k: i32, l: i32) -> Self {
        Coincidence { i, j, k, l }
    }

    /// 四个系数全部相等（平凡解）
    pub fn is_trivial(&self) -> bool {
        self.i == self.j && self.j == self.k && self.k == self.l
    }

    /// 两个格点之间的失配距离 |Am - R(θ)Bn|
    pub fn mismatch(&self, a: &Basis2D, b: &Basis2D, theta: f64) -> f64 {
        self.mismatch_rotated(a, &rotate_basis(b, theta))
    }

    fn mismatch_rotated(&self, a: &Basis2D, rb: &Basis2D) -> f64 {
        distance(basis_dot(a, self.i, self.j), basis_dot(rb, self.k, self.l))
    }
}

/// 搜索窗口内的组合总数 (nmax - nmin + 1)^4，窗口倒置时为 0，超出 u64 时为 None
pub fn checked_combination_count(nmin: i32, nmax: i32) -> Option<u64> {
    if nmin > nmax {
        return Some(0);
    }
    let span = (i64::from(nmax) - i64::from(nmin) + 1) as u64;
    span.checked_pow(4)
}

/// 搜索窗口内的组合总数，超出 u64 时饱和为 `u64::MAX`
pub fn combination_count(nmin: i32, nmax: i32) -> u64 {
    checked_combination_count(nmin, nmax).unwrap_or(u64::MAX)
}

/// 在 [nmin, nmax]^4 内搜索角度 theta（弧度）下的所有重合点
///
/// 没有匹配时返回空集合。
pub fn find_coincidences(
    a: &Basis2D,
    b: &Basis2D,
    theta: f64,
    nmin: i32,
    nmax: i32,
    tolerance: f64,
) -> Vec<Coincidence> {
    // 倒置窗口或组合数超出 u64 的窗口（调用方应先校验）不产生结果
    let total = match checked_combination_count(nmin, nmax) {
        Some(total) if total > 0 => total,
        _ => return Vec::new(),
    };
    let span = (i64::from(nmax) - i64::from(nmin) + 1) as u64;

    // R(θ) 对 (k, l) 是线性的，预先旋转 B 的基矢
    let rb = rotate_basis(b, theta);

    (0..total)
        .into_par_iter()
        .filter_map(|idx| {
            let c = decode_index(idx, span, nmin);
            if c.is_trivial() {
                return None;
            }
            (c.mismatch_rotated(a, &rb) < tolerance).then_some(c)
        })
        .collect()
}

fn rotate_basis(b: &Basis2D, theta: f64) -> Basis2D {
    [rotate_2d(b[0], theta), rotate_2d(b[1], theta)]
}

/// 线性索引 → (i, j, k, l)，l 变化最快
fn decode_index(idx: u64, span: u64, nmin: i32) -> Coincidence {
    let at = |div: u64| nmin + ((idx / div) % span) as i32;
    Coincidence::new(at(span * span * span), at(span * span), at(span), at(1))
}
