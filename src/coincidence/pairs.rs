//! # 独立超胞矩阵对提取
//!
//! 将重合点两两组合为超胞矩阵对 (M, N)：
//!
//! ```text
//! M = | p_i.i  p_i.j |      N = | p_i.k  p_i.l |
//!     | p_j.i  p_j.j |          | p_j.k  p_j.l |
//! ```
//!
//! 只保留 det(M) > 0、det(N) > 0（保持手性）且八个分量 gcd 为 1 的组合；
//! gcd ≠ 1 的矩阵对是更小矩阵对的整数倍，描述的是同一个超结构。
//!
//! 只遍历 i < j 的组合以避免对称重复，因此输入顺序必须稳定
//! （`find_coincidences` 的输出已按字典序排列）。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用，结果交给 `coincidence/builder.rs`
//! - 使用 `coincidence/geometry.rs`

use super::geometry::{det2, embed_2x2, gcd_of};
use super::search::Coincidence;

use rayon::prelude::*;
use std::fmt;

/// 超胞矩阵对 (m1, m2, m3, m4, n1, n2, n3, n4)
///
/// M = [[m1, m2], [m3, m4]] 作用于底层，N = [[n1, n2], [n3, n4]] 作用于顶层。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SupercellPair {
    pub m: [i32; 4],
    pub n: [i32; 4],
}

impl SupercellPair {
    /// 由两个重合点构造矩阵对
    pub fn from_coincidences(first: &Coincidence, second: &Coincidence) -> Self {
        SupercellPair {
            m: [first.i, first.j, second.i, second.j],
            n: [first.k, first.l, second.k, second.l],
        }
    }

    pub fn m_2x2(&self) -> [[i32; 2]; 2] {
        [[self.m[0], self.m[1]], [self.m[2], self.m[3]]]
    }

    pub fn n_2x2(&self) -> [[i32; 2]; 2] {
        [[self.n[0], self.n[1]], [self.n[2], self.n[3]]]
    }

    /// 底层 3x3 超胞矩阵
    pub fn m_3x3(&self) -> [[i32; 3]; 3] {
        embed_2x2(&self.m_2x2())
    }

    /// 顶层 3x3 超胞矩阵
    pub fn n_3x3(&self) -> [[i32; 3]; 3] {
        embed_2x2(&self.n_2x2())
    }

    pub fn det_m(&self) -> i64 {
        det2(&self.m_2x2())
    }

    pub fn det_n(&self) -> i64 {
        det2(&self.n_2x2())
    }

    /// 八个分量
    pub fn components(&self) -> [i32; 8] {
        let (m, n) = (self.m, self.n);
        [m[0], m[1], m[2], m[3], n[0], n[1], n[2], n[3]]
    }

    /// 两个变换都保持手性，且不是更小矩阵对的整数倍
    pub fn is_primitive(&self) -> bool {
        self.det_m() > 0 && self.det_n() > 0 && gcd_of(&self.components()) == 1
    }
}

impl fmt::Display for SupercellPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (m, n) = (self.m, self.n);
        write!(
            f,
            "M=[[{}, {}], [{}, {}]] N=[[{}, {}], [{}, {}]]",
            m[0], m[1], m[2], m[3], n[0], n[1], n[2], n[3]
        )
    }
}

/// 从重合点集合中提取所有独立的超胞矩阵对
///
/// 少于两个重合点时返回空集合。结果按 (i, j) 顺序排列。
pub fn find_unique_pairs(coincidences: &[Coincidence]) -> Vec<SupercellPair> {
    (0..coincidences.len())
        .into_par_iter()
        .flat_map_iter(move |i| {
            let first = &coincidences[i];
            coincidences[i + 1..].iter().filter_map(move |second| {
                let pair = SupercellPair::from_coincidences(first, second);
                pair.is_primitive().then_some(pair)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coincidence::search::find_coincidences;

    #[test]
    fn test_from_coincidences_layout() {
        let p = SupercellPair::from_coincidences(
            &Coincidence::new(1, 2, 3, 4),
            &Coincidence::new(5, 6, 7, 8),
        );
        assert_eq!(p.components(), [1, 2, 5, 6, 3, 4, 7, 8]);
        assert_eq!(p.m_3x3(), [[1, 2, 0], [5, 6, 0], [0, 0, 1]]);
        assert_eq!(p.n_3x3(), [[3, 4, 0], [7, 8, 0], [0, 0, 1]]);
    }

    #[test]
    fn test_empty_and_single_input() {
        assert!(find_unique_pairs(&[]).is_empty());
        assert!(find_unique_pairs(&[Coincidence::new(1, 0, 1, 0)]).is_empty());
    }

    #[test]
    fn test_identity_pair_accepted() {
        let pairs = find_unique_pairs(&[Coincidence::new(1, 0, 1, 0), Coincidence::new(0, 1, 0, 1)]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].m, [1, 0, 0, 1]);
        assert_eq!(pairs[0].n, [1, 0, 0, 1]);
    }

    #[test]
    fn test_negative_determinant_rejected() {
        // det(M) = -1
        let pairs = find_unique_pairs(&[Coincidence::new(0, 1, 0, 1), Coincidence::new(1, 0, 1, 0)]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_scaled_pair_rejected() {
        let pairs = find_unique_pairs(&[Coincidence::new(2, 0, 2, 0), Coincidence::new(0, 2, 0, 2)]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_invariants_on_square_search() {
        let square = [[1.0, 0.0], [0.0, 1.0]];
        let coincidences = find_coincidences(&square, &square, 0.0, -2, 2, 1e-6);
        let pairs = find_unique_pairs(&coincidences);

        assert!(!pairs.is_empty());
        for p in &pairs {
            assert!(p.det_m() > 0);
            assert!(p.det_n() > 0);
            assert_eq!(gcd_of(&p.components()).abs(), 1);
        }

        // 原始矩阵对的两倍不能出现在结果中
        for p in &pairs {
            let doubled = SupercellPair {
                m: p.m.map(|x| 2 * x),
                n: p.n.map(|x| 2 * x),
            };
            assert!(!pairs.contains(&doubled));
        }
    }

    #[test]
    fn test_pairs_follow_input_order() {
        let square = [[1.0, 0.0], [0.0, 1.0]];
        let coincidences = find_coincidences(&square, &square, 0.0, -2, 2, 1e-6);
        let pairs = find_unique_pairs(&coincidences);

        let mut expected = Vec::new();
        for i in 0..coincidences.len() {
            for j in i + 1..coincidences.len() {
                let p = SupercellPair::from_coincidences(&coincidences[i], &coincidences[j]);
                if p.is_primitive() {
                    expected.push(p);
                }
            }
        }
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_display() {
        let p = SupercellPair {
            m: [2, 1, -1, 1],
            n: [1, 2, -2, -1],
        };
        assert_eq!(format!("{}", p), "M=[[2, 1], [-1, 1]] N=[[1, 2], [-2, -1]]");
    }
}
