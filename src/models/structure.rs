//! # 晶体结构数据模型
//!
//! 定义晶体结构表示以及构建界面所需的结构操作：
//! - 整数矩阵超胞展开 (`make_supercell`)
//! - 绕 z 轴旋转 (`rotate_around_z`)
//! - 两层堆叠 (`stack`)
//!
//! ## 约定
//! - `Lattice::matrix` 的行向量为 a, b, c（笛卡尔坐标，Å）
//! - 原子坐标为分数坐标，行向量约定：cart = frac · L
//! - 超胞矩阵 M 作用为 L' = M · L
//!
//! ## 依赖关系
//! - 被 `parsers/`、`coincidence/` 和 `commands/` 使用
//! - 使用 `error.rs`

use crate::error::{Result, TwistcellError};

/// 面内二维晶格基矢，行向量为两个面内晶格矢量
pub type Basis2D = [[f64; 2]; 2];

/// 判断原子是否落在新晶胞内的分数坐标容差
const WRAP_EPS: f64 = 1e-8;

/// 晶格
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 晶格矢量长度 (|a|, |b|, |c|)
    pub fn lengths(&self) -> [f64; 3] {
        self.matrix.map(|v| norm(&v))
    }

    /// 晶胞体积（带符号）
    pub fn volume(&self) -> f64 {
        det3(&self.matrix)
    }

    /// 面内面积 |a × b|
    pub fn area(&self) -> f64 {
        norm(&cross(&self.matrix[0], &self.matrix[1]))
    }

    /// 提取面内基矢（a, b 的 x/y 分量）
    pub fn basis_2d(&self) -> Basis2D {
        let m = &self.matrix;
        [[m[0][0], m[0][1]], [m[1][0], m[1][1]]]
    }

    /// 分数坐标转笛卡尔坐标
    pub fn to_cartesian(&self, frac: [f64; 3]) -> [f64; 3] {
        vec_mat(&frac, &self.matrix)
    }

    /// 笛卡尔坐标转分数坐标，晶格奇异时返回 None
    pub fn to_fractional(&self, cart: [f64; 3]) -> Option<[f64; 3]> {
        inverse3(&self.matrix).map(|inv| vec_mat(&cart, &inv))
    }
}

/// 原子信息
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    /// 原子总数
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// 面内面积
    pub fn area(&self) -> f64 {
        self.lattice.area()
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 将所有分数坐标折回 [0, 1)
    pub fn wrapped(mut self) -> Self {
        for atom in &mut self.atoms {
            atom.position = atom.position.map(wrap_unit);
        }
        self
    }

    /// 原子笛卡尔 z 坐标范围 (min, max)，无原子时为 (0, 0)
    pub fn z_extent(&self) -> (f64, f64) {
        let mut zs = self
            .atoms
            .iter()
            .map(|a| self.lattice.to_cartesian(a.position)[2]);
        let first = match zs.next() {
            Some(z) => z,
            None => return (0.0, 0.0),
        };
        zs.fold((first, first), |(lo, hi), z| (lo.min(z), hi.max(z)))
    }

    /// 按整数矩阵 M 构建超胞，新晶格为 M · L
    ///
    /// 遍历新晶胞包围盒内的所有平移，保留落在新晶胞 [0, 1) 内的像。
    /// 结果原子数必须等于 |det M| · n。
    pub fn make_supercell(&self, m: &[[i32; 3]; 3]) -> Result<Crystal> {
        let mf = m.map(|row| row.map(f64::from));
        let det = det3(&mf);
        if det.abs() < 0.5 {
            return Err(TwistcellError::Supercell(format!(
                "singular supercell matrix {:?}",
                m
            )));
        }
        let inv = inverse3(&mf).ok_or_else(|| {
            TwistcellError::Supercell(format!("cannot invert supercell matrix {:?}", m))
        })?;

        // 新晶胞八个顶点在原胞分数坐标下的包围盒（闭区间，负分量时上界可取到）
        let mut lo = [0i32; 3];
        let mut hi = [0i32; 3];
        for corner in 0..8 {
            let c = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1];
            for k in 0..3 {
                let v = c[0] * m[0][k] + c[1] * m[1][k] + c[2] * m[2][k];
                lo[k] = lo[k].min(v);
                hi[k] = hi[k].max(v);
            }
        }

        let expected = self.atoms.len() * det.abs().round() as usize;
        let mut atoms = Vec::with_capacity(expected);

        for atom in &self.atoms {
            let p = atom.position.map(wrap_unit);
            for t0 in lo[0]..=hi[0] {
                for t1 in lo[1]..=hi[1] {
                    for t2 in lo[2]..=hi[2] {
                        let shifted = [p[0] + t0 as f64, p[1] + t1 as f64, p[2] + t2 as f64];
                        let frac = vec_mat(&shifted, &inv);
                        if frac.iter().all(|&x| x >= -WRAP_EPS && x < 1.0 - WRAP_EPS) {
                            atoms.push(Atom::new(atom.element.clone(), frac.map(wrap_unit)));
                        }
                    }
                }
            }
        }

        if atoms.len() != expected {
            return Err(TwistcellError::Supercell(format!(
                "expected {} atoms for matrix {:?}, found {}",
                expected,
                m,
                atoms.len()
            )));
        }

        Ok(Crystal::new(
            self.name.clone(),
            Lattice::from_vectors(mat_mul(&mf, &self.lattice.matrix)),
            atoms,
        ))
    }

    /// 绕 z 轴逆时针旋转 theta（弧度）
    ///
    /// 只旋转晶格矢量，分数坐标保持不变。
    pub fn rotate_around_z(&self, theta: f64) -> Crystal {
        let (s, c) = theta.sin_cos();
        let matrix = self
            .lattice
            .matrix
            .map(|v| [c * v[0] - s * v[1], s * v[0] + c * v[1], v[2]]);
        Crystal::new(self.name.clone(), Lattice::from_vectors(matrix), self.atoms.clone())
    }

    /// 将 `top` 堆叠在当前结构（底层）之上
    ///
    /// 面内晶胞 C = A + weight · (B - A)，两层都按分数坐标映射到 C 上。
    /// 顶层最低原子位于底层最高原子之上 `distance` 处。
    /// c 轴垂直于面内，真空层取两层中较大者且不小于 `distance`。
    pub fn stack(&self, top: &Crystal, weight: f64, distance: f64) -> Crystal {
        let a = &self.lattice.matrix;
        let b = &top.lattice.matrix;
        let mix = |k: usize| {
            [
                a[k][0] + weight * (b[k][0] - a[k][0]),
                a[k][1] + weight * (b[k][1] - a[k][1]),
                0.0,
            ]
        };

        let (bottom_lo, bottom_hi) = self.z_extent();
        let (top_lo, top_hi) = top.z_extent();
        let bottom_thickness = bottom_hi - bottom_lo;
        let top_thickness = top_hi - top_lo;

        let vacuum = (a[2][2].abs() - bottom_thickness)
            .max(b[2][2].abs() - top_thickness)
            .max(distance);
        let height = bottom_thickness + distance + top_thickness + vacuum;
        let lattice = Lattice::from_vectors([mix(0), mix(1), [0.0, 0.0, height]]);

        let base = vacuum / 2.0;
        let top_base = base + bottom_thickness + distance;

        let place = |layer: &Crystal, z_lo: f64, offset: f64| {
            layer
                .atoms
                .iter()
                .map(|atom| {
                    let z = layer.lattice.to_cartesian(atom.position)[2];
                    Atom::new(
                        atom.element.clone(),
                        [
                            wrap_unit(atom.position[0]),
                            wrap_unit(atom.position[1]),
                            (offset + z - z_lo) / height,
                        ],
                    )
                })
                .collect::<Vec<_>>()
        };

        let mut atoms = place(self, bottom_lo, base);
        atoms.extend(place(top, top_lo, top_base));

        Crystal::new(format!("{}+{}", self.name, top.name), lattice, atoms)
    }
}

// ─────────────────────────────────────────────────────────────
// 3x3 线性代数
// ─────────────────────────────────────────────────────────────

fn wrap_unit(x: f64) -> f64 {
    let y = x.rem_euclid(1.0);
    if y > 1.0 - WRAP_EPS {
        0.0
    } else {
        y
    }
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn inverse3(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let det = det3(m);
    if det.abs() < 1e-10 {
        return None;
    }
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ])
}

/// 行向量乘矩阵 v · M
fn vec_mat(v: &[f64; 3], m: &[[f64; 3]; 3]) -> [f64; 3] {
    [
        v[0] * m[0][0] + v[1] * m[1][0] + v[2] * m[2][0],
        v[0] * m[0][1] + v[1] * m[1][1] + v[2] * m[2][1],
        v[0] * m[0][2] + v[1] * m[1][2] + v[2] * m[2][2],
    ]
}

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [vec_mat(&a[0], b), vec_mat(&a[1], b), vec_mat(&a[2], b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graphene_like() -> Crystal {
        let a = 2.46;
        let lattice = Lattice::from_vectors([
            [a, 0.0, 0.0],
            [-a / 2.0, a * 3f64.sqrt() / 2.0, 0.0],
            [0.0, 0.0, 20.0],
        ]);
        let atoms = vec![
            Atom::new("C", [0.0, 0.0, 0.5]),
            Atom::new("C", [1.0 / 3.0, 2.0 / 3.0, 0.5]),
        ];
        Crystal::new("C", lattice, atoms)
    }

    #[test]
    fn test_lattice_area_square() {
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 10.0]]);
        assert!((lattice.area() - 6.0).abs() < 1e-12);
        assert!((lattice.volume() - 60.0).abs() < 1e-12);
        assert_eq!(lattice.basis_2d(), [[3.0, 0.0], [0.0, 2.0]]);
    }

    #[test]
    fn test_fractional_cartesian_inverse() {
        let crystal = graphene_like();
        let frac = [0.25, 0.75, 0.5];
        let cart = crystal.lattice.to_cartesian(frac);
        let back = crystal.lattice.to_fractional(cart).unwrap();
        for k in 0..3 {
            assert!((frac[k] - back[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_supercell_diagonal() {
        let crystal = graphene_like();
        let sc = crystal
            .make_supercell(&[[2, 0, 0], [0, 3, 0], [0, 0, 1]])
            .unwrap();

        assert_eq!(sc.num_atoms(), 12);
        assert!((sc.area() - 6.0 * crystal.area()).abs() < 1e-9);
        assert!(sc
            .atoms
            .iter()
            .all(|a| a.position.iter().all(|&x| (0.0..1.0).contains(&x))));
    }

    #[test]
    fn test_supercell_sheared() {
        // sqrt(3) x sqrt(3) R30
        let crystal = graphene_like();
        let sc = crystal
            .make_supercell(&[[2, 1, 0], [-1, 1, 0], [0, 0, 1]])
            .unwrap();

        assert_eq!(sc.num_atoms(), 6);
        assert!((sc.area() - 3.0 * crystal.area()).abs() < 1e-9);
        assert_eq!(sc.formula(), "C6");
    }

    #[test]
    fn test_supercell_negative_entries() {
        let square = Crystal::new(
            "square",
            Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 20.0]]),
            vec![Atom::new("Mo", [0.0, 0.0, 0.5])],
        );

        // 旋转 90°
        let sc = square
            .make_supercell(&[[0, -1, 0], [1, 0, 0], [0, 0, 1]])
            .unwrap();
        assert_eq!(sc.num_atoms(), 1);
        assert!((sc.area() - 9.0).abs() < 1e-9);

        let sc = square
            .make_supercell(&[[-1, -1, 0], [1, -1, 0], [0, 0, 1]])
            .unwrap();
        assert_eq!(sc.num_atoms(), 2);

        let sc = graphene_like()
            .make_supercell(&[[-1, 2, 0], [-2, 1, 0], [0, 0, 1]])
            .unwrap();
        assert_eq!(sc.num_atoms(), 6);
    }

    #[test]
    fn test_supercell_singular_matrix() {
        let crystal = graphene_like();
        let result = crystal.make_supercell(&[[1, 1, 0], [2, 2, 0], [0, 0, 1]]);
        assert!(matches!(result, Err(TwistcellError::Supercell(_))));
    }

    #[test]
    fn test_rotate_preserves_lengths_and_fractions() {
        let crystal = graphene_like();
        let rotated = crystal.rotate_around_z(0.3);

        let before = crystal.lattice.lengths();
        let after = rotated.lattice.lengths();
        for k in 0..3 {
            assert!((before[k] - after[k]).abs() < 1e-12);
        }
        assert!((crystal.area() - rotated.area()).abs() < 1e-12);
        assert_eq!(crystal.atoms, rotated.atoms);
    }

    #[test]
    fn test_stack_interpolates_cell() {
        let bottom = Crystal::new(
            "A",
            Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 15.0]]),
            vec![Atom::new("Mo", [0.0, 0.0, 0.5])],
        );
        let top = Crystal::new(
            "B",
            Lattice::from_vectors([[3.2, 0.0, 0.0], [0.0, 3.2, 0.0], [0.0, 0.0, 15.0]]),
            vec![Atom::new("W", [0.5, 0.5, 0.5])],
        );

        let stacked = bottom.stack(&top, 0.5, 4.0);
        assert_eq!(stacked.num_atoms(), 2);
        assert!((stacked.lattice.matrix[0][0] - 3.1).abs() < 1e-12);
        assert!((stacked.lattice.matrix[1][1] - 3.1).abs() < 1e-12);

        let (lo, hi) = stacked.z_extent();
        assert!((hi - lo - 4.0).abs() < 1e-9);
        assert!(stacked.atoms.iter().all(|a| a.position[2] > 0.0 && a.position[2] < 1.0));
        assert_eq!(stacked.name, "A+B");
    }

    #[test]
    fn test_stack_weight_bounds() {
        let bottom = graphene_like();
        let top = graphene_like().make_supercell(&[[1, 0, 0], [0, 1, 0], [0, 0, 1]]).unwrap();

        let s0 = bottom.stack(&top, 0.0, 3.4);
        let s1 = bottom.stack(&top, 1.0, 3.4);
        assert_eq!(s0.lattice.matrix[0], bottom.lattice.matrix[0]);
        assert_eq!(s1.lattice.matrix[1], top.lattice.matrix[1]);
    }

    #[test]
    fn test_crystal_formula() {
        let lattice = Lattice::from_vectors([[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]]);
        let atoms = vec![
            Atom::new("S", [0.0, 0.0, 0.4]),
            Atom::new("Mo", [0.5, 0.5, 0.5]),
            Atom::new("S", [0.0, 0.0, 0.6]),
        ];
        let crystal = Crystal::new("MoS2", lattice, atoms);
        assert_eq!(crystal.formula(), "MoS2");
    }
}
