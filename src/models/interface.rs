//! # 界面数据模型
//!
//! `Interface` 记录一次超胞构建的全部产物：底层超胞、旋转后的顶层超胞、
//! 堆叠并对称化后的结构、旋转角以及两个 3x3 超胞矩阵。
//!
//! 去重使用显式的 `InterfaceKey` = (空间群号, 面内面积, 原子数)。
//!
//! ## 依赖关系
//! - 被 `coincidence/builder.rs`、`coincidence/filter.rs` 和 `commands/` 使用
//! - 使用 `models/structure.rs`

use super::structure::Crystal;
use std::fmt;

/// 面积量化步长 (Å²)，保证等价键可精确比较
pub const AREA_QUANTUM: f64 = 1e-4;

/// 离散化的旋转角键（单位：微度）
///
/// 浮点角度不适合作为映射键，这里按 1e-6° 取整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AngleKey(i64);

impl AngleKey {
    pub fn from_degrees(degrees: f64) -> Self {
        AngleKey((degrees * 1e6).round() as i64)
    }

    pub fn from_radians(radians: f64) -> Self {
        Self::from_degrees(radians.to_degrees())
    }

    pub fn degrees(self) -> f64 {
        self.0 as f64 * 1e-6
    }
}

impl fmt::Display for AngleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.degrees())
    }
}

/// 界面等价键 (空间群号, 量化面积, 原子数)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceKey {
    pub space_group: u32,
    pub area: i64,
    pub num_atoms: usize,
}

impl InterfaceKey {
    pub fn new(space_group: u32, area: f64, num_atoms: usize) -> Self {
        InterfaceKey {
            space_group,
            area: (area / AREA_QUANTUM).round() as i64,
            num_atoms,
        }
    }
}

/// 堆叠界面
#[derive(Debug, Clone)]
pub struct Interface {
    /// 底层超胞
    pub bottom: Crystal,
    /// 旋转后的顶层超胞
    pub top: Crystal,
    /// 堆叠并对称化后的结构
    pub stack: Crystal,
    /// 旋转角键
    pub angle: AngleKey,
    /// 旋转角（弧度）
    pub theta: f64,
    /// 底层超胞矩阵
    pub m: [[i32; 3]; 3],
    /// 顶层超胞矩阵
    pub n: [[i32; 3]; 3],
    /// 空间群号（1-230）
    pub space_group: u32,
}

impl Interface {
    /// 去重用的等价键
    pub fn key(&self) -> InterfaceKey {
        InterfaceKey::new(self.space_group, self.stack.area(), self.stack.num_atoms())
    }

    /// 旋转角（度）
    pub fn angle_degrees(&self) -> f64 {
        self.theta.to_degrees()
    }

    /// 顶层相对底层的面内平均应变 (|B| - |A|) / |A|
    pub fn strain(&self) -> f64 {
        let a = self.bottom.lattice.lengths();
        let b = self.top.lattice.lengths();
        ((b[0] - a[0]) / a[0] + (b[1] - a[1]) / a[1]) / 2.0
    }
}
