//! # 几何与整数工具函数
//!
//! 重合搜索与矩阵对提取使用的纯函数：
//! - 基矢 × 整数向量
//! - 二维向量旋转
//! - 欧氏距离
//! - N 元整数最大公约数
//! - 2x2 行列式与 2x2 → 3x3 嵌入
//!
//! ## 依赖关系
//! - 被 `coincidence/search.rs`、`coincidence/pairs.rs`、`coincidence/builder.rs` 使用
//! - 使用 `num-integer` 计算 gcd

use crate::models::Basis2D;
use num_integer::Integer;

/// 基矢与整数系数的乘积 i·a1 + j·a2
pub fn basis_dot(basis: &Basis2D, i: i32, j: i32) -> [f64; 2] {
    let (i, j) = (f64::from(i), f64::from(j));
    [
        i * basis[0][0] + j * basis[1][0],
        i * basis[0][1] + j * basis[1][1],
    ]
}

/// 二维向量逆时针旋转 theta（弧度）
pub fn rotate_2d(v: [f64; 2], theta: f64) -> [f64; 2] {
    let (s, c) = theta.sin_cos();
    [c * v[0] - s * v[1], s * v[0] + c * v[1]]
}

/// 两个二维向量之间的欧氏距离
pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// 整数序列的最大公约数（非负），空序列或全零时为 0
pub fn gcd_of(values: &[i32]) -> i32 {
    values.iter().fold(0, |acc, &v| acc.gcd(&v))
}

/// 2x2 整数矩阵行列式，使用 i64 避免溢出
pub fn det2(m: &[[i32; 2]; 2]) -> i64 {
    i64::from(m[0][0]) * i64::from(m[1][1]) - i64::from(m[0][1]) * i64::from(m[1][0])
}

/// 将面内 2x2 矩阵嵌入 3x3，z 方向为单位变换
pub fn embed_2x2(m: &[[i32; 2]; 2]) -> [[i32; 3]; 3] {
    [
        [m[0][0], m[0][1], 0],
        [m[1][0], m[1][1], 0],
        [0, 0, 1],
    ]
}
