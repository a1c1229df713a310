//! # 重合超胞搜索模块
//!
//! 四阶段流水线：
//! 1. `search`: 对单个旋转角搜索重合格点
//! 2. `pairs`: 两两组合为独立的超胞矩阵对
//! 3. `builder`: 展开超胞、旋转、堆叠并对称化
//! 4. `filter`: 去除结构等价的界面
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`
//! - 子模块: geometry, search, pairs, symmetry, builder, filter

pub mod builder;
pub mod filter;
pub mod geometry;
pub mod pairs;
pub mod search;
pub mod symmetry;

pub use builder::{build_all_supercells, AnglePairs, StackingParams};
pub use filter::filter_supercells;
pub use pairs::{find_unique_pairs, SupercellPair};
pub use search::{checked_combination_count, combination_count, find_coincidences};
pub use symmetry::{MoyoStandardizer, SymmetrySettings};
