//! # 数据模型模块
//!
//! 定义晶体结构与堆叠界面的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`coincidence/` 和 `commands/` 使用
//! - 子模块: structure, interface

pub mod interface;
pub mod structure;

pub use interface::{AngleKey, Interface, InterfaceKey};
pub use structure::{Atom, Basis2D, Crystal, Lattice};
