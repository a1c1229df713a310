//! # 界面去重
//!
//! 空间群号、面内面积和原子数都相同的界面视为等价，每个等价类只保留一个代表。
//! 代表为输入顺序中第一个出现的界面；`build_all_supercells` 的输出按角度升序、
//! 矩阵对顺序排列，因此代表即最小旋转角下最先构建的那个。
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 调用
//! - 使用 `models/interface.rs`

use crate::models::{Interface, InterfaceKey};

use std::collections::BTreeMap;

/// 去除等价界面，结果按 `InterfaceKey` 排序
pub fn filter_supercells(interfaces: Vec<Interface>) -> Vec<Interface> {
    let mut unique: BTreeMap<InterfaceKey, Interface> = BTreeMap::new();
    for interface in interfaces {
        unique.entry(interface.key()).or_insert(interface);
    }
    unique.into_values().collect()
}
