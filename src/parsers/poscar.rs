//! # VASP POSCAR 格式读写
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor (negative = target volume)
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! 二维材料的层结构以 a, b 为面内矢量、c 为垂直方向（含真空层）。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `commands/build.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, TwistcellError};
use crate::models::{Atom, Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| TwistcellError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 POSCAR 格式，`source` 用于错误信息和默认名称
pub fn parse_poscar_content(content: &str, source: &str) -> Result<Crystal> {
    let fail = |reason: String| TwistcellError::ParseError {
        format: "poscar".to_string(),
        path: source.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return Err(fail("File too short".to_string()));
    }

    let name = match lines[0].trim() {
        "" => source.to_string(),
        comment => comment.to_string(),
    };

    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| fail("Invalid scaling factor on line 2".to_string()))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts = parse_floats(lines[2 + i], 3)
            .ok_or_else(|| fail(format!("Invalid lattice vector on line {}", 3 + i)))?;
        *row = [parts[0], parts[1], parts[2]];
    }

    // 负缩放因子表示目标体积
    let factor = if scale < 0.0 {
        let volume = Lattice::from_vectors(matrix).volume().abs();
        if volume < 1e-10 {
            return Err(fail("Degenerate lattice".to_string()));
        }
        (-scale / volume).cbrt()
    } else {
        scale
    };
    let lattice = Lattice::from_vectors(matrix.map(|row| row.map(|x| x * factor)));

    // VASP 5+ 在计数行前有元素行；VASP 4 只有计数，元素用 X1, X2... 代替
    let has_symbols = lines[5]
        .split_whitespace()
        .next()
        .map(|s| s.parse::<usize>().is_err())
        .unwrap_or(false);
    let (elements, count_line) = if has_symbols {
        let symbols: Vec<String> = lines[5].split_whitespace().map(str::to_string).collect();
        (symbols, 6)
    } else {
        (Vec::new(), 5)
    };

    let counts: Vec<usize> = lines
        .get(count_line)
        .map(|l| l.split_whitespace().filter_map(|s| s.parse().ok()).collect())
        .unwrap_or_default();
    if counts.is_empty() {
        return Err(fail(format!("Missing atom counts on line {}", count_line + 1)));
    }
    let elements = if elements.is_empty() {
        (1..=counts.len()).map(|i| format!("X{}", i)).collect()
    } else if elements.len() == counts.len() {
        elements
    } else {
        return Err(fail(format!(
            "{} element symbols but {} atom counts",
            elements.len(),
            counts.len()
        )));
    };

    let mut coord_line = count_line + 1;
    if lines
        .get(coord_line)
        .map(|l| l.trim().to_lowercase().starts_with('s'))
        .unwrap_or(false)
    {
        coord_line += 1;
    }
    let coord_type = lines
        .get(coord_line)
        .map(|l| l.trim().to_lowercase())
        .ok_or_else(|| fail("Missing coordinate type line".to_string()))?;
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let total: usize = counts.iter().sum();
    let position_lines = &lines[(coord_line + 1).min(lines.len())..];
    if position_lines.len() < total {
        return Err(fail(format!(
            "Expected {} atom positions, found {} lines",
            total,
            position_lines.len()
        )));
    }

    let species = elements
        .iter()
        .zip(counts.iter())
        .flat_map(|(el, &n)| std::iter::repeat(el).take(n));

    let mut atoms = Vec::with_capacity(total);
    for (idx, (element, line)) in species.zip(position_lines.iter()).enumerate() {
        let p = parse_floats(line, 3)
            .ok_or_else(|| fail(format!("Invalid position for atom {}", idx + 1)))?;
        let position = if is_cartesian {
            let cart = [p[0] * factor, p[1] * factor, p[2] * factor];
            lattice
                .to_fractional(cart)
                .ok_or_else(|| fail("Degenerate lattice".to_string()))?
        } else {
            [p[0], p[1], p[2]]
        };
        atoms.push(Atom::new(element.clone(), position));
    }

    Ok(Crystal::new(name, lattice, atoms))
}

/// 解析一行中前 n 个浮点数
fn parse_floats(line: &str, n: usize) -> Option<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(n)
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    (values.len() == n).then_some(values)
}

/// 将 Crystal 转换为 POSCAR 格式字符串（Direct 坐标，元素按首次出现顺序分组）
pub fn to_poscar_string(crystal: &Crystal, comment: &str) -> String {
    let mut order: Vec<&str> = Vec::new();
    for atom in &crystal.atoms {
        if !order.contains(&atom.element.as_str()) {
            order.push(&atom.element);
        }
    }

    let mut result = String::new();
    result.push_str(&format!("{}\n", comment));
    result.push_str("1.0\n");

    for row in &crystal.lattice.matrix {
        result.push_str(&format!(
            "  {:16.10}  {:16.10}  {:16.10}\n",
            row[0], row[1], row[2]
        ));
    }

    let counts: Vec<String> = order
        .iter()
        .map(|el| {
            crystal
                .atoms
                .iter()
                .filter(|a| a.element == *el)
                .count()
                .to_string()
        })
        .collect();
    result.push_str(&format!("   {}\n", order.join("   ")));
    result.push_str(&format!("   {}\n", counts.join("   ")));
    result.push_str("Direct\n");

    for el in &order {
        for atom in crystal.atoms.iter().filter(|a| a.element == *el) {
            let p = atom.position;
            result.push_str(&format!(
                "  {:16.10}  {:16.10}  {:16.10}  {}\n",
                p[0], p[1], p[2], el
            ));
        }
    }

    result
}

/// 写出 POSCAR 文件
pub fn write_poscar_file(crystal: &Crystal, comment: &str, path: &Path) -> Result<()> {
    fs::write(path, to_poscar_string(crystal, comment)).map_err(|e| {
        TwistcellError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOS2: &str = r#"MoS2 monolayer
1.0
3.19 0.0 0.0
-1.595 2.7626 0.0
0.0 0.0 20.0
Mo S
1 2
Direct
0.0 0.0 0.5
0.3333333333 0.6666666667 0.578
0.3333333333 0.6666666667 0.422
"#;

    #[test]
    fn test_parse_poscar_vasp5() {
        let crystal = parse_poscar_content(MOS2, "MoS2").unwrap();
        assert_eq!(crystal.name, "MoS2 monolayer");
        assert_eq!(crystal.num_atoms(), 3);
        assert_eq!(crystal.formula(), "MoS2");
        assert!((crystal.lattice.matrix[2][2] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_poscar_vasp4_and_scale() {
        let content = r#"
2.0
1.5 0.0 0.0
0.0 1.5 0.0
0.0 0.0 5.0
2
Direct
0.0 0.0 0.5
0.5 0.5 0.5
"#;
        let crystal = parse_poscar_content(content, "fallback").unwrap();
        assert_eq!(crystal.name, "fallback");
        assert_eq!(crystal.atoms[0].element, "X1");
        assert!((crystal.lattice.matrix[0][0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_poscar_negative_scale_is_volume() {
        let content = r#"cube
-27.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
Fe
1
Direct
0.0 0.0 0.0
"#;
        let crystal = parse_poscar_content(content, "cube").unwrap();
        assert!((crystal.lattice.volume() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_cartesian_selective() {
        let content = r#"graphene
1.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 10.0
C
2
Selective dynamics
Cartesian
0.0 0.0 5.0 T T F
1.0 1.0 5.0 T T F
"#;
        let crystal = parse_poscar_content(content, "g").unwrap();
        assert_eq!(crystal.num_atoms(), 2);
        let p = crystal.atoms[1].position;
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!((p[1] - 0.5).abs() < 1e-12);
        assert!((p[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_poscar_truncated_positions() {
        let content = MOS2.lines().take(9).collect::<Vec<_>>().join("\n");
        let err = parse_poscar_content(&content, "MoS2").unwrap_err();
        assert!(matches!(err, TwistcellError::ParseError { .. }));
    }

    #[test]
    fn test_poscar_write_then_read() {
        let mut crystal = parse_poscar_content(MOS2, "MoS2").unwrap();
        // 交错排列的元素写出后按元素分组
        crystal.atoms.swap(0, 1);

        let text = to_poscar_string(&crystal, "interface 0");
        assert!(text.starts_with("interface 0\n"));

        let parsed = parse_poscar_content(&text, "again").unwrap();
        assert_eq!(parsed.formula(), "MoS2");
        assert_eq!(parsed.atoms[0].element, "S");
        assert_eq!(parsed.atoms[2].element, "Mo");
    }
}
