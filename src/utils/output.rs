//! # 美化输出工具
//!
//! 统一的终端输出样式，也是流水线的信息日志出口。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块和 `main.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印流水线阶段，如 `[2/4] Extracting unique pairs`
pub fn print_stage(step: usize, total: usize, msg: &str) {
    println!(
        "{} {}",
        format!("[{}/{}]", step, total).cyan().bold(),
        msg.bold()
    );
}

/// 打印键值对
pub fn print_kv(key: &str, value: &str) {
    println!("    {:<22} {}", key.dimmed(), value);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}
