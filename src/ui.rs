// Terminal UI utilities
// Human-facing lines only; engine output and structured events go elsewhere.

use colored::Colorize;
use std::path::Path;

const RULE_WIDTH: usize = 60;

pub fn print_header(title: &str) {
    let rule = "═".repeat(RULE_WIDTH);
    println!();
    println!("{}", rule.bright_blue());
    println!("{}", format!("  {}", title).bright_blue().bold());
    println!("{}", rule.bright_blue());
    println!();
}

/// One planned combination: image on the first line, its files indented below
pub fn print_combination(image: &str, base_image: &str, files: &[impl AsRef<Path>]) {
    println!("{} {}", image.bold(), format!("(from {})", base_image).dimmed());
    for file in files {
        println!("  {} {}", "→".bright_black(), file.as_ref().display());
    }
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}
