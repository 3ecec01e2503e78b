//! Colored console output for extrepo
//!
//! Uses owo-colors for terminal colors. Progress spinners live in
//! `helpers::internal::progress`.

use owo_colors::OwoColorize;

use crate::descriptor::DescriptorKind;

/// Print an action header (blue, bold)
/// Example: "==> Building repository in public/"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print a detail line (dimmed prefix)
/// Example: "     git clone https://github.com/..."
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Label used in per-package status lines.
fn kind_label(kind: DescriptorKind) -> &'static str {
    match kind {
        DescriptorKind::Regular => "Extension:",
        DescriptorKind::Theme => "Theme:",
    }
}

/// Name column width; theme names get the width the shorter label leaves.
fn name_width(kind: DescriptorKind) -> usize {
    match kind {
        DescriptorKind::Regular => 30,
        DescriptorKind::Theme => 34,
    }
}

/// Name and version padded so status columns line up across kinds.
fn status_columns(kind: DescriptorKind, name: &str, version: &str) -> (String, String) {
    (
        format!("{:width$}", name, width = name_width(kind)),
        format!("{:6}", version),
    )
}

/// Print a package that got a fresh version directory.
/// Example: "Extension: Folders                        1.3.5   (updated)"
pub fn updated(kind: DescriptorKind, name: &str, version: &str) {
    let (name, version) = status_columns(kind, name, version);
    println!(
        "{} {} {}\t{}",
        kind_label(kind).bold(),
        name,
        version.cyan(),
        "(updated)".green()
    );
}

/// Print a package whose latest version was already on disk.
pub fn up_to_date(kind: DescriptorKind, name: &str, version: &str) {
    let (name, version) = status_columns(kind, name, version);
    println!(
        "{} {} {}\t{}",
        kind_label(kind).bold(),
        name,
        version,
        "(already up-to-date)".dimmed()
    );
}

/// Print the end-of-run summary.
pub fn summary(regular: usize, themes: usize, failed: usize, base_url: &str) {
    println!();
    println!(
        "{} {} extensions. (Components: {}, Themes: {})",
        "Processed:".bold(),
        regular + themes,
        regular,
        themes
    );
    if failed > 0 {
        println!("{} {}", "Skipped:".yellow().bold(), failed);
    }
    println!("{} {}/index.json", "Repository Endpoint URL:".bold(), base_url);
}
