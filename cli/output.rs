use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use ctxstudio_core::{FileNode, ScanWarning};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}

pub fn print_scan_warnings(warnings: &[ScanWarning]) {
    for warning in warnings {
        eprintln!(
            "{} {}: {}",
            "Warning:".yellow().bold(),
            warning.path.display(),
            warning.message
        );
    }
}

/// Indented text rendering of a scanned tree. Directories get a trailing
/// slash; non-text files are dimmed with a marker so it is obvious what the
/// payload will not carry.
pub fn print_tree(root: &FileNode) -> Result<()> {
    let mut out = String::new();
    render_node(root, 0, &mut out);
    write_to_stdout(&out)
}

fn render_node(node: &FileNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    if node.is_dir() {
        out.push_str(&format!("{}{}/\n", indent, node.name.blue().bold()));
        for child in &node.children {
            render_node(child, depth + 1, out);
        }
    } else if node.is_text {
        out.push_str(&format!("{}{}\n", indent, node.name));
    } else {
        out.push_str(&format!(
            "{}{} {}\n",
            indent,
            node.name.dimmed(),
            "(binary)".dimmed()
        ));
    }
}

pub fn print_metrics_pretty_table(metrics: &crate::commands::metrics::ProjectMetrics) -> Result<()> {
    println!();
    println!("{}", " Project Metrics Summary ".green().bold().underline());
    println!(
        "{:<20} {}",
        "Total Files:".green(),
        metrics.total_files.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Size:".green(),
        metrics.total_bytes_readable.cyan()
    );
    println!(
        "{:<20} {}",
        "Est. Tokens:".green(),
        metrics.estimated_tokens_readable.cyan()
    );

    if metrics.files_details.is_empty() {
        println!("\n{}", "(No files included in metrics)".yellow());
    } else {
        println!("\n{}", " File Details ".green().bold().underline());
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Path").fg(Color::Green),
            Cell::new("Size").fg(Color::Green),
            Cell::new("Tokens").fg(Color::Green),
        ]);
        for file in &metrics.files_details {
            table.add_row(vec![
                Cell::new(&file.path).fg(Color::Cyan),
                Cell::new(&file.bytes_readable)
                    .set_alignment(comfy_table::CellAlignment::Right)
                    .fg(Color::DarkGrey),
                Cell::new(file.estimated_tokens)
                    .set_alignment(comfy_table::CellAlignment::Right),
            ]);
        }
        println!("{table}");
    }
    println!();
    Ok(())
}
