use crate::cli_args::MetricsArgs;
use crate::load_config_for_command;
use crate::output::{print_metrics_pretty_table, print_scan_warnings, write_to_stdout};
use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use ctxstudio_core::{
    Config, FileNode, SelectionModel, TokenEstimator, format_token_count,
};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ProjectMetrics {
    pub total_files: usize,
    pub total_bytes: u64,
    pub total_bytes_readable: String,
    pub estimated_tokens: u64,
    pub estimated_tokens_readable: String,
    pub files_details: Vec<FileMetrics>,
}

#[derive(Debug, Serialize)]
pub struct FileMetrics {
    pub path: String,
    pub bytes: u64,
    pub bytes_readable: String,
    pub estimated_tokens: u64,
}

pub fn handle_metrics_command(args: MetricsArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(&project_root, &args.project_config)
        .context("Failed to load configuration for metrics command")?;

    let outcome = super::scan::run_scan(&config, &project_root)?;
    if !quiet {
        print_scan_warnings(&outcome.warnings);
    }

    let selection = SelectionModel::for_tree(&outcome.root);
    let estimator = TokenEstimator::new(config.chars_per_token()?)?;

    if selection.included_count() == 0 && !quiet {
        println!("No text files found to calculate metrics.");
        return Ok(());
    }

    log::debug!("Calculating metrics...");
    let metrics = calculate_metrics(&outcome.root, &selection, &estimator, &project_root);

    if args.json {
        let json = serde_json::to_string_pretty(&metrics)
            .map_err(ctxstudio_core::AppError::JsonSerialize)?;
        write_to_stdout(&json)
    } else {
        print_metrics_pretty_table(&metrics)
    }
}

fn calculate_metrics(
    tree: &FileNode,
    selection: &SelectionModel,
    estimator: &TokenEstimator,
    project_root: &Path,
) -> ProjectMetrics {
    let mut total_files = 0usize;
    let mut total_bytes = 0u64;
    let mut total_tokens = 0u64;
    let mut files_details = Vec::new();

    for node in selection.included_files(tree) {
        let tokens = estimator.estimate_file(node);
        let relative_path = pathdiff::diff_paths(&node.path, project_root)
            .unwrap_or_else(|| node.path.clone())
            .to_string_lossy()
            .to_string();

        total_files += 1;
        total_bytes = total_bytes.saturating_add(node.size);
        total_tokens += tokens;

        let bytes_readable = Byte::from_u64(node.size)
            .get_appropriate_unit(UnitType::Binary)
            .to_string();
        files_details.push(FileMetrics {
            path: relative_path,
            bytes: node.size,
            bytes_readable,
            estimated_tokens: tokens,
        });
    }

    files_details.sort_by(|a, b| a.path.cmp(&b.path));

    let total_bytes_readable = Byte::from_u64(total_bytes)
        .get_appropriate_unit(UnitType::Binary)
        .to_string();

    ProjectMetrics {
        total_files,
        total_bytes,
        total_bytes_readable,
        estimated_tokens: total_tokens,
        estimated_tokens_readable: format_token_count(total_tokens),
        files_details,
    }
}
