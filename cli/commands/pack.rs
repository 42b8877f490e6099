use crate::cli_args::PackArgs;
use crate::load_config_for_command;
use crate::output::{print_scan_warnings, write_to_file, write_to_stdout};
use anyhow::{Context, Result};
use colored::*;
use ctxstudio_core::{
    AppError, Config, FileNode, PayloadAssembler, SelectionModel, TokenEstimator,
    format_token_count,
};
use glob::Pattern;
use std::path::Path;

pub fn handle_pack_command(args: PackArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let mut config = load_config_for_command(&project_root, &args.project_config)
        .context("Failed to load configuration for pack command")?;
    if let Some(size) = &args.max_size {
        config.payload.max_size = size.clone();
    }

    let outcome = super::scan::run_scan(&config, &project_root)?;
    if !quiet {
        print_scan_warnings(&outcome.warnings);
    }

    let mut selection = SelectionModel::for_tree(&outcome.root);
    apply_selection_patterns(
        &outcome.root,
        &mut selection,
        &project_root,
        &args.select,
        &args.deselect,
    )?;

    let estimator = TokenEstimator::new(config.chars_per_token()?)?;
    let tokens = estimator.estimate_selection(&outcome.root, &selection);
    if !quiet {
        eprintln!(
            "{} {} files, ~{} tokens",
            "Selected:".green().bold(),
            selection.included_count().to_string().cyan(),
            format_token_count(tokens).cyan()
        );
    }

    let assembler = PayloadAssembler::new(config.max_payload_bytes()?);
    let assembly = assembler.assemble(&outcome.root, &selection, &project_root);

    if !quiet {
        for skipped in &assembly.skipped {
            eprintln!(
                "{} skipped {}: {}",
                "Warning:".yellow().bold(),
                skipped.path.display(),
                skipped.reason
            );
        }
        if assembly.truncated {
            eprintln!(
                "{} payload truncated at the {} cap ({} files emitted)",
                "Warning:".yellow().bold(),
                config.payload.max_size,
                assembly.files_emitted
            );
        }
    }

    match &args.output {
        Some(path) => {
            write_to_file(path, &assembly.text)?;
            if !quiet {
                println!(
                    "{} Payload saved to: {}",
                    "Done:".green().bold(),
                    path.display().to_string().blue()
                );
            }
        }
        None => write_to_stdout(&assembly.text)?,
    }
    Ok(())
}

/// Apply `--select` then `--deselect` globs on top of the default selection.
/// Patterns match node paths relative to the project root; a matching
/// directory applies to its whole subtree. Deselection wins on overlap.
pub fn apply_selection_patterns(
    tree: &FileNode,
    selection: &mut SelectionModel,
    project_root: &Path,
    select: &[String],
    deselect: &[String],
) -> Result<()> {
    apply_patterns(tree, selection, project_root, select, true)?;
    apply_patterns(tree, selection, project_root, deselect, false)
}

fn apply_patterns(
    tree: &FileNode,
    selection: &mut SelectionModel,
    project_root: &Path,
    patterns: &[String],
    included: bool,
) -> Result<()> {
    for raw in patterns {
        let pattern = Pattern::new(raw).map_err(|e| {
            AppError::InvalidArgument(format!("Invalid glob pattern '{}': {}", raw, e))
        })?;
        let mut matched = false;
        for node in tree.iter() {
            let Some(rel) = pathdiff::diff_paths(&node.path, project_root) else {
                continue;
            };
            if pattern.matches_path(&rel) {
                selection.set_subtree(tree, &node.path, included)?;
                matched = true;
            }
        }
        if !matched {
            log::warn!("Pattern '{}' matched no files", raw);
        }
    }
    Ok(())
}
