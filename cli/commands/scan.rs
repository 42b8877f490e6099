use crate::cli_args::ScanArgs;
use crate::load_config_for_command;
use crate::output::{print_scan_warnings, print_tree, write_to_stdout};
use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use colored::*;
use ctxstudio_core::{Config, ScanOutcome, Scanner};
use std::path::Path;

pub fn handle_scan_command(args: ScanArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(&project_root, &args.project_config)
        .context("Failed to load configuration for scan command")?;

    let outcome = run_scan(&config, &project_root)?;
    if !quiet {
        print_scan_warnings(&outcome.warnings);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.root)
            .map_err(ctxstudio_core::AppError::JsonSerialize)?;
        write_to_stdout(&json)?;
    } else {
        print_tree(&outcome.root)?;
        if !quiet {
            let files = outcome.root.iter().filter(|n| n.is_file()).count();
            let size = Byte::from_u64(outcome.root.size)
                .get_appropriate_unit(UnitType::Binary)
                .to_string();
            println!(
                "\n{} {} files, {}",
                "Scanned:".green().bold(),
                files.to_string().cyan(),
                size.cyan()
            );
        }
    }
    Ok(())
}

pub fn run_scan(config: &Config, project_root: &Path) -> Result<ScanOutcome> {
    let scanner = Scanner::new(
        config.compile_filter(),
        config.max_file_size_bytes()?,
        config.scan.max_depth,
    );
    let outcome = scanner
        .scan(project_root)
        .context("Failed to scan project directory")?;
    Ok(outcome)
}
