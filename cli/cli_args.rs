use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Specify the target project directory (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .ctxstudio.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "disable_config_file",
        help_heading = "Project Setup"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Project Setup"
    )]
    pub disable_config_file: bool,

    #[arg(
        long,
        help = "Specify the project name (overrides config/dir name).",
        value_name = "NAME",
        help_heading = "Project Setup"
    )]
    pub project_name: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scan a project and assemble selected files into an AI prompt payload.",
    long_about = "ctxstudio walks a project directory, classifies files as text or binary, \nestimates the token cost of the current selection, and concatenates the \nselected files into a single payload ready to paste into a model prompt.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  ctxstudio scan\n  ctxstudio metrics\n  ctxstudio pack --deselect 'tests/**' -o payload.txt",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "s",
        about = "Scan the project and print the file tree."
    )]
    Scan(ScanArgs),

    #[command(
        visible_alias = "m",
        about = "Calculate and display per-file token and size statistics."
    )]
    Metrics(MetricsArgs),

    #[command(
        visible_alias = "p",
        about = "Assemble the selected files into a prompt payload."
    )]
    Pack(PackArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(
        long,
        help = "Emit the scanned tree as JSON instead of the text rendering.",
        help_heading = "Output Control"
    )]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(
        long,
        help = "Emit the metrics as JSON instead of the pretty table.",
        help_heading = "Output Control"
    )]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PackArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(long = "select", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Include files matching a glob pattern (relative to the project root).", help_heading = "Selection")]
    pub select: Vec<String>,

    #[arg(long = "deselect", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Exclude files matching a glob pattern (applied after --select).", help_heading = "Selection")]
    pub deselect: Vec<String>,

    #[arg(
        long,
        value_name = "SIZE_STRING",
        help = "Override the payload size cap (e.g. '500 KB', '2 MB').",
        help_heading = "Output Control"
    )]
    pub max_size: Option<String>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the payload to a file instead of standard output.",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,
}
