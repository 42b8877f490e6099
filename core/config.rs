use crate::error::{AppError, Result};
use crate::filter::PathFilter;
use byte_unit::Byte;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILENAME: &str = ".ctxstudio.toml";

/// Directory names pruned from every scan unless the user overrides the set.
static DEFAULT_IGNORED_DIRS: Lazy<Vec<&str>> = Lazy::new(|| {
    vec![
        ".git",
        ".svn",
        ".hg",
        "node_modules",
        "bower_components",
        "__pycache__",
        ".pytest_cache",
        ".mypy_cache",
        "venv",
        ".venv",
        "env",
        ".idea",
        ".vscode",
        ".vs",
        "dist",
        "build",
        "out",
        "target",
        ".tox",
        ".nox",
        "htmlcov",
        "eggs",
        ".eggs",
        ".terraform",
        ".serverless",
        "vendor",
        "packages",
    ]
});

/// Extensions treated as text source by default (lowercase, no leading dot).
static DEFAULT_ALLOWED_EXTENSIONS: Lazy<Vec<&str>> = Lazy::new(|| {
    vec![
        "py", "js", "ts", "tsx", "jsx", "html", "css", "scss", "sass", "json", "yaml", "yml",
        "toml", "ini", "cfg", "java", "kt", "scala", "cpp", "c", "h", "hpp", "go", "rs", "rb",
        "php", "swift", "m", "md", "rst", "txt", "sql", "graphql", "proto", "sh", "bash", "zsh",
        "ps1", "bat", "cmd", "xml", "xsl", "xslt", "vue", "svelte",
    ]
});

/// Extensionless (or hidden) names admitted by exact match.
static DEFAULT_ALLOWED_FILENAMES: Lazy<Vec<&str>> =
    Lazy::new(|| vec!["Dockerfile", "Makefile", "Justfile", ".env.example"]);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub payload: PayloadConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_allowed_filenames")]
    pub allowed_filenames: Vec<String>,
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Files above this size stay visible but are never treated as text.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Average characters per language-model token. The estimate is
    /// `ceil(chars / chars_per_token)`, a heuristic rather than a tokenizer.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PayloadConfig {
    #[serde(default = "default_max_payload_size")]
    pub max_size: String,
}

fn default_true() -> bool {
    true
}
fn default_ignored_dirs() -> Vec<String> {
    DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect()
}
fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_allowed_filenames() -> Vec<String> {
    DEFAULT_ALLOWED_FILENAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_file_size() -> String {
    "1 MB".to_string()
}
fn default_max_depth() -> usize {
    20
}
fn default_chars_per_token() -> f64 {
    4.0
}
fn default_max_payload_size() -> String {
    "10 MB".to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignored_dirs: default_ignored_dirs(),
            allowed_extensions: default_allowed_extensions(),
            allowed_filenames: default_allowed_filenames(),
            skip_hidden: default_true(),
        }
    }
}
impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_depth: default_max_depth(),
        }
    }
}
impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            chars_per_token: default_chars_per_token(),
        }
    }
}
impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_payload_size(),
        }
    }
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("CTXSTUDIO_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let expanded = shellexpand::tilde(p_str);
                let path = PathBuf::from(expanded.as_ref());
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    /// Build the immutable predicate set consumed by the scanner. Extension
    /// case-folding and dot-stripping happen here, once, at configuration time.
    pub fn compile_filter(&self) -> PathFilter {
        let ignored_dirs: HashSet<String> = self.filter.ignored_dirs.iter().cloned().collect();
        let allowed_extensions: HashSet<String> = self
            .filter
            .allowed_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        let allowed_filenames: HashSet<String> =
            self.filter.allowed_filenames.iter().cloned().collect();
        PathFilter::new(
            ignored_dirs,
            allowed_extensions,
            allowed_filenames,
            self.filter.skip_hidden,
        )
    }

    pub fn max_file_size_bytes(&self) -> Result<u64> {
        parse_size(&self.scan.max_file_size)
    }

    pub fn max_payload_bytes(&self) -> Result<u64> {
        parse_size(&self.payload.max_size)
    }

    pub fn chars_per_token(&self) -> Result<f64> {
        let k = self.estimator.chars_per_token;
        if k.is_finite() && k > 0.0 {
            Ok(k)
        } else {
            Err(AppError::InvalidArgument(format!(
                "estimator.chars_per_token must be a positive number, got {k}"
            )))
        }
    }

    pub fn get_effective_project_name(&self, project_root: &Path) -> String {
        self.general.project_name.clone().unwrap_or_else(|| {
            project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "UnknownProject".to_string())
        })
    }
}

fn parse_size(size_str: &str) -> Result<u64> {
    let byte_value = Byte::from_str(size_str).map_err(|e| {
        AppError::InvalidArgument(format!(
            "Invalid size '{}': {}. Use formats like '500 KB' or '1 MB'.",
            size_str, e
        ))
    })?;
    let bytes: u128 = byte_value.into();
    u64::try_from(bytes).map_err(|_| {
        AppError::InvalidArgument(format!("Size '{}' exceeds the supported range", size_str))
    })
}
