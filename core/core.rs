pub mod assembler;
pub mod config;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod scanner;
pub mod selection;

pub use assembler::{Assembly, PayloadAssembler, SkippedFile};
pub use config::{Config, EstimatorConfig, FilterConfig, PayloadConfig, ScanConfig};
pub use error::{AppError, Result};
pub use estimator::{TokenEstimator, format_token_count};
pub use filter::PathFilter;
pub use scanner::{CancelToken, FileNode, NodeKind, ScanOutcome, ScanWarning, Scanner};
pub use selection::{DirState, SelectionModel};
