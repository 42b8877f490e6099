use crate::error::{AppError, Result};
use crate::filter::PathFilter;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry in the scanned tree.
///
/// Nodes are immutable once `scan` returns; the only later write is the
/// memoized token estimate, which lives in a `OnceCell` so a frozen tree can
/// be read from multiple threads without locking. A re-scan builds a fresh
/// tree; there is no incremental diffing.
#[derive(Debug, Serialize)]
pub struct FileNode {
    pub path: PathBuf,
    pub name: String,
    pub kind: NodeKind,
    /// Files: size on disk. Directories: sum over currently present children
    /// (raw scan totals, independent of any selection).
    pub size: u64,
    pub is_text: bool,
    #[serde(skip)]
    token_estimate: OnceCell<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    fn file(path: PathBuf, name: String, size: u64, is_text: bool) -> Self {
        Self {
            path,
            name,
            kind: NodeKind::File,
            size,
            is_text,
            token_estimate: OnceCell::new(),
            children: Vec::new(),
        }
    }

    fn directory(path: PathBuf, name: String, children: Vec<FileNode>) -> Self {
        let size = children.iter().map(|c| c.size).sum();
        Self {
            path,
            name,
            kind: NodeKind::Directory,
            size,
            is_text: false,
            token_estimate: OnceCell::new(),
            children,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Look a node up by its absolute path, descending only into the subtree
    /// that can contain it.
    pub fn find(&self, path: &Path) -> Option<&FileNode> {
        if self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Preorder (directory-then-children) traversal including `self`.
    pub fn iter(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    /// Token estimate memoized on first computation. Callers go through
    /// [`crate::estimator::TokenEstimator::estimate_file`].
    pub(crate) fn memoized_tokens(&self, compute: impl FnOnce() -> u64) -> u64 {
        *self.token_estimate.get_or_init(compute)
    }
}

pub struct Nodes<'a> {
    stack: Vec<&'a FileNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Non-fatal problem hit during a walk (permission denied, vanished entry).
/// The traversal continues; these surface to the caller as a list.
#[derive(Debug, Clone, Serialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub root: FileNode,
    pub warnings: Vec<ScanWarning>,
    /// True when the walk was interrupted via [`CancelToken`]; `root` then
    /// holds the partial tree gathered so far.
    pub cancelled: bool,
}

/// Cooperative cancellation flag, checked between directory visits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
        log::debug!("Scan cancellation requested");
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub type ProgressCallback = Box<dyn Fn(&Path, usize) + Send>;

/// Depth-first directory walker.
///
/// Each directory is listed with a single `read_dir` call; excluded
/// directories are pruned before any child enumeration, so traversal cost is
/// proportional to the entries actually visited. Symbolic links are never
/// followed (directory or file), which rules out cycles. Children are sorted
/// case-insensitively by name so an unchanged tree scans identically across
/// runs. Empty directories are kept in the tree for display.
pub struct Scanner {
    filter: PathFilter,
    max_file_size: u64,
    max_depth: usize,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

struct WalkState {
    warnings: Vec<ScanWarning>,
    cancelled: bool,
    dirs_visited: usize,
}

impl Scanner {
    pub fn new(filter: PathFilter, max_file_size: u64, max_depth: usize) -> Self {
        Self {
            filter,
            max_file_size,
            max_depth,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Handle for requesting cancellation from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Invoked once per visited directory with the path and a running count.
    pub fn set_progress_callback(&mut self, callback: impl Fn(&Path, usize) + Send + 'static) {
        self.progress = Some(Box::new(callback));
    }

    /// Walk `root` and build the node tree. Fails only when the root itself is
    /// missing or not a directory; everything below degrades to warnings.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        let metadata = fs::symlink_metadata(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::RootNotFound {
                    path: root.to_path_buf(),
                }
            } else {
                AppError::Io(e)
            }
        })?;
        if !metadata.is_dir() {
            return Err(AppError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        log::info!("Starting scan of: {}", root.display());
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.to_string_lossy().to_string());

        let mut state = WalkState {
            warnings: Vec::new(),
            cancelled: false,
            dirs_visited: 0,
        };
        let root_node = self.scan_dir(root.to_path_buf(), root_name, 0, &mut state);

        if state.cancelled {
            log::info!(
                "Scan cancelled after {} directories, returning partial tree",
                state.dirs_visited
            );
        } else {
            log::info!(
                "Scan complete: {} directories visited, {} bytes, {} warnings",
                state.dirs_visited,
                root_node.size,
                state.warnings.len()
            );
        }

        Ok(ScanOutcome {
            root: root_node,
            warnings: state.warnings,
            cancelled: state.cancelled,
        })
    }

    fn scan_dir(
        &self,
        dir_path: PathBuf,
        dir_name: String,
        depth: usize,
        state: &mut WalkState,
    ) -> FileNode {
        if self.cancel.is_cancelled() {
            state.cancelled = true;
            return FileNode::directory(dir_path, dir_name, Vec::new());
        }

        state.dirs_visited += 1;
        if let Some(progress) = &self.progress {
            progress(&dir_path, state.dirs_visited);
        }

        if depth > self.max_depth {
            log::warn!("Max depth reached at: {}", dir_path.display());
            state.warnings.push(ScanWarning {
                path: dir_path.clone(),
                message: format!("maximum scan depth ({}) reached, subtree pruned", self.max_depth),
            });
            return FileNode::directory(dir_path, dir_name, Vec::new());
        }

        let entries = match fs::read_dir(&dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cannot list {}: {}", dir_path.display(), e);
                state.warnings.push(ScanWarning {
                    path: dir_path.clone(),
                    message: e.to_string(),
                });
                return FileNode::directory(dir_path, dir_name, Vec::new());
            }
        };

        let mut children: Vec<FileNode> = Vec::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    state.warnings.push(ScanWarning {
                        path: dir_path.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if self.filter.is_hidden_skipped(&name) {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    state.warnings.push(ScanWarning {
                        path: entry.path(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }

            if file_type.is_dir() {
                if self.filter.is_excluded_dir(&name) {
                    log::trace!("Pruning excluded directory: {}", entry.path().display());
                    continue;
                }
                children.push(self.scan_dir(entry.path(), name, depth + 1, state));
                if state.cancelled {
                    break;
                }
            } else if file_type.is_file() {
                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        state.warnings.push(ScanWarning {
                            path: entry.path(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };
                let mut is_text = self.filter.is_allowed_file(&name);
                if is_text && size > self.max_file_size {
                    log::debug!(
                        "File exceeds size limit, treating as non-text: {}",
                        entry.path().display()
                    );
                    is_text = false;
                }
                children.push(FileNode::file(entry.path(), name, size, is_text));
            }
        }

        children.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        FileNode::directory(dir_path, dir_name, children)
    }
}
