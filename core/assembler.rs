use crate::scanner::FileNode;
use crate::selection::SelectionModel;
use std::fs;
use std::path::{Path, PathBuf};

/// An included file the assembler could not emit, with the reason for the
/// skip. Skips never abort assembly.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct Assembly {
    pub text: String,
    /// True when the size cap cut the payload short. `text` then ends on a
    /// complete file block; no file is ever emitted partially.
    pub truncated: bool,
    pub skipped: Vec<SkippedFile>,
    pub files_emitted: usize,
}

/// Concatenates the included files into one prompt-ready payload.
///
/// Each file is emitted as a header block with its path relative to the scan
/// root, followed by the file content read fresh from disk. Files that
/// vanished, fail to read, or are not valid UTF-8 are recorded as skipped and
/// assembly moves on. Emission stops before the payload would exceed
/// `max_bytes`.
#[derive(Debug, Clone, Copy)]
pub struct PayloadAssembler {
    max_bytes: u64,
}

impl PayloadAssembler {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn assemble(&self, tree: &FileNode, selection: &SelectionModel, root: &Path) -> Assembly {
        let mut text = String::new();
        let mut skipped = Vec::new();
        let mut truncated = false;
        let mut files_emitted = 0usize;

        for node in selection.included_files(tree) {
            let content = match fs::read(&node.path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(content) => content,
                    Err(_) => {
                        log::debug!("Skipping non-UTF-8 file: {}", node.path.display());
                        skipped.push(SkippedFile {
                            path: node.path.clone(),
                            reason: "not valid UTF-8".to_string(),
                        });
                        continue;
                    }
                },
                Err(e) => {
                    log::warn!("Could not read {}: {}", node.path.display(), e);
                    skipped.push(SkippedFile {
                        path: node.path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let block = Self::file_block(&node.path, root, &content);
            if (text.len() + block.len()) as u64 > self.max_bytes {
                log::info!(
                    "Payload size cap ({} bytes) reached after {} files",
                    self.max_bytes,
                    files_emitted
                );
                truncated = true;
                break;
            }
            text.push_str(&block);
            files_emitted += 1;
        }

        Assembly {
            text,
            truncated,
            skipped,
            files_emitted,
        }
    }

    fn file_block(path: &Path, root: &Path, content: &str) -> String {
        let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
        let mut block = format!("---\nFile: {}\n---\n\n{}", rel.display(), content);
        if !block.ends_with('\n') {
            block.push('\n');
        }
        block.push('\n');
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PathFilter;
    use crate::scanner::Scanner;
    use std::fs;
    use tempfile::TempDir;

    fn scan(root: &Path, exts: &[&str]) -> FileNode {
        let exts = exts.iter().map(|s| s.to_string()).collect();
        let filter = PathFilter::new(Default::default(), exts, Default::default(), true);
        Scanner::new(filter, 1_000_000, 20).scan(root).unwrap().root
    }

    #[test]
    fn payload_carries_relative_headers_in_tree_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("README.md"), "# readme\n").unwrap();

        let tree = scan(dir.path(), &["py", "md"]);
        let selection = SelectionModel::for_tree(&tree);
        let assembly =
            PayloadAssembler::new(10_000_000).assemble(&tree, &selection, dir.path());

        assert!(!assembly.truncated);
        assert_eq!(assembly.files_emitted, 2);
        let readme_at = assembly.text.find("---\nFile: README.md\n---\n\n# readme\n").unwrap();
        let main_at = assembly
            .text
            .find("---\nFile: src/main.py\n---\n\nprint('hi')\n")
            .unwrap();
        assert!(readme_at < main_at);
    }

    #[test]
    fn missing_newline_at_eof_is_added_before_the_separator() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "no newline").unwrap();

        let tree = scan(dir.path(), &["py"]);
        let selection = SelectionModel::for_tree(&tree);
        let assembly =
            PayloadAssembler::new(10_000_000).assemble(&tree, &selection, dir.path());
        assert!(assembly.text.ends_with("no newline\n\n"));
    }

    #[test]
    fn size_cap_stops_on_a_file_boundary() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "a".repeat(100)).unwrap();
        fs::write(dir.path().join("b.py"), "b".repeat(100)).unwrap();

        let tree = scan(dir.path(), &["py"]);
        let selection = SelectionModel::for_tree(&tree);
        // Room for one block but not two.
        let assembly = PayloadAssembler::new(150).assemble(&tree, &selection, dir.path());

        assert!(assembly.truncated);
        assert_eq!(assembly.files_emitted, 1);
        assert!(assembly.text.contains("File: a.py"));
        assert!(!assembly.text.contains("File: b.py"));
        assert!(assembly.text.len() as u64 <= 150);
    }

    #[test]
    fn undecodable_files_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.py"), "fine\n").unwrap();
        fs::write(dir.path().join("bad.py"), [0xffu8, 0xfe, 0x00]).unwrap();

        let tree = scan(dir.path(), &["py"]);
        let selection = SelectionModel::for_tree(&tree);
        let assembly =
            PayloadAssembler::new(10_000_000).assemble(&tree, &selection, dir.path());

        assert_eq!(assembly.files_emitted, 1);
        assert_eq!(assembly.skipped.len(), 1);
        assert!(assembly.skipped[0].path.ends_with("bad.py"));
        assert!(assembly.skipped[0].reason.contains("UTF-8"));
        assert!(assembly.text.contains("File: ok.py"));
    }

    #[test]
    fn vanished_files_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("here.py"), "x\n").unwrap();
        fs::write(dir.path().join("gone.py"), "y\n").unwrap();

        let tree = scan(dir.path(), &["py"]);
        fs::remove_file(dir.path().join("gone.py")).unwrap();

        let selection = SelectionModel::for_tree(&tree);
        let assembly =
            PayloadAssembler::new(10_000_000).assemble(&tree, &selection, dir.path());

        assert_eq!(assembly.files_emitted, 1);
        assert_eq!(assembly.skipped.len(), 1);
        assert!(assembly.skipped[0].path.ends_with("gone.py"));
    }
}
