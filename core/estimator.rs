use crate::error::{AppError, Result};
use crate::scanner::FileNode;
use crate::selection::SelectionModel;

/// Character-ratio token approximation.
///
/// One token per `chars_per_token` characters, rounded up. This is a sizing
/// heuristic for budget display, not a tokenizer; accuracy within a few
/// percent of real BPE counts on source code is all it promises.
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    chars_per_token: f64,
}

impl TokenEstimator {
    pub fn new(chars_per_token: f64) -> Result<Self> {
        if !chars_per_token.is_finite() || chars_per_token <= 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "chars_per_token must be a positive number, got {chars_per_token}"
            )));
        }
        Ok(Self { chars_per_token })
    }

    pub fn estimate(&self, text: &str) -> u64 {
        let chars = text.chars().count() as f64;
        (chars / self.chars_per_token).ceil() as u64
    }

    /// Estimate for one node. Directories, non-text files, and empty files
    /// count zero. File estimates are derived from on-disk size and memoized
    /// on the node, so repeated totals over a frozen tree cost one pass of
    /// cell reads.
    pub fn estimate_file(&self, node: &FileNode) -> u64 {
        if !node.is_file() || !node.is_text || node.size == 0 {
            return 0;
        }
        node.memoized_tokens(|| (node.size as f64 / self.chars_per_token).ceil() as u64)
    }

    /// Total over the currently included files. Recomputed from leaf values on
    /// every call; with memoized leaves that is cheap enough that keeping an
    /// incremental running total is not worth the invalidation bookkeeping.
    pub fn estimate_selection(&self, tree: &FileNode, selection: &SelectionModel) -> u64 {
        selection
            .included_files(tree)
            .map(|node| self.estimate_file(node))
            .sum()
    }
}

/// Human display form: millions get one decimal ("1.2M"), smaller counts get
/// thousands separators ("12,345").
pub fn format_token_count(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else {
        group_thousands(tokens)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PathFilter;
    use crate::scanner::Scanner;
    use std::fs;
    use tempfile::TempDir;

    fn estimator() -> TokenEstimator {
        TokenEstimator::new(4.0).unwrap()
    }

    #[test]
    fn estimate_rounds_up() {
        let e = estimator();
        assert_eq!(e.estimate(""), 0);
        assert_eq!(e.estimate("abc"), 1);
        assert_eq!(e.estimate("abcd"), 1);
        assert_eq!(e.estimate("abcde"), 2);
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        assert!(TokenEstimator::new(0.0).is_err());
        assert!(TokenEstimator::new(-1.0).is_err());
        assert!(TokenEstimator::new(f64::NAN).is_err());
    }

    fn scan_sample() -> (TempDir, FileNode) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/main.py"), "x".repeat(400)).unwrap();
        fs::write(root.join("src/empty.py"), "").unwrap();
        fs::write(root.join("logo.png"), [0u8, 159, 146, 150]).unwrap();

        let exts = ["py"].iter().map(|s| s.to_string()).collect();
        let filter = PathFilter::new(Default::default(), exts, Default::default(), true);
        let outcome = Scanner::new(filter, 1_000_000, 20).scan(root).unwrap();
        (dir, outcome.root)
    }

    #[test]
    fn file_estimates_skip_non_text_and_empty() {
        let (dir, tree) = scan_sample();
        let e = estimator();

        let main_py = tree.find(&dir.path().join("src/main.py")).unwrap();
        assert_eq!(e.estimate_file(main_py), 100);

        let empty = tree.find(&dir.path().join("src/empty.py")).unwrap();
        assert_eq!(e.estimate_file(empty), 0);

        let png = tree.find(&dir.path().join("logo.png")).unwrap();
        assert_eq!(e.estimate_file(png), 0);

        let src = tree.find(&dir.path().join("src")).unwrap();
        assert_eq!(e.estimate_file(src), 0);
    }

    #[test]
    fn selection_total_tracks_toggles() {
        let (dir, tree) = scan_sample();
        let e = estimator();
        let mut selection = SelectionModel::for_tree(&tree);

        assert_eq!(e.estimate_selection(&tree, &selection), 100);

        selection
            .toggle(&tree, &dir.path().join("src/main.py"))
            .unwrap();
        assert_eq!(e.estimate_selection(&tree, &selection), 0);

        selection
            .toggle(&tree, &dir.path().join("src/main.py"))
            .unwrap();
        assert_eq!(e.estimate_selection(&tree, &selection), 100);
    }

    #[test]
    fn force_included_binary_still_estimates_zero() {
        let (dir, tree) = scan_sample();
        let e = estimator();
        let mut selection = SelectionModel::for_tree(&tree);

        selection
            .toggle(&tree, &dir.path().join("logo.png"))
            .unwrap();
        assert_eq!(e.estimate_selection(&tree, &selection), 100);
    }

    #[test]
    fn token_counts_format_for_humans() {
        assert_eq!(format_token_count(0), "0");
        assert_eq!(format_token_count(999), "999");
        assert_eq!(format_token_count(12_345), "12,345");
        assert_eq!(format_token_count(999_999), "999,999");
        assert_eq!(format_token_count(1_234_567), "1.2M");
    }
}
