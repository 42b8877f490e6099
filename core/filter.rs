use std::collections::HashSet;

/// Pure eligibility predicates over an immutable, pre-normalized configuration.
///
/// A `PathFilter` is compiled once by [`crate::config::Config::compile_filter`];
/// extension case-folding happens at that point, never per comparison. The
/// filter holds no ambient state, so scans driven by different filters can run
/// side by side in tests.
#[derive(Debug, Clone)]
pub struct PathFilter {
    ignored_dirs: HashSet<String>,
    allowed_extensions: HashSet<String>,
    allowed_filenames: HashSet<String>,
    skip_hidden: bool,
}

impl PathFilter {
    /// `allowed_extensions` are expected lowercased and without a leading dot.
    pub fn new(
        ignored_dirs: HashSet<String>,
        allowed_extensions: HashSet<String>,
        allowed_filenames: HashSet<String>,
        skip_hidden: bool,
    ) -> Self {
        Self {
            ignored_dirs,
            allowed_extensions,
            allowed_filenames,
            skip_hidden,
        }
    }

    /// Exact, case-sensitive match on the bare directory name. A listed name
    /// excludes that directory at any depth; there is no glob or path matching.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.ignored_dirs.contains(name)
    }

    /// A file is text-eligible when its exact name is allow-listed (covers
    /// extensionless names like `Makefile` and dotted ones like
    /// `.env.example`), or when the substring after its final `.` is a member
    /// of the allowed-extension set (case-insensitive). Anything else,
    /// including bare names without an allowlist entry, is rejected.
    pub fn is_allowed_file(&self, name: &str) -> bool {
        if self.allowed_filenames.contains(name) {
            return true;
        }
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                self.allowed_extensions.contains(&ext.to_lowercase())
            }
            _ => false,
        }
    }

    /// Dot-prefixed entries are dropped from the walk entirely unless the
    /// exact name is allow-listed (default exception: `.env.example`).
    pub fn is_hidden_skipped(&self, name: &str) -> bool {
        self.skip_hidden && name.starts_with('.') && !self.allowed_filenames.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PathFilter {
        let dirs = ["node_modules", "target", ".git"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let exts = ["py", "rs", "md"].iter().map(|s| s.to_string()).collect();
        let names = ["Makefile", ".env.example"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        PathFilter::new(dirs, exts, names, true)
    }

    #[test]
    fn excluded_dir_is_exact_and_case_sensitive() {
        let f = filter();
        assert!(f.is_excluded_dir("node_modules"));
        assert!(!f.is_excluded_dir("Node_Modules"));
        assert!(!f.is_excluded_dir("node_modules_old"));
    }

    #[test]
    fn allowed_file_extension_is_case_insensitive() {
        let f = filter();
        assert!(f.is_allowed_file("main.py"));
        assert!(f.is_allowed_file("README.MD"));
        assert!(!f.is_allowed_file("image.png"));
    }

    #[test]
    fn extension_is_taken_after_the_final_dot() {
        let f = filter();
        assert!(f.is_allowed_file("archive.tar.md"));
        assert!(!f.is_allowed_file("script.py.bak"));
    }

    #[test]
    fn extensionless_files_need_an_exact_name_entry() {
        let f = filter();
        assert!(f.is_allowed_file("Makefile"));
        assert!(!f.is_allowed_file("Dockerfile"));
        assert!(!f.is_allowed_file("makefile"));
    }

    #[test]
    fn dotted_allow_listed_names_are_text_eligible() {
        let f = filter();
        assert!(f.is_allowed_file(".env.example"));
        assert!(!f.is_allowed_file(".env"));
        assert!(!f.is_allowed_file(".env.local"));
    }

    #[test]
    fn hidden_entries_are_skipped_unless_allow_listed() {
        let f = filter();
        assert!(f.is_hidden_skipped(".venv"));
        assert!(f.is_hidden_skipped(".gitignore"));
        assert!(!f.is_hidden_skipped(".env.example"));
        assert!(!f.is_hidden_skipped("src"));
    }
}
