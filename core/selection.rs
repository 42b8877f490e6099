use crate::error::{AppError, Result};
use crate::scanner::{FileNode, Nodes};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Derived display state of a directory. Never stored; always recomputed
/// from the leaf flags, so a directory checkbox can never drift out of sync
/// with its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    Included,
    Excluded,
    Partial,
}

/// Mutable include/exclude overlay on a frozen [`FileNode`] tree.
///
/// Only files carry a flag; directories are projections (see [`DirState`]).
/// Defaults on construction: text files included, everything else excluded.
/// All mutation goes through `&mut self`, so one mutation is in flight at a
/// time and a subtree update is observed atomically; the tree itself is never
/// written. A new scan replaces the model wholesale via [`Self::for_tree`].
///
/// Directory-level operations never turn a non-text file on: including a
/// subtree re-includes its text files only, which makes an exclude/include
/// round trip land back on the default flags. A direct operation on a single
/// file path does exactly what it is told, non-text or not.
#[derive(Debug, Default)]
pub struct SelectionModel {
    flags: IndexMap<PathBuf, bool>,
}

impl SelectionModel {
    pub fn for_tree(root: &FileNode) -> Self {
        let flags = root
            .iter()
            .filter(|node| node.is_file())
            .map(|node| (node.path.clone(), node.is_text))
            .collect();
        Self { flags }
    }

    pub fn is_included(&self, path: &Path) -> bool {
        self.flags.get(path).copied().unwrap_or(false)
    }

    /// Flip one file, or set a whole directory to "the opposite of fully
    /// included".
    pub fn toggle(&mut self, tree: &FileNode, path: &Path) -> Result<()> {
        let node = Self::lookup(tree, path)?;
        if node.is_file() {
            let current = self.is_included(path);
            self.flags.insert(node.path.clone(), !current);
            log::debug!(
                "Toggled {} -> {}",
                node.path.display(),
                if current { "excluded" } else { "included" }
            );
        } else {
            let target = self.dir_state(node) != DirState::Included;
            self.apply_subtree(node, target);
        }
        Ok(())
    }

    pub fn set_subtree(&mut self, tree: &FileNode, path: &Path, included: bool) -> Result<()> {
        let node = Self::lookup(tree, path)?;
        if node.is_file() {
            self.flags.insert(node.path.clone(), included);
        } else {
            self.apply_subtree(node, included);
        }
        Ok(())
    }

    /// Derived state over the directory's file descendants. A directory with
    /// no file descendants reads as `Excluded`.
    pub fn dir_state(&self, dir: &FileNode) -> DirState {
        let mut total = 0usize;
        let mut included = 0usize;
        for node in dir.iter().filter(|n| n.is_file()) {
            total += 1;
            if self.is_included(&node.path) {
                included += 1;
            }
        }
        if total == 0 || included == 0 {
            DirState::Excluded
        } else if included == total {
            DirState::Included
        } else {
            DirState::Partial
        }
    }

    /// Lazy preorder (directory-then-children) walk over the included files.
    pub fn included_files<'a>(&'a self, root: &'a FileNode) -> IncludedFiles<'a> {
        IncludedFiles {
            nodes: root.iter(),
            flags: &self.flags,
        }
    }

    pub fn included_count(&self) -> usize {
        self.flags.values().filter(|&&included| included).count()
    }

    fn apply_subtree(&mut self, dir: &FileNode, included: bool) {
        for node in dir.iter().filter(|n| n.is_file()) {
            self.flags
                .insert(node.path.clone(), included && node.is_text);
        }
        log::debug!(
            "Set subtree {} -> {}",
            dir.path.display(),
            if included { "included" } else { "excluded" }
        );
    }

    fn lookup<'a>(tree: &'a FileNode, path: &Path) -> Result<&'a FileNode> {
        tree.find(path).ok_or_else(|| AppError::NodeNotFound {
            path: path.to_path_buf(),
        })
    }
}

pub struct IncludedFiles<'a> {
    nodes: Nodes<'a>,
    flags: &'a IndexMap<PathBuf, bool>,
}

impl<'a> Iterator for IncludedFiles<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes
            .by_ref()
            .find(|node| node.is_file() && self.flags.get(&node.path).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PathFilter;
    use crate::scanner::Scanner;
    use std::fs;
    use tempfile::TempDir;

    fn scan_sample() -> (TempDir, FileNode) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/main.py"), "def main():\n    pass\n").unwrap();
        fs::write(root.join("src/utils.py"), "x = 1\n").unwrap();
        fs::write(root.join("src/data.bin"), [1u8, 2, 3]).unwrap();
        fs::write(root.join("README.md"), "# sample\n").unwrap();

        let exts = ["py", "md"].iter().map(|s| s.to_string()).collect();
        let filter = PathFilter::new(Default::default(), exts, Default::default(), true);
        let outcome = Scanner::new(filter, 1_000_000, 20).scan(root).unwrap();
        (dir, outcome.root)
    }

    #[test]
    fn defaults_include_text_files_only() {
        let (dir, tree) = scan_sample();
        let selection = SelectionModel::for_tree(&tree);
        assert!(selection.is_included(&dir.path().join("src/main.py")));
        assert!(selection.is_included(&dir.path().join("README.md")));
        assert!(!selection.is_included(&dir.path().join("src/data.bin")));
    }

    #[test]
    fn toggling_a_file_flips_its_flag() {
        let (dir, tree) = scan_sample();
        let mut selection = SelectionModel::for_tree(&tree);
        let main_py = dir.path().join("src/main.py");

        selection.toggle(&tree, &main_py).unwrap();
        assert!(!selection.is_included(&main_py));
        selection.toggle(&tree, &main_py).unwrap();
        assert!(selection.is_included(&main_py));
    }

    #[test]
    fn a_binary_file_can_be_force_included_individually() {
        let (dir, tree) = scan_sample();
        let mut selection = SelectionModel::for_tree(&tree);
        let bin = dir.path().join("src/data.bin");

        selection.toggle(&tree, &bin).unwrap();
        assert!(selection.is_included(&bin));
    }

    #[test]
    fn directory_round_trip_restores_default_flags() {
        let (dir, tree) = scan_sample();
        let mut selection = SelectionModel::for_tree(&tree);
        let src = dir.path().join("src");

        selection.toggle(&tree, &src).unwrap();
        assert!(!selection.is_included(&dir.path().join("src/main.py")));
        assert!(!selection.is_included(&dir.path().join("src/utils.py")));

        selection.toggle(&tree, &src).unwrap();
        assert!(selection.is_included(&dir.path().join("src/main.py")));
        assert!(selection.is_included(&dir.path().join("src/utils.py")));
        // Directory inclusion never resurrects a non-text file.
        assert!(!selection.is_included(&dir.path().join("src/data.bin")));
    }

    #[test]
    fn dir_state_is_derived_from_leaf_flags() {
        let (dir, tree) = scan_sample();
        let mut selection = SelectionModel::for_tree(&tree);
        let src = tree.find(&dir.path().join("src")).unwrap();

        assert_eq!(selection.dir_state(src), DirState::Partial); // data.bin excluded
        selection
            .set_subtree(&tree, &dir.path().join("src"), false)
            .unwrap();
        assert_eq!(selection.dir_state(src), DirState::Excluded);
        selection
            .toggle(&tree, &dir.path().join("src/data.bin"))
            .unwrap();
        selection
            .toggle(&tree, &dir.path().join("src/main.py"))
            .unwrap();
        selection
            .toggle(&tree, &dir.path().join("src/utils.py"))
            .unwrap();
        assert_eq!(selection.dir_state(src), DirState::Included);
    }

    #[test]
    fn included_files_walk_in_tree_order() {
        let (dir, tree) = scan_sample();
        let selection = SelectionModel::for_tree(&tree);
        let names: Vec<&str> = selection
            .included_files(&tree)
            .map(|n| n.name.as_str())
            .collect();
        // Children are sorted case-insensitively; README.md sorts before src/.
        assert_eq!(names, vec!["README.md", "main.py", "utils.py"]);
        drop(dir);
    }

    #[test]
    fn unknown_paths_are_rejected() {
        let (dir, tree) = scan_sample();
        let mut selection = SelectionModel::for_tree(&tree);
        let err = selection
            .toggle(&tree, &dir.path().join("ghost.py"))
            .unwrap_err();
        assert!(matches!(err, AppError::NodeNotFound { .. }));
    }
}
