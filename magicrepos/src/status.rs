use std::collections::BTreeMap;

use crate::error::Result;
use crate::ignore::IgnorePredicate;
use crate::obj::{self, ObjType};
use crate::repo::Repository;
use crate::scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub staged: Vec<StatusEntry>,
    pub unstaged: Vec<StatusEntry>,
    pub untracked: Vec<String>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

impl Repository {
    /// Computes the three-way status: staged (index vs. `HEAD`), unstaged
    /// (working tree vs. index), and untracked (working tree with no
    /// index entry).
    pub fn status(&self, ignore: &dyn IgnorePredicate) -> Result<Status> {
        let index = self.load_index()?;

        let head_entries: BTreeMap<String, _> = match self.head_tree()? {
            Some(tree_id) => self.read_tree_recursive(tree_id, "")?.into_iter().collect(),
            None => BTreeMap::new(),
        };

        let mut staged = Vec::new();
        for entry in index.entries() {
            match head_entries.get(&entry.path) {
                None => staged.push(StatusEntry { path: entry.path.clone(), kind: ChangeKind::Added }),
                Some(head_digest) if *head_digest != entry.digest => {
                    staged.push(StatusEntry { path: entry.path.clone(), kind: ChangeKind::Modified })
                }
                Some(_) => {}
            }
        }
        for path in head_entries.keys() {
            if index.get(path).is_none() {
                staged.push(StatusEntry { path: path.clone(), kind: ChangeKind::Deleted });
            }
        }
        staged.sort_by(|a, b| a.path.cmp(&b.path));

        let present = scanner::list_files(&self.workdir(), ignore)?;
        let present_set: std::collections::BTreeSet<_> = present.iter().map(String::as_str).collect();

        let mut unstaged = Vec::new();
        for path in &present {
            if let Some(entry) = index.get(path) {
                let bytes = std::fs::read(self.workdir().join(path))?;
                let digest = obj::compute_id(ObjType::Blob, &bytes);
                if digest != entry.digest {
                    unstaged.push(StatusEntry { path: path.clone(), kind: ChangeKind::Modified });
                }
            }
        }
        for path in index.paths() {
            if !present_set.contains(path) {
                unstaged.push(StatusEntry { path: path.to_owned(), kind: ChangeKind::Deleted });
            }
        }
        unstaged.sort_by(|a, b| a.path.cmp(&b.path));

        let untracked: Vec<String> = present.into_iter().filter(|p| index.get(p).is_none()).collect();

        Ok(Status { staged, unstaged, untracked })
    }
}
