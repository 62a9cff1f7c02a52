use std::collections::BTreeSet;
use std::time::UNIX_EPOCH;

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::index::{Index, IndexEntry};
use crate::refs::HeadRef;
use crate::repo::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Soft,
    Mixed,
    Hard,
}

impl Repository {
    fn index_entry_preserving(&self, path: &str, digest: Digest) -> Result<IndexEntry> {
        let abs = self.workdir().join(path);
        match std::fs::metadata(&abs) {
            Ok(meta) => {
                let mtime = meta.modified()?.duration_since(UNIX_EPOCH).unwrap_or_default();
                Ok(IndexEntry {
                    mtime_s: mtime.as_secs(),
                    mtime_ns: 0,
                    size: meta.len() as u32,
                    digest,
                    path: path.to_owned(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let blob = self
                    .store()
                    .read(digest)?
                    .into_blob()
                    .ok_or_else(|| Error::MalformedObject(format!("`{digest}` is not a blob")))?;
                Ok(IndexEntry {
                    mtime_s: 0,
                    mtime_ns: 0,
                    size: blob.content().len() as u32,
                    digest,
                    path: path.to_owned(),
                })
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// `reset(spec, mode)`. In every mode `HEAD` (and, if on a
    /// branch, the branch ref) moves to the resolved target. Mixed
    /// additionally rebuilds the index from the target's tree, preserving
    /// existing working-tree mtimes where a file is still present. Hard
    /// additionally clears the working tree of every file named by either
    /// the prior or the rebuilt index, then writes the target tree out.
    pub fn reset(&self, spec: &str, mode: ResetMode) -> Result<()> {
        let target =
            self.refs().resolve(spec)?.ok_or_else(|| Error::not_found(format!("ref spec `{spec}`")))?;

        match self.refs().read_head()? {
            HeadRef::Symbolic(path) => self.refs().write_ref(&path, target)?,
            HeadRef::Detached(_) => self.refs().write_head(&HeadRef::Detached(target))?,
        }

        if mode == ResetMode::Soft {
            return Ok(());
        }

        let prior_index = self.load_index()?;
        let tree_id = self.commit_tree(target)?;
        let flattened = self.read_tree_recursive(tree_id, "")?;

        let mut new_index = Index::new();
        for (path, digest) in &flattened {
            new_index.put(self.index_entry_preserving(path, *digest)?);
        }
        self.save_index(&new_index)?;

        if mode == ResetMode::Mixed {
            return Ok(());
        }

        let mut stale: BTreeSet<String> = prior_index.paths().map(String::from).collect();
        stale.extend(new_index.paths().map(String::from));
        self.remove_tracked_files(stale.iter().map(String::as_str))?;

        self.write_tree_files(&flattened)?;
        let written_index = self.index_from_written(&flattened)?;
        self.save_index(&written_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NullConfig;
    use crate::ignore::NullIgnore;
    use crate::repo::CONTROL_DIR_NAME;
    use crate::status::ChangeKind;
    use std::fs;

    fn write_file(repo: &Repository, path: &str, content: &str) {
        fs::write(repo.workdir().join(path), content).unwrap();
    }

    fn init_with_commit() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write_file(&repo, "a.txt", "x");
        repo.stage_all(&NullIgnore::new(CONTROL_DIR_NAME)).unwrap();
        repo.commit("c1", &NullConfig).unwrap();
        (dir, repo)
    }

    #[test]
    fn hard_reset_erases_unstaged_changes() {
        let (_dir, repo) = init_with_commit();
        write_file(&repo, "a.txt", "z");
        let ignore = NullIgnore::new(CONTROL_DIR_NAME);
        let status = repo.status(&ignore).unwrap();
        assert!(status.unstaged.iter().any(|e| e.path == "a.txt" && e.kind == ChangeKind::Modified));

        repo.reset("HEAD", ResetMode::Hard).unwrap();
        assert_eq!(fs::read_to_string(repo.workdir().join("a.txt")).unwrap(), "x");
        assert!(repo.status(&ignore).unwrap().is_clean());
    }

    #[test]
    fn soft_reset_leaves_index_and_workdir_untouched() {
        let (_dir, repo) = init_with_commit();
        write_file(&repo, "b.txt", "y");
        repo.stage_all(&NullIgnore::new(CONTROL_DIR_NAME)).unwrap();
        let before = repo.load_index().unwrap();

        repo.reset("HEAD", ResetMode::Soft).unwrap();
        let after = repo.load_index().unwrap();
        assert_eq!(before, after);
        assert!(repo.workdir().join("b.txt").exists());
    }

    #[test]
    fn mixed_reset_rebuilds_index_but_keeps_workdir() {
        let (_dir, repo) = init_with_commit();
        write_file(&repo, "a.txt", "changed-but-unstaged");
        repo.stage("a.txt").unwrap();

        repo.reset("HEAD", ResetMode::Mixed).unwrap();
        let index = repo.load_index().unwrap();
        let head_tree = repo.store().read(repo.refs().resolve_head().unwrap().unwrap()).unwrap().into_commit().unwrap().tree;
        let flattened = repo.read_tree_recursive(head_tree, "").unwrap();
        assert_eq!(index.get("a.txt").unwrap().digest, flattened.iter().find(|(p, _)| p == "a.txt").unwrap().1);
        // working tree untouched by mixed reset
        assert_eq!(fs::read_to_string(repo.workdir().join("a.txt")).unwrap(), "changed-but-unstaged");
    }

    #[test]
    fn reset_to_unresolvable_spec_fails() {
        let (_dir, repo) = init_with_commit();
        assert!(matches!(repo.reset("nonexistent-branch", ResetMode::Soft), Err(Error::NotFound(_))));
    }
}
