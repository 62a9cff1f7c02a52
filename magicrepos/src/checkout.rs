use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::refs::HeadRef;
use crate::repo::Repository;

impl Repository {
    /// Resolves a commit id to the tree it snapshots.
    pub(crate) fn commit_tree(&self, id: Digest) -> Result<Digest> {
        let commit = self
            .store()
            .read(id)?
            .into_commit()
            .ok_or_else(|| Error::MalformedObject(format!("`{id}` is not a commit")))?;
        Ok(commit.tree)
    }

    /// `checkout(name)` deletes every file currently named by the
    /// index, writes every file named by the target branch's tree, rebuilds
    /// the index from what was written, and moves `HEAD` onto the branch.
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        let target = self
            .refs()
            .resolve_branch(name)?
            .ok_or_else(|| Error::not_found(format!("branch `{name}`")))?;
        let tree_id = self.commit_tree(target)?;

        let index = self.load_index()?;
        let tracked: Vec<String> = index.paths().map(str::to_owned).collect();
        self.remove_tracked_files(tracked.iter().map(String::as_str))?;

        let flattened = self.read_tree_recursive(tree_id, "")?;
        self.write_tree_files(&flattened)?;
        let new_index = self.index_from_written(&flattened)?;
        self.save_index(&new_index)?;

        self.refs().write_head(&HeadRef::Symbolic(format!("refs/heads/{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NullConfig;
    use crate::ignore::NullIgnore;
    use crate::repo::CONTROL_DIR_NAME;
    use std::fs;

    fn write_file(repo: &Repository, path: &str, content: &str) {
        let abs = repo.workdir().join(path);
        if let Some(dir) = abs.parent() {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(abs, content).unwrap();
    }

    #[test]
    fn fast_forward_checkout_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let ignore = NullIgnore::new(CONTROL_DIR_NAME);

        write_file(&repo, "a.txt", "x");
        repo.stage_all(&ignore).unwrap();
        repo.commit("c1", &NullConfig).unwrap();

        repo.create_branch("b").unwrap();
        repo.checkout_branch("b").unwrap();

        write_file(&repo, "a.txt", "y");
        repo.stage_all(&ignore).unwrap();
        repo.commit("c2", &NullConfig).unwrap();

        repo.checkout_branch("main").unwrap();
        assert_eq!(fs::read_to_string(repo.workdir().join("a.txt")).unwrap(), "x");
        assert_eq!(repo.current_branch_name().unwrap(), Some("main".into()));

        repo.checkout_branch("b").unwrap();
        assert_eq!(fs::read_to_string(repo.workdir().join("a.txt")).unwrap(), "y");
    }

    #[test]
    fn checkout_removes_files_not_in_target() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let ignore = NullIgnore::new(CONTROL_DIR_NAME);

        write_file(&repo, "a.txt", "x");
        repo.stage_all(&ignore).unwrap();
        repo.commit("c1", &NullConfig).unwrap();
        repo.create_branch("b").unwrap();

        write_file(&repo, "b.txt", "y");
        repo.stage_all(&ignore).unwrap();
        repo.commit("c2", &NullConfig).unwrap();

        repo.checkout_branch("b").unwrap();
        assert!(!repo.workdir().join("b.txt").exists());
        assert!(repo.workdir().join("a.txt").exists());
    }

    #[test]
    fn checkout_missing_branch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(matches!(repo.checkout_branch("nope"), Err(Error::NotFound(_))));
    }
}
