use crate::error::{Error, Result};
use crate::refs::HeadRef;
use crate::repo::Repository;

/// Branch management (checkout lives in [`crate::checkout`]).
impl Repository {
    /// Creates `refs/heads/{name}` pointing at the commit `HEAD` currently
    /// resolves to. Fails if `HEAD` is unborn (no commit yet) or the branch
    /// already exists.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        let head_id = self
            .refs()
            .resolve_head()?
            .ok_or_else(|| Error::InvalidOperation("cannot branch from an unborn HEAD".into()))?;
        self.refs().create_branch(name, head_id)
    }

    /// Deletes `refs/heads/{name}`. Fails if the branch is currently checked
    /// out or does not exist.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        if self.refs().current_branch_name()?.as_deref() == Some(name) {
            return Err(Error::InvalidOperation(format!("cannot delete checked-out branch `{name}`")));
        }
        self.refs().delete_branch(name)
    }

    pub fn list_branches(&self) -> Result<Vec<String>> {
        self.refs().list_branches()
    }

    pub fn current_branch_name(&self) -> Result<Option<String>> {
        self.refs().current_branch_name()
    }

    pub(crate) fn is_detached(&self) -> Result<bool> {
        Ok(matches!(self.refs().read_head()?, HeadRef::Detached(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NullConfig;
    use crate::ignore::NullIgnore;
    use crate::repo::CONTROL_DIR_NAME;
    use std::fs;

    fn init_with_commit() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        repo.stage_all(&NullIgnore::new(CONTROL_DIR_NAME)).unwrap();
        repo.commit("c1", &NullConfig).unwrap();
        (dir, repo)
    }

    #[test]
    fn create_branch_from_unborn_head_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(matches!(repo.create_branch("feature"), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn create_and_list_branches() {
        let (_dir, repo) = init_with_commit();
        repo.create_branch("feature").unwrap();
        assert_eq!(repo.list_branches().unwrap(), vec!["feature".to_string(), "main".to_string()]);
    }

    #[test]
    fn create_branch_twice_fails() {
        let (_dir, repo) = init_with_commit();
        repo.create_branch("feature").unwrap();
        assert!(matches!(repo.create_branch("feature"), Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn delete_checked_out_branch_fails() {
        let (_dir, repo) = init_with_commit();
        assert!(matches!(repo.delete_branch("main"), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn delete_nonexistent_branch_fails() {
        let (_dir, repo) = init_with_commit();
        assert!(matches!(repo.delete_branch("ghost"), Err(Error::NotFound(_))));
    }

    #[test]
    fn delete_other_branch_succeeds() {
        let (_dir, repo) = init_with_commit();
        repo.create_branch("feature").unwrap();
        repo.delete_branch("feature").unwrap();
        assert_eq!(repo.list_branches().unwrap(), vec!["main".to_string()]);
    }
}
