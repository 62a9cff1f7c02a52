use std::fs;
use std::path::{Path, PathBuf};

use magicrepos::error::{Error, Result};
use magicrepos::odb::ObjectStore;
use magicrepos::refs::{HeadRef, RefStore};

/// The server-side repository model: no working tree, no index, just the
/// object store and ref namespace rooted at `{base_dir}/{owner}/{repo}.mr/`,
/// stripped down to the two sub-stores a bare repo actually needs.
#[derive(Debug, Clone)]
pub struct BareRepo {
    root: PathBuf,
    store: ObjectStore,
    refs: RefStore,
}

impl BareRepo {
    pub fn control_dir(base_dir: &Path, owner: &str, repo: &str) -> PathBuf {
        base_dir.join(owner).join(format!("{repo}.mr"))
    }

    pub fn exists(base_dir: &Path, owner: &str, repo: &str) -> bool {
        Self::control_dir(base_dir, owner, repo).is_dir()
    }

    pub fn open(base_dir: &Path, owner: &str, repo: &str) -> Result<Self> {
        let root = Self::control_dir(base_dir, owner, repo);
        if !root.is_dir() {
            return Err(Error::NotARepository);
        }
        Ok(Self::from_root(root))
    }

    /// Creates a fresh bare repository, mirroring `Repository::init`'s
    /// layout minus the working tree.
    pub fn create(base_dir: &Path, owner: &str, repo: &str) -> Result<Self> {
        let root = Self::control_dir(base_dir, owner, repo);
        if root.is_dir() {
            return Err(Error::AlreadyExists(root.display().to_string()));
        }
        fs::create_dir_all(root.join("objects"))?;
        fs::create_dir_all(root.join("refs/heads"))?;
        fs::create_dir_all(root.join("refs/tags"))?;
        fs::create_dir_all(root.join("refs/remotes"))?;

        let bare = Self::from_root(root);
        bare.refs.write_head(&HeadRef::Symbolic("refs/heads/main".into()))?;
        Ok(bare)
    }

    pub fn open_or_create(base_dir: &Path, owner: &str, repo: &str) -> Result<Self> {
        if Self::exists(base_dir, owner, repo) { Self::open(base_dir, owner, repo) } else { Self::create(base_dir, owner, repo) }
    }

    fn from_root(root: PathBuf) -> Self {
        let store = ObjectStore::new(root.join("objects"));
        let refs = RefStore::new(root.clone());
        Self { root, store, refs }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
