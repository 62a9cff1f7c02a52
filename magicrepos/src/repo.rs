use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::config::{resolve_email, resolve_name, ConfigProvider};
use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::ignore::IgnorePredicate;
use crate::index::{Index, IndexEntry};
use crate::obj::{Commit, FileMode, Tree, TreeEntry};
use crate::odb::ObjectStore;
use crate::refs::{HeadRef, RefStore};
use crate::scanner;
use crate::signature::Signature;

pub const CONTROL_DIR_NAME: &str = ".magicrepos";

/// The repository facade: working directory, control directory, and handles
/// to the object store and ref store it owns. There is no arena or
/// interning layer — this engine has no long-lived incremental query cache
/// to justify one, so paths are owned `PathBuf`s throughout.
#[derive(Debug, Clone)]
pub struct Repository {
    workdir: PathBuf,
    control_dir: PathBuf,
    store: ObjectStore,
    refs: RefStore,
}

impl Repository {
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn control_dir(&self) -> &Path {
        &self.control_dir
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    fn index_path(&self) -> PathBuf {
        self.control_dir.join("index")
    }

    fn from_control_dir(workdir: PathBuf, control_dir: PathBuf) -> Self {
        let store = ObjectStore::new(control_dir.join("objects"));
        let refs = RefStore::new(control_dir.clone());
        Self { workdir, control_dir, store, refs }
    }

    /// Creates a fresh repository at `workdir`. Fails if a control
    /// directory is already present.
    pub fn init(workdir: impl Into<PathBuf>) -> Result<Self> {
        let workdir = workdir.into();
        let control_dir = workdir.join(CONTROL_DIR_NAME);
        if control_dir.is_dir() {
            return Err(Error::AlreadyExists(control_dir.display().to_string()));
        }

        fs::create_dir_all(control_dir.join("objects"))?;
        fs::create_dir_all(control_dir.join("refs/heads"))?;
        fs::create_dir_all(control_dir.join("refs/tags"))?;
        fs::create_dir_all(control_dir.join("refs/remotes"))?;

        let repo = Self::from_control_dir(workdir, control_dir);
        repo.refs.write_head(&HeadRef::Symbolic("refs/heads/main".into()))?;
        // The config file's contents are owned by an external INI parser;
        // the engine only guarantees the file exists so that collaborator
        // has something to open.
        fs::write(repo.control_dir.join("config"), "")?;
        debug!(workdir = %repo.workdir.display(), "initialized repository");
        Ok(repo)
    }

    /// Walks parent directories from `start` until a control directory is
    /// found.
    pub fn open(start: impl Into<PathBuf>) -> Result<Self> {
        let mut dir = start.into();
        loop {
            let candidate = dir.join(CONTROL_DIR_NAME);
            if candidate.is_dir() {
                return Ok(Self::from_control_dir(dir, candidate));
            }
            if !dir.pop() {
                return Err(Error::NotARepository);
            }
        }
    }

    pub fn load_index(&self) -> Result<Index> {
        let path = self.index_path();
        if path.is_file() {
            Index::load(path)
        } else {
            Ok(Index::new())
        }
    }

    pub fn save_index(&self, index: &Index) -> Result<()> {
        index.save(self.index_path())
    }

    /// Normalizes a caller-supplied path (possibly using native separators)
    /// to the engine's `/`-separated, workdir-relative form.
    pub fn normalize_path(path: impl AsRef<Path>) -> String {
        path.as_ref().to_string_lossy().replace('\\', "/")
    }

    fn stat_entry(&self, normalized: &str) -> Result<(Digest, u64, u32, u32)> {
        let abs = self.workdir.join(normalized);
        let bytes = fs::read(&abs)?;
        let digest = self.store.write_blob(&bytes)?;
        let meta = fs::metadata(&abs)?;
        let mtime = meta.modified()?.duration_since(UNIX_EPOCH).unwrap_or_default();
        Ok((digest, mtime.as_secs(), 0, bytes.len() as u32))
    }

    /// `stage(path)`: if the working-tree file is absent the index entry is
    /// dropped (idempotent); else the file is hashed, stored, and upserted.
    pub fn stage(&self, path: impl AsRef<Path>) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut index = self.load_index()?;
        let abs = self.workdir.join(&normalized);
        if !abs.is_file() {
            index.remove(&normalized);
        } else {
            let (digest, mtime_s, mtime_ns, size) = self.stat_entry(&normalized)?;
            index.put(IndexEntry { mtime_s, mtime_ns, size, digest, path: normalized });
        }
        self.save_index(&index)
    }

    /// `stage_all()`: enumerates the working tree and produces/updates an
    /// entry for every present file, removing entries for paths that no
    /// longer exist.
    pub fn stage_all(&self, ignore: &dyn IgnorePredicate) -> Result<()> {
        let present = scanner::list_files(&self.workdir, ignore)?;
        let mut index = self.load_index()?;

        for path in &present {
            let (digest, mtime_s, mtime_ns, size) = self.stat_entry(path)?;
            index.put(IndexEntry { mtime_s, mtime_ns, size, digest, path: path.clone() });
        }

        let present_set: std::collections::BTreeSet<_> = present.iter().map(String::as_str).collect();
        let stale: Vec<String> =
            index.paths().filter(|p| !present_set.contains(p)).map(String::from).collect();
        for path in stale {
            index.remove(&path);
        }

        self.save_index(&index)
    }

    fn build_node_tree(index: &Index) -> BTreeMap<String, TreeNode> {
        let mut root: BTreeMap<String, TreeNode> = BTreeMap::new();
        for entry in index.entries() {
            let parts: Vec<&str> = entry.path.split('/').collect();
            insert_node(&mut root, &parts, entry.digest);
        }
        root
    }

    fn write_tree_node(&self, node: &BTreeMap<String, TreeNode>) -> Result<Digest> {
        let mut entries = Vec::with_capacity(node.len());
        for (name, child) in node {
            match child {
                TreeNode::File(digest) => {
                    entries.push(TreeEntry { mode: FileMode::Regular, name: name.clone(), digest: *digest })
                }
                TreeNode::Dir(sub) => {
                    let sub_id = self.write_tree_node(sub)?;
                    entries.push(TreeEntry { mode: FileMode::Directory, name: name.clone(), digest: sub_id });
                }
            }
        }
        self.store.write_tree(&Tree::new(entries))
    }

    /// Builds and stores a tree object from the index's entries.
    pub fn build_tree_from_index(&self, index: &Index) -> Result<Digest> {
        let root = Self::build_node_tree(index);
        self.write_tree_node(&root)
    }

    /// Expands a tree depth-first into `(path, blob_id)` leaves. Entries
    /// with non-directory modes (executable, symlink) are emitted as plain
    /// leaves regardless of their original mode.
    pub fn read_tree_recursive(&self, tree_id: Digest, prefix: &str) -> Result<Vec<(String, Digest)>> {
        let tree = self
            .store
            .read(tree_id)?
            .into_tree()
            .ok_or_else(|| Error::MalformedObject(format!("`{tree_id}` is not a tree")))?;

        let mut out = Vec::new();
        for entry in tree.entries() {
            let path = if prefix.is_empty() { entry.name.clone() } else { format!("{prefix}/{}", entry.name) };
            if entry.mode.is_directory() {
                out.extend(self.read_tree_recursive(entry.digest, &path)?);
            } else {
                out.push((path, entry.digest));
            }
        }
        Ok(out)
    }

    /// `commit(message)`: fails with `EmptyCommit` if the index is empty.
    pub fn commit(&self, message: &str, config: &dyn ConfigProvider) -> Result<Digest> {
        let index = self.load_index()?;
        if index.is_empty() {
            return Err(Error::EmptyCommit);
        }

        let tree = self.build_tree_from_index(&index)?;
        let parent = self.refs.resolve_head()?;

        let author = Signature::new(resolve_name(config), resolve_email(config));
        let commit = Commit {
            tree,
            parents: parent.into_iter().collect(),
            author: author.clone(),
            committer: author,
            message: message.to_owned(),
        };
        let id = self.store.write_commit(&commit)?;

        match self.refs.read_head()? {
            HeadRef::Symbolic(path) => self.refs.write_ref(&path, id)?,
            HeadRef::Detached(_) => self.refs.write_head(&HeadRef::Detached(id))?,
        }
        debug!(%id, "created commit");
        Ok(id)
    }

    /// Walks the first-parent chain from `HEAD`, most recent first.
    pub fn log(&self) -> Result<Vec<Commit>> {
        let mut out = Vec::new();
        let mut next = self.refs.resolve_head()?;
        while let Some(id) = next {
            let commit = self
                .store
                .read(id)?
                .into_commit()
                .ok_or_else(|| Error::MalformedObject(format!("`{id}` is not a commit")))?;
            next = commit.parents.first().copied();
            out.push(commit);
        }
        Ok(out)
    }

    pub(crate) fn head_tree(&self) -> Result<Option<Digest>> {
        match self.refs.resolve_head()? {
            Some(id) => {
                let commit = self
                    .store
                    .read(id)?
                    .into_commit()
                    .ok_or_else(|| Error::MalformedObject(format!("`{id}` is not a commit")))?;
                Ok(Some(commit.tree))
            }
            None => Ok(None),
        }
    }

    /// Removes every file named by `paths` from the working tree, pruning
    /// now-empty parent directories up to (but not including) the working
    /// root.
    pub(crate) fn remove_tracked_files<'a>(&self, paths: impl Iterator<Item = &'a str>) -> Result<()> {
        for path in paths {
            let abs = self.workdir.join(path);
            match fs::remove_file(&abs) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::Io(e)),
            }
            self.prune_empty_parents(&abs);
        }
        Ok(())
    }

    fn prune_empty_parents(&self, file_path: &Path) {
        let mut dir = file_path.parent().map(Path::to_path_buf);
        while let Some(d) = dir {
            if d == self.workdir || !d.starts_with(&self.workdir) {
                break;
            }
            match fs::read_dir(&d) {
                Ok(mut entries) if entries.next().is_none() => {
                    let _ = fs::remove_dir(&d);
                    dir = d.parent().map(Path::to_path_buf);
                }
                _ => break,
            }
        }
    }

    /// Writes every `(path, blob_id)` leaf to the working tree as a regular
    /// file, creating parent directories as needed.
    pub(crate) fn write_tree_files(&self, flattened: &[(String, Digest)]) -> Result<()> {
        for (path, digest) in flattened {
            let abs = self.workdir.join(path);
            if let Some(dir) = abs.parent() {
                fs::create_dir_all(dir)?;
            }
            let blob = self
                .store
                .read(*digest)?
                .into_blob()
                .ok_or_else(|| Error::MalformedObject(format!("`{digest}` is not a blob")))?;
            fs::write(&abs, blob.content())?;
        }
        Ok(())
    }

    /// Rebuilds an index from files just written to disk, using their
    /// post-write mtimes.
    pub(crate) fn index_from_written(&self, flattened: &[(String, Digest)]) -> Result<Index> {
        let mut index = Index::new();
        for (path, digest) in flattened {
            let abs = self.workdir.join(path);
            let meta = fs::metadata(&abs)?;
            let mtime = meta.modified()?.duration_since(UNIX_EPOCH).unwrap_or_default();
            index.put(IndexEntry {
                mtime_s: mtime.as_secs(),
                mtime_ns: 0,
                size: meta.len() as u32,
                digest: *digest,
                path: path.clone(),
            });
        }
        Ok(index)
    }
}

enum TreeNode {
    File(Digest),
    Dir(BTreeMap<String, TreeNode>),
}

fn insert_node(node: &mut BTreeMap<String, TreeNode>, parts: &[&str], digest: Digest) {
    if parts.len() == 1 {
        node.insert(parts[0].to_owned(), TreeNode::File(digest));
        return;
    }
    let child = node.entry(parts[0].to_owned()).or_insert_with(|| TreeNode::Dir(BTreeMap::new()));
    if let TreeNode::Dir(sub) = child {
        insert_node(sub, &parts[1..], digest);
    }
}
