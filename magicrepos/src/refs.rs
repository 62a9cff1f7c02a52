use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hash::Digest;

const HEAD_BRANCH_PREFIX: &str = "refs/heads/";

/// `HEAD` modeled as a sum type rather than a raw string: it either points at
/// a branch ref by path, or carries a commit id directly (detached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    Symbolic(String),
    Detached(Digest),
}

impl HeadRef {
    fn encode(&self) -> String {
        match self {
            Self::Symbolic(path) => format!("ref: {path}\n"),
            Self::Detached(id) => format!("{id}\n"),
        }
    }

    fn decode(text: &str) -> Result<Self> {
        let text = text.trim_end_matches('\n');
        if let Some(path) = text.strip_prefix("ref: ") {
            Ok(Self::Symbolic(path.to_owned()))
        } else {
            Ok(Self::Detached(
                text.parse().map_err(|_| Error::MalformedRef(format!("bad HEAD content `{text}`")))?,
            ))
        }
    }
}

/// The reference namespace: `HEAD`, branches under `refs/heads/`, and any
/// other ref the caller chooses to name. Loose refs only — there is no
/// packed-refs backend, since the whole-file-overwrite model never needs
/// compaction.
#[derive(Debug, Clone)]
pub struct RefStore {
    root: PathBuf,
}

impl RefStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("HEAD")
    }

    fn ref_path(&self, refpath: &str) -> PathBuf {
        self.root.join(refpath)
    }

    fn branch_path(&self, name: &str) -> PathBuf {
        self.ref_path(&format!("{HEAD_BRANCH_PREFIX}{name}"))
    }

    fn write_atomic(path: &Path, content: &str) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read_head(&self) -> Result<HeadRef> {
        let text = fs::read_to_string(self.head_path())?;
        HeadRef::decode(&text)
    }

    pub fn write_head(&self, head: &HeadRef) -> Result<()> {
        Self::write_atomic(&self.head_path(), &head.encode())
    }

    pub fn is_detached(&self) -> Result<bool> {
        Ok(matches!(self.read_head()?, HeadRef::Detached(_)))
    }

    pub fn current_branch_name(&self) -> Result<Option<String>> {
        match self.read_head()? {
            HeadRef::Symbolic(path) => Ok(path.strip_prefix(HEAD_BRANCH_PREFIX).map(str::to_owned)),
            HeadRef::Detached(_) => Ok(None),
        }
    }

    /// Follows `HEAD` to a commit id. `None` means unborn: `HEAD` is
    /// symbolic but its target ref does not exist yet.
    pub fn resolve_head(&self) -> Result<Option<Digest>> {
        match self.read_head()? {
            HeadRef::Symbolic(path) => self.read_ref(&path),
            HeadRef::Detached(id) => Ok(Some(id)),
        }
    }

    pub fn create_branch(&self, name: &str, id: Digest) -> Result<()> {
        let path = self.branch_path(name);
        if path.is_file() {
            return Err(Error::AlreadyExists(format!("branch `{name}`")));
        }
        self.write_ref(&format!("{HEAD_BRANCH_PREFIX}{name}"), id)
    }

    pub fn delete_branch(&self, name: &str) -> Result<()> {
        let path = self.branch_path(name);
        fs::remove_file(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(format!("branch `{name}`")),
            _ => Error::Io(e),
        })
    }

    pub fn resolve_branch(&self, name: &str) -> Result<Option<Digest>> {
        self.read_ref(&format!("{HEAD_BRANCH_PREFIX}{name}"))
    }

    /// Recursively walks `refs/heads/`, returning branch names (`/`
    /// separated) in ascending ordinal order.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let root = self.ref_path(HEAD_BRANCH_PREFIX);
        let mut names = Vec::new();
        if root.is_dir() {
            Self::walk_branches(&root, &root, &mut names)?;
        }
        names.sort();
        Ok(names)
    }

    fn walk_branches(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::walk_branches(root, &path, out)?;
            } else {
                let rel = path.strip_prefix(root).expect("walked path is under root");
                let name = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
                out.push(name);
            }
        }
        Ok(())
    }

    pub fn read_ref(&self, refpath: &str) -> Result<Option<Digest>> {
        match fs::read_to_string(self.ref_path(refpath)) {
            Ok(text) => {
                let digest = text
                    .trim_end_matches('\n')
                    .parse()
                    .map_err(|_| Error::MalformedRef(format!("bad ref content at `{refpath}`")))?;
                Ok(Some(digest))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn write_ref(&self, refpath: &str, id: Digest) -> Result<()> {
        Self::write_atomic(&self.ref_path(refpath), &format!("{id}\n"))
    }

    fn is_hex64(spec: &str) -> bool {
        spec.len() == 64 && spec.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Universal resolver: literal `HEAD` (case-insensitive), then any
    /// `refs/`-prefixed path, then a short branch name, then a 64-char hex
    /// literal. First hit wins; there is no partial-hex (abbreviated
    /// object id) resolution.
    pub fn resolve(&self, spec: &str) -> Result<Option<Digest>> {
        if spec.eq_ignore_ascii_case("HEAD") {
            return self.resolve_head();
        }
        if let Some(rest) = spec.strip_prefix("refs/") {
            let _ = rest;
            return self.read_ref(spec);
        }
        if let Some(id) = self.resolve_branch(spec)? {
            return Ok(Some(id));
        }
        if Self::is_hex64(spec) {
            return Ok(Some(spec.parse().map_err(|_| Error::MalformedRef(spec.to_owned()))?));
        }
        Ok(None)
    }
}
