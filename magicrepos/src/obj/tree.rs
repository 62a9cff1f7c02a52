use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};
use crate::hash::{Digest, DIGEST_SIZE};

/// The mode of a tree entry. Only these four values are legal; anything
/// else is a malformed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Regular,
    Executable,
    Directory,
    Symlink,
}

impl FileMode {
    pub fn as_octal_str(self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Executable => "100755",
            Self::Directory => "40000",
            Self::Symlink => "120000",
        }
    }

    pub fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    fn from_octal_str(s: &str) -> Result<Self> {
        match s {
            "100644" => Ok(Self::Regular),
            "100755" => Ok(Self::Executable),
            "40000" => Ok(Self::Directory),
            "120000" => Ok(Self::Symlink),
            _ => Err(Error::MalformedObject(format!("invalid tree entry mode `{s}`"))),
        }
    }
}

impl Display for FileMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_octal_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub digest: Digest,
}

/// A tree is a sorted list of named entries, each pointing at a blob (file)
/// or a subtree (directory).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    /// always kept sorted by `name` in ascending ordinal order
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a tree from entries, sorting them by name as the canonical
    /// encoding requires. Panics (a programmer error, not a user error) if
    /// two entries share a name: the index that feeds tree construction
    /// guarantees path uniqueness, so a collision here means a caller
    /// bypassed that guarantee.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug_assert!(
            entries.windows(2).all(|w| w[0].name != w[1].name),
            "tree entries must have unique names"
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for entry in &self.entries {
            buf.extend_from_slice(format!("{} {}", entry.mode, entry.name).as_bytes());
            buf.push(0);
            buf.extend_from_slice(entry.digest.as_bytes());
        }
        buf
    }

    pub fn decode(content: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut rest = content;
        while !rest.is_empty() {
            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::MalformedObject("truncated tree entry header".into()))?;
            let header = std::str::from_utf8(&rest[..nul])
                .map_err(|_| Error::MalformedObject("tree entry header is not utf8".into()))?;
            let (mode_tok, name) = header
                .split_once(' ')
                .ok_or_else(|| Error::MalformedObject(format!("tree entry `{header}` missing space")))?;
            let mode = FileMode::from_octal_str(mode_tok)?;

            let digest_start = nul + 1;
            let digest_end = digest_start + DIGEST_SIZE;
            if digest_end > rest.len() {
                return Err(Error::MalformedObject("truncated tree entry digest".into()));
            }
            let mut bytes = [0u8; DIGEST_SIZE];
            bytes.copy_from_slice(&rest[digest_start..digest_end]);

            entries.push(TreeEntry { mode, name: name.to_owned(), digest: Digest::new(bytes) });
            rest = &rest[digest_end..];
        }
        Ok(Self { entries })
    }
}
