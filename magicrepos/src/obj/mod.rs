mod blob;
mod codec;
mod commit;
mod tree;

pub use blob::Blob;
pub use codec::{compute_id, deserialize, serialize};
pub use commit::Commit;
pub use tree::{FileMode, Tree, TreeEntry};

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;
use crate::hash::Digest;

/// The discriminant shared by blob/tree/commit objects.
///
/// The three kinds are small enough that a plain closed match over the type
/// discriminant suffices without a subclassing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjType {
    Blob,
    Tree,
    Commit,
}

impl Display for ObjType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        })
    }
}

impl FromStr for ObjType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            _ => Err(Error::MalformedObject(format!("unknown object type `{s}`"))),
        }
    }
}

/// Fully decoded object content paired with its type, as handed back by the
/// object store after a round trip through the codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn obj_type(&self) -> ObjType {
        match self {
            Self::Blob(_) => ObjType::Blob,
            Self::Tree(_) => ObjType::Tree,
            Self::Commit(_) => ObjType::Commit,
        }
    }

    pub fn into_blob(self) -> Option<Blob> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_commit(self) -> Option<Commit> {
        match self {
            Self::Commit(c) => Some(c),
            _ => None,
        }
    }
}
