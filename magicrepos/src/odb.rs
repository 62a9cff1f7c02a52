use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::obj::{self, Object, ObjType};

/// The loose object store: `{root}/objects/{prefix}/{suffix}`.
///
/// There is no packed-object backend and no multi-backend search loop —
/// delta-compressed packs are out of scope, so every object is loose.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self { objects_dir: objects_dir.into() }
    }

    fn path_for(&self, id: Digest) -> PathBuf {
        self.objects_dir.join(id.prefix()).join(id.suffix())
    }

    pub fn exists(&self, id: Digest) -> bool {
        self.path_for(id).is_file()
    }

    /// Read the raw (compressed) bytes stored for `id`.
    pub fn read_raw(&self, id: Digest) -> Result<Vec<u8>> {
        fs::read(self.path_for(id)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(format!("object `{id}`")),
            _ => Error::Io(e),
        })
    }

    /// Write the raw (already-compressed) bytes for `id`.
    ///
    /// Idempotent: if the destination already exists the call is a no-op
    /// and does not re-verify content (content addressing means same key
    /// implies same bytes). Writes go to a sibling temp file
    /// first, then are renamed into place, so a concurrent reader never
    /// observes a partially-written object.
    pub fn write_raw(&self, id: Digest, compressed: &[u8]) -> Result<()> {
        if self.exists(id) {
            trace!(%id, "object already present, skipping write");
            return Ok(());
        }
        let dest = self.path_for(id);
        let dir = dest.parent().expect("object path always has a prefix directory");
        fs::create_dir_all(dir)?;

        let tmp = dir.join(format!(".{}.tmp", id.suffix()));
        fs::write(&tmp, compressed)?;
        fs::rename(&tmp, &dest)?;
        trace!(%id, "wrote object");
        Ok(())
    }

    /// Read and fully decode an object.
    pub fn read(&self, id: Digest) -> Result<Object> {
        let raw = self.read_raw(id)?;
        let (obj_type, content) = obj::deserialize(&raw)?;
        Ok(match obj_type {
            ObjType::Blob => Object::Blob(obj::Blob::new(content)),
            ObjType::Tree => Object::Tree(obj::Tree::decode(&content)?),
            ObjType::Commit => Object::Commit(obj::Commit::decode(&content)?),
        })
    }

    /// Encode, compress, and store `content` under `obj_type`, returning its
    /// digest.
    pub fn write(&self, obj_type: ObjType, content: &[u8]) -> Result<Digest> {
        let (id, compressed) = obj::serialize(obj_type, content);
        self.write_raw(id, &compressed)?;
        Ok(id)
    }

    pub fn write_blob(&self, bytes: &[u8]) -> Result<Digest> {
        self.write(ObjType::Blob, bytes)
    }

    pub fn write_tree(&self, tree: &obj::Tree) -> Result<Digest> {
        self.write(ObjType::Tree, &tree.encode())
    }

    pub fn write_commit(&self, commit: &obj::Commit) -> Result<Digest> {
        self.write(ObjType::Commit, &commit.encode())
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let id = store.write_blob(b"hello").unwrap();
        assert!(store.exists(id));
        let obj = store.read(id).unwrap();
        assert_eq!(obj.into_blob().unwrap().content(), b"hello");
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let id = store.write_blob(b"same content").unwrap();
        store.write_blob(b"same content").unwrap();
        let expected_path = dir.path().join(id.prefix()).join(id.suffix());
        assert!(expected_path.is_file());
        assert_eq!(store.read_raw(id).unwrap(), fs::read(&expected_path).unwrap());
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let id = crate::hash::hash_bytes(b"nonexistent");
        assert!(matches!(store.read_raw(id), Err(Error::NotFound(_))));
    }
}
