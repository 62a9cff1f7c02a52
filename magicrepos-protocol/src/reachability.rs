use std::collections::HashSet;

use magicrepos::error::Result;
use magicrepos::hash::Digest;
use magicrepos::obj::Object;
use magicrepos::odb::ObjectStore;

/// Recursively collects the set of objects reachable from `id`: a commit's
/// tree and parents, a tree's entries, nothing further for a blob. Dispatch
/// is a closed match over the object type rather than virtual dispatch.
///
/// An object missing from the local store silently terminates that branch
/// of the walk — this is what lets a push/pull work on a partial or
/// first-time repository rather than requiring full history up front.
pub fn collect(store: &ObjectStore, id: Digest, set: &mut HashSet<Digest>) -> Result<()> {
    if set.contains(&id) {
        return Ok(());
    }
    if !store.exists(id) {
        return Ok(());
    }
    set.insert(id);

    match store.read(id)? {
        Object::Blob(_) => {}
        Object::Tree(tree) => {
            for entry in tree.entries() {
                collect(store, entry.digest, set)?;
            }
        }
        Object::Commit(commit) => {
            collect(store, commit.tree, set)?;
            for parent in &commit.parents {
                collect(store, *parent, set)?;
            }
        }
    }
    Ok(())
}

/// Convenience wrapper collecting the closure of several roots at once —
/// used when sending every local branch tip in a push.
pub fn collect_all(store: &ObjectStore, roots: impl IntoIterator<Item = Digest>) -> Result<HashSet<Digest>> {
    let mut set = HashSet::new();
    for root in roots {
        collect(store, root, &mut set)?;
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use magicrepos::obj::{Commit, FileMode, Tree, TreeEntry};
    use magicrepos::signature::Signature;

    fn sig() -> Signature {
        Signature { name: "A".into(), email: "a@b.com".into(), timestamp: 0, offset_minutes: 0 }
    }

    #[test]
    fn collects_commit_tree_and_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());

        let blob_id = store.write_blob(b"hello").unwrap();
        let tree = Tree::new(vec![TreeEntry { mode: FileMode::Regular, name: "a.txt".into(), digest: blob_id }]);
        let tree_id = store.write_tree(&tree).unwrap();
        let commit = Commit { tree: tree_id, parents: vec![], author: sig(), committer: sig(), message: "c".into() };
        let commit_id = store.write_commit(&commit).unwrap();

        let mut set = HashSet::new();
        collect(&store, commit_id, &mut set).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&commit_id));
        assert!(set.contains(&tree_id));
        assert!(set.contains(&blob_id));
    }

    #[test]
    fn missing_object_terminates_branch_silently() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let ghost = magicrepos::hash::hash_bytes(b"never written");

        let mut set = HashSet::new();
        collect(&store, ghost, &mut set).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn revisiting_same_id_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let blob_id = store.write_blob(b"x").unwrap();

        let mut set = HashSet::new();
        collect(&store, blob_id, &mut set).unwrap();
        collect(&store, blob_id, &mut set).unwrap();
        assert_eq!(set.len(), 1);
    }
}
