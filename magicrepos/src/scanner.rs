use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::ignore::IgnorePredicate;

/// Enumerates every non-ignored, non-symlink file under `root`, as paths
/// relative to `root` with `/` separators, in ascending ordinal order.
///
/// Descent is depth-first in sorted order at each level; a directory whose
/// relative path the oracle reports ignored is pruned entirely rather than
/// descended into, in place of a `.gitignore`-aware matcher.
pub fn list_files(root: &Path, ignore: &dyn IgnorePredicate) -> Result<Vec<String>> {
    let mut out = Vec::new();
    walk(root, "", ignore, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(root: &Path, rel_prefix: &str, ignore: &dyn IgnorePredicate, out: &mut Vec<String>) -> Result<()> {
    let dir = if rel_prefix.is_empty() { root.to_path_buf() } else { root.join(rel_prefix) };

    let mut children: Vec<_> = fs::read_dir(&dir)?.collect::<std::io::Result<Vec<_>>>()?;
    children.sort_by_key(|e| e.file_name());

    for entry in children {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        let rel = if rel_prefix.is_empty() { name.to_string() } else { format!("{rel_prefix}/{name}") };

        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }

        let is_dir = file_type.is_dir();
        if ignore.is_ignored(&rel, is_dir) {
            continue;
        }

        if is_dir {
            walk(root, &rel, ignore, out)?;
        } else {
            out.push(rel);
        }
    }
    Ok(())
}
