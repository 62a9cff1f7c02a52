use std::path::Path;

/// The ignore oracle the scanner consults for every path it visits.
///
/// Pattern parsing (`.gitignore` syntax and friends) is explicitly out of
/// scope for this crate; callers supply their own implementation. The only
/// contract the scanner relies on is that the control directory, and
/// everything under it, is always reported as ignored.
pub trait IgnorePredicate {
    fn is_ignored(&self, relative_path: &str, is_directory: bool) -> bool;
}

/// An oracle that never ignores anything except the control directory
/// itself. Useful for tests and as a baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIgnore {
    control_dir_name: &'static str,
}

impl NullIgnore {
    pub fn new(control_dir_name: &'static str) -> Self {
        Self { control_dir_name }
    }
}

impl IgnorePredicate for NullIgnore {
    fn is_ignored(&self, relative_path: &str, _is_directory: bool) -> bool {
        let control = if self.control_dir_name.is_empty() { ".magicrepos" } else { self.control_dir_name };
        relative_path == control || relative_path.starts_with(&format!("{control}/"))
    }
}

/// A small fixed-set oracle, handy in tests that need a couple of paths
/// ignored without pulling in a real pattern matcher.
#[derive(Debug, Clone, Default)]
pub struct FixedIgnore {
    paths: Vec<String>,
}

impl FixedIgnore {
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }
}

impl IgnorePredicate for FixedIgnore {
    fn is_ignored(&self, relative_path: &str, _is_directory: bool) -> bool {
        relative_path == ".magicrepos"
            || relative_path.starts_with(".magicrepos/")
            || self.paths.iter().any(|p| p == relative_path)
    }
}

pub fn control_dir_path(relative_path: impl AsRef<Path>) -> bool {
    let p = relative_path.as_ref();
    p.components().next().map(|c| c.as_os_str() == ".magicrepos").unwrap_or(false)
}
