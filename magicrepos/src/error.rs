use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Stable, matchable error identifiers for the engine.
///
/// Every error the crate can raise is a case callers may need to match on,
/// so this is a plain closed enum rather than an opaque, downcastable one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not a magicrepos repository (or any parent up to the filesystem root)")]
    NotARepository,

    #[error("repository already exists at `{0}`")]
    AlreadyExists(String),

    #[error("nothing to commit (index is empty)")]
    EmptyCommit,

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed ref: {0}")]
    MalformedRef(String),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("malformed remote url: {0}")]
    MalformedUrl(String),

    /// facade-level precondition violations not covered by a more specific
    /// variant above (branching from an unborn HEAD, deleting the checked
    /// out branch, and similar state-dependent rules).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
