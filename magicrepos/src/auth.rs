/// The authorization oracle a server session consults before dispatching a
/// push/pull/pr request. Authentication itself (verifying the caller
/// really is `user`) is the transport's job, not this crate's; by the time
/// the oracle is asked, the identity string is already trusted.
pub trait AuthProvider {
    fn can_read(&self, user: &str) -> bool;
    fn can_write(&self, user: &str, owner: &str, repo: &str) -> bool;
}

/// Grants every caller read and write access to everything. Useful for
/// tests and single-tenant deployments that handle authorization upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthProvider for AllowAll {
    fn can_read(&self, _user: &str) -> bool {
        true
    }

    fn can_write(&self, _user: &str, _owner: &str, _repo: &str) -> bool {
        true
    }
}

/// The minimal real policy the spec calls out: any authenticated user may
/// read, but a user may only write to a namespace they themselves own.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleOwnerAuth;

impl AuthProvider for SingleOwnerAuth {
    fn can_read(&self, _user: &str) -> bool {
        true
    }

    fn can_write(&self, user: &str, owner: &str, _repo: &str) -> bool {
        user == owner
    }
}
