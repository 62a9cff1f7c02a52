//! The framed wire protocol, reachability walk, and server/client session
//! state machines that move objects between two `magicrepos` engines.
//! The bare, working-tree-less repository model the server
//! side operates on lives here too, since nothing outside a session needs it.

pub mod bare_repo;
pub mod frame;
pub mod reachability;
pub mod remote_url;
pub mod session;

pub use bare_repo::BareRepo;
pub use frame::{MessageType, ProtocolRead, ProtocolWrite};
pub use reachability::{collect, collect_all};
pub use remote_url::RemoteUrl;
pub use session::{pull, push, serve};
