use std::path::PathBuf;
use std::process::ExitCode;

use clap::Clap;
use tracing::{error, info};

use magicrepos::auth::SingleOwnerAuth;
use magicrepos_protocol::serve;

/// The thin remote-shell binary spawned over an already-authenticated
/// transport. It owns nothing beyond a base
/// directory of bare repositories and the caller's already-verified
/// identity; negotiation, dispatch, and authorization are all
/// `magicrepos-protocol`'s job.
#[derive(Clap, Debug)]
#[clap(author = "magicrepos")]
struct Opts {
    /// Root directory under which `{owner}/{repo}.mr` bare repositories live.
    #[clap(long)]
    base_dir: PathBuf,

    /// The identity the transport already authenticated the caller as.
    #[clap(long)]
    identity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let mut io = tokio::io::join(tokio::io::stdin(), tokio::io::stdout());
    let auth = SingleOwnerAuth;

    match serve(&mut io, &opts.base_dir, &opts.identity, &auth).await {
        Ok(()) => {
            info!(identity = %opts.identity, "session completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(identity = %opts.identity, error = %e, "session terminated");
            ExitCode::FAILURE
        }
    }
}
