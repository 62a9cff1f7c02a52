use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use magicrepos::auth::AuthProvider;
use magicrepos::error::{Error, Result};
use magicrepos::hash::Digest;
use magicrepos::repo::Repository;

use crate::bare_repo::BareRepo;
use crate::frame::{
    decode_negotiate_request, decode_pack_data, decode_ref_entries, decode_ref_update, decode_ref_wanted,
    encode_negotiate_request, encode_pack_data, encode_ref_entries, encode_ref_update, encode_ref_wanted,
    MessageType, ProtocolRead, ProtocolWrite,
};
use crate::reachability::collect;

fn ref_advertisement_entries(bare: &BareRepo) -> Result<Vec<(String, Digest)>> {
    let mut entries = Vec::new();
    if let Some(head_id) = bare.refs().resolve_head()? {
        entries.push(("HEAD".to_owned(), head_id));
    }
    for name in bare.refs().list_branches()? {
        if let Some(id) = bare.refs().resolve_branch(&name)? {
            entries.push((format!("refs/heads/{name}"), id));
        }
    }
    Ok(entries)
}

/// Drives the server side of exactly one session: negotiate, authorize,
/// select/create the repository, then dispatch to the operation-specific
/// loop. A session is strictly sequential — no pipelining, no retries.
pub async fn serve<S>(
    stream: &mut S,
    base_dir: &Path,
    identity: &str,
    auth: &dyn AuthProvider,
) -> Result<()>
where
    S: ProtocolRead + ProtocolWrite,
{
    let (msg_type, payload) = stream.recv_message().await?;
    if msg_type != MessageType::NegotiateRequest {
        stream.send_message(MessageType::Error, b"expected NegotiateRequest").await?;
        return Err(Error::ProtocolViolation("first message was not NegotiateRequest".into()));
    }
    let (op, owner, repo) = match decode_negotiate_request(&payload) {
        Ok(fields) => fields,
        Err(e) => {
            stream.send_message(MessageType::Error, e.to_string().as_bytes()).await?;
            return Err(e);
        }
    };

    let authorized = match op.as_str() {
        "push" => auth.can_write(identity, &owner, &repo),
        "pull" | "pr" => auth.can_read(identity),
        _ => false,
    };
    if !authorized {
        warn!(%identity, %owner, %repo, %op, "unauthorized session request");
        stream.send_message(MessageType::Error, b"unauthorized").await?;
        return Err(Error::Unauthorized(format!("{identity} cannot {op} {owner}/{repo}")));
    }

    let bare = if BareRepo::exists(base_dir, &owner, &repo) {
        BareRepo::open(base_dir, &owner, &repo)?
    } else if op == "push" {
        BareRepo::create(base_dir, &owner, &repo)?
    } else {
        stream.send_message(MessageType::Error, b"repository not found").await?;
        return Err(Error::NotARepository);
    };

    stream.send_message(MessageType::NegotiateResponse, b"v1").await?;
    info!(%identity, %owner, %repo, %op, "negotiated session");

    match op.as_str() {
        "push" => serve_push(stream, &bare).await,
        "pull" => serve_pull(stream, &bare).await,
        "pr" => {
            stream.send_message(MessageType::Error, b"pr is not part of the core session handler").await?;
            Err(Error::ProtocolViolation("pr dispatch is out of scope".into()))
        }
        other => {
            let msg = format!("unknown op `{other}`");
            stream.send_message(MessageType::Error, msg.as_bytes()).await?;
            Err(Error::ProtocolViolation(msg))
        }
    }
}

async fn serve_push<S: ProtocolRead + ProtocolWrite>(stream: &mut S, bare: &BareRepo) -> Result<()> {
    let entries = ref_advertisement_entries(bare)?;
    stream.send_message(MessageType::RefAdvertisement, &encode_ref_entries(&entries)).await?;

    let mut updates: Vec<(String, Digest)> = Vec::new();
    loop {
        let (msg_type, payload) = stream.recv_message().await?;
        match msg_type {
            MessageType::RefUpdate => updates.push(decode_ref_update(&payload)?),
            MessageType::PackData => {
                let (id, compressed) = decode_pack_data(&payload)?;
                // The embedded id is trusted as-is; nothing here verifies
                // sha256(decompress(compressed)) == id.
                bare.store().write_raw(id, compressed)?;
            }
            MessageType::PackComplete => break,
            _ => {
                stream.send_message(MessageType::Error, b"unexpected message during push").await?;
                return Err(Error::ProtocolViolation("unexpected message during push".into()));
            }
        }
    }

    // All ref updates are accumulated above before any is applied, so a
    // push either commits every update or (on an earlier protocol error)
    // none of them.
    for (refname, id) in &updates {
        bare.refs().write_ref(refname, *id)?;
    }

    stream.send_message(MessageType::Ok, b"push applied").await?;
    Ok(())
}

async fn serve_pull<S: ProtocolRead + ProtocolWrite>(stream: &mut S, bare: &BareRepo) -> Result<()> {
    let entries = ref_advertisement_entries(bare)?;
    stream.send_message(MessageType::RefAdvertisement, &encode_ref_entries(&entries)).await?;

    let (msg_type, payload) = stream.recv_message().await?;
    if msg_type != MessageType::RefWanted {
        stream.send_message(MessageType::Error, b"expected RefWanted").await?;
        return Err(Error::ProtocolViolation("expected RefWanted".into()));
    }
    let wanted = decode_ref_wanted(&payload)?;

    let mut to_send = HashSet::new();
    for name in &wanted {
        if let Some(id) = bare.refs().resolve(name)? {
            collect(bare.store(), id, &mut to_send)?;
        }
    }

    for id in &to_send {
        let compressed = bare.store().read_raw(*id)?;
        stream.send_message(MessageType::PackData, &encode_pack_data(*id, &compressed)).await?;
    }
    stream.send_message(MessageType::PackComplete, b"").await?;
    Ok(())
}

/// Client-side push: negotiate, read the remote's advertisement (not
/// subtracted from the send-set — this bandwidth inefficiency is
/// deliberate), send every local branch update and the full reachable
/// closure behind it, then expect `Ok`.
pub async fn push<S>(stream: &mut S, repo: &Repository, owner: &str, repo_name: &str) -> Result<()>
where
    S: ProtocolRead + ProtocolWrite,
{
    stream
        .send_message(MessageType::NegotiateRequest, &encode_negotiate_request("push", owner, repo_name))
        .await?;
    expect_negotiate_response(stream, Error::PushFailed).await?;

    let (msg_type, payload) = stream.recv_message().await?;
    if msg_type != MessageType::RefAdvertisement {
        return Err(Error::ProtocolViolation("expected RefAdvertisement".into()));
    }
    let _remote_refs = decode_ref_entries(&payload)?;

    let mut updates = Vec::new();
    let mut send_set = HashSet::new();
    for name in repo.list_branches()? {
        if let Some(id) = repo.refs().resolve_branch(&name)? {
            updates.push((format!("refs/heads/{name}"), id));
            collect(repo.store(), id, &mut send_set)?;
        }
    }

    for (refname, id) in &updates {
        stream.send_message(MessageType::RefUpdate, &encode_ref_update(refname, *id)).await?;
    }
    for id in &send_set {
        let compressed = repo.store().read_raw(*id)?;
        stream.send_message(MessageType::PackData, &encode_pack_data(*id, &compressed)).await?;
    }
    stream.send_message(MessageType::PackComplete, b"").await?;

    let (msg_type, payload) = stream.recv_message().await?;
    match msg_type {
        MessageType::Ok => Ok(()),
        MessageType::Error => Err(Error::PushFailed(String::from_utf8_lossy(&payload).into_owned())),
        _ => Err(Error::ProtocolViolation("expected Ok or Error after push".into())),
    }
}

/// Client-side pull: negotiate, request every advertised ref,
/// receive the pack, write `refs/remotes/{remote_name}/{branch}` for each
/// advertised branch, and return the advertised ref map.
pub async fn pull<S>(
    stream: &mut S,
    repo: &Repository,
    owner: &str,
    repo_name: &str,
    remote_name: &str,
) -> Result<Vec<(String, Digest)>>
where
    S: ProtocolRead + ProtocolWrite,
{
    stream
        .send_message(MessageType::NegotiateRequest, &encode_negotiate_request("pull", owner, repo_name))
        .await?;
    expect_negotiate_response(stream, Error::PullFailed).await?;

    let (msg_type, payload) = stream.recv_message().await?;
    if msg_type != MessageType::RefAdvertisement {
        return Err(Error::ProtocolViolation("expected RefAdvertisement".into()));
    }
    let advertised = decode_ref_entries(&payload)?;

    if advertised.is_empty() {
        stream.send_message(MessageType::RefWanted, &encode_ref_wanted(&[])).await?;
        let (msg_type, _) = stream.recv_message().await?;
        if msg_type != MessageType::PackComplete {
            return Err(Error::ProtocolViolation("expected PackComplete".into()));
        }
        return Ok(Vec::new());
    }

    let names: Vec<String> = advertised.iter().map(|(n, _)| n.clone()).collect();
    stream.send_message(MessageType::RefWanted, &encode_ref_wanted(&names)).await?;

    loop {
        let (msg_type, payload) = stream.recv_message().await?;
        match msg_type {
            MessageType::PackData => {
                let (id, compressed) = decode_pack_data(&payload)?;
                repo.store().write_raw(id, compressed)?;
            }
            MessageType::PackComplete => break,
            MessageType::Error => return Err(Error::PullFailed(String::from_utf8_lossy(&payload).into_owned())),
            _ => return Err(Error::ProtocolViolation("unexpected message during pull".into())),
        }
    }

    for (name, id) in &advertised {
        if let Some(branch) = name.strip_prefix("refs/heads/") {
            repo.refs().write_ref(&format!("refs/remotes/{remote_name}/{branch}"), *id)?;
        }
    }

    Ok(advertised)
}

async fn expect_negotiate_response<S: ProtocolRead>(
    stream: &mut S,
    as_fault: impl FnOnce(String) -> Error,
) -> Result<()> {
    let (msg_type, payload) = stream.recv_message().await?;
    match msg_type {
        MessageType::NegotiateResponse if payload == b"v1" => Ok(()),
        MessageType::NegotiateResponse => {
            Err(Error::ProtocolViolation(format!("unsupported protocol version `{}`", String::from_utf8_lossy(&payload))))
        }
        MessageType::Error => Err(as_fault(String::from_utf8_lossy(&payload).into_owned())),
        _ => Err(Error::ProtocolViolation("expected NegotiateResponse".into())),
    }
}
