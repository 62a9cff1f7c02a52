use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use magicrepos::error::{Error, Result};
use magicrepos::hash::{Digest, DIGEST_SIZE};

/// The one-byte type tag of every wire message. Values are fixed literal
/// codes so a peer that only logs the raw byte still sees the same number
/// this enum round-trips to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    NegotiateRequest = 1,
    NegotiateResponse = 2,
    RefAdvertisement = 3,
    RefUpdate = 4,
    RefWanted = 5,
    PackData = 6,
    PackComplete = 7,
    Ok = 8,
    Error = 9,
}

impl MessageType {
    fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            1 => Self::NegotiateRequest,
            2 => Self::NegotiateResponse,
            3 => Self::RefAdvertisement,
            4 => Self::RefUpdate,
            5 => Self::RefWanted,
            6 => Self::PackData,
            7 => Self::PackComplete,
            8 => Self::Ok,
            9 => Self::Error,
            other => return Err(Error::ProtocolViolation(format!("unknown message type byte {other}"))),
        })
    }
}

/// Maps an I/O error from a frame read/write to a fatal `UnexpectedEof`: a
/// short read that returns zero bytes before the frame is fully consumed
/// is never recoverable mid-session.
fn map_io(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEof
    } else {
        Error::Io(e)
    }
}

/// Extension trait over any `AsyncRead`. `length` on the wire is the
/// payload length alone; the type byte is read separately immediately
/// after it.
#[async_trait]
pub trait ProtocolRead: AsyncRead + Unpin + Send {
    async fn recv_message(&mut self) -> Result<(MessageType, Vec<u8>)> {
        let mut len_buf = [0u8; 4];
        self.read_exact(&mut len_buf).await.map_err(map_io)?;
        let len = u32::from_be_bytes(len_buf) as usize;

        let mut type_buf = [0u8; 1];
        self.read_exact(&mut type_buf).await.map_err(map_io)?;
        let msg_type = MessageType::from_byte(type_buf[0])?;

        let mut payload = vec![0u8; len];
        self.read_exact(&mut payload).await.map_err(map_io)?;
        Ok((msg_type, payload))
    }
}

impl<R: AsyncRead + Unpin + Send> ProtocolRead for R {}

/// Extension trait over any `AsyncWrite`.
#[async_trait]
pub trait ProtocolWrite: AsyncWrite + Unpin + Send {
    async fn send_message(&mut self, msg_type: MessageType, payload: &[u8]) -> Result<()> {
        self.write_all(&(payload.len() as u32).to_be_bytes()).await.map_err(Error::Io)?;
        self.write_all(&[msg_type as u8]).await.map_err(Error::Io)?;
        self.write_all(payload).await.map_err(Error::Io)?;
        self.flush().await.map_err(Error::Io)
    }
}

impl<W: AsyncWrite + Unpin + Send> ProtocolWrite for W {}

/// `"{op}\0{owner}\0{repo}"`.
pub fn encode_negotiate_request(op: &str, owner: &str, repo: &str) -> Vec<u8> {
    format!("{op}\0{owner}\0{repo}").into_bytes()
}

/// Fails if the payload has fewer than three NUL-separated fields.
pub fn decode_negotiate_request(payload: &[u8]) -> Result<(String, String, String)> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| Error::ProtocolViolation("negotiate request is not utf8".into()))?;
    let mut fields = text.splitn(3, '\0');
    let op = fields.next();
    let owner = fields.next();
    let repo = fields.next();
    match (op, owner, repo) {
        (Some(op), Some(owner), Some(repo)) => Ok((op.to_owned(), owner.to_owned(), repo.to_owned())),
        _ => Err(Error::ProtocolViolation("negotiate request missing fields".into())),
    }
}

pub fn encode_ref_entries(entries: &[(String, Digest)]) -> Vec<u8> {
    let mut out = String::new();
    for (name, id) in entries {
        out.push_str(&format!("{name} {id}\n"));
    }
    out.into_bytes()
}

pub fn decode_ref_entries(payload: &[u8]) -> Result<Vec<(String, Digest)>> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| Error::ProtocolViolation("ref advertisement is not utf8".into()))?;
    text.lines()
        .map(|line| {
            let (name, hex) = line
                .rsplit_once(' ')
                .ok_or_else(|| Error::ProtocolViolation(format!("malformed ref advertisement line `{line}`")))?;
            Ok((name.to_owned(), hex.parse()?))
        })
        .collect()
}

pub fn encode_ref_update(refname: &str, id: Digest) -> Vec<u8> {
    format!("{refname}\0{id}").into_bytes()
}

pub fn decode_ref_update(payload: &[u8]) -> Result<(String, Digest)> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| Error::ProtocolViolation("ref update is not utf8".into()))?;
    let (refname, hex) = text
        .split_once('\0')
        .ok_or_else(|| Error::ProtocolViolation("ref update missing NUL separator".into()))?;
    Ok((refname.to_owned(), hex.parse()?))
}

/// Newline-separated ref names; an empty payload means nothing is wanted.
pub fn encode_ref_wanted(names: &[String]) -> Vec<u8> {
    names.join("\n").into_bytes()
}

pub fn decode_ref_wanted(payload: &[u8]) -> Result<Vec<String>> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    let text = std::str::from_utf8(payload)
        .map_err(|_| Error::ProtocolViolation("ref wanted list is not utf8".into()))?;
    Ok(text.lines().map(str::to_owned).collect())
}

/// A 64-char ASCII hex id immediately followed by the compressed object bytes.
pub fn encode_pack_data(id: Digest, compressed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(DIGEST_SIZE * 2 + compressed.len());
    out.extend_from_slice(id.to_hex().as_bytes());
    out.extend_from_slice(compressed);
    out
}

pub fn decode_pack_data(payload: &[u8]) -> Result<(Digest, &[u8])> {
    if payload.len() < DIGEST_SIZE * 2 {
        return Err(Error::ProtocolViolation("pack data frame too short for an id".into()));
    }
    let (hex, rest) = payload.split_at(DIGEST_SIZE * 2);
    let hex = std::str::from_utf8(hex)
        .map_err(|_| Error::ProtocolViolation("pack data id is not utf8".into()))?;
    Ok((hex.parse()?, rest))
}
