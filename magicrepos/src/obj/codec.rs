use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::ObjType;
use crate::error::{Error, Result};
use crate::hash::{hash_bytes, Digest};

/// Builds the canonical `"{type} {len}\0{content}"` framing and hashes it.
fn canonical_bytes(obj_type: ObjType, content: &[u8]) -> Vec<u8> {
    let header = format!("{obj_type} {}", content.len());
    let mut bytes = Vec::with_capacity(header.len() + 1 + content.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(content);
    bytes
}

/// The digest of an object is a pure function of its type and content.
pub fn compute_id(obj_type: ObjType, content: &[u8]) -> Digest {
    hash_bytes(canonical_bytes(obj_type, content))
}

/// Frame `content` under `obj_type`'s canonical header and DEFLATE-compress
/// it (raw deflate, no zlib wrapper), returning the digest of the
/// *uncompressed* canonical bytes alongside the compressed bytes ready to be
/// handed to the object store.
pub fn serialize(obj_type: ObjType, content: &[u8]) -> (Digest, Vec<u8>) {
    let canonical = canonical_bytes(obj_type, content);
    let id = hash_bytes(&canonical);
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    // writes to a Vec<u8> never fail
    encoder.write_all(&canonical).expect("in-memory deflate write cannot fail");
    let compressed = encoder.finish().expect("in-memory deflate finish cannot fail");
    (id, compressed)
}

/// Inverse of [`serialize`]: decompress, then split the canonical header
/// from its content.
pub fn deserialize(compressed: &[u8]) -> Result<(ObjType, Vec<u8>)> {
    let mut decoder = DeflateDecoder::new(compressed);
    let mut canonical = Vec::new();
    decoder
        .read_to_end(&mut canonical)
        .map_err(|e| Error::MalformedObject(format!("decompression failed: {e}")))?;

    let nul = canonical
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::MalformedObject("missing NUL header separator".into()))?;
    let header = std::str::from_utf8(&canonical[..nul])
        .map_err(|_| Error::MalformedObject("header is not valid utf8".into()))?;
    let (type_tok, size_tok) = header
        .split_once(' ')
        .ok_or_else(|| Error::MalformedObject(format!("header `{header}` missing space")))?;
    let obj_type: ObjType = type_tok.parse()?;
    let size: usize = size_tok
        .parse()
        .map_err(|_| Error::MalformedObject(format!("invalid size token `{size_tok}`")))?;

    let content = &canonical[nul + 1..];
    if size > content.len() {
        return Err(Error::MalformedObject(format!(
            "declared length {size} exceeds available content {}",
            content.len()
        )));
    }
    Ok((obj_type, content[..size].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_digest_is_stable() {
        let content = b"Hello, World!";
        assert_eq!(content.len(), 13);
        let id = compute_id(ObjType::Blob, content);
        assert_eq!(id.to_hex().len(), 64);
    }

    #[test]
    fn serialize_then_deserialize_is_identity() {
        let content = b"tree contents go here".to_vec();
        let (id, compressed) = serialize(ObjType::Tree, &content);
        let (ty, decoded) = deserialize(&compressed).unwrap();
        assert_eq!(ty, ObjType::Tree);
        assert_eq!(decoded, content);
        assert_eq!(compute_id(ty, &decoded), id);
    }

    #[test]
    fn rejects_missing_nul() {
        let bogus = {
            let mut e = DeflateEncoder::new(Vec::new(), Compression::default());
            e.write_all(b"blob 13 no nul here").unwrap();
            e.finish().unwrap()
        };
        assert!(matches!(deserialize(&bogus), Err(Error::MalformedObject(_))));
    }

    #[test]
    fn rejects_unknown_type() {
        let bogus = {
            let mut e = DeflateEncoder::new(Vec::new(), Compression::default());
            e.write_all(b"widget 3\0abc").unwrap();
            e.finish().unwrap()
        };
        assert!(matches!(deserialize(&bogus), Err(Error::MalformedObject(_))));
    }

    #[test]
    fn rejects_truncated_content() {
        let bogus = {
            let mut e = DeflateEncoder::new(Vec::new(), Compression::default());
            e.write_all(b"blob 100\0short").unwrap();
            e.finish().unwrap()
        };
        assert!(matches!(deserialize(&bogus), Err(Error::MalformedObject(_))));
    }

    #[test]
    fn rejects_garbage_compression() {
        assert!(matches!(deserialize(b"not deflate data at all"), Err(Error::MalformedObject(_))));
    }
}
