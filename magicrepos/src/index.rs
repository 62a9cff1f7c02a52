use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::hash::{hash_bytes, Digest, DIGEST_SIZE};

const MAGIC: &[u8; 4] = b"MRIX";
const VERSION: u32 = 1;
/// fixed-size portion of an entry: mtime_s(8) + mtime_ns(4) + size(4) +
/// digest(32) + flags(2) + path_len(2)
const ENTRY_HEADER_LEN: usize = 8 + 4 + 4 + DIGEST_SIZE + 2 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub mtime_s: u64,
    pub mtime_ns: u32,
    pub size: u32,
    pub digest: Digest,
    pub path: String,
}

impl IndexEntry {
    fn flags(&self) -> u16 {
        self.path.len().min(0xFFF) as u16
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.mtime_s.to_be_bytes());
        out.extend_from_slice(&self.mtime_ns.to_be_bytes());
        out.extend_from_slice(&self.size.to_be_bytes());
        out.extend_from_slice(self.digest.as_bytes());
        out.extend_from_slice(&self.flags().to_be_bytes());
        let path_bytes = self.path.as_bytes();
        out.extend_from_slice(&(path_bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(path_bytes);

        let entry_len = ENTRY_HEADER_LEN + path_bytes.len();
        let pad = (8 - entry_len % 8) % 8;
        out.resize(out.len() + pad, 0);
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self> {
        let start = *pos;
        if buf.len() < start + ENTRY_HEADER_LEN {
            return Err(Error::CorruptIndex("truncated index entry header".into()));
        }
        let mtime_s = u64::from_be_bytes(buf[start..start + 8].try_into().unwrap());
        let mtime_ns = u32::from_be_bytes(buf[start + 8..start + 12].try_into().unwrap());
        let size = u32::from_be_bytes(buf[start + 12..start + 16].try_into().unwrap());
        let digest_start = start + 16;
        let digest_end = digest_start + DIGEST_SIZE;
        let mut digest_bytes = [0u8; DIGEST_SIZE];
        digest_bytes.copy_from_slice(&buf[digest_start..digest_end]);
        let digest = Digest::new(digest_bytes);
        let _flags = u16::from_be_bytes(buf[digest_end..digest_end + 2].try_into().unwrap());
        let path_len =
            u16::from_be_bytes(buf[digest_end + 2..digest_end + 4].try_into().unwrap()) as usize;

        let path_start = digest_end + 4;
        let path_end = path_start + path_len;
        if buf.len() < path_end {
            return Err(Error::CorruptIndex("truncated index entry path".into()));
        }
        let path = std::str::from_utf8(&buf[path_start..path_end])
            .map_err(|_| Error::CorruptIndex("index entry path is not utf8".into()))?
            .to_owned();

        let entry_len = ENTRY_HEADER_LEN + path_len;
        let pad = (8 - entry_len % 8) % 8;
        *pos = path_end + pad;
        Ok(Self { mtime_s, mtime_ns, size, digest, path })
    }
}

/// The staging index: a binary, checksum-protected snapshot of the next
/// commit's tree. Entries are kept in a `BTreeMap` keyed by path so ordinal
/// ordering and path uniqueness come for free, with no merge-stage
/// dimension since merging is out of scope here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// replaces any existing entry with the same path, else inserts
    /// preserving ascending ordinal order
    pub fn put(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        self.entries.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// entries in ascending ordinal path order
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let buf = fs::read(path)?;
        if buf.len() < 4 + 4 + 4 + DIGEST_SIZE {
            return Err(Error::CorruptIndex("truncated index file".into()));
        }

        let (body, footer) = buf.split_at(buf.len() - DIGEST_SIZE);
        let expected = hash_bytes(body);
        let mut actual_bytes = [0u8; DIGEST_SIZE];
        actual_bytes.copy_from_slice(footer);
        let actual = Digest::new(actual_bytes);
        if actual != expected {
            return Err(Error::CorruptIndex("checksum mismatch".into()));
        }

        if &body[0..4] != MAGIC {
            return Err(Error::CorruptIndex("bad magic".into()));
        }
        let version = u32::from_be_bytes(body[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(Error::CorruptIndex(format!("unsupported index version {version}")));
        }
        let count = u32::from_be_bytes(body[8..12].try_into().unwrap());

        let mut pos = 12;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let entry = IndexEntry::decode(body, &mut pos)?;
            if entries.insert(entry.path.clone(), entry).is_some() {
                return Err(Error::CorruptIndex("duplicate path in index".into()));
            }
        }
        Ok(Self { entries })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_be_bytes());
        buf.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in self.entries.values() {
            entry.encode(&mut buf);
        }
        let checksum = hash_bytes(&buf);
        buf.extend_from_slice(checksum.as_bytes());

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &buf)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
