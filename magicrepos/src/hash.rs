use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

pub const DIGEST_SIZE: usize = 32;

/// The 32-byte SHA-256 identity of an object.
///
/// Rendered externally as 64 lowercase hex characters, split for storage
/// purposes into a 2-char prefix and a 62-char suffix (`objects/{prefix}/{suffix}`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// the distinguished zero digest; never a valid stored object
    pub const ZERO: Self = Self([0; DIGEST_SIZE]);

    #[inline]
    pub fn new(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// the 2-char storage prefix
    pub fn prefix(&self) -> String {
        self.to_hex()[..2].to_owned()
    }

    /// the 62-char storage suffix
    pub fn suffix(&self) -> String {
        self.to_hex()[2..].to_owned()
    }
}

/// hash the canonical bytes of an object (header + content already framed)
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hasher.finalize().into())
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim_end();
        if s.len() != DIGEST_SIZE * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::MalformedRef(format!("invalid hex digest `{s}`")));
        }
        let mut bytes = [0u8; DIGEST_SIZE];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::MalformedRef(format!("invalid hex digest `{s}`: {e}")))?;
        Ok(Self(bytes))
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_round_trips_through_hex() {
        let d = hash_bytes(b"blob 13\x00Hello, World!");
        let s = d.to_hex();
        assert_eq!(s.len(), 64);
        assert_eq!(Digest::from_str(&s).unwrap(), d);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(hash_bytes(b"abc"), hash_bytes(b"abc"));
        assert_ne!(hash_bytes(b"abc"), hash_bytes(b"abd"));
    }

    #[test]
    fn prefix_suffix_split() {
        let d = hash_bytes(b"blob 13\x00Hello, World!");
        let hex = d.to_hex();
        assert_eq!(d.prefix().len(), 2);
        assert_eq!(d.suffix().len(), 62);
        assert_eq!(format!("{}{}", d.prefix(), d.suffix()), hex);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Digest::from_str("not-hex").is_err());
        assert!(Digest::from_str("abcd").is_err());
    }
}
