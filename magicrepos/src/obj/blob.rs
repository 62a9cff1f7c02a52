/// A blob is just the raw bytes of a file; there is nothing to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn content(&self) -> &[u8] {
        &self.bytes
    }
}
