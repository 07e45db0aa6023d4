use std::{fs::File, ops::Deref, path::Path, sync::Arc};

use memmap2::Mmap;

use crate::FlatError;

/// Random-access bytes backing an indexed-binary format.
///
/// File inputs are memory-mapped so that only the index nodes and data blocks
/// actually visited are paged in. Cloning is cheap.
#[derive(Clone)]
pub enum ByteStore {
    Mapped(Arc<Mmap>),
    Owned(Arc<[u8]>),
}
impl ByteStore {
    pub fn map<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(Arc::new(map)))
    }

    /// Bounds-checked slice of `len` bytes at `offset`.
    pub fn slice(&self, offset: usize, len: usize, what: &'static str) -> crate::Result<&[u8]> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.len())
            .map(|end| &self[offset..end])
            .ok_or(FlatError::TruncatedBlock { what, offset })
    }
}
impl Deref for ByteStore {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => &map[..],
            Self::Owned(bytes) => &bytes[..],
        }
    }
}
impl From<Vec<u8>> for ByteStore {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes.into())
    }
}
