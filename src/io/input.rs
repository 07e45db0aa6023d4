//! Input acquisition for format plugins.
//!
//! Text formats open their input through [`Input::into_text_reader`], which
//! transparently decompresses gzip/bzip2/xz/zstd streams when the `niffler`
//! feature is enabled. Indexed-binary formats need random access and use
//! [`Input::into_bytes`] instead.

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader, Cursor, Read},
    path::{Path, PathBuf},
};

use super::ByteStore;

const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;
const SNIFF_LEN: usize = 5;

pub type BoxedReader = Box<dyn Read + Send>;
pub type BoxedBufReader = Box<dyn BufRead + Send>;

/// Where a parser reads its blocks from.
pub enum Input {
    Path(PathBuf),
    Stdin,
    Reader(BoxedReader),
    Bytes(Vec<u8>),
}
impl Input {
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> Self {
        match path {
            Some(path) => Self::Path(path.as_ref().to_path_buf()),
            None => Self::Stdin,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Opens the input as a buffered, decompressed line-oriented reader.
    pub fn into_text_reader(self) -> crate::Result<BoxedBufReader> {
        let raw: BoxedReader = match self {
            Self::Path(path) => Box::new(File::open(path)?),
            Self::Stdin => Box::new(std::io::stdin()),
            Self::Reader(reader) => reader,
            Self::Bytes(bytes) => Box::new(Cursor::new(bytes)),
        };
        let reader = decompress(raw)?;
        Ok(Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader)))
    }

    /// Loads the input for random access.
    ///
    /// Paths are memory-mapped; every other input is read fully into memory.
    pub fn into_bytes(self) -> crate::Result<ByteStore> {
        match self {
            Self::Path(path) => ByteStore::map(path),
            Self::Bytes(bytes) => Ok(ByteStore::from(bytes)),
            Self::Stdin => {
                let mut buffer = Vec::new();
                std::io::stdin().read_to_end(&mut buffer)?;
                Ok(ByteStore::from(buffer))
            }
            Self::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer)?;
                Ok(ByteStore::from(buffer))
            }
        }
    }
}
impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Stdin => f.write_str("Stdin"),
            Self::Reader(_) => f.write_str("Reader(..)"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}
impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}
impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}
impl From<&str> for Input {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}
impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Streams shorter than any compression magic are passed through untouched.
fn decompress(mut raw: BoxedReader) -> crate::Result<BoxedReader> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    (&mut raw).take(SNIFF_LEN as u64).read_to_end(&mut prefix)?;
    let short = prefix.len() < SNIFF_LEN;
    let rejoined: BoxedReader = Box::new(Cursor::new(prefix).chain(raw));
    if short {
        return Ok(rejoined);
    }

    #[cfg(feature = "niffler")]
    {
        let (reader, format) = niffler::send::get_reader(rejoined)?;
        tracing::trace!(?format, "Detected input compression");
        Ok(reader)
    }
    #[cfg(not(feature = "niffler"))]
    {
        Ok(rejoined)
    }
}
