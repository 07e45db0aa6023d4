//! bigBed and bigWig, UCSC's indexed binary formats.
//!
//! Both share one container: a fixed 64-byte header, a B+ tree mapping
//! chromosome names to ids, an R-tree over the data blocks, and the data
//! blocks themselves (zlib-compressed when the header declares an
//! uncompress buffer). Only little-endian files are read.
//!
//! The first block a plugin yields is a header block; absorbing it as
//! metadata records the file summary and chromosome list. Every following
//! block is one decoded entry. Seeking walks the R-tree, so only data blocks
//! that can hold matching entries are ever decompressed.

mod bigbed;
mod bigwig;
mod tree;

#[cfg(test)]
pub(crate) mod build;

pub use bigbed::{BedEntry, BigBed};
pub use bigwig::{BigWig, WigEntry};

use std::{
    collections::VecDeque,
    io::{Cursor, Read},
};

use flate2::read::ZlibDecoder;
use tracing::{debug, trace};

use crate::{
    io::{ByteStore, Input},
    FlatError, Metadata, Region,
};

use tree::{DataBlock, Query};

pub const BIGWIG_MAGIC: u32 = 0x888F_FC26;
pub const BIGBED_MAGIC: u32 = 0x8789_F2EB;
pub const HEADER_SIZE: usize = 64;

/// The fixed header at the start of every BBI file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbiHeader {
    pub magic: u32,
    pub version: u16,
    pub zoom_levels: u16,
    pub chrom_tree_offset: u64,
    pub full_data_offset: u64,
    pub full_index_offset: u64,
    pub field_count: u16,
    pub defined_field_count: u16,
    pub auto_sql_offset: u64,
    pub total_summary_offset: u64,
    pub uncompress_buf_size: u32,
    pub extension_offset: u64,
}
impl BbiHeader {
    pub fn from_bytes(bytes: &[u8], magic: u32, what: &'static str) -> crate::Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let actual = read_u32(&mut cursor)?;
        if actual != magic {
            return Err(FlatError::InvalidMagicNumber { what, actual });
        }
        Ok(Self {
            magic,
            version: read_u16(&mut cursor)?,
            zoom_levels: read_u16(&mut cursor)?,
            chrom_tree_offset: read_u64(&mut cursor)?,
            full_data_offset: read_u64(&mut cursor)?,
            full_index_offset: read_u64(&mut cursor)?,
            field_count: read_u16(&mut cursor)?,
            defined_field_count: read_u16(&mut cursor)?,
            auto_sql_offset: read_u64(&mut cursor)?,
            total_summary_offset: read_u64(&mut cursor)?,
            uncompress_buf_size: read_u32(&mut cursor)?,
            extension_offset: read_u64(&mut cursor)?,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.uncompress_buf_size > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chrom {
    pub name: String,
    pub id: u32,
    pub size: u32,
}

/// A parsed BBI container over its bytes.
pub struct BbiFile {
    bytes: ByteStore,
    header: BbiHeader,
    chroms: Vec<Chrom>,
    index_root: usize,
}
impl BbiFile {
    pub fn open(bytes: ByteStore, magic: u32, what: &'static str) -> crate::Result<Self> {
        let header = BbiHeader::from_bytes(bytes.slice(0, HEADER_SIZE, "BBI header")?, magic, what)?;
        let chroms = tree::read_chroms(&bytes, header.chrom_tree_offset)?;
        let index_root = tree::rtree_root(&bytes, header.full_index_offset)?;
        debug!(
            what,
            version = header.version,
            chroms = chroms.len(),
            compressed = header.is_compressed(),
            "Loaded BBI index"
        );
        Ok(Self {
            bytes,
            header,
            chroms,
            index_root,
        })
    }

    pub fn header(&self) -> &BbiHeader {
        &self.header
    }

    pub fn chroms(&self) -> &[Chrom] {
        &self.chroms
    }

    pub fn chrom_id(&self, name: &str) -> Option<u32> {
        self.chroms.iter().find(|c| c.name == name).map(|c| c.id)
    }

    pub fn chrom_name(&self, id: u32) -> crate::Result<&str> {
        self.chroms
            .binary_search_by_key(&id, |c| c.id)
            .map(|ix| self.chroms[ix].name.as_str())
            .map_err(|_| FlatError::InvalidIndex(format!("unknown chromosome id {id}")))
    }

    /// The data blocks that may hold entries intersecting `region`, or every
    /// block when `region` is `None`.
    fn data_blocks(&self, region: Option<&Region>) -> crate::Result<VecDeque<DataBlock>> {
        let query = match region {
            None => None,
            Some(region) => match self.chrom_id(&region.chrom) {
                Some(chrom) => Some(Query {
                    chrom,
                    start: clamp_u32(region.start),
                    end: clamp_u32(region.end),
                }),
                None => return Ok(VecDeque::new()),
            },
        };
        Ok(tree::find_blocks(&self.bytes, self.index_root, query.as_ref())?.into())
    }

    /// Raw (decompressed) payload of a data block.
    fn block_bytes(&self, block: &DataBlock) -> crate::Result<Vec<u8>> {
        let offset = usize::try_from(block.offset)
            .map_err(|_| FlatError::InvalidIndex(format!("data block offset {}", block.offset)))?;
        let size = usize::try_from(block.size)
            .map_err(|_| FlatError::InvalidIndex(format!("data block size {}", block.size)))?;
        let raw = self.bytes.slice(offset, size, "data block")?;
        if !self.header.is_compressed() {
            return Ok(raw.to_vec());
        }
        let mut buffer = Vec::with_capacity(self.header.uncompress_buf_size as usize);
        ZlibDecoder::new(raw).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// NUL-terminated string at `offset`.
    fn c_string(&self, offset: u64) -> crate::Result<String> {
        let offset = usize::try_from(offset)
            .map_err(|_| FlatError::InvalidIndex(format!("string offset {offset}")))?;
        let tail = self.bytes.slice(offset, self.bytes.len().saturating_sub(offset), "string")?;
        let text = tail.split(|&b| b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    fn summarize(&self, metadata: &mut Metadata) -> crate::Result<()> {
        let header = &self.header;
        metadata.set("version", header.version.to_string());
        metadata.set("zoom_levels", header.zoom_levels.to_string());
        metadata.set("compressed", header.is_compressed().to_string());
        if header.magic == BIGBED_MAGIC {
            metadata.set("field_count", header.field_count.to_string());
            metadata.set("defined_field_count", header.defined_field_count.to_string());
            if header.auto_sql_offset != 0 {
                metadata.set("autoSql", self.c_string(header.auto_sql_offset)?);
            }
        }
        for chrom in &self.chroms {
            metadata.append("chromosomes", format!("{}\t{}", chrom.name, chrom.size));
        }
        Ok(())
    }
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Inclusive bounds of the half-open entry `[start, end)`. An empty entry
/// still occupies its start position.
pub(crate) fn covered_bases(start: u32, end: u32) -> (u64, u64) {
    let last = end.saturating_sub(1).max(start);
    (start as u64, last as u64)
}

/// Decoding specific to one BBI flavour.
pub(crate) trait EntryDecoder {
    type Entry;
    const NAME: &'static str;
    const MAGIC: u32;

    /// Appends every entry in a decompressed data block to `entries`.
    fn decode(file: &BbiFile, data: &[u8], entries: &mut VecDeque<Self::Entry>) -> crate::Result<()>;

    /// `(chrom, first, last)` bases covered by an entry, both inclusive.
    fn span(entry: &Self::Entry) -> (&str, u64, u64);
}

/// Block yielded by the BBI plugins.
#[derive(Debug, Clone, PartialEq)]
pub enum BbiBlock<E> {
    /// The file summary, consumed as metadata.
    Header,
    Entry(E),
}

/// Shared open/lex/seek machinery for [`BigBed`] and [`BigWig`].
pub(crate) struct BbiStream<D: EntryDecoder> {
    pending: Option<Input>,
    file: Option<BbiFile>,
    /// Yield a header block before the next entry.
    header_due: bool,
    summarized: bool,
    blocks: VecDeque<DataBlock>,
    entries: VecDeque<D::Entry>,
    region: Option<Region>,
}
impl<D: EntryDecoder> BbiStream<D> {
    pub fn new(input: Input) -> Self {
        Self {
            pending: Some(input),
            file: None,
            header_due: false,
            summarized: false,
            blocks: VecDeque::new(),
            entries: VecDeque::new(),
            region: None,
        }
    }

    pub fn open(&mut self) -> crate::Result<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let input = self.pending.take().ok_or(FlatError::ParserClosed)?;
        debug!(format = D::NAME, ?input, "Opening indexed input");
        let file = BbiFile::open(input.into_bytes()?, D::MAGIC, D::NAME)?;
        self.blocks = file.data_blocks(None)?;
        self.header_due = true;
        self.file = Some(file);
        Ok(())
    }

    pub fn close(&mut self) {
        self.pending = None;
        self.file = None;
        self.blocks.clear();
        self.entries.clear();
        self.region = None;
    }

    pub fn file(&self) -> crate::Result<&BbiFile> {
        self.file.as_ref().ok_or(FlatError::ParserClosed)
    }

    pub fn next_block(&mut self) -> crate::Result<Option<BbiBlock<D::Entry>>> {
        let file = self.file.as_ref().ok_or(FlatError::ParserClosed)?;
        if std::mem::take(&mut self.header_due) {
            return Ok(Some(BbiBlock::Header));
        }
        loop {
            if let Some(entry) = self.entries.pop_front() {
                let keep = self.region.as_ref().is_none_or(|region| {
                    let (chrom, start, end) = D::span(&entry);
                    region.intersects(chrom, start, end)
                });
                if keep {
                    return Ok(Some(BbiBlock::Entry(entry)));
                }
                continue;
            }
            let Some(block) = self.blocks.pop_front() else {
                return Ok(None);
            };
            trace!(format = D::NAME, offset = block.offset, size = block.size, "Decoding data block");
            let data = file.block_bytes(&block)?;
            D::decode(file, &data, &mut self.entries)?;
        }
    }

    pub fn summarize(&mut self, metadata: &mut Metadata) -> crate::Result<()> {
        self.file()?.summarize(metadata)?;
        self.summarized = true;
        Ok(())
    }

    /// Restricts the stream to entries intersecting `region`. An unknown
    /// chromosome leaves nothing to yield.
    pub fn seek(&mut self, region: &Region) -> crate::Result<()> {
        let blocks = self.file()?.data_blocks(Some(region))?;
        debug!(format = D::NAME, %region, blocks = blocks.len(), "Seeking indexed input");
        self.blocks = blocks;
        self.entries.clear();
        self.region = Some(region.clone());
        self.header_due = !self.summarized;
        Ok(())
    }
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> crate::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u16<R: Read>(reader: &mut R) -> crate::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> crate::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> crate::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> crate::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}
