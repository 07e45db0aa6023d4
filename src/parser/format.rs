use crate::{FlatError, Metadata, Record, Region};

/// Produces the next atomic chunk of raw input.
///
/// Implementations must be safe to call past the logical end of the stream:
/// once exhausted, `read_block` returns `Ok(None)` on every further call.
pub trait BlockSource {
    /// One unit of raw input (a line, a paragraph, a decoded binary entry...).
    type Block;

    fn read_block(&mut self) -> crate::Result<Option<Self::Block>>;
}

/// The primitives a file format supplies to the [`Parser`](crate::Parser).
///
/// Everything except [`seek`](Format::seek) is required. The engine owns the
/// iteration state; a format only acquires its input, lexes blocks, and
/// decodes whichever block the engine hands back.
pub trait Format: BlockSource {
    /// Identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Acquires the underlying stream.
    fn open(&mut self) -> crate::Result<()>;

    /// Releases the underlying stream. Must be idempotent.
    fn close(&mut self) -> crate::Result<()>;

    /// Whether `block` carries metadata rather than a data record.
    fn is_metadata(&self, block: &Self::Block) -> bool;

    /// Merges a metadata block into `metadata`.
    fn read_metadata(&mut self, block: &Self::Block, metadata: &mut Metadata) -> crate::Result<()>;

    /// Decodes a data block.
    fn read_record(&mut self, block: &Self::Block) -> crate::Result<Record>;

    /// Repositions the source so that subsequent blocks are the records
    /// intersecting `region` (inclusive on both ends).
    ///
    /// Only formats backed by a sorted index can do this.
    #[allow(unused_variables)]
    fn seek(&mut self, region: &Region) -> crate::Result<()> {
        Err(FlatError::NotSupported {
            format: self.name(),
            capability: "seek",
        })
    }
}
