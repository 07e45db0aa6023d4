use std::collections::VecDeque;

use bytemuck::{Pod, Zeroable};

use crate::{io::Input, BlockSource, FlatError, Format, Metadata, Record, Region};

use super::{covered_bases, read_f32, read_u32, BbiBlock, BbiFile, BbiStream, EntryDecoder, BIGWIG_MAGIC};

const NAME: &str = "bigwig";

const SECTION_HEADER_SIZE: usize = std::mem::size_of::<SectionHeader>();

/// 24-byte header of a bigWig data section.
#[derive(Copy, Clone, Pod, Zeroable, Debug)]
#[repr(C)]
struct SectionHeader {
    chrom_id: u32,
    start: u32,
    end: u32,
    item_step: u32,
    item_span: u32,
    kind: u8,
    reserved: u8,
    item_count: u16,
}
impl SectionHeader {
    fn from_le(self) -> Self {
        Self {
            chrom_id: u32::from_le(self.chrom_id),
            start: u32::from_le(self.start),
            end: u32::from_le(self.end),
            item_step: u32::from_le(self.item_step),
            item_span: u32::from_le(self.item_span),
            item_count: u16::from_le(self.item_count),
            ..self
        }
    }
}

/// One bigWig value with its chromosome resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct WigEntry {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub value: f32,
}

struct WigDecoder;
impl EntryDecoder for WigDecoder {
    type Entry = WigEntry;
    const NAME: &'static str = NAME;
    const MAGIC: u32 = BIGWIG_MAGIC;

    fn decode(file: &BbiFile, data: &[u8], entries: &mut VecDeque<WigEntry>) -> crate::Result<()> {
        let mut remaining = data;
        while !remaining.is_empty() {
            if remaining.len() < SECTION_HEADER_SIZE {
                return Err(FlatError::TruncatedBlock {
                    what: "bigWig section header",
                    offset: data.len() - remaining.len(),
                });
            }
            let (head, body) = remaining.split_at(SECTION_HEADER_SIZE);
            let section = bytemuck::pod_read_unaligned::<SectionHeader>(head).from_le();
            let chrom = file.chrom_name(section.chrom_id)?;
            let mut body = body;
            for i in 0..section.item_count as u32 {
                let (start, end) = match section.kind {
                    1 => (read_u32(&mut body)?, read_u32(&mut body)?),
                    2 => {
                        let start = read_u32(&mut body)?;
                        (start, start.saturating_add(section.item_span))
                    }
                    3 => {
                        let start = section.start.saturating_add(i.saturating_mul(section.item_step));
                        (start, start.saturating_add(section.item_span))
                    }
                    kind => {
                        return Err(FlatError::InvalidIndex(format!("unknown bigWig section type {kind}")))
                    }
                };
                entries.push_back(WigEntry {
                    chrom: chrom.to_string(),
                    start,
                    end,
                    value: read_f32(&mut body)?,
                });
            }
            remaining = body;
        }
        Ok(())
    }

    fn span(entry: &WigEntry) -> (&str, u64, u64) {
        let (first, last) = covered_bases(entry.start, entry.end);
        (&entry.chrom, first, last)
    }
}

/// Indexed signal track. Supports [`seek`](Format::seek).
pub struct BigWig {
    stream: BbiStream<WigDecoder>,
}
impl BigWig {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            stream: BbiStream::new(input.into()),
        }
    }

    pub fn file(&self) -> crate::Result<&BbiFile> {
        self.stream.file()
    }
}

impl BlockSource for BigWig {
    type Block = BbiBlock<WigEntry>;
    fn read_block(&mut self) -> crate::Result<Option<Self::Block>> {
        self.stream.next_block()
    }
}

impl Format for BigWig {
    fn name(&self) -> &'static str {
        NAME
    }

    fn open(&mut self) -> crate::Result<()> {
        self.stream.open()
    }

    fn close(&mut self) -> crate::Result<()> {
        self.stream.close();
        Ok(())
    }

    fn is_metadata(&self, block: &Self::Block) -> bool {
        matches!(block, BbiBlock::Header)
    }

    fn read_metadata(&mut self, block: &Self::Block, metadata: &mut Metadata) -> crate::Result<()> {
        match block {
            BbiBlock::Header => self.stream.summarize(metadata),
            BbiBlock::Entry(_) => Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_metadata on an entry",
            }),
        }
    }

    fn read_record(&mut self, block: &Self::Block) -> crate::Result<Record> {
        let BbiBlock::Entry(entry) = block else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_record on the header",
            });
        };
        Ok(Record::new(entry.chrom.as_str(), entry.start as u64, entry.end as u64)
            .with_score(entry.value.to_string()))
    }

    fn seek(&mut self, region: &Region) -> crate::Result<()> {
        self.stream.seek(region)
    }
}
