//! Minimal bigBed/bigWig writer used to build test fixtures.
//!
//! Produces a version 4 file with no zoom levels: a single-leaf chromosome
//! tree, one R-tree leaf per `leaf_size` data blocks (under a single branch
//! node when there is more than one leaf), and optionally zlib-compressed
//! data blocks.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};

use super::{tree::CHROM_TREE_MAGIC, tree::RTREE_MAGIC, BIGBED_MAGIC, BIGWIG_MAGIC, HEADER_SIZE};

const BEDGRAPH: u8 = 1;
const VARIABLE_STEP: u8 = 2;
const FIXED_STEP: u8 = 3;

struct Block {
    payload: Vec<u8>,
    bounds: (u32, u32, u32, u32),
}

pub(crate) struct BbiBuilder {
    magic: u32,
    chroms: Vec<(String, u32)>,
    blocks: Vec<Block>,
    compressed: bool,
    leaf_size: usize,
    field_count: u16,
    auto_sql: Option<String>,
}
impl BbiBuilder {
    fn new(magic: u32, chroms: &[(&str, u32)]) -> Self {
        Self {
            magic,
            chroms: chroms.iter().map(|(name, size)| (name.to_string(), *size)).collect(),
            blocks: Vec::new(),
            compressed: false,
            leaf_size: 64,
            field_count: if magic == BIGBED_MAGIC { 3 } else { 0 },
            auto_sql: None,
        }
    }

    pub fn bigbed(chroms: &[(&str, u32)]) -> Self {
        Self::new(BIGBED_MAGIC, chroms)
    }

    pub fn bigwig(chroms: &[(&str, u32)]) -> Self {
        Self::new(BIGWIG_MAGIC, chroms)
    }

    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size.max(1);
        self
    }

    pub fn field_count(mut self, field_count: u16) -> Self {
        self.field_count = field_count;
        self
    }

    pub fn auto_sql(mut self, auto_sql: &str) -> Self {
        self.auto_sql = Some(auto_sql.to_string());
        self
    }

    /// One data block of `(chrom_id, start, end, rest)` entries, sorted.
    pub fn bed_block(mut self, entries: &[(u32, u32, u32, &str)]) -> Self {
        let mut payload = Vec::new();
        for (chrom, start, end, rest) in entries {
            payload.extend_from_slice(&chrom.to_le_bytes());
            payload.extend_from_slice(&start.to_le_bytes());
            payload.extend_from_slice(&end.to_le_bytes());
            payload.extend_from_slice(rest.as_bytes());
            payload.push(0);
        }
        let (first, last) = (entries[0], entries[entries.len() - 1]);
        let end = entries
            .iter()
            .filter(|e| e.0 == last.0)
            .map(|e| e.2)
            .max()
            .unwrap_or(last.2);
        self.blocks.push(Block {
            payload,
            bounds: (first.0, first.1, last.0, end),
        });
        self
    }

    pub fn bedgraph_section(self, chrom: u32, items: &[(u32, u32, f32)]) -> Self {
        let start = items[0].0;
        let end = items[items.len() - 1].1;
        let mut body = Vec::new();
        for (s, e, value) in items {
            body.extend_from_slice(&s.to_le_bytes());
            body.extend_from_slice(&e.to_le_bytes());
            body.extend_from_slice(&value.to_le_bytes());
        }
        self.section(chrom, start, end, 0, 0, BEDGRAPH, items.len(), body)
    }

    pub fn variable_section(self, chrom: u32, span: u32, items: &[(u32, f32)]) -> Self {
        let start = items[0].0;
        let end = items[items.len() - 1].0 + span;
        let mut body = Vec::new();
        for (s, value) in items {
            body.extend_from_slice(&s.to_le_bytes());
            body.extend_from_slice(&value.to_le_bytes());
        }
        self.section(chrom, start, end, 0, span, VARIABLE_STEP, items.len(), body)
    }

    pub fn fixed_section(self, chrom: u32, start: u32, step: u32, span: u32, values: &[f32]) -> Self {
        let end = start + (values.len() as u32 - 1) * step + span;
        let body: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.section(chrom, start, end, step, span, FIXED_STEP, values.len(), body)
    }

    #[allow(clippy::too_many_arguments)]
    fn section(
        mut self,
        chrom: u32,
        start: u32,
        end: u32,
        step: u32,
        span: u32,
        kind: u8,
        count: usize,
        body: Vec<u8>,
    ) -> Self {
        let mut payload = Vec::new();
        for value in [chrom, start, end, step, span] {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload.push(kind);
        payload.push(0);
        payload.extend_from_slice(&(count as u16).to_le_bytes());
        payload.extend(body);
        self.blocks.push(Block {
            payload,
            bounds: (chrom, start, chrom, end),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];

        let auto_sql_offset = match &self.auto_sql {
            Some(text) => {
                let offset = out.len() as u64;
                out.extend_from_slice(text.as_bytes());
                out.push(0);
                offset
            }
            None => 0,
        };

        // chromosome B+ tree, one leaf
        let chrom_tree_offset = out.len() as u64;
        let key_size = self.chroms.iter().map(|(n, _)| n.len()).max().unwrap_or(1).max(1);
        put_u32(&mut out, CHROM_TREE_MAGIC);
        put_u32(&mut out, self.chroms.len().max(1) as u32);
        put_u32(&mut out, key_size as u32);
        put_u32(&mut out, 8);
        put_u64(&mut out, self.chroms.len() as u64);
        put_u64(&mut out, 0);
        out.push(1);
        out.push(0);
        put_u16(&mut out, self.chroms.len() as u16);
        for (id, (name, size)) in self.chroms.iter().enumerate() {
            let mut key = name.as_bytes().to_vec();
            key.resize(key_size, 0);
            out.extend_from_slice(&key);
            put_u32(&mut out, id as u32);
            put_u32(&mut out, *size);
        }

        // data section
        let full_data_offset = out.len() as u64;
        put_u64(&mut out, self.blocks.len() as u64);
        let mut max_raw = 0;
        let mut located = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            max_raw = max_raw.max(block.payload.len());
            let stored = if self.compressed {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&block.payload).unwrap();
                encoder.finish().unwrap()
            } else {
                block.payload.clone()
            };
            located.push((block.bounds, out.len() as u64, stored.len() as u64));
            out.extend(stored);
        }

        // R-tree
        let full_index_offset = out.len() as u64;
        let (sc, sb) = located.first().map(|b| (b.0 .0, b.0 .1)).unwrap_or_default();
        let (ec, eb) = located.last().map(|b| (b.0 .2, b.0 .3)).unwrap_or_default();
        put_u32(&mut out, RTREE_MAGIC);
        put_u32(&mut out, self.leaf_size as u32);
        put_u64(&mut out, located.len() as u64);
        for value in [sc, sb, ec, eb] {
            put_u32(&mut out, value);
        }
        put_u64(&mut out, full_index_offset);
        put_u32(&mut out, 1);
        put_u32(&mut out, 0);

        let leaves: Vec<_> = located.chunks(self.leaf_size).collect();
        if leaves.len() > 1 {
            let mut child = out.len() + 4 + 24 * leaves.len();
            out.push(0);
            out.push(0);
            put_u16(&mut out, leaves.len() as u16);
            for leaf in &leaves {
                let first = leaf[0].0;
                let last = leaf[leaf.len() - 1].0;
                for value in [first.0, first.1, last.2, last.3] {
                    put_u32(&mut out, value);
                }
                put_u64(&mut out, child as u64);
                child += 4 + 32 * leaf.len();
            }
        }
        if leaves.is_empty() {
            out.extend_from_slice(&[1, 0, 0, 0]);
        }
        for leaf in &leaves {
            out.push(1);
            out.push(0);
            put_u16(&mut out, leaf.len() as u16);
            for ((s_chrom, s_base, e_chrom, e_base), offset, size) in leaf.iter() {
                for value in [*s_chrom, *s_base, *e_chrom, *e_base] {
                    put_u32(&mut out, value);
                }
                put_u64(&mut out, *offset);
                put_u64(&mut out, *size);
            }
        }

        let mut header = Vec::with_capacity(HEADER_SIZE);
        put_u32(&mut header, self.magic);
        put_u16(&mut header, 4);
        put_u16(&mut header, 0);
        put_u64(&mut header, chrom_tree_offset);
        put_u64(&mut header, full_data_offset);
        put_u64(&mut header, full_index_offset);
        put_u16(&mut header, self.field_count);
        put_u16(&mut header, self.field_count);
        put_u64(&mut header, auto_sql_offset);
        put_u64(&mut header, 0);
        put_u32(&mut header, if self.compressed { max_raw.max(1) as u32 } else { 0 });
        put_u64(&mut header, 0);
        out[..HEADER_SIZE].copy_from_slice(&header);
        out
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}
