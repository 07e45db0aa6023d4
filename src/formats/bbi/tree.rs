use std::{collections::HashSet, io::Cursor};

use bytemuck::{Pod, Zeroable};

use crate::{io::ByteStore, FlatError};

use super::{read_u16, read_u32, read_u64, read_u8, Chrom};

pub const CHROM_TREE_MAGIC: u32 = 0x78CA_8C91;
pub const RTREE_MAGIC: u32 = 0x2468_ACE0;

const CHROM_TREE_HEADER_SIZE: usize = 32;
const RTREE_HEADER_SIZE: usize = 48;
const NODE_HEADER_SIZE: usize = 4;
const MAX_DEPTH: usize = 32;

/// R-tree leaf entry: the bounds and location of one data block.
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct DataBlock {
    pub start_chrom: u32,
    pub start_base: u32,
    pub end_chrom: u32,
    pub end_base: u32,
    pub offset: u64,
    pub size: u64,
}
impl DataBlock {
    fn from_le(self) -> Self {
        Self {
            start_chrom: u32::from_le(self.start_chrom),
            start_base: u32::from_le(self.start_base),
            end_chrom: u32::from_le(self.end_chrom),
            end_base: u32::from_le(self.end_base),
            offset: u64::from_le(self.offset),
            size: u64::from_le(self.size),
        }
    }
}

#[derive(Copy, Clone, Pod, Zeroable, Debug)]
#[repr(C)]
struct Branch {
    start_chrom: u32,
    start_base: u32,
    end_chrom: u32,
    end_base: u32,
    child: u64,
}
impl Branch {
    fn from_le(self) -> Self {
        Self {
            start_chrom: u32::from_le(self.start_chrom),
            start_base: u32::from_le(self.start_base),
            end_chrom: u32::from_le(self.end_chrom),
            end_base: u32::from_le(self.end_base),
            child: u64::from_le(self.child),
        }
    }
}

/// Closed query interval on a single chromosome id.
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub chrom: u32,
    pub start: u32,
    pub end: u32,
}
impl Query {
    /// Whether the half-open span `(start_chrom, start_base)..(end_chrom, end_base)`
    /// can hold anything intersecting the query. An empty span still holds
    /// its start position.
    fn overlaps(&self, start_chrom: u32, start_base: u32, end_chrom: u32, end_base: u32) -> bool {
        let first = (start_chrom, start_base);
        let end = (end_chrom, end_base);
        let reaches = end > (self.chrom, self.start) || (end == first && first == (self.chrom, self.start));
        first <= (self.chrom, self.end) && reaches
    }
}

fn to_offset(value: u64, what: &'static str) -> crate::Result<usize> {
    usize::try_from(value).map_err(|_| FlatError::InvalidIndex(format!("{what} offset {value} out of range")))
}

/// Marks `offset` as visited, rejecting a node reached a second time.
fn visit(visited: &mut HashSet<usize>, offset: usize, what: &str) -> crate::Result<()> {
    if visited.insert(offset) {
        Ok(())
    } else {
        Err(FlatError::InvalidIndex(format!("{what} node at offset {offset} is reachable twice")))
    }
}

fn read_node_header(bytes: &ByteStore, offset: usize, what: &'static str) -> crate::Result<(bool, usize)> {
    let mut cursor = Cursor::new(bytes.slice(offset, NODE_HEADER_SIZE, what)?);
    let is_leaf = read_u8(&mut cursor)? != 0;
    let _reserved = read_u8(&mut cursor)?;
    let count = read_u16(&mut cursor)? as usize;
    Ok((is_leaf, count))
}

/// Reads every chromosome from the B+ tree at `offset`, ordered by id.
pub fn read_chroms(bytes: &ByteStore, offset: u64) -> crate::Result<Vec<Chrom>> {
    let offset = to_offset(offset, "chromosome tree")?;
    let mut cursor = Cursor::new(bytes.slice(offset, CHROM_TREE_HEADER_SIZE, "chromosome tree header")?);
    let magic = read_u32(&mut cursor)?;
    if magic != CHROM_TREE_MAGIC {
        return Err(FlatError::InvalidMagicNumber {
            what: "chromosome tree",
            actual: magic,
        });
    }
    let _block_size = read_u32(&mut cursor)?;
    let key_size = read_u32(&mut cursor)? as usize;
    let value_size = read_u32(&mut cursor)?;
    let item_count = read_u64(&mut cursor)?;
    if value_size != 8 {
        return Err(FlatError::InvalidIndex(format!(
            "chromosome tree value size {value_size}, expected 8"
        )));
    }

    let mut chroms = Vec::new();
    let mut visited = HashSet::new();
    walk_chroms(bytes, offset + CHROM_TREE_HEADER_SIZE, key_size, &mut chroms, &mut visited, 0)?;
    if chroms.len() as u64 != item_count {
        return Err(FlatError::InvalidIndex(format!(
            "chromosome tree holds {} items, header declares {item_count}",
            chroms.len()
        )));
    }
    chroms.sort_by_key(|c| c.id);
    Ok(chroms)
}

fn walk_chroms(
    bytes: &ByteStore,
    offset: usize,
    key_size: usize,
    chroms: &mut Vec<Chrom>,
    visited: &mut HashSet<usize>,
    depth: usize,
) -> crate::Result<()> {
    if depth > MAX_DEPTH {
        return Err(FlatError::InvalidIndex("chromosome tree too deep".to_string()));
    }
    visit(visited, offset, "chromosome tree")?;
    let (is_leaf, count) = read_node_header(bytes, offset, "chromosome tree node")?;
    let item_size = key_size + 8;
    let items = bytes.slice(
        offset + NODE_HEADER_SIZE,
        count * item_size,
        "chromosome tree node",
    )?;
    for item in items.chunks_exact(item_size) {
        let (key, value) = item.split_at(key_size);
        let mut cursor = Cursor::new(value);
        if is_leaf {
            let name = key.split(|&b| b == 0).next().unwrap_or_default();
            chroms.push(Chrom {
                name: String::from_utf8_lossy(name).into_owned(),
                id: read_u32(&mut cursor)?,
                size: read_u32(&mut cursor)?,
            });
        } else {
            let child = to_offset(read_u64(&mut cursor)?, "chromosome tree child")?;
            walk_chroms(bytes, child, key_size, chroms, visited, depth + 1)?;
        }
    }
    Ok(())
}

/// Location of the R-tree root, validated against the index header.
pub fn rtree_root(bytes: &ByteStore, offset: u64) -> crate::Result<usize> {
    let offset = to_offset(offset, "R-tree")?;
    let mut cursor = Cursor::new(bytes.slice(offset, RTREE_HEADER_SIZE, "R-tree header")?);
    let magic = read_u32(&mut cursor)?;
    if magic != RTREE_MAGIC {
        return Err(FlatError::InvalidMagicNumber {
            what: "R-tree index",
            actual: magic,
        });
    }
    Ok(offset + RTREE_HEADER_SIZE)
}

/// Collects, in file order, every data block whose bounds meet `query`
/// (all of them when `query` is `None`).
pub fn find_blocks(
    bytes: &ByteStore,
    root: usize,
    query: Option<&Query>,
) -> crate::Result<Vec<DataBlock>> {
    let mut blocks = Vec::new();
    walk_rtree(bytes, root, query, &mut blocks, &mut HashSet::new(), 0)?;
    Ok(blocks)
}

fn walk_rtree(
    bytes: &ByteStore,
    offset: usize,
    query: Option<&Query>,
    blocks: &mut Vec<DataBlock>,
    visited: &mut HashSet<usize>,
    depth: usize,
) -> crate::Result<()> {
    if depth > MAX_DEPTH {
        return Err(FlatError::InvalidIndex("R-tree too deep".to_string()));
    }
    visit(visited, offset, "R-tree")?;
    let (is_leaf, count) = read_node_header(bytes, offset, "R-tree node")?;
    let start = offset + NODE_HEADER_SIZE;

    if is_leaf {
        let size = std::mem::size_of::<DataBlock>();
        let items = bytes.slice(start, count * size, "R-tree leaf")?;
        for item in items.chunks_exact(size) {
            let block = bytemuck::pod_read_unaligned::<DataBlock>(item).from_le();
            let hit = query.is_none_or(|q| {
                q.overlaps(block.start_chrom, block.start_base, block.end_chrom, block.end_base)
            });
            if hit {
                blocks.push(block);
            }
        }
    } else {
        let size = std::mem::size_of::<Branch>();
        let items = bytes.slice(start, count * size, "R-tree branch")?;
        for item in items.chunks_exact(size) {
            let branch = bytemuck::pod_read_unaligned::<Branch>(item).from_le();
            let hit = query.is_none_or(|q| {
                q.overlaps(branch.start_chrom, branch.start_base, branch.end_chrom, branch.end_base)
            });
            if hit {
                let child = to_offset(branch.child, "R-tree child")?;
                walk_rtree(bytes, child, query, blocks, visited, depth + 1)?;
            }
        }
    }
    Ok(())
}
