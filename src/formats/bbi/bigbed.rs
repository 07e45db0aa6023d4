use std::collections::VecDeque;

use crate::{io::Input, BlockSource, FlatError, Format, Metadata, Record, Region, Strand};

use super::{covered_bases, read_u32, BbiBlock, BbiFile, BbiStream, EntryDecoder, BIGBED_MAGIC};

const NAME: &str = "bigbed";

/// One bigBed entry with its chromosome resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BedEntry {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    /// Tab-separated columns after `end`.
    pub rest: String,
}

struct BedDecoder;
impl EntryDecoder for BedDecoder {
    type Entry = BedEntry;
    const NAME: &'static str = NAME;
    const MAGIC: u32 = BIGBED_MAGIC;

    fn decode(file: &BbiFile, data: &[u8], entries: &mut VecDeque<BedEntry>) -> crate::Result<()> {
        let mut remaining = data;
        while !remaining.is_empty() {
            let chrom_id = read_u32(&mut remaining)?;
            let start = read_u32(&mut remaining)?;
            let end = read_u32(&mut remaining)?;
            let nul = remaining
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| FlatError::InvalidIndex("unterminated bigBed entry".to_string()))?;
            let rest = std::str::from_utf8(&remaining[..nul])
                .map_err(|err| FlatError::InvalidIndex(format!("bigBed entry is not UTF-8: {err}")))?
                .to_string();
            remaining = &remaining[nul + 1..];
            entries.push_back(BedEntry {
                chrom: file.chrom_name(chrom_id)?.to_string(),
                start,
                end,
                rest,
            });
        }
        Ok(())
    }

    fn span(entry: &BedEntry) -> (&str, u64, u64) {
        let (first, last) = covered_bases(entry.start, entry.end);
        (&entry.chrom, first, last)
    }
}

/// Indexed BED annotation. Supports [`seek`](Format::seek).
pub struct BigBed {
    stream: BbiStream<BedDecoder>,
}
impl BigBed {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            stream: BbiStream::new(input.into()),
        }
    }

    /// The parsed container, available while open.
    pub fn file(&self) -> crate::Result<&BbiFile> {
        self.stream.file()
    }
}

impl BlockSource for BigBed {
    type Block = BbiBlock<BedEntry>;
    fn read_block(&mut self) -> crate::Result<Option<Self::Block>> {
        self.stream.next_block()
    }
}

impl Format for BigBed {
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

    /// `rest` holds name, score, strand, then any extra columns.
    fn read_record(&mut self, block: &Self::Block) -> crate::Result<Record> {
        let BbiBlock::Entry(entry) = block else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_record on the header",
            });
        };
        let mut record = Record::new(entry.chrom.as_str(), entry.start as u64, entry.end as u64);
        if entry.rest.is_empty() {
            return Ok(record);
        }
        let mut columns = entry.rest.split('\t');
        if let Some(name) = columns.next() {
            record = record.with_name(name);
        }
        if let Some(score) = columns.next() {
            record = record.with_score(score);
        }
        if let Some(strand) = columns.next() {
            record = record.with_strand(Strand::from_symbol(strand)?);
        }
        Ok(record.with_fields(columns.map(str::to_string).collect()))
    }

    fn seek(&mut self, region: &Region) -> crate::Result<()> {
        self.stream.seek(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::bbi::build::BbiBuilder;
    use crate::{Config, Parser};
    use std::io::Write;

    fn sample(compressed: bool) -> Vec<u8> {
        BbiBuilder::bigbed(&[("chr1", 1000), ("chr2", 500)])
            .compressed(compressed)
            .leaf_size(2)
            .field_count(7)
            .auto_sql("table bed6plus")
            .bed_block(&[(0, 10, 20, "a\t5\t+"), (0, 30, 40, "b\t0\t-\textra")])
            .bed_block(&[(0, 100, 200, "c\t1\t.")])
            .bed_block(&[(1, 0, 50, "d\t2\t+")])
            .build()
    }

    fn open(bytes: Vec<u8>) -> Parser<BigBed> {
        Parser::open(BigBed::new(bytes), Config::default()).unwrap()
    }

    fn names(parser: &mut Parser<BigBed>) -> Vec<String> {
        parser.by_ref().map(|r| r.unwrap().name).collect()
    }

    #[test]
    fn test_full_scan() {
        for compressed in [false, true] {
            let mut parser = open(sample(compressed));

            assert!(parser.advance().unwrap());
            assert!(parser.metadata_changed());
            let record = parser.record().unwrap();
            assert_eq!(record.chrom, "chr1");
            assert_eq!((record.start, record.end), (10, 20));
            assert_eq!(record.name, "a");
            assert_eq!(record.score, "5");
            assert_eq!(record.strand, 1);
            assert!(record.fields.is_empty());

            assert!(parser.advance().unwrap());
            assert!(!parser.metadata_changed());
            let record = parser.record().unwrap();
            assert_eq!(record.strand, -1);
            assert_eq!(record.fields, vec!["extra"]);

            assert_eq!(names(&mut parser), vec!["c", "d"]);
            assert!(!parser.advance().unwrap());

            let meta = parser.metadata();
            assert_eq!(meta.text("version"), Some("4"));
            assert_eq!(meta.text("field_count"), Some("7"));
            assert_eq!(meta.text("compressed"), Some(compressed.to_string().as_str()));
            assert_eq!(meta.text("autoSql"), Some("table bed6plus"));
            assert_eq!(
                meta.list("chromosomes"),
                Some(&["chr1\t1000".to_string(), "chr2\t500".to_string()][..])
            );
        }
    }

    #[test]
    fn test_seek() {
        let mut parser = open(sample(true));
        parser.seek(&"chr1:35-150".parse().unwrap()).unwrap();
        assert_eq!(names(&mut parser), vec!["b", "c"]);

        parser.seek(&Region::chromosome("chr2")).unwrap();
        assert!(parser.advance().unwrap());
        assert_eq!(parser.record().unwrap().chrom, "chr2");
        assert!(!parser.advance().unwrap());

        // [10, 20) ends at base 19
        parser.seek(&Region::new("chr1", 20, 25).unwrap()).unwrap();
        assert!(!parser.advance().unwrap());
        parser.seek(&Region::new("chr1", 19, 25).unwrap()).unwrap();
        assert_eq!(names(&mut parser), vec!["a"]);
        parser.seek(&Region::new("chr1", 0, 10).unwrap()).unwrap();
        assert_eq!(names(&mut parser), vec!["a"]);
    }

    #[test]
    fn test_seek_half_open_bounds() {
        let bytes = BbiBuilder::bigbed(&[("chr1", 100)])
            .bed_block(&[(0, 10, 20, "a"), (0, 20, 20, "empty"), (0, 20, 30, "b")])
            .build();
        let mut parser = open(bytes);
        parser.seek(&Region::new("chr1", 20, 20).unwrap()).unwrap();
        assert_eq!(names(&mut parser), vec!["empty", "b"]);
        parser.seek(&Region::new("chr1", 30, 40).unwrap()).unwrap();
        assert!(!parser.advance().unwrap());
    }

    #[test]
    fn test_seek_without_matches() {
        let mut parser = open(sample(false));
        parser.seek(&Region::chromosome("chrUn")).unwrap();
        assert!(!parser.advance().unwrap());

        parser.seek(&Region::new("chr1", 300, 400).unwrap()).unwrap();
        assert!(!parser.advance().unwrap());
    }

    #[test]
    fn test_seek_before_first_advance_keeps_header() {
        let mut parser = open(sample(false));
        parser.seek(&Region::chromosome("chr2")).unwrap();
        assert!(parser.advance().unwrap());
        assert!(parser.metadata_changed());
        assert_eq!(parser.record().unwrap().name, "d");

        parser.seek(&Region::chromosome("chr2")).unwrap();
        assert!(parser.advance().unwrap());
        assert!(!parser.metadata_changed());
    }

    #[test]
    fn test_metadata_disabled() {
        let parser = Parser::open(BigBed::new(sample(false)), Config::default().parse_metadata(false)).unwrap();
        let records: Vec<_> = parser.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_bed3_entries() {
        let bytes = BbiBuilder::bigbed(&[("chrM", 16569)])
            .bed_block(&[(0, 0, 100, ""), (0, 200, 300, "")])
            .build();
        let records: Vec<_> = open(bytes).map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "");
        assert_eq!(records[1].score, ".");
        assert_eq!(records[1].strand, 0);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample(true)).unwrap();
        let mut parser = Parser::open(BigBed::new(file.path()), Config::default()).unwrap();
        assert_eq!(names(&mut parser), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_bigwig_rejected() {
        let bytes = BbiBuilder::bigwig(&[("chr1", 10)])
            .fixed_section(0, 0, 1, 1, &[1.0])
            .build();
        let result = Parser::open(BigBed::new(bytes), Config::default());
        assert!(matches!(result, Err(FlatError::InvalidMagicNumber { .. })));
    }

    #[test]
    fn test_bad_strand() {
        let bytes = BbiBuilder::bigbed(&[("chr1", 100)])
            .bed_block(&[(0, 1, 2, "x\t0\t*")])
            .build();
        let mut parser = open(bytes);
        assert!(matches!(parser.advance(), Err(FlatError::InvalidStrand(_))));
    }

    #[test]
    fn test_reopen_after_close() {
        let mut bigbed = BigBed::new(sample(false));
        bigbed.open().unwrap();
        assert!(bigbed.file().is_ok());
        bigbed.close().unwrap();
        assert!(matches!(bigbed.open(), Err(FlatError::ParserClosed)));
    }
}
