//! FASTA sequences.
//!
//! A block is a whole entry: the `>` header and every sequence line up to the
//! next header. Legacy `;` comment lines are the only metadata.

use crate::{
    io::{Input, Line},
    BlockSource, FlatError, Format, Metadata, Record,
};

use super::TextInput;

const NAME: &str = "fasta";

#[derive(Debug, Clone, PartialEq)]
pub enum FastaBlock {
    Comment(Line),
    Entry {
        line: usize,
        header: String,
        sequence: String,
    },
}

pub struct Fasta {
    input: TextInput,
}
impl Fasta {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
        }
    }
}

impl BlockSource for Fasta {
    type Block = FastaBlock;
    fn read_block(&mut self) -> crate::Result<Option<FastaBlock>> {
        let lines = self.input.lines()?;
        let Some(first) = lines.next_nonblank()? else {
            return Ok(None);
        };
        if first.text.starts_with(';') {
            return Ok(Some(FastaBlock::Comment(first)));
        }
        let Some(header) = first.text.strip_prefix('>') else {
            return Err(FlatError::malformed(
                NAME,
                first.number,
                "expected '>' to open a sequence entry",
            ));
        };

        let mut sequence = String::new();
        while let Some(line) = lines.next_line()? {
            if line.text.starts_with('>') || line.text.starts_with(';') {
                lines.push_back(line);
                break;
            }
            sequence.push_str(line.text.trim());
        }
        Ok(Some(FastaBlock::Entry {
            line: first.number,
            header: header.trim().to_string(),
            sequence,
        }))
    }
}

impl Format for Fasta {
    fn name(&self) -> &'static str {
        NAME
    }

    fn open(&mut self) -> crate::Result<()> {
        self.input.open(NAME)
    }

    fn close(&mut self) -> crate::Result<()> {
        self.input.close();
        Ok(())
    }

    fn is_metadata(&self, block: &FastaBlock) -> bool {
        matches!(block, FastaBlock::Comment(_))
    }

    fn read_metadata(&mut self, block: &FastaBlock, metadata: &mut Metadata) -> crate::Result<()> {
        let FastaBlock::Comment(line) = block else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_metadata on a sequence entry",
            });
        };
        metadata.append("comment", line.text.trim_start_matches(';').trim());
        Ok(())
    }

    /// The record spans the whole sequence, `1..=len`.
    fn read_record(&mut self, block: &FastaBlock) -> crate::Result<Record> {
        let FastaBlock::Entry {
            line,
            header,
            sequence,
        } = block
        else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_record on a comment",
            });
        };
        let (id, description) = header
            .split_once(char::is_whitespace)
            .map(|(id, desc)| (id, desc.trim()))
            .unwrap_or((header.as_str(), ""));
        if id.is_empty() {
            return Err(FlatError::malformed(NAME, *line, "empty sequence identifier"));
        }
        Ok(Record::new(id, 1, sequence.len() as u64)
            .with_name(id)
            .with_fields(vec![description.to_string(), sequence.clone()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Parser};

    fn collect(text: &str) -> Vec<Record> {
        Parser::open(Fasta::new(text.as_bytes().to_vec()), Config::default())
            .unwrap()
            .collect::<crate::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_multiline_entries() {
        let records = collect(">seq1 first sequence\nACGT\nAC\n\n>seq2\nGGGG\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chrom, "seq1");
        assert_eq!(records[0].name, "seq1");
        assert_eq!((records[0].start, records[0].end), (1, 6));
        assert_eq!(records[0].fields, vec!["first sequence", "ACGTAC"]);
        assert_eq!(records[1].fields, vec!["", "GGGG"]);
        assert_eq!(records[1].strand, 0);
    }

    #[test]
    fn test_comments_are_metadata() {
        let mut parser = Parser::open(
            Fasta::new(b";old style comment\n>a\nAC\n;between\n>b\nT\n".to_vec()),
            Config::default(),
        )
        .unwrap();
        assert!(parser.advance().unwrap());
        assert!(parser.metadata_changed());
        assert!(parser.advance().unwrap());
        assert!(parser.metadata_changed());
        assert_eq!(parser.record().unwrap().name, "b");
        assert!(!parser.advance().unwrap());
        assert_eq!(parser.metadata().list("comment").map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_empty_sequence() {
        let records = collect(">empty\n>full\nA\n");
        assert_eq!(records[0].end, 0);
        assert_eq!(records[1].end, 1);
    }

    #[test]
    fn test_missing_header() {
        let result = Parser::open(Fasta::new(b"ACGT\n".to_vec()), Config::default());
        assert!(matches!(result, Err(FlatError::Malformed { line: 1, .. })));
    }

    #[test]
    fn test_empty_identifier() {
        let mut parser = Parser::open(Fasta::new(b">\nACGT\n".to_vec()), Config::default()).unwrap();
        assert!(parser.advance().is_err());
    }

    #[test]
    fn test_read_metadata_on_entry() {
        let mut fasta = Fasta::new(Vec::new());
        let block = FastaBlock::Entry {
            line: 1,
            header: "x".into(),
            sequence: "A".into(),
        };
        let mut meta = Metadata::new();
        assert!(matches!(
            fasta.read_metadata(&block, &mut meta),
            Err(FlatError::NotImplemented { .. })
        ));
    }
}
