//! MAF multiple alignments.
//!
//! A block is a whole alignment paragraph: the `a` line plus every following
//! `s`/`i`/`e`/`q` line up to the next blank line. The first `s` line is the
//! reference component and gives the record its interval, reported as the
//! file writes it (zero-based start, `start + size` end).

use crate::{
    io::{Input, Line},
    BlockSource, FlatError, Format, Metadata, Record,
};

use super::{checked_coordinate, has_keyword, parse_column, parse_key_values, parse_strand, TextInput};

const NAME: &str = "maf";

#[derive(Debug, Clone, PartialEq)]
pub enum MafBlock {
    /// `##maf` header or `#` comment.
    Directive(Line),
    /// An alignment paragraph; `lines[0]` is the `a` line.
    Alignment { line: usize, lines: Vec<String> },
}

pub struct Maf {
    input: TextInput,
}
impl Maf {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
        }
    }
}

impl BlockSource for Maf {
    type Block = MafBlock;
    fn read_block(&mut self) -> crate::Result<Option<MafBlock>> {
        let lines = self.input.lines()?;
        let Some(first) = lines.next_nonblank()? else {
            return Ok(None);
        };
        if first.text.starts_with('#') {
            return Ok(Some(MafBlock::Directive(first)));
        }
        if !has_keyword(&first.text, "a") {
            return Err(FlatError::malformed(
                NAME,
                first.number,
                "expected an 'a' line to open an alignment block",
            ));
        }

        let mut paragraph = vec![first.text];
        while let Some(line) = lines.next_line()? {
            if line.is_blank() {
                break;
            }
            if line.text.starts_with('#') || has_keyword(&line.text, "a") {
                lines.push_back(line);
                break;
            }
            paragraph.push(line.text);
        }
        Ok(Some(MafBlock::Alignment {
            line: first.number,
            lines: paragraph,
        }))
    }
}

impl Format for Maf {
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

    fn is_metadata(&self, block: &MafBlock) -> bool {
        matches!(block, MafBlock::Directive(_))
    }

    fn read_metadata(&mut self, block: &MafBlock, metadata: &mut Metadata) -> crate::Result<()> {
        let MafBlock::Directive(line) = block else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_metadata on an alignment",
            });
        };
        match line.text.strip_prefix("##maf") {
            Some(header) => {
                for (key, value) in parse_key_values(header) {
                    metadata.set(key, value);
                }
            }
            None => metadata.append("comment", line.text.trim_start_matches('#').trim()),
        }
        Ok(())
    }

    fn read_record(&mut self, block: &MafBlock) -> crate::Result<Record> {
        let MafBlock::Alignment { line, lines } = block else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_record on a directive",
            });
        };
        let score = parse_key_values(&lines[0][1..])
            .into_iter()
            .find(|(key, _)| key == "score")
            .map(|(_, value)| value)
            .unwrap_or_else(|| ".".to_string());

        let mut components = lines
            .iter()
            .enumerate()
            .filter(|(_, text)| has_keyword(text, "s"));
        let Some((offset, reference)) = components.next() else {
            return Err(FlatError::malformed(NAME, *line, "alignment block has no 's' lines"));
        };
        let number = line + offset;
        let columns: Vec<&str> = reference.split_whitespace().collect();
        if columns.len() != 7 {
            return Err(FlatError::malformed(
                NAME,
                number,
                format!("expected 7 columns in 's' line, found {}", columns.len()),
            ));
        }
        let start: u64 = parse_column(NAME, number, "start", columns[2])?;
        let size: u64 = parse_column(NAME, number, "size", columns[3])?;
        let strand = parse_strand(NAME, number, columns[4])?;
        let end = checked_coordinate(NAME, number, start.checked_add(size))?;
        let others = components
            .filter_map(|(_, text)| text.split_whitespace().nth(1))
            .map(str::to_string)
            .collect();

        Ok(Record::new(columns[1], start, end)
            .with_score(score)
            .with_strand(strand)
            .with_fields(others))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Parser};

    const MAF: &str = "##maf version=1 scoring=tba.v8\n\
# tba.v8 (((human chimp) baboon) (mouse rat))\n\
\n\
a score=23262.0\n\
s hg16.chr7    27578828 38 + 158545518 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG\n\
s panTro1.chr6 28741140 38 + 161576975 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG\n\
s baboon         116834 38 +   4622798 AAA-GGGAATGTTAACCAAATGA---GTTGTCTCTTATGGTG\n\
\n\
a score=5062.0\n\
s hg16.chr7    27699739 6 - 158545518 TAAAGA\n\
s panTro1.chr6 28862317 6 + 161576975 TAAAGA\n\
a\n\
s hg16.chr7    27707221 13 + 158545518 gcagctgaaaaca\n";

    #[test]
    fn test_maf_blocks() {
        let mut parser = Parser::open(Maf::new(MAF.as_bytes().to_vec()), Config::default()).unwrap();

        assert!(parser.advance().unwrap());
        assert!(parser.metadata_changed());
        let record = parser.record().unwrap();
        assert_eq!(record.chrom, "hg16.chr7");
        assert_eq!((record.start, record.end), (27578828, 27578866));
        assert_eq!(record.score, "23262.0");
        assert_eq!(record.strand, 1);
        assert_eq!(record.fields, vec!["panTro1.chr6", "baboon"]);

        assert!(parser.advance().unwrap());
        assert!(!parser.metadata_changed());
        let record = parser.record().unwrap();
        assert_eq!(record.strand, -1);
        assert_eq!(record.fields.len(), 1);

        // paragraph without a trailing blank line, no score
        assert!(parser.advance().unwrap());
        let record = parser.record().unwrap();
        assert_eq!(record.score, ".");
        assert_eq!(record.end, 27707234);

        assert!(!parser.advance().unwrap());

        let meta = parser.metadata();
        assert_eq!(meta.text("version"), Some("1"));
        assert_eq!(meta.text("scoring"), Some("tba.v8"));
        assert_eq!(meta.list("comment").map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_block_without_sequences() {
        let mut parser =
            Parser::open(Maf::new(b"a score=1\ni x\n".to_vec()), Config::default()).unwrap();
        assert!(matches!(
            parser.advance(),
            Err(FlatError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_stray_line() {
        let result = Parser::open(Maf::new(b"s a 1 2 + 3 AC\n".to_vec()), Config::default());
        assert!(matches!(result, Err(FlatError::Malformed { .. })));
    }

    #[test]
    fn test_coordinate_overflow() {
        let text = b"a score=1\ns x 18446744073709551615 5 + 100 ACGTA\n";
        let mut parser = Parser::open(Maf::new(text.to_vec()), Config::default()).unwrap();
        assert!(matches!(
            parser.advance(),
            Err(FlatError::Malformed { line: 2, ref reason, .. }) if reason == "coordinate overflow"
        ));
    }
}
