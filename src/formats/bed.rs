//! BED tabular annotation format.
//!
//! Metadata blocks are `#` comments and the UCSC `track` / `browser` lines.
//! Data lines are split on any run of whitespace so that space-aligned files
//! decode the same as tab-delimited ones.

use crate::{
    io::{Input, Line},
    BlockSource, Format, Metadata, Record, Strand,
};

use super::{has_keyword, parse_column, parse_key_values, parse_strand, require_columns, TextInput};

const NAME: &str = "bed";

pub struct Bed {
    input: TextInput,
}
impl Bed {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
        }
    }
}

impl BlockSource for Bed {
    type Block = Line;
    fn read_block(&mut self) -> crate::Result<Option<Line>> {
        self.input.lines()?.next_nonblank()
    }
}

impl Format for Bed {
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

    fn is_metadata(&self, line: &Line) -> bool {
        let text = line.text.trim_start();
        text.starts_with('#') || has_keyword(text, "track") || has_keyword(text, "browser")
    }

    /// `track` attributes overwrite earlier values; `browser` lines and
    /// comments accumulate.
    fn read_metadata(&mut self, line: &Line, metadata: &mut Metadata) -> crate::Result<()> {
        let text = line.text.trim();
        if let Some(comment) = text.strip_prefix('#') {
            metadata.append("comment", comment.trim());
        } else if let Some(rest) = text.strip_prefix("track") {
            for (key, value) in parse_key_values(rest) {
                metadata.set(key, value);
            }
        } else if let Some(rest) = text.strip_prefix("browser") {
            metadata.append("browser", rest.trim());
        }
        Ok(())
    }

    fn read_record(&mut self, line: &Line) -> crate::Result<Record> {
        let columns: Vec<&str> = line.text.split_whitespace().collect();
        require_columns(NAME, line.number, &columns, 3)?;

        let start = parse_column(NAME, line.number, "chromStart", columns[1])?;
        let end = parse_column(NAME, line.number, "chromEnd", columns[2])?;
        let strand = match columns.get(5) {
            Some(symbol) => parse_strand(NAME, line.number, symbol)?,
            None => Strand::Unknown,
        };

        Ok(Record::new(columns[0], start, end)
            .with_name(columns.get(3).copied().unwrap_or_default())
            .with_score(columns.get(4).copied().unwrap_or("."))
            .with_strand(strand)
            .with_fields(columns.iter().skip(6).map(|c| c.to_string()).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, FlatError, Parser};

    fn open(text: &str, config: Config) -> Parser<Bed> {
        Parser::open(Bed::new(text.as_bytes().to_vec()), config).unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let text = "# header comment\nchr1  100  200  featA  .  +\nchr1  300  400  featB  .  -\n";
        let mut parser = open(text, Config::default());

        assert!(parser.advance().unwrap());
        let record = parser.record().unwrap();
        assert_eq!(record.start, 100);
        assert_eq!(record.end, 200);
        assert_eq!(record.strand, 1);
        assert_eq!(record.score, ".");
        assert_eq!(record.name, "featA");
        assert!(parser.metadata_changed());

        assert!(parser.advance().unwrap());
        let record = parser.record().unwrap();
        assert_eq!(record.start, 300);
        assert_eq!(record.end, 400);
        assert_eq!(record.strand, -1);
        assert!(!parser.metadata_changed());

        assert!(!parser.advance().unwrap());
        assert_eq!(
            parser.metadata().list("comment"),
            Some(&["header comment".to_string()][..])
        );
    }

    #[test]
    fn test_track_and_browser_lines() {
        let text = "browser position chr1:1-1000\nbrowser hide all\ntrack name=\"Genes\" visibility=2\nchr1\t0\t10\n";
        let mut parser = open(text, Config::default());
        assert!(parser.advance().unwrap());
        assert!(parser.metadata_changed());
        let meta = parser.metadata();
        assert_eq!(meta.text("name"), Some("Genes"));
        assert_eq!(meta.text("visibility"), Some("2"));
        assert_eq!(meta.list("browser").map(|b| b.len()), Some(2));
    }

    #[test]
    fn test_bed3_defaults() {
        let mut parser = open("chr2\t5\t15\n", Config::default());
        assert!(parser.advance().unwrap());
        let record = parser.record().unwrap();
        assert_eq!(record.chrom, "chr2");
        assert_eq!(record.name, "");
        assert_eq!(record.score, ".");
        assert_eq!(record.strand, 0);
        assert_eq!(record.thick_start(), 0);
        assert_eq!(record.thick_end(), 0);
    }

    #[test]
    fn test_bed12_extra_columns() {
        let line = "chr1\t10\t100\ttx1\t960\t+\t20\t90\t255,0,0\t2\t10,20\t0,70\n";
        let mut parser = open(line, Config::default());
        assert!(parser.advance().unwrap());
        let record = parser.record().unwrap();
        assert_eq!(record.score, "960");
        assert_eq!(record.fields.len(), 6);
        assert_eq!(record.fields[0], "20");
        assert_eq!(record.thick_start(), 0);
        assert_eq!(record.thick_end(), 0);
    }

    #[test]
    fn test_disabled_metadata() {
        let text = "track name=x\n#c\nchr1 1 2\n";
        let mut parser = open(text, Config::default().parse_metadata(false));
        assert!(parser.advance().unwrap());
        assert!(!parser.metadata_changed());
        assert!(parser.metadata().is_empty());
        assert_eq!(parser.record().unwrap().end, 2);
        assert!(!parser.advance().unwrap());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let records = open("\nchr1 1 2\n\n\nchr1 3 4\n\n", Config::default())
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_malformed_lines() {
        let mut parser = open("chr1 1\n", Config::default());
        assert!(matches!(
            parser.advance(),
            Err(FlatError::Malformed { line: 1, .. })
        ));

        let mut parser = open("chr1 x 2\n", Config::default());
        assert!(parser.advance().is_err());

        let mut parser = open("chr1 1 2 n 0 *\n", Config::default());
        assert!(parser.advance().is_err());
    }

    #[test]
    fn test_line_numbers_in_errors() {
        let mut parser = open("#c\nchr1 1 2\nchr1 bad 3\n", Config::default());
        assert!(parser.advance().unwrap());
        match parser.advance() {
            Err(FlatError::Malformed { line, format, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(format, "bed");
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_seek_not_supported() {
        let mut parser = open("chr1 1 2\n", Config::default());
        let region = crate::Region::new("chr1", 0, 10).unwrap();
        assert!(matches!(
            parser.seek(&region),
            Err(FlatError::NotSupported { format: "bed", .. })
        ));
        assert!(parser.advance().unwrap());
    }

    #[test]
    fn test_reopen_after_close_fails() {
        let mut bed = Bed::new(b"chr1 1 2\n".to_vec());
        bed.open().unwrap();
        bed.close().unwrap();
        bed.close().unwrap();
        assert!(matches!(bed.open(), Err(FlatError::ParserClosed)));
    }
}
