//! GFF3 and GTF feature annotation.
//!
//! Lines beginning with `#` are metadata: `##` directives and plain comments.
//! A `##FASTA` directive ends the feature section; the embedded sequences are
//! not part of the record stream.

use tracing::debug;

use crate::{
    io::{Input, Line},
    BlockSource, Format, Metadata, Record,
};

use super::{parse_column, parse_strand, require_columns, TextInput};

const NAME: &str = "gff";

/// Directives that may legitimately repeat within one file.
const REPEATED_DIRECTIVES: &[&str] = &["sequence-region", "species", "genome-build"];

pub struct Gff {
    input: TextInput,
}
impl Gff {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
        }
    }
}

impl BlockSource for Gff {
    type Block = Line;
    fn read_block(&mut self) -> crate::Result<Option<Line>> {
        let lines = self.input.lines()?;
        match lines.next_nonblank()? {
            Some(line) if line.text.starts_with("##FASTA") => {
                debug!(line = line.number, "Reached ##FASTA section");
                lines.finish();
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

impl Format for Gff {
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
        line.text.starts_with('#')
    }

    fn read_metadata(&mut self, line: &Line, metadata: &mut Metadata) -> crate::Result<()> {
        let Some(directive) = line.text.strip_prefix("##") else {
            metadata.append("comment", line.text.trim_start_matches('#').trim());
            return Ok(());
        };
        let directive = directive.trim();
        // `###` only marks that forward references are resolved
        if directive.is_empty() || directive.starts_with('#') {
            return Ok(());
        }
        let (key, value) = directive
            .split_once(char::is_whitespace)
            .map(|(k, v)| (k, v.trim()))
            .unwrap_or((directive, ""));
        if REPEATED_DIRECTIVES.contains(&key) {
            metadata.append(key, value);
        } else {
            metadata.set(key, value);
        }
        Ok(())
    }

    fn read_record(&mut self, line: &Line) -> crate::Result<Record> {
        let columns: Vec<&str> = line.text.split('\t').collect();
        require_columns(NAME, line.number, &columns, 8)?;

        let start = parse_column(NAME, line.number, "start", columns[3])?;
        let end = parse_column(NAME, line.number, "end", columns[4])?;
        // `?` marks a strand that is relevant but unknown
        let strand = match columns[6] {
            "?" => crate::Strand::Unknown,
            symbol => parse_strand(NAME, line.number, symbol)?,
        };
        let attributes = columns.get(8).copied().unwrap_or_default();
        let name = ["ID", "Name", "gene_id"]
            .iter()
            .find_map(|key| attribute(attributes, key))
            .unwrap_or_default();

        Ok(Record::new(columns[0], start, end)
            .with_name(name)
            .with_score(columns[5])
            .with_strand(strand)
            .with_fields(vec![
                columns[1].to_string(),
                columns[2].to_string(),
                columns[7].to_string(),
                attributes.to_string(),
            ]))
    }
}

/// Looks up `key` in either GFF3 (`key=value;`) or GTF (`key "value";`)
/// attribute syntax.
pub fn attribute<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (k, v) = pair
                .split_once('=')
                .or_else(|| pair.split_once(char::is_whitespace))?;
            (k.trim() == key).then(|| v.trim().trim_matches('"'))
        })
}
