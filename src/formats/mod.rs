//! Format plugins.
//!
//! Each plugin implements [`Format`](crate::Format) for one file format and
//! nothing else: the engine in [`crate::parser`] owns lookahead, metadata
//! bookkeeping, and record lifecycle.
//!
//! | module   | format                                   | block                     |
//! |----------|------------------------------------------|---------------------------|
//! | [`bed`]  | BED tabular annotation                   | line                      |
//! | [`gff`]  | GFF3 / GTF feature annotation            | line                      |
//! | [`vcf`]  | VCF variants                             | line                      |
//! | [`sam`]  | SAM alignments                           | line                      |
//! | [`wig`]  | WIG / bedGraph signal track              | resolved data point       |
//! | [`maf`]  | MAF multiple alignment                   | paragraph                 |
//! | [`fasta`]| FASTA sequences                          | entry                     |
//! | [`bbi`]  | bigBed / bigWig indexed binary           | decoded entry             |

pub mod bbi;
pub mod bed;
pub mod fasta;
pub mod gff;
pub mod maf;
pub mod sam;
pub mod vcf;
pub mod wig;

pub use bbi::{BigBed, BigWig};
pub use bed::Bed;
pub use fasta::Fasta;
pub use gff::Gff;
pub use maf::Maf;
pub use sam::Sam;
pub use vcf::Vcf;
pub use wig::Wig;

use std::str::FromStr;

use tracing::debug;

use crate::{
    io::{Input, LineSource},
    FlatError, Strand,
};

/// Open/close lifecycle shared by the text formats.
///
/// The input is consumed on the first `open`; after `close` the stream cannot
/// be reacquired.
pub(crate) struct TextInput {
    pending: Option<Input>,
    lines: Option<LineSource>,
}
impl TextInput {
    pub fn new(input: Input) -> Self {
        Self {
            pending: Some(input),
            lines: None,
        }
    }

    pub fn open(&mut self, format: &'static str) -> crate::Result<()> {
        if self.lines.is_some() {
            return Ok(());
        }
        let input = self.pending.take().ok_or(FlatError::ParserClosed)?;
        debug!(format, ?input, "Opening text input");
        self.lines = Some(LineSource::new(input.into_text_reader()?));
        Ok(())
    }

    pub fn close(&mut self) {
        self.pending = None;
        self.lines = None;
    }

    pub fn lines(&mut self) -> crate::Result<&mut LineSource> {
        self.lines.as_mut().ok_or(FlatError::ParserClosed)
    }
}

/// `text == keyword` or `text` starts with `keyword` followed by whitespace.
pub(crate) fn has_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Splits `key=value key2="quoted value"` pairs, as used by `track` lines,
/// WIG declarations, and the MAF header.
pub(crate) fn parse_key_values(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let key: String = std::iter::from_fn(|| chars.next_if(|&c| c != '=' && !c.is_whitespace())).collect();
        if key.is_empty() {
            if chars.next().is_none() {
                break;
            }
            continue;
        }
        if chars.next_if_eq(&'=').is_none() {
            pairs.push((key, String::new()));
            continue;
        }
        let value: String = match chars.peek() {
            Some(&quote) if quote == '"' || quote == '\'' => {
                chars.next();
                let value: String = std::iter::from_fn(|| chars.next_if(|&c| c != quote)).collect();
                chars.next();
                value
            }
            _ => std::iter::from_fn(|| chars.next_if(|c| !c.is_whitespace())).collect(),
        };
        pairs.push((key, value));
    }
    pairs
}

/// Parses a numeric column, reporting the column name on failure.
pub(crate) fn parse_column<T: FromStr>(
    format: &'static str,
    line: usize,
    column: &str,
    text: &str,
) -> crate::Result<T> {
    text.parse()
        .map_err(|_| FlatError::malformed(format, line, format!("invalid {column}: {text:?}")))
}

/// Turns a failed checked coordinate computation into a line error.
pub(crate) fn checked_coordinate(format: &'static str, line: usize, value: Option<u64>) -> crate::Result<u64> {
    value.ok_or_else(|| FlatError::malformed(format, line, "coordinate overflow"))
}

pub(crate) fn parse_strand(format: &'static str, line: usize, text: &str) -> crate::Result<Strand> {
    Strand::from_symbol(text).map_err(|err| FlatError::malformed(format, line, err.to_string()))
}

pub(crate) fn require_columns(
    format: &'static str,
    line: usize,
    columns: &[&str],
    expected: usize,
) -> crate::Result<()> {
    if columns.len() < expected {
        return Err(FlatError::malformed(
            format,
            line,
            format!("expected at least {expected} columns, found {}", columns.len()),
        ));
    }
    Ok(())
}
