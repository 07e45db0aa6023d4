//! SAM alignments.
//!
//! `@` header lines are metadata. Records span the reference bases consumed
//! by their CIGAR, reported 1-based and inclusive.

use crate::{
    io::{Input, Line},
    BlockSource, FlatError, Format, Metadata, Record, Strand,
};

use super::{checked_coordinate, parse_column, require_columns, TextInput};

const NAME: &str = "sam";

const FLAG_UNMAPPED: u16 = 0x4;
const FLAG_REVERSE: u16 = 0x10;

pub struct Sam {
    input: TextInput,
}
impl Sam {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
        }
    }
}

impl BlockSource for Sam {
    type Block = Line;
    fn read_block(&mut self) -> crate::Result<Option<Line>> {
        self.input.lines()?.next_nonblank()
    }
}

impl Format for Sam {
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
        line.text.starts_with('@')
    }

    /// `@HD` overwrites; `@SQ`, `@RG`, `@PG`, and `@CO` accumulate.
    fn read_metadata(&mut self, line: &Line, metadata: &mut Metadata) -> crate::Result<()> {
        let text = &line.text[1..];
        let (tag, rest) = text.split_once('\t').unwrap_or((text, ""));
        if tag.len() != 2 {
            return Err(FlatError::malformed(
                NAME,
                line.number,
                format!("invalid header record type {tag:?}"),
            ));
        }
        match tag {
            "HD" => metadata.set(tag, rest),
            _ => metadata.append(tag, rest),
        }
        Ok(())
    }

    fn read_record(&mut self, line: &Line) -> crate::Result<Record> {
        let columns: Vec<&str> = line.text.split('\t').collect();
        require_columns(NAME, line.number, &columns, 11)?;

        let flag: u16 = parse_column(NAME, line.number, "FLAG", columns[1])?;
        let pos: u64 = parse_column(NAME, line.number, "POS", columns[3])?;
        let cigar = columns[5];
        let span = match cigar {
            "*" => 0,
            _ => reference_length(cigar).ok_or_else(|| {
                FlatError::malformed(NAME, line.number, format!("invalid CIGAR {cigar:?}"))
            })?,
        };
        let end = if pos == 0 || span == 0 {
            pos
        } else {
            checked_coordinate(NAME, line.number, pos.checked_add(span - 1))?
        };

        let strand = if flag & FLAG_UNMAPPED != 0 {
            Strand::Unknown
        } else if flag & FLAG_REVERSE != 0 {
            Strand::Reverse
        } else {
            Strand::Forward
        };

        let mut fields = vec![columns[1].to_string()];
        fields.extend(columns.iter().skip(5).map(|c| c.to_string()));

        Ok(Record::new(columns[2], pos, end)
            .with_name(columns[0])
            .with_score(columns[4])
            .with_strand(strand)
            .with_fields(fields))
    }
}

/// Number of reference bases consumed by a CIGAR string (`M D N = X`).
///
/// Returns `None` for an empty or malformed CIGAR.
pub fn reference_length(cigar: &str) -> Option<u64> {
    if cigar.is_empty() {
        return None;
    }
    let mut total = 0u64;
    let mut count: Option<u64> = None;
    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            count = Some(count.unwrap_or(0).checked_mul(10)?.checked_add(digit as u64)?);
            continue;
        }
        let len = count.take()?;
        match c {
            'M' | 'D' | 'N' | '=' | 'X' => total = total.checked_add(len)?,
            'I' | 'S' | 'H' | 'P' => {}
            _ => return None,
        }
    }
    count.is_none().then_some(total)
}
