//! VCF variants.
//!
//! `##key=value` meta lines and the `#CHROM` column header are metadata.
//! Structured meta lines that repeat (`INFO`, `FORMAT`, `FILTER`, `contig`...)
//! are appended; all other keys overwrite.

use crate::{
    io::{Input, Line},
    BlockSource, FlatError, Format, Metadata, Record,
};

use super::{checked_coordinate, parse_column, require_columns, TextInput};

const NAME: &str = "vcf";

const REPEATED_KEYS: &[&str] = &["INFO", "FORMAT", "FILTER", "ALT", "contig", "SAMPLE", "PEDIGREE"];

/// Fixed columns preceding the per-sample columns.
const HEADER_COLUMNS: usize = 9;

pub struct Vcf {
    input: TextInput,
}
impl Vcf {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
        }
    }
}

impl BlockSource for Vcf {
    type Block = Line;
    fn read_block(&mut self) -> crate::Result<Option<Line>> {
        self.input.lines()?.next_nonblank()
    }
}

impl Format for Vcf {
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
        if let Some(meta) = line.text.strip_prefix("##") {
            match meta.split_once('=') {
                Some((key, value)) if REPEATED_KEYS.contains(&key) => metadata.append(key, value),
                Some((key, value)) => metadata.set(key, value),
                None => metadata.append("comment", meta.trim()),
            }
            return Ok(());
        }

        let columns: Vec<&str> = line.text.split('\t').collect();
        if columns.first() != Some(&"#CHROM") {
            return Err(FlatError::malformed(
                NAME,
                line.number,
                "header line must start with #CHROM",
            ));
        }
        metadata.set("header", &line.text[1..]);
        for sample in columns.iter().skip(HEADER_COLUMNS) {
            metadata.append("samples", *sample);
        }
        Ok(())
    }

    fn read_record(&mut self, line: &Line) -> crate::Result<Record> {
        let columns: Vec<&str> = line.text.split('\t').collect();
        require_columns(NAME, line.number, &columns, 8)?;

        let pos: u64 = parse_column(NAME, line.number, "POS", columns[1])?;
        let reference = columns[3];
        if reference.is_empty() {
            return Err(FlatError::malformed(NAME, line.number, "empty REF allele"));
        }
        let end = checked_coordinate(NAME, line.number, pos.checked_add(reference.len() as u64 - 1))?;

        let mut fields: Vec<String> = vec![
            reference.to_string(),
            columns[4].to_string(),
            columns[6].to_string(),
            columns[7].to_string(),
        ];
        fields.extend(columns.iter().skip(8).map(|c| c.to_string()));

        Ok(Record::new(columns[0], pos, end)
            .with_name(columns[2])
            .with_score(columns[5])
            .with_fields(fields))
    }
}
