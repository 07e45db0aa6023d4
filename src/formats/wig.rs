//! WIG and bedGraph signal tracks.
//!
//! Data lines in a WIG file only make sense relative to the preceding
//! `fixedStep`/`variableStep` declaration, so declarations are resolved
//! while lexing: every data block already carries its chromosome and span.
//! That keeps records decodable when metadata parsing is switched off.
//!
//! Outside any declaration, four-column `chrom start end value` lines are
//! read as bedGraph and copied as written.

use crate::{
    io::{Input, Line},
    BlockSource, FlatError, Format, Metadata, Record,
};

use super::{checked_coordinate, has_keyword, parse_column, parse_key_values, TextInput};

const NAME: &str = "wig";

/// One lexed WIG block.
#[derive(Debug, Clone, PartialEq)]
pub enum WigBlock {
    /// `track`, `browser`, comment, or step declaration line.
    Directive(Line),
    /// A data value with its resolved interval.
    Point {
        line: usize,
        chrom: String,
        start: u64,
        end: u64,
        value: String,
    },
}

#[derive(Debug, Clone)]
enum StepMode {
    BedGraph,
    Variable { chrom: String, span: u64 },
    /// `next` is `None` once stepping has run past `u64::MAX`.
    Fixed { chrom: String, next: Option<u64>, step: u64, span: u64 },
}

pub struct Wig {
    input: TextInput,
    mode: StepMode,
}
impl Wig {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: TextInput::new(input.into()),
            mode: StepMode::BedGraph,
        }
    }

    fn declare(&mut self, line: &Line) -> crate::Result<()> {
        let text = line.text.trim_start();
        let variable = has_keyword(text, "variableStep");
        let pairs = parse_key_values(text);
        let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let number = |key: &str, default: Option<u64>| -> crate::Result<u64> {
            match (get(key), default) {
                (Some(text), _) => parse_column(NAME, line.number, key, text),
                (None, Some(default)) => Ok(default),
                (None, None) => Err(FlatError::malformed(
                    NAME,
                    line.number,
                    format!("declaration is missing {key}="),
                )),
            }
        };

        let chrom = get("chrom")
            .ok_or_else(|| FlatError::malformed(NAME, line.number, "declaration is missing chrom="))?
            .to_string();
        let span = number("span", Some(1))?;
        if span == 0 {
            return Err(FlatError::malformed(NAME, line.number, "span must be positive"));
        }
        self.mode = if variable {
            StepMode::Variable { chrom, span }
        } else {
            StepMode::Fixed {
                chrom,
                next: Some(number("start", None)?),
                step: number("step", None)?,
                span,
            }
        };
        Ok(())
    }

    fn resolve(&mut self, line: Line) -> crate::Result<WigBlock> {
        let columns: Vec<&str> = line.text.split_whitespace().collect();
        let bad_shape = || {
            FlatError::malformed(
                NAME,
                line.number,
                format!("unexpected {} column data line", columns.len()),
            )
        };
        let (chrom, start, end, value) = match &mut self.mode {
            StepMode::Fixed {
                chrom,
                next,
                step,
                span,
            } => {
                let [value] = columns[..] else {
                    return Err(bad_shape());
                };
                let start = checked_coordinate(NAME, line.number, *next)?;
                *next = start.checked_add(*step);
                let end = checked_coordinate(NAME, line.number, start.checked_add(*span - 1))?;
                (chrom.clone(), start, end, value)
            }
            StepMode::Variable { chrom, span } => {
                let [pos, value] = columns[..] else {
                    return Err(bad_shape());
                };
                let start: u64 = parse_column(NAME, line.number, "position", pos)?;
                let end = checked_coordinate(NAME, line.number, start.checked_add(*span - 1))?;
                (chrom.clone(), start, end, value)
            }
            StepMode::BedGraph => {
                let [chrom, start, end, value] = columns[..] else {
                    return Err(bad_shape());
                };
                (
                    chrom.to_string(),
                    parse_column(NAME, line.number, "start", start)?,
                    parse_column(NAME, line.number, "end", end)?,
                    value,
                )
            }
        };
        Ok(WigBlock::Point {
            line: line.number,
            chrom,
            start,
            end,
            value: value.to_string(),
        })
    }
}

fn is_declaration(text: &str) -> bool {
    has_keyword(text, "fixedStep") || has_keyword(text, "variableStep")
}

impl BlockSource for Wig {
    type Block = WigBlock;
    fn read_block(&mut self) -> crate::Result<Option<WigBlock>> {
        let Some(line) = self.input.lines()?.next_nonblank()? else {
            return Ok(None);
        };
        let text = line.text.trim_start();
        if is_declaration(text) {
            self.declare(&line)?;
            return Ok(Some(WigBlock::Directive(line)));
        }
        if text.starts_with('#') || has_keyword(text, "track") || has_keyword(text, "browser") {
            return Ok(Some(WigBlock::Directive(line)));
        }
        self.resolve(line).map(Some)
    }
}

impl Format for Wig {
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

    fn is_metadata(&self, block: &WigBlock) -> bool {
        matches!(block, WigBlock::Directive(_))
    }

    /// Track attributes and the active declaration overwrite; browser lines
    /// and comments accumulate.
    fn read_metadata(&mut self, block: &WigBlock, metadata: &mut Metadata) -> crate::Result<()> {
        let WigBlock::Directive(line) = block else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_metadata on a data point",
            });
        };
        let text = line.text.trim();
        if let Some(comment) = text.strip_prefix('#') {
            metadata.append("comment", comment.trim());
        } else if let Some(rest) = text.strip_prefix("browser") {
            metadata.append("browser", rest.trim());
        } else if let Some(rest) = text.strip_prefix("track") {
            for (key, value) in parse_key_values(rest) {
                metadata.set(key, value);
            }
        } else {
            let (mode, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            metadata.set("step", mode);
            for (key, value) in parse_key_values(rest) {
                metadata.set(key, value);
            }
        }
        Ok(())
    }

    fn read_record(&mut self, block: &WigBlock) -> crate::Result<Record> {
        let WigBlock::Point {
            line,
            chrom,
            start,
            end,
            value,
        } = block
        else {
            return Err(FlatError::NotImplemented {
                format: NAME,
                primitive: "read_record on a directive",
            });
        };
        if value.parse::<f64>().is_err() {
            return Err(FlatError::malformed(
                NAME,
                *line,
                format!("invalid value {value:?}"),
            ));
        }
        Ok(Record::new(chrom.as_str(), *start, *end).with_score(value.as_str()))
    }
}
