//! The streaming record engine.
//!
//! [`Parser`] drives a [`Format`] through a one-block [`Lookahead`] buffer,
//! absorbing metadata blocks into a [`Metadata`] map and decoding everything
//! else into [`Record`]s. Formats never see the iteration state; they only
//! lex and decode the blocks they are handed.

mod dispatch;
mod format;
mod lookahead;

pub use dispatch::{open_as, open_path, AnyParser, FormatKind};
pub use format::{BlockSource, Format};
pub use lookahead::Lookahead;

use tracing::{debug, trace, warn};

use crate::{Config, FlatError, IntoFlatError, Metadata, Record, Region};

/// Streaming parser over a single open stream.
///
/// # Examples
///
/// ```rust
/// use flatrec::{formats::Bed, Config, Input, Parser};
///
/// # fn main() -> flatrec::Result<()> {
/// let text = "track name=demo\nchr1 100 200 featA . +\nchr1 300 400 featB . -\n";
/// let mut parser = Parser::open(Bed::new(Input::from(text.as_bytes().to_vec())), Config::default())?;
///
/// assert!(parser.advance()?);
/// assert!(parser.metadata_changed());
/// assert_eq!(parser.record().unwrap().strand, 1);
///
/// assert!(parser.advance()?);
/// assert!(!parser.metadata_changed());
/// assert_eq!(parser.record().unwrap().name, "featB");
///
/// assert!(!parser.advance()?);
/// assert_eq!(parser.metadata().text("name"), Some("demo"));
/// parser.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Parser<F: Format> {
    format: F,
    blocks: Lookahead<F::Block>,
    record: Option<Record>,
    metadata: Metadata,
    metadata_changed: bool,
    config: Config,
    /// Set once the source has run dry; cleared only by `seek`.
    exhausted: bool,
    /// Set when the iterator yields an error; cleared only by `seek`.
    fused: bool,
    closed: bool,
}
impl<F: Format> Parser<F> {
    /// Opens `format` and primes the lookahead buffer.
    ///
    /// If priming fails the format is closed again before the error is
    /// returned.
    pub fn open(mut format: F, config: Config) -> crate::Result<Self> {
        format.open()?;
        debug!(format = format.name(), ?config, "Opened parser");

        let mut parser = Self {
            format,
            blocks: Lookahead::new(),
            record: None,
            metadata: Metadata::new(),
            metadata_changed: false,
            config,
            exhausted: false,
            fused: false,
            closed: false,
        };
        parser.blocks.shift(&mut parser.format)?;
        Ok(parser)
    }

    /// Moves to the next data record.
    ///
    /// Returns `Ok(false)` once the stream is exhausted, and keeps returning
    /// it without touching the source until the parser is closed. Errors
    /// from the format are passed through unchanged.
    pub fn advance(&mut self) -> crate::Result<bool> {
        self.ensure_open()?;
        self.record = None;
        self.metadata_changed = false;
        if self.exhausted {
            return Ok(false);
        }

        self.blocks.shift(&mut self.format)?;
        while let Some(block) = self.blocks.current() {
            if !self.format.is_metadata(block) {
                break;
            }
            if self.config.parse_metadata {
                self.format.read_metadata(block, &mut self.metadata)?;
                self.metadata_changed = true;
                trace!(format = self.format.name(), "Absorbed metadata block");
            }
            self.blocks.shift(&mut self.format)?;
        }

        match self.blocks.current() {
            Some(block) => {
                self.record = Some(self.format.read_record(block)?);
                Ok(true)
            }
            None => {
                self.exhausted = true;
                debug!(format = self.format.name(), "Stream exhausted");
                Ok(false)
            }
        }
    }

    /// The record produced by the last successful `advance`.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Moves the current record out of the parser.
    pub fn take_record(&mut self) -> Option<Record> {
        self.record.take()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// True iff a metadata block was absorbed during the last `advance`.
    pub fn metadata_changed(&self) -> bool {
        self.metadata_changed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn format_name(&self) -> &'static str {
        self.format.name()
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    /// Hands every remaining record to `f`, along with the metadata read so
    /// far, and returns how many records were processed.
    ///
    /// Stops at the first error. Errors raised by `f` come back as
    /// [`FlatError::Process`].
    ///
    /// ```rust
    /// use flatrec::{formats::Bed, Config, FlatError, Parser};
    ///
    /// let text = b"chr1\t0\t10\tok\nchr1\t10\t20\tbad\nchr1\t20\t30\tok\n".to_vec();
    /// let mut parser = Parser::open(Bed::new(text), Config::default()).unwrap();
    /// let result = parser.try_for_each_record(|record, _| match record.name.as_str() {
    ///     "ok" => Ok(()),
    ///     name => Err(std::io::Error::other(format!("rejected {name}"))),
    /// });
    /// assert!(matches!(result, Err(FlatError::Process(_))));
    /// ```
    pub fn try_for_each_record<E, C>(&mut self, mut f: C) -> crate::Result<usize>
    where
        E: IntoFlatError,
        C: FnMut(&Record, &Metadata) -> std::result::Result<(), E>,
    {
        let mut count = 0;
        while self.advance()? {
            if let Some(record) = self.record.as_ref() {
                f(record, &self.metadata).map_err(IntoFlatError::into_flat_error)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Repositions the stream to the records intersecting `region`.
    ///
    /// On `NotSupported` the parser is left exactly as it was, so callers can
    /// fall back to scanning with `advance`.
    pub fn seek(&mut self, region: &Region) -> crate::Result<()> {
        self.ensure_open()?;
        region.validate()?;
        self.format.seek(region)?;

        self.blocks.clear();
        self.record = None;
        self.metadata_changed = false;
        self.exhausted = false;
        self.fused = false;
        self.blocks.shift(&mut self.format)?;
        debug!(format = self.format.name(), %region, "Seeked parser");
        Ok(())
    }

    /// Releases the underlying stream. Calling it again is a no-op.
    pub fn close(&mut self) -> crate::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.blocks.clear();
        self.record = None;
        self.metadata_changed = false;
        debug!(format = self.format.name(), "Closed parser");
        self.format.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> crate::Result<()> {
        if self.closed {
            Err(FlatError::ParserClosed)
        } else {
            Ok(())
        }
    }
}

impl<F: Format> Drop for Parser<F> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(format = self.format.name(), %error, "Failed to close parser");
        }
    }
}

/// Iterating takes each record out of the parser.
///
/// The iterator stops after yielding the first error. Explicit calls to
/// [`Parser::advance`] still move past the failing block.
impl<F: Format> Iterator for Parser<F> {
    type Item = crate::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed || self.fused {
            return None;
        }
        match self.advance() {
            Ok(true) => self.record.take().map(Ok),
            Ok(false) => None,
            Err(error) => {
                self.fused = true;
                Some(Err(error))
            }
        }
    }
}
