//! # flatrec - Streaming Record Parsers for Genomic Flat Files
//!
//! `flatrec` reads the flat and indexed file formats of genomics (BED, GFF,
//! VCF, SAM, WIG, MAF, FASTA, bigBed and bigWig) through one streaming
//! engine. Every format yields the same [`Record`] shape and accumulates its
//! header lines into a [`Metadata`] map, so downstream code can be written
//! once and pointed at any of them.
//!
//! ## Architecture
//!
//! A format plugin implements [`Format`]: it lexes its input into *blocks*
//! (a line, a paragraph, a decoded binary entry), says which blocks are
//! metadata, and decodes the rest into records. The [`Parser`] owns the
//! iteration state:
//!
//! - a two-slot [`Lookahead`] buffer, kept one block ahead of the record
//!   being decoded,
//! - the metadata-skip loop, which absorbs metadata blocks wherever they
//!   appear in the stream and flags the advance that absorbed them,
//! - the record lifecycle (`advance` / `record` / `close`), and
//! - optional random access through [`Parser::seek`] for indexed formats.
//!
//! ## Coordinates
//!
//! Records carry coordinates exactly as the file writes them. BED, bigBed,
//! bigWig and MAF intervals are zero-based with an exclusive end; GFF, VCF,
//! SAM, WIG and FASTA intervals are one-based and inclusive. A [`Region`]
//! used for seeking is a closed interval in the same numbering as the
//! records it selects; a half-open record matches when one of the bases it
//! covers falls inside the region.
//!
//! ## Basic Usage
//!
//! ### Streaming records
//!
//! ```rust
//! use flatrec::{open_as, Config};
//!
//! # fn main() -> flatrec::Result<()> {
//! let text = "##gff-version 3\n\
//!             chr1\tsrc\tgene\t1000\t2000\t.\t+\t.\tID=gene1\n\
//!             chr1\tsrc\tmRNA\t1000\t2000\t.\t+\t.\tID=tx1;Parent=gene1\n";
//!
//! let mut parser = open_as("gff", text.as_bytes().to_vec(), Config::default())?;
//! while parser.advance()? {
//!     let record = parser.record().unwrap();
//!     println!("{}:{}-{} {}", record.chrom, record.start, record.end, record.name);
//! }
//! assert_eq!(parser.metadata().text("gff-version"), Some("3"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Files and compression
//!
//! Paths are opened by extension; gzip, bzip2, xz and zstd inputs are
//! detected from their magic bytes and decompressed transparently.
//!
//! ```rust,no_run
//! use flatrec::{open_path, Config};
//!
//! # fn main() -> flatrec::Result<()> {
//! let parser = open_path("calls.vcf.gz", Config::default().parse_metadata(false))?;
//! let records = parser.collect::<flatrec::Result<Vec<_>>>()?;
//! println!("{} variants", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ### Indexed access
//!
//! ```rust,no_run
//! use flatrec::{formats::BigWig, Config, Parser, Region};
//!
//! # fn main() -> flatrec::Result<()> {
//! let mut parser = Parser::open(BigWig::new("signal.bw"), Config::default())?;
//! parser.seek(&"chr7:5,527,000-5,530,000".parse::<Region>()?)?;
//! for record in parser {
//!     let record = record?;
//!     println!("{}\t{}\t{}\t{}", record.chrom, record.start, record.end, record.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FlatError>`. Seeking a format without an
//! index fails with a recoverable [`FlatError::NotSupported`]:
//!
//! ```rust
//! use flatrec::{open_as, Config, Region};
//!
//! # fn main() -> flatrec::Result<()> {
//! let mut parser = open_as("bed", b"chr1\t0\t10\n".to_vec(), Config::default())?;
//! let err = parser.seek(&Region::chromosome("chr1")).unwrap_err();
//! assert!(err.is_not_supported());
//! assert!(parser.advance()?);
//! # Ok(())
//! # }
//! ```

mod constructs;
mod error;
pub mod formats;
pub mod io;
mod parser;

pub use constructs::{Config, MetaValue, Metadata, Record, Region, Strand};
pub use error::{FlatError, IntoFlatError, Result};
pub use io::Input;
pub use parser::{open_as, open_path, AnyParser, BlockSource, Format, FormatKind, Lookahead, Parser};
