use std::{fmt, path::Path, str::FromStr};

use tracing::debug;

use crate::{
    formats::{BigBed, BigWig, Bed, Fasta, Gff, Maf, Sam, Vcf, Wig},
    io::Input,
    Config, FlatError, IntoFlatError, Metadata, Record, Region,
};

use super::Parser;

/// Every format the crate can open by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FormatKind {
    Bed,
    BigBed,
    BigWig,
    Maf,
    Fasta,
    Gff,
    Vcf,
    Sam,
    Wig,
}
impl FormatKind {
    pub const ALL: [FormatKind; 9] = [
        Self::Bed,
        Self::BigBed,
        Self::BigWig,
        Self::Maf,
        Self::Fasta,
        Self::Gff,
        Self::Vcf,
        Self::Sam,
        Self::Wig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bed => "bed",
            Self::BigBed => "bigbed",
            Self::BigWig => "bigwig",
            Self::Maf => "maf",
            Self::Fasta => "fasta",
            Self::Gff => "gff",
            Self::Vcf => "vcf",
            Self::Sam => "sam",
            Self::Wig => "wig",
        }
    }

    /// Guesses the format from a file extension, looking through a trailing
    /// compression suffix (`reads.vcf.gz` is VCF).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();
        let name = [".gz", ".bgz", ".bz2", ".xz", ".zst"]
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .unwrap_or(&name);
        let (_, extension) = name.rsplit_once('.')?;
        let kind = match extension {
            "bed" => Self::Bed,
            "bb" | "bigbed" => Self::BigBed,
            "bw" | "bigwig" => Self::BigWig,
            "maf" => Self::Maf,
            "fa" | "fasta" | "fna" => Self::Fasta,
            "gff" | "gff3" | "gtf" => Self::Gff,
            "vcf" => Self::Vcf,
            "sam" => Self::Sam,
            "wig" | "bedgraph" => Self::Wig,
            _ => return None,
        };
        Some(kind)
    }

    /// Opens `input` with this format's plugin.
    pub fn open(self, input: impl Into<Input>, config: Config) -> crate::Result<AnyParser> {
        let input = input.into();
        debug!(format = self.as_str(), ?input, "Dispatching parser");
        let parser = match self {
            Self::Bed => AnyParser::Bed(Parser::open(Bed::new(input), config)?),
            Self::BigBed => AnyParser::BigBed(Parser::open(BigBed::new(input), config)?),
            Self::BigWig => AnyParser::BigWig(Parser::open(BigWig::new(input), config)?),
            Self::Maf => AnyParser::Maf(Parser::open(Maf::new(input), config)?),
            Self::Fasta => AnyParser::Fasta(Parser::open(Fasta::new(input), config)?),
            Self::Gff => AnyParser::Gff(Parser::open(Gff::new(input), config)?),
            Self::Vcf => AnyParser::Vcf(Parser::open(Vcf::new(input), config)?),
            Self::Sam => AnyParser::Sam(Parser::open(Sam::new(input), config)?),
            Self::Wig => AnyParser::Wig(Parser::open(Wig::new(input), config)?),
        };
        Ok(parser)
    }
}
impl FromStr for FormatKind {
    type Err = FlatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FlatError::UnsupportedFormat(s.to_string()))
    }
}
impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`Parser`] over any built-in format.
pub enum AnyParser {
    Bed(Parser<Bed>),
    BigBed(Parser<BigBed>),
    BigWig(Parser<BigWig>),
    Maf(Parser<Maf>),
    Fasta(Parser<Fasta>),
    Gff(Parser<Gff>),
    Vcf(Parser<Vcf>),
    Sam(Parser<Sam>),
    Wig(Parser<Wig>),
}

macro_rules! delegate {
    ($self:expr, $parser:ident => $body:expr) => {
        match $self {
            AnyParser::Bed($parser) => $body,
            AnyParser::BigBed($parser) => $body,
            AnyParser::BigWig($parser) => $body,
            AnyParser::Maf($parser) => $body,
            AnyParser::Fasta($parser) => $body,
            AnyParser::Gff($parser) => $body,
            AnyParser::Vcf($parser) => $body,
            AnyParser::Sam($parser) => $body,
            AnyParser::Wig($parser) => $body,
        }
    };
}

impl AnyParser {
    pub fn kind(&self) -> FormatKind {
        match self {
            Self::Bed(_) => FormatKind::Bed,
            Self::BigBed(_) => FormatKind::BigBed,
            Self::BigWig(_) => FormatKind::BigWig,
            Self::Maf(_) => FormatKind::Maf,
            Self::Fasta(_) => FormatKind::Fasta,
            Self::Gff(_) => FormatKind::Gff,
            Self::Vcf(_) => FormatKind::Vcf,
            Self::Sam(_) => FormatKind::Sam,
            Self::Wig(_) => FormatKind::Wig,
        }
    }

    pub fn advance(&mut self) -> crate::Result<bool> {
        delegate!(self, p => p.advance())
    }

    pub fn record(&self) -> Option<&Record> {
        delegate!(self, p => p.record())
    }

    pub fn take_record(&mut self) -> Option<Record> {
        delegate!(self, p => p.take_record())
    }

    pub fn metadata(&self) -> &Metadata {
        delegate!(self, p => p.metadata())
    }

    pub fn metadata_changed(&self) -> bool {
        delegate!(self, p => p.metadata_changed())
    }

    pub fn config(&self) -> &Config {
        delegate!(self, p => p.config())
    }

    pub fn format_name(&self) -> &'static str {
        delegate!(self, p => p.format_name())
    }

    pub fn seek(&mut self, region: &Region) -> crate::Result<()> {
        delegate!(self, p => p.seek(region))
    }

    /// See [`Parser::try_for_each_record`].
    pub fn try_for_each_record<E, C>(&mut self, f: C) -> crate::Result<usize>
    where
        E: IntoFlatError,
        C: FnMut(&Record, &Metadata) -> std::result::Result<(), E>,
    {
        delegate!(self, p => p.try_for_each_record(f))
    }

    pub fn close(&mut self) -> crate::Result<()> {
        delegate!(self, p => p.close())
    }

    pub fn is_closed(&self) -> bool {
        delegate!(self, p => p.is_closed())
    }
}
impl Iterator for AnyParser {
    type Item = crate::Result<Record>;
    fn next(&mut self) -> Option<Self::Item> {
        delegate!(self, p => p.next())
    }
}
impl fmt::Debug for AnyParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyParser")
            .field("format", &self.format_name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Opens `input` with the plugin registered under `id` (`"bed"`, `"vcf"`...).
///
/// Fails with [`FlatError::UnsupportedFormat`] for an unknown identifier.
pub fn open_as(id: &str, input: impl Into<Input>, config: Config) -> crate::Result<AnyParser> {
    id.parse::<FormatKind>()?.open(input, config)
}

/// Opens a file, picking the format from its extension.
pub fn open_path<P: AsRef<Path>>(path: P, config: Config) -> crate::Result<AnyParser> {
    let path = path.as_ref();
    let kind = FormatKind::from_path(path)
        .ok_or_else(|| FlatError::UnsupportedFormat(path.display().to_string()))?;
    kind.open(path, config)
}
