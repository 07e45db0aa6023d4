use std::fmt;
use std::str::FromStr;

use crate::FlatError;

/// Strand orientation of a genomic feature.
///
/// Every format maps its strand column through the same fixed encoding:
///
/// | symbol | variant   | encoded |
/// |--------|-----------|---------|
/// | `+`    | `Forward` | `1`     |
/// | `.`    | `Unknown` | `0`     |
/// | `-`    | `Reverse` | `-1`    |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    Forward,
    #[default]
    Unknown,
    Reverse,
}
impl Strand {
    /// Parses one of the three canonical strand symbols.
    pub fn from_symbol(symbol: &str) -> crate::Result<Self> {
        match symbol {
            "+" => Ok(Self::Forward),
            "." => Ok(Self::Unknown),
            "-" => Ok(Self::Reverse),
            other => Err(FlatError::InvalidStrand(other.to_string())),
        }
    }
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Forward => "+",
            Self::Unknown => ".",
            Self::Reverse => "-",
        }
    }
    pub fn encode(&self) -> i8 {
        match self {
            Self::Forward => 1,
            Self::Unknown => 0,
            Self::Reverse => -1,
        }
    }
    pub fn decode(value: i8) -> Option<Self> {
        match value {
            1 => Some(Self::Forward),
            0 => Some(Self::Unknown),
            -1 => Some(Self::Reverse),
            _ => None,
        }
    }
}
impl FromStr for Strand {
    type Err = FlatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}
impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One decoded data record.
///
/// Coordinates are reported as the source file writes them; no coordinate
/// system translation happens at this layer.
///
/// [`thick_start`](Record::thick_start) and [`thick_end`](Record::thick_end)
/// are placeholders for the fixed-width annotation shape and always return `0`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
    /// Score as written, `.` when absent.
    pub score: String,
    /// Encoded strand: `1`, `0`, or `-1`.
    pub strand: i8,
    /// Format-specific trailing columns.
    pub fields: Vec<String>,
}
impl Record {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            name: String::new(),
            score: ".".to_string(),
            strand: Strand::Unknown.encode(),
            fields: Vec::new(),
        }
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = score.into();
        self
    }
    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand.encode();
        self
    }
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }
    pub fn start(&self) -> u64 {
        self.start
    }
    pub fn end(&self) -> u64 {
        self.end
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn score(&self) -> &str {
        &self.score
    }
    pub fn strand(&self) -> i8 {
        self.strand
    }
    pub fn thick_start(&self) -> u64 {
        0
    }
    pub fn thick_end(&self) -> u64 {
        0
    }
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Closed-interval intersection against `chrom:start-end`.
    pub fn intersects(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && self.start <= end && self.end >= start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_encoding() {
        assert_eq!(Strand::from_symbol("+").unwrap().encode(), 1);
        assert_eq!(Strand::from_symbol(".").unwrap().encode(), 0);
        assert_eq!(Strand::from_symbol("-").unwrap().encode(), -1);
    }

    #[test]
    fn test_strand_rejects_other_symbols() {
        for symbol in ["?", "", "++", "1", "forward"] {
            assert!(matches!(
                Strand::from_symbol(symbol),
                Err(FlatError::InvalidStrand(_))
            ));
        }
    }

    #[test]
    fn test_strand_decode() {
        for strand in [Strand::Forward, Strand::Unknown, Strand::Reverse] {
            assert_eq!(Strand::decode(strand.encode()), Some(strand));
            assert_eq!(strand.symbol().parse::<Strand>().unwrap(), strand);
        }
        assert_eq!(Strand::decode(2), None);
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new("chr1", 100, 200)
            .with_name("featA")
            .with_strand(Strand::Reverse);
        assert_eq!(record.chrom(), "chr1");
        assert_eq!(record.start(), 100);
        assert_eq!(record.end(), 200);
        assert_eq!(record.name(), "featA");
        assert_eq!(record.score(), ".");
        assert_eq!(record.strand(), -1);
    }

    #[test]
    fn test_thick_placeholders_always_zero() {
        let record = Record::new("chr1", 100, 200).with_fields(vec!["150".into(), "180".into()]);
        assert_eq!(record.thick_start(), 0);
        assert_eq!(record.thick_end(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialized_record_has_no_thick_columns() {
        let record = Record::new("chr1", 100, 200).with_strand(Strand::Forward);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("thick_start").is_none());
        assert_eq!(json["strand"], 1);
        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_intersects_closed_interval() {
        let record = Record::new("chr1", 100, 200);
        assert!(record.intersects("chr1", 200, 300));
        assert!(record.intersects("chr1", 0, 100));
        assert!(!record.intersects("chr1", 201, 300));
        assert!(!record.intersects("chr2", 100, 200));
    }
}
