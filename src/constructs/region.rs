use std::fmt;
use std::str::FromStr;

use crate::FlatError;

/// A genomic region used for seeking.
///
/// Both `start` and `end` are inclusive. A record intersects the region when
/// it lies on `chrom` and `record.start <= end && record.end >= start`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}
impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> crate::Result<Self> {
        let region = Self {
            chrom: chrom.into(),
            start,
            end,
        };
        region.validate()?;
        Ok(region)
    }

    /// The whole of `chrom`.
    pub fn chromosome(chrom: impl Into<String>) -> Self {
        Self {
            chrom: chrom.into(),
            start: 0,
            end: u64::MAX,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.chrom.is_empty() {
            return Err(FlatError::InvalidRegion("empty chromosome name".into()));
        }
        if self.start > self.end {
            return Err(FlatError::InvalidRegion(format!(
                "start ({}) is greater than end ({})",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn contains_position(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && self.start <= pos && pos <= self.end
    }

    pub fn intersects(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && start <= self.end && end >= self.start
    }
}

/// Parses `chrom`, `chrom:start-end`, or `chrom:pos`.
///
/// Thousands separators (`,`) in positions are accepted.
impl FromStr for Region {
    type Err = FlatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((chrom, range)) = s.rsplit_once(':') else {
            let region = Self::chromosome(s);
            region.validate()?;
            return Ok(region);
        };
        let parse = |text: &str| -> crate::Result<u64> {
            text.replace(',', "")
                .parse()
                .map_err(|_| FlatError::InvalidRegion(format!("bad position {:?} in {:?}", text, s)))
        };
        let (start, end) = match range.split_once('-') {
            Some((start, end)) => (parse(start)?, parse(end)?),
            None => {
                let pos = parse(range)?;
                (pos, pos)
            }
        };
        Self::new(chrom, start, end)
    }
}
impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == 0 && self.end == u64::MAX {
            write!(f, "{}", self.chrom)
        } else {
            write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
        }
    }
}
