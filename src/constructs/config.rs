use std::collections::HashMap;

use tracing::warn;

use crate::FlatError;

/// Parser configuration, fixed for the lifetime of a parser.
///
/// The only option the engine itself consults is `parse_metadata`. When it is
/// `false`, metadata blocks are still detected and skipped but their content
/// is never decoded, so [`Parser::metadata_changed`](crate::Parser::metadata_changed)
/// stays `false` and the metadata map stays empty.
///
/// `parseMetadata` is accepted as a second spelling of the same option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    #[cfg_attr(feature = "serde", serde(alias = "parseMetadata"))]
    pub parse_metadata: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            parse_metadata: true,
        }
    }
}
impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_metadata(mut self, parse_metadata: bool) -> Self {
        self.parse_metadata = parse_metadata;
        self
    }

    /// Builds a config from an option-name to value mapping.
    ///
    /// Unknown keys are ignored with a warning.
    pub fn from_pairs<I, K, V>(pairs: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "parse_metadata" | "parseMetadata" => {
                    config.parse_metadata = parse_bool(key, value)?;
                }
                _ => warn!(option = key, "Ignoring unrecognized parser option"),
            }
        }
        Ok(config)
    }
}
impl TryFrom<&HashMap<String, String>> for Config {
    type Error = FlatError;
    fn try_from(map: &HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

fn parse_bool(key: &str, value: &str) -> crate::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(FlatError::InvalidConfig(format!(
            "option {key:?} expects a boolean, found {value:?}"
        ))),
    }
}
