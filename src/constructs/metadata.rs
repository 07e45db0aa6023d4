use std::collections::HashMap;

/// A single metadata value.
///
/// Directives that may appear once per stream are stored as `Text`; directives
/// that repeat (VCF `##INFO`, SAM `@SQ`, comments) accumulate into a `List`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum MetaValue {
    Text(String),
    List(Vec<String>),
}
impl MetaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Accumulated stream metadata.
///
/// The map only ever grows or overwrites; nothing is removed while a parser
/// is open. Merge policy (overwrite vs. append) is chosen by each format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Metadata {
    entries: HashMap<String, MetaValue>,
}
impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing whatever was there.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), MetaValue::Text(value.into()));
    }

    /// Appends `value` to the list under `key`.
    ///
    /// A `Text` entry already present under `key` becomes the first element.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let items = match self.entries.remove(&key) {
            Some(MetaValue::List(mut items)) => {
                items.push(value);
                items
            }
            Some(MetaValue::Text(first)) => vec![first, value],
            None => vec![value],
        };
        self.entries.insert(key, MetaValue::List(items));
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_text)
    }
    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(MetaValue::as_list)
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
