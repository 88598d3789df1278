use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Structured analysis of one video.
///
/// Every field is optional: absence means the model did not produce it.
/// `error` and `raw_text` are only set on diagnostic records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_line_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub emotions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(
        default,
        alias = "tweetSuggestion",
        deserialize_with = "deserialize_single_or_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub viral_suggestions: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_line_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub title_suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_moments: Option<Vec<KeyMoment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMoment {
    pub timestamp: String,
    pub description: String,
}

impl KeyMoment {
    pub fn new(timestamp: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            description: description.into(),
        }
    }
}

impl AnalysisRecord {
    /// Record returned when analysis produced nothing usable.
    pub fn diagnostic(error: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            raw_text: Some(raw_text.into()),
            ..Self::default()
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        self.error.is_some()
    }
}

/// Accepts either a JSON array of strings or a single string holding one item
/// per line. Blank lines are dropped and items are trimmed.
fn deserialize_line_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(ListVisitor { split_lines: true })
}

/// Accepts either a JSON array of strings or a single string kept whole as
/// one item, blank lines included.
fn deserialize_single_or_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(ListVisitor { split_lines: false })
}

struct ListVisitor {
    split_lines: bool,
}

impl<'de> Visitor<'de> for ListVisitor {
    type Value = Option<Vec<String>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a list of strings")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(self)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if self.split_lines {
            Ok(Some(split_lines(value)))
        } else {
            Ok(Some(vec![value.to_string()]))
        }
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<String>()? {
            items.push(item);
        }
        Ok(Some(items))
    }
}

fn split_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
