//! Raw source records as they appear in the corpus files
//!
//! Source files disagree on field names and on whether a text field is a
//! single string or an array of strings. Decoding happens in two passes:
//! a strict serde pass over the whole file, then a lossy pass that reads
//! whatever string fields each element has.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a file yielded no records at all
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an object or an array of objects, found {0}")]
    UnexpectedShape(&'static str),
}

/// A text field that may be encoded as one string or as an array of strings
///
/// Shapes are tried in order: array, then single string. `null` and `""`
/// decode to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    fn from_value_lossy(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if !s.is_empty() => StringList(vec![s.clone()]),
            Some(Value::Array(items)) => StringList(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => StringList::default(),
        }
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Many(Vec<String>),
            One(String),
        }

        Ok(match Option::<Shape>::deserialize(deserializer)? {
            None => StringList::default(),
            Some(Shape::Many(lines)) => StringList(lines),
            Some(Shape::One(line)) if line.is_empty() => StringList::default(),
            Some(Shape::One(line)) => StringList(vec![line]),
        })
    }
}

/// Union of every field the collections use
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub rhythmic: Option<String>,
    pub dynasty: Option<String>,
    pub chapter: Option<String>,
    pub section: Option<String>,
    pub volume: Option<String>,
    pub prologue: Option<String>,
    pub paragraphs: StringList,
    pub content: StringList,
    pub para: StringList,
    pub notes: StringList,
    pub comment: StringList,
}

impl RawRecord {
    /// Read the string-shaped fields an element has, ignoring the rest
    ///
    /// Numeric IDs are kept as their decimal text.
    pub fn from_value_lossy(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return RawRecord::default();
        };

        RawRecord {
            id: match obj.get("id") {
                Some(Value::Number(n)) => Some(n.to_string()),
                other => other.and_then(Value::as_str).map(str::to_string),
            },
            title: text(obj, "title"),
            author: text(obj, "author"),
            rhythmic: text(obj, "rhythmic"),
            dynasty: text(obj, "dynasty"),
            chapter: text(obj, "chapter"),
            section: text(obj, "section"),
            volume: text(obj, "volume"),
            prologue: text(obj, "prologue"),
            paragraphs: StringList::from_value_lossy(obj.get("paragraphs")),
            content: StringList::from_value_lossy(obj.get("content")),
            para: StringList::from_value_lossy(obj.get("para")),
            notes: StringList::from_value_lossy(obj.get("notes")),
            comment: StringList::from_value_lossy(obj.get("comment")),
        }
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Which decoding pass produced the records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    Strict,
    Lossy,
}

/// Decode one file's bytes into records, one per source element
///
/// The returned records keep source positions: element `i` of an array is
/// record `i`. A file holding a single object yields one record.
pub fn parse_records(bytes: &[u8]) -> Result<(Vec<RawRecord>, DecodeMode), ParseError> {
    let value: Value = serde_json::from_slice(bytes)?;

    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![&value],
        Value::Null => return Err(ParseError::UnexpectedShape("null")),
        Value::Bool(_) => return Err(ParseError::UnexpectedShape("boolean")),
        Value::Number(_) => return Err(ParseError::UnexpectedShape("number")),
        Value::String(_) => return Err(ParseError::UnexpectedShape("string")),
    };

    let strict: Result<Vec<RawRecord>, serde_json::Error> =
        items.iter().map(|item| RawRecord::deserialize(*item)).collect();

    match strict {
        Ok(records) => Ok((records, DecodeMode::Strict)),
        Err(e) => {
            tracing::debug!("Strict decode failed ({}), falling back to lossy decode", e);
            let records = items.into_iter().map(RawRecord::from_value_lossy).collect();
            Ok((records, DecodeMode::Lossy))
        }
    }
}
