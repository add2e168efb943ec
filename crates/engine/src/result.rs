// ABOUTME: Evaluation output: Extracted values, ordered Records, and the Extraction with its error list.
// ABOUTME: Records serialize as maps in configuration order.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::EvalError;

/// The output of one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Terminal value of a leaf definition.
    Text(String),
    /// Children of the single element an `expect_single` definition matched.
    Record(Record),
    /// One entry per matched element (or per parent, for grouped results).
    List(Vec<Extracted>),
}

impl Extracted {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Extracted::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Extracted::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Extracted]> {
        match self {
            Extracted::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts to a `serde_json::Value` (object keys lose their order).
    pub fn to_json(&self) -> Value {
        match self {
            Extracted::Text(text) => Value::String(text.clone()),
            Extracted::Record(record) => record.to_json(),
            Extracted::List(items) => Value::Array(items.iter().map(Extracted::to_json).collect()),
        }
    }
}

impl Serialize for Extracted {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Extracted::Text(text) => serializer.serialize_str(text),
            Extracted::Record(record) => record.serialize(serializer),
            Extracted::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// An ordered `name -> value` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, Extracted)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Names are unique because the loader enforces it.
    pub fn insert(&mut self, name: impl Into<String>, value: Extracted) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Extracted> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Extracted)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Result of evaluating a whole configuration.
///
/// In lenient mode a failing top-level definition is left out of `fields`
/// and its error is recorded in `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Extraction {
    pub fields: Record,
    pub errors: Vec<EvalError>,
}

impl Extraction {
    /// True when every top-level definition produced a value.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Extracted> {
        self.fields.get(name)
    }
}
