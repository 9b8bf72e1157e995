//! Chart-data value model and JSON text codec.
//!
//! # Responsibility
//! - Model arbitrary visualization payloads as a generic structured value.
//! - Encode values to JSON text for storage and decode stored text back.
//!
//! # Invariants
//! - `encode` fails loudly on values JSON text cannot represent faithfully.
//! - `decode` never fails the caller: malformed text degrades to `None`.
//! - Object entry order survives an encode/decode round trip.

use log::error;
use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

/// Deepest container nesting accepted by [`encode`].
///
/// Kept below the JSON parser recursion limit so that everything `encode`
/// accepts can be decoded again.
pub const MAX_CHART_DEPTH: usize = 100;

/// Generic structured chart payload.
///
/// Opaque to business logic; the store only ever sees its encoded text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChartValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ChartValue>),
    /// Ordered key/value entries. Keys must be unique to be encodable.
    Map(Vec<(String, ChartValue)>),
}

impl ChartValue {
    /// Builds a map value from ordered entries.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ChartValue)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Builds a list value.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ChartValue>,
    {
        Self::List(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Looks up an entry of a map value by key.
    pub fn get(&self, key: &str) -> Option<&ChartValue> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(candidate, _)| candidate == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a numeric value as `f64`, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ChartValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for ChartValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ChartValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ChartValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ChartValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ChartValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<ChartValue>> for ChartValue {
    fn from(value: Vec<ChartValue>) -> Self {
        Self::List(value)
    }
}

impl Serialize for ChartValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ChartValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ChartValueVisitor)
    }
}

struct ChartValueVisitor;

impl<'de> Visitor<'de> for ChartValueVisitor {
    type Value = ChartValue;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a JSON-compatible chart value")
    }

    fn visit_unit<E>(self) -> Result<ChartValue, E> {
        Ok(ChartValue::Null)
    }

    fn visit_none<E>(self) -> Result<ChartValue, E> {
        Ok(ChartValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<ChartValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        ChartValue::deserialize(deserializer)
    }

    fn visit_bool<E>(self, value: bool) -> Result<ChartValue, E> {
        Ok(ChartValue::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<ChartValue, E> {
        Ok(ChartValue::Integer(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<ChartValue, E> {
        Ok(match i64::try_from(value) {
            Ok(value) => ChartValue::Integer(value),
            Err(_) => ChartValue::Float(value as f64),
        })
    }

    fn visit_f64<E>(self, value: f64) -> Result<ChartValue, E> {
        Ok(ChartValue::Float(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<ChartValue, E> {
        Ok(ChartValue::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<ChartValue, E> {
        Ok(ChartValue::String(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ChartValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<ChartValue>()? {
            items.push(item);
        }
        Ok(ChartValue::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<ChartValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        // Repeated keys keep their first position and their last value.
        let mut entries: Vec<(String, ChartValue)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        while let Some((key, value)) = map.next_entry::<String, ChartValue>()? {
            match positions.get(&key) {
                Some(&index) => entries[index].1 = value,
                None => {
                    positions.insert(key.clone(), entries.len());
                    entries.push((key, value));
                }
            }
        }
        Ok(ChartValue::Map(entries))
    }
}

/// Error for chart values that cannot be encoded.
#[derive(Debug)]
pub enum ChartDataError {
    /// `NaN` or an infinity; JSON has no literal for either.
    NonFiniteNumber { path: String },
    /// Map repeats a key, which JSON objects cannot carry faithfully.
    DuplicateKey { path: String, key: String },
    /// Containers nest deeper than [`MAX_CHART_DEPTH`].
    TooDeep { path: String },
    Json(serde_json::Error),
}

impl Display for ChartDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteNumber { path } => {
                write!(f, "chart data value at `{path}` is not a finite number")
            }
            Self::DuplicateKey { path, key } => {
                write!(f, "chart data object at `{path}` repeats key `{key}`")
            }
            Self::TooDeep { path } => write!(
                f,
                "chart data nesting exceeds {MAX_CHART_DEPTH} levels at `{path}`"
            ),
            Self::Json(err) => write!(f, "failed to encode chart data: {err}"),
        }
    }
}

impl Error for ChartDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::NonFiniteNumber { .. } | Self::DuplicateKey { .. } | Self::TooDeep { .. } => {
                None
            }
        }
    }
}

impl From<serde_json::Error> for ChartDataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Encodes a chart value into compact JSON text for storage.
///
/// # Errors
/// - `NonFiniteNumber` when a float is `NaN` or infinite.
/// - `DuplicateKey` when a map repeats a key.
/// - `TooDeep` when nesting exceeds [`MAX_CHART_DEPTH`].
pub fn encode(value: &ChartValue) -> Result<String, ChartDataError> {
    let mut path = String::from("$");
    check_encodable(value, &mut path, 0)?;
    Ok(serde_json::to_string(value)?)
}

/// Decodes stored chart text.
///
/// Malformed text is logged (metadata only) and yields `None`, so one
/// corrupted payload never blocks reading the record that carries it.
pub fn decode(text: &str) -> Option<ChartValue> {
    match serde_json::from_str::<ChartValue>(text) {
        Ok(value) => Some(value),
        Err(err) => {
            error!(
                "event=chart_decode module=codec status=error bytes={} line={} column={} error_code=chart_data_malformed",
                text.len(),
                err.line(),
                err.column()
            );
            None
        }
    }
}

fn check_encodable(
    value: &ChartValue,
    path: &mut String,
    depth: usize,
) -> Result<(), ChartDataError> {
    match value {
        ChartValue::Float(number) if !number.is_finite() => Err(ChartDataError::NonFiniteNumber {
            path: path.clone(),
        }),
        ChartValue::List(items) => {
            if depth >= MAX_CHART_DEPTH {
                return Err(ChartDataError::TooDeep { path: path.clone() });
            }
            for (index, item) in items.iter().enumerate() {
                let mark = path.len();
                let _ = write!(path, "[{index}]");
                check_encodable(item, path, depth + 1)?;
                path.truncate(mark);
            }
            Ok(())
        }
        ChartValue::Map(entries) => {
            if depth >= MAX_CHART_DEPTH {
                return Err(ChartDataError::TooDeep { path: path.clone() });
            }
            let mut seen = HashSet::with_capacity(entries.len());
            for (key, item) in entries {
                if !seen.insert(key.as_str()) {
                    return Err(ChartDataError::DuplicateKey {
                        path: path.clone(),
                        key: key.clone(),
                    });
                }
                let mark = path.len();
                path.push('.');
                path.push_str(key);
                check_encodable(item, path, depth + 1)?;
                path.truncate(mark);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
