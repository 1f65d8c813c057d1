//! Cache Value Module
//!
//! Tagged value stored in the cache. Plain JSON kinds map one-to-one onto
//! JSON; dates, regular-expression patterns and binary blobs are carried as
//! single-key tagged objects (`{"$date": ..}`, `{"$pattern": ..}`,
//! `{"$bytes": [..]}`) so they survive a snapshot round-trip and are never
//! mistaken for plain objects during hydration.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

const DATE_TAG: &str = "$date";
const PATTERN_TAG: &str = "$pattern";
const BYTES_TAG: &str = "$bytes";

/// Key-value object stored under [`CacheValue::Object`].
pub type ObjectMap = BTreeMap<String, CacheValue>;

// == Cache Value ==
/// Arbitrary serializable data held by a cache entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CacheValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<CacheValue>),
    /// Plain key-value object, the only kind hydration merges into
    Object(ObjectMap),
    Date(DateTime<Utc>),
    /// Regular-expression source text
    Pattern(String),
    Bytes(Vec<u8>),
}

impl CacheValue {
    /// True only for plain key-value objects.
    ///
    /// Arrays, dates, patterns and binary blobs are not plain objects.
    pub fn is_plain_object(&self) -> bool {
        matches!(self, CacheValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            CacheValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CacheValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CacheValue::Null)
    }

    /// Builds a value from anything serializable.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(CacheValue::from)
    }

    /// Reads the value back as a typed structure.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::to_value(self).and_then(serde_json::from_value)
    }
}

// == Serde ==
impl Serialize for CacheValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CacheValue::Null => serializer.serialize_unit(),
            CacheValue::Bool(b) => serializer.serialize_bool(*b),
            CacheValue::Number(n) => n.serialize(serializer),
            CacheValue::String(s) => serializer.serialize_str(s),
            CacheValue::Array(items) => items.serialize(serializer),
            CacheValue::Object(map) => map.serialize(serializer),
            CacheValue::Date(at) => tagged(
                serializer,
                DATE_TAG,
                &at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            CacheValue::Pattern(source) => tagged(serializer, PATTERN_TAG, source),
            CacheValue::Bytes(bytes) => tagged(serializer, BYTES_TAG, bytes),
        }
    }
}

fn tagged<S, T>(serializer: S, tag: &str, inner: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(tag, inner)?;
    map.end()
}

impl<'de> Deserialize<'de> for CacheValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CacheValue::from)
    }
}

// == Conversions ==
impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CacheValue::Null,
            Value::Bool(b) => CacheValue::Bool(b),
            Value::Number(n) => CacheValue::Number(n),
            Value::String(s) => CacheValue::String(s),
            Value::Array(items) => {
                CacheValue::Array(items.into_iter().map(CacheValue::from).collect())
            }
            Value::Object(map) => match extended_kind(&map) {
                Some(value) => value,
                None => CacheValue::Object(
                    map.into_iter()
                        .map(|(key, value)| (key, CacheValue::from(value)))
                        .collect(),
                ),
            },
        }
    }
}

/// Recognizes the single-key tagged encodings of the non-plain kinds.
fn extended_kind(map: &Map<String, Value>) -> Option<CacheValue> {
    if map.len() != 1 {
        return None;
    }
    let (tag, inner) = map.iter().next()?;
    match (tag.as_str(), inner) {
        (DATE_TAG, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|at| CacheValue::Date(at.with_timezone(&Utc))),
        (PATTERN_TAG, Value::String(s)) => Some(CacheValue::Pattern(s.clone())),
        (BYTES_TAG, Value::Array(items)) => items
            .iter()
            .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(CacheValue::Bytes),
        _ => None,
    }
}

impl From<bool> for CacheValue {
    fn from(b: bool) -> Self {
        CacheValue::Bool(b)
    }
}

impl From<i64> for CacheValue {
    fn from(n: i64) -> Self {
        CacheValue::Number(n.into())
    }
}

impl From<u64> for CacheValue {
    fn from(n: u64) -> Self {
        CacheValue::Number(n.into())
    }
}

impl From<f64> for CacheValue {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(CacheValue::Null, CacheValue::Number)
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        CacheValue::String(s.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        CacheValue::String(s)
    }
}

impl From<DateTime<Utc>> for CacheValue {
    fn from(at: DateTime<Utc>) -> Self {
        CacheValue::Date(at)
    }
}

impl From<Vec<CacheValue>> for CacheValue {
    fn from(items: Vec<CacheValue>) -> Self {
        CacheValue::Array(items)
    }
}

impl From<ObjectMap> for CacheValue {
    fn from(map: ObjectMap) -> Self {
        CacheValue::Object(map)
    }
}
