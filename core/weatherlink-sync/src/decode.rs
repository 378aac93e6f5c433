//! Scalar JSON decoder.
//!
//! Walks the direct members of one object inside a JSON document and
//! classifies each member value. Classification looks at the raw number
//! token rather than a parsed `f64`, so `55` is an integer, `55.0` and
//! `5.5e1` are floats, and integers outside the `i64` range are not
//! silently turned into floats.
//!
//! Nothing here is an error: a missing target, a non-object target or a
//! malformed document decode to an empty sequence.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;
use std::fmt;
use tracing::{debug, warn};
use weatherlink_types::Value;

/// Classification of a member value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Unsupported,
}

/// A classified member value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    /// Booleans, nulls, nested objects and arrays, out-of-range numbers.
    Unsupported,
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::String(_) => FieldKind::String,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::Unsupported => FieldKind::Unsupported,
        }
    }

    /// Converts to a node value; `None` for unsupported members.
    pub fn into_node_value(self) -> Option<Value> {
        match self {
            Self::String(s) => Some(Value::String(s)),
            Self::Integer(i) => Some(Value::Int(i)),
            Self::Float(f) => Some(Value::Number(f)),
            Self::Unsupported => None,
        }
    }
}

/// One decoded member.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub name: String,
    pub value: FieldValue,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }
}

/// Decodes the members of the object at a fixed JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarDecoder {
    tokens: Vec<String>,
}

impl ScalarDecoder {
    /// Creates a decoder for the object at `pointer` (`""` = document root).
    pub fn new(pointer: &str) -> Self {
        let tokens = pointer
            .split('/')
            .skip(1)
            .map(|t| t.replace("~1", "/").replace("~0", "~"))
            .collect();
        Self { tokens }
    }

    /// Decodes `bytes`, returning one record per direct member of the
    /// target object in document order.
    pub fn decode(&self, bytes: &[u8]) -> Vec<FieldRecord> {
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("Document is not valid UTF-8: {e}");
                return Vec::new();
            }
        };

        let mut members = match serde_json::from_str::<Members<'_>>(text) {
            Ok(members) => members,
            Err(e) => {
                warn!("Document is not a JSON object: {e}");
                return Vec::new();
            }
        };

        for token in &self.tokens {
            let Some(raw) = members.get(token) else {
                debug!("Document has no member {token:?}");
                return Vec::new();
            };
            members = match serde_json::from_str::<Members<'_>>(raw.get()) {
                Ok(members) => members,
                Err(_) => {
                    debug!("Member {token:?} is not an object");
                    return Vec::new();
                }
            };
        }

        members
            .0
            .into_iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, raw)| {
                let value = classify(raw.get());
                debug!("Decoded member {name:?} as {:?}", value.kind());
                FieldRecord { name, value }
            })
            .collect()
    }
}

impl Default for ScalarDecoder {
    fn default() -> Self {
        Self::new("/main")
    }
}

/// Classifies a raw JSON token: string, then integer, then float.
fn classify(raw: &str) -> FieldValue {
    let token = raw.trim();
    match token.as_bytes().first() {
        Some(b'"') => serde_json::from_str::<String>(token)
            .map(FieldValue::String)
            .unwrap_or(FieldValue::Unsupported),
        Some(b'-' | b'0'..=b'9') => {
            if token.contains(['.', 'e', 'E']) {
                match token.parse::<f64>() {
                    Ok(f) if f.is_finite() => FieldValue::Float(f),
                    _ => FieldValue::Unsupported,
                }
            } else {
                token
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .unwrap_or(FieldValue::Unsupported)
            }
        }
        _ => FieldValue::Unsupported,
    }
}

/// Object members in document order. A repeated key keeps its first
/// position and its last value.
struct Members<'a>(Vec<(String, &'a RawValue)>);

impl<'a> Members<'a> {
    fn get(&self, key: &str) -> Option<&'a RawValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

impl<'de> Deserialize<'de> for Members<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MembersVisitor;

        impl<'de> Visitor<'de> for MembersVisitor {
            type Value = Members<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut members: Vec<(String, &'de RawValue)> = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, &'de RawValue>()? {
                    match members.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => members.push((key, value)),
                    }
                }
                Ok(Members(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor)
    }
}
