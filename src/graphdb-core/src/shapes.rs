//! JSON values whose shape the server decides at runtime.
//!
//! GraphDB is inconsistent about a few payloads: cluster failures report
//! their messages either as an array or as a node -> message object, and some
//! list fields arrive as a bare string when they hold a single element. The
//! types here decode those payloads by trying the candidate shapes in a fixed
//! order instead of guessing from the data.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

static EMPTY_MAP: BTreeMap<String, String> = BTreeMap::new();

/// Server messages that come either as a list or as a mapping.
///
/// Decoding tries the list shape first (an array of strings, or a single
/// string) and falls back to a string -> string object. Both accessors are
/// always safe to call: the one that does not match the decoded shape
/// returns an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Messages {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Default for Messages {
    fn default() -> Self {
        Messages::List(Vec::new())
    }
}

impl Messages {
    /// Decode from an already parsed JSON value, list first, mapping second.
    ///
    /// When neither shape matches, the mapping decode error is returned.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match StringList::from_value(value.clone()) {
            Ok(list) => Ok(Messages::List(list.into_inner())),
            Err(_) => serde_json::from_value::<BTreeMap<String, String>>(value).map(Messages::Map),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Messages::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Messages::Map(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Messages::List(list) => list.is_empty(),
            Messages::Map(map) => map.is_empty(),
        }
    }

    /// The messages as a list; empty when the server sent a mapping.
    pub fn list(&self) -> &[String] {
        match self {
            Messages::List(list) => list,
            Messages::Map(_) => &[],
        }
    }

    /// The messages as a mapping; empty when the server sent a list.
    pub fn map(&self) -> &BTreeMap<String, String> {
        match self {
            Messages::Map(map) => map,
            Messages::List(_) => &EMPTY_MAP,
        }
    }
}

impl fmt::Display for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Messages::List(list) => write!(f, "{}", list.join("; ")),
            Messages::Map(map) => {
                let joined = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{}", joined)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Messages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Messages::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for Messages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Messages::List(list) => list.serialize(serializer),
            Messages::Map(map) => map.serialize(serializer),
        }
    }
}

/// A list of strings that also accepts a single JSON string literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringList(Vec<String>);

impl StringList {
    /// Decode from a JSON value: a string becomes a one-element list,
    /// otherwise an array of strings is required.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::String(s) => Ok(StringList(vec![s])),
            other => serde_json::from_value::<Vec<String>>(other).map(StringList),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for StringList {
    fn from(list: Vec<String>) -> Self {
        StringList(list)
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        StringList::from_value(value).map_err(D::Error::custom)
    }
}

/// Repository parameter values are strings for most settings and bare
/// integers for a few numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    // Order matters for untagged decoding: string first, then integer.
    Str(String),
    Int(i64),
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrString::Str(s) => write!(f, "{}", s),
            IntOrString::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for IntOrString {
    fn from(s: &str) -> Self {
        IntOrString::Str(s.to_string())
    }
}

impl From<i64> for IntOrString {
    fn from(i: i64) -> Self {
        IntOrString::Int(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_list_first() {
        let messages: Messages = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert!(messages.is_list());
        assert_eq!(messages.list(), &["a".to_string(), "b".to_string()]);
        assert!(messages.map().is_empty());
    }

    #[test]
    fn test_messages_mapping_fallback() {
        let messages: Messages = serde_json::from_value(json!({"k": "v"})).unwrap();
        assert!(messages.is_map());
        assert_eq!(messages.map().get("k").map(String::as_str), Some("v"));
        assert!(messages.list().is_empty());
    }

    #[test]
    fn test_messages_single_string_is_list() {
        let messages: Messages = serde_json::from_str(r#""no cluster""#).unwrap();
        assert_eq!(messages.list(), &["no cluster".to_string()]);
    }

    #[test]
    fn test_messages_rejects_other_shapes() {
        assert!(serde_json::from_value::<Messages>(json!(42)).is_err());
        assert!(serde_json::from_value::<Messages>(json!({"k": 1})).is_err());
    }

    #[test]
    fn test_string_list_accepts_literal_and_array() {
        let one: StringList = serde_json::from_str(r#""x""#).unwrap();
        assert_eq!(one.as_slice(), &["x".to_string()]);

        let many: StringList = serde_json::from_str(r#"["x","y"]"#).unwrap();
        assert_eq!(many.into_inner(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_int_or_string() {
        let s: IntOrString = serde_json::from_str(r#""owlim""#).unwrap();
        assert_eq!(s, IntOrString::Str("owlim".into()));

        let i: IntOrString = serde_json::from_str("32").unwrap();
        assert_eq!(i, IntOrString::Int(32));
        assert_eq!(serde_json::to_string(&i).unwrap(), "32");
    }
}
