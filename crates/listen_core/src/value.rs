use std::fmt;

use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A configuration value as held by the store, the extra bag, and decoded URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Number(Number),
    Bool(bool),
    List(Vec<String>),
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Empty text, `false` and the empty list count as unset.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Text(text) => text.is_empty(),
            ParamValue::Number(_) => false,
            ParamValue::Bool(flag) => !flag,
            ParamValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// One rendered string per query-parameter occurrence.
    pub fn query_values(&self) -> Vec<String> {
        match self {
            ParamValue::Text(text) => vec![text.clone()],
            ParamValue::Number(number) => vec![number.to_string()],
            ParamValue::Bool(flag) => vec![flag.to_string()],
            ParamValue::List(items) => items.clone(),
        }
    }

    /// Converts a JSON value. `null` has no representation and yields `None`;
    /// nested objects are kept as their compact JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(ParamValue::Bool(*flag)),
            Value::Number(number) => Some(ParamValue::Number(number.clone())),
            Value::String(text) => Some(ParamValue::Text(text.clone())),
            Value::Array(items) => Some(ParamValue::List(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Value::Object(_) => Some(ParamValue::Text(value.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(text) => Value::String(text.clone()),
            ParamValue::Number(number) => Value::Number(number.clone()),
            ParamValue::Bool(flag) => Value::Bool(*flag),
            ParamValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Merges a repeated occurrence: a scalar becomes a two-element list,
    /// a list grows at the end.
    pub fn merged_with(self, other: ParamValue) -> ParamValue {
        let mut items = match self {
            ParamValue::List(items) => items,
            scalar => scalar.query_values(),
        };
        items.extend(other.query_values());
        ParamValue::List(items)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(text) => f.write_str(text),
            ParamValue::Number(number) => write!(f, "{number}"),
            ParamValue::Bool(flag) => write!(f, "{flag}"),
            ParamValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        ParamValue::Bool(flag)
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        ParamValue::Text(text.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(text: String) -> Self {
        ParamValue::Text(text)
    }
}

impl From<u64> for ParamValue {
    fn from(number: u64) -> Self {
        ParamValue::Number(number.into())
    }
}

/// Insertion-ordered parameter map.
///
/// Repeated keys are kept explicitly: [`ParamMap::append`] promotes a scalar to
/// a list on the second occurrence. Deserializing from a JSON object uses the
/// same rule, so `{"tag": "a", "tag": "b"}` yields `tag = ["a", "b"]` instead of
/// silently keeping the last value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamMap {
    entries: IndexMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.entries.insert(key.into(), value);
    }

    /// Adds an occurrence, accumulating repeated keys into a list.
    pub fn append(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                let current = std::mem::replace(existing, ParamValue::List(Vec::new()));
                *existing = current.merged_with(value);
            }
            None => {
                self.entries.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a JSON object, preserving duplicate keys as lists.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> String {
        // Serializing string keys and plain values cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl IntoIterator for ParamMap {
    type Item = (String, ParamValue);
    type IntoIter = indexmap::map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, ParamValue)> for ParamMap {
    fn from_iter<T: IntoIterator<Item = (String, ParamValue)>>(iter: T) -> Self {
        let mut map = ParamMap::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}

impl Serialize for ParamMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, &value.to_json())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParamMapVisitor)
    }
}

struct ParamMapVisitor;

impl<'de> Visitor<'de> for ParamMapVisitor {
    type Value = ParamMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of parameters")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ParamMap, A::Error> {
        let mut map = ParamMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            if let Some(value) = ParamValue::from_json(&value) {
                map.append(key, value);
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_json_keys_accumulate_in_order() {
        let map = ParamMap::from_json_str(r#"{"tag": "a", "other": 1, "tag": "b", "tag": "c"}"#)
            .unwrap();
        assert_eq!(map.get("tag"), Some(&ParamValue::list(["a", "b", "c"])));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["tag", "other"]);
    }

    #[test]
    fn non_string_values_are_kept() {
        let map = ParamMap::from_json_str(
            r#"{"n": 3, "flag": false, "nested": {"a": 1}, "mixed": [1, "x", true], "gone": null}"#,
        )
        .unwrap();
        assert_eq!(map.get("n"), Some(&ParamValue::from(3u64)));
        assert_eq!(map.get("flag"), Some(&ParamValue::Bool(false)));
        assert_eq!(map.get("nested"), Some(&ParamValue::text(r#"{"a":1}"#)));
        assert_eq!(map.get("mixed"), Some(&ParamValue::list(["1", "x", "true"])));
        assert!(!map.contains_key("gone"));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(ParamMap::from_json_str("[1, 2]").is_err());
        assert!(ParamMap::from_json_str("\"text\"").is_err());
    }

    #[test]
    fn pretty_json_keeps_insertion_order() {
        let mut map = ParamMap::new();
        map.insert("zeta", ParamValue::text("1"));
        map.insert("alpha", ParamValue::list(["a", "b"]));
        let text = map.to_json_pretty();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
        assert_eq!(ParamMap::from_json_str(&text).unwrap(), map);
    }
}
