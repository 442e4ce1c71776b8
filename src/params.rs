//! Request parameters.
//!
//! A [`ParameterSet`] is an ordered-by-key map of string-or-primitive values.
//! Key order is what canonicalization relies on, so the map is a `BTreeMap`
//! and caller insertion order never leaks into the signature.

use serde::{Serialize, Serializer};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// Protocol keys owned by the client. Callers may not supply them.
pub const APP_KEY: &str = "app_key";
pub const TIMESTAMP: &str = "timestamp";
pub const SIGN_METHOD: &str = "sign_method";
pub const SIGN: &str = "sign";
pub const ACCESS_TOKEN: &str = "access_token";

/// Every key the client writes itself
pub const RESERVED_KEYS: [&str; 5] = [APP_KEY, TIMESTAMP, SIGN_METHOD, SIGN, ACCESS_TOKEN];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// A single parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{}", n),
            ParamValue::Unsigned(n) => write!(f, "{}", n),
            ParamValue::Float(n) => write!(f, "{}", n),
            ParamValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Floats go out as their `Display` text, the same text the signature covers.
impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Text(s) => serializer.serialize_str(s),
            ParamValue::Integer(n) => serializer.serialize_i64(*n),
            ParamValue::Unsigned(n) => serializer.serialize_u64(*n),
            ParamValue::Float(n) => serializer.collect_str(n),
            ParamValue::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Unsigned(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Unsigned(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Boolean(value)
    }
}

/// Key/value pairs sent with a request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert only when a value is present
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
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

    /// Pairs in ascending key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// First caller-supplied key that the client reserves for itself
    pub fn reserved_key(&self) -> Option<&str> {
        self.keys().find(|key| is_reserved(key))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_key_order_regardless_of_insertion() {
        let mut set = ParameterSet::new();
        set.insert("zeta", "z");
        set.insert("alpha", 1);
        set.insert("mid", true);

        let keys: Vec<&str> = set.keys().collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn insert_opt_skips_none() {
        let mut set = ParameterSet::new();
        set.insert_opt("created_after", None::<String>);
        set.insert_opt("status", Some("pending"));

        assert!(!set.contains_key("created_after"));
        assert_eq!(set.get("status"), Some(&ParamValue::Text("pending".into())));
    }

    #[test]
    fn reserved_key_is_detected() {
        let set = ParameterSet::from([("status", "pending"), ("sign", "forged")]);
        assert_eq!(set.reserved_key(), Some("sign"));

        let clean = ParameterSet::from([("status", "pending")]);
        assert_eq!(clean.reserved_key(), None);
    }

    #[test]
    fn values_keep_json_types_when_serialized() {
        let set = ParameterSet::new()
            .with("limit", 10)
            .with("active", false)
            .with("name", "phone");

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!({"limit": 10, "active": false, "name": "phone"}));
    }

    #[test]
    fn floats_serialize_as_their_signed_text() {
        let set = ParameterSet::new().with("price", 10.0).with("weight", 0.25);

        assert_eq!(set.get("price").unwrap().to_string(), "10");
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!({"price": "10", "weight": "0.25"}));
    }
}
