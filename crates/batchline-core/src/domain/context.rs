//! ExecutionContext: the checkpoint store handed to readers.
//!
//! The owner (orchestration) creates it fresh or rebuilds it from persisted
//! state, passes it by `&mut` into `open` / `update` / `close`, and persists it
//! between commit intervals. Readers only write their own namespaced keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ReaderError;

/// A single checkpoint value.
///
/// Serialized with an explicit kind tag so a `Long(1)` is never read back as a
/// `Double(1.0)`. Non-finite doubles are written as the strings `"NaN"`,
/// `"inf"` and `"-inf"`, which JSON numbers cannot carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContextValue {
    String(String),
    Long(i64),
    Double(#[serde(with = "double_repr")] f64),
}

impl ContextValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ContextValue::String(_) => "string",
            ContextValue::Long(_) => "long",
            ContextValue::Double(_) => "double",
        }
    }
}

/// Doubles compare by bit pattern, so a stored NaN equals itself and
/// re-writing it does not count as a change.
impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContextValue::String(a), ContextValue::String(b)) => a == b,
            (ContextValue::Long(a), ContextValue::Long(b)) => a == b,
            (ContextValue::Double(a), ContextValue::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::String(s) => s.fmt(f),
            ContextValue::Long(n) => n.fmt(f),
            ContextValue::Double(d) => d.fmt(f),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::String(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::String(value.to_string())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Long(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Double(value)
    }
}

/// Ordered key/value checkpoint store.
///
/// Typed getters distinguish three cases:
/// - `Ok(Some(v))`: present with the requested kind
/// - `Ok(None)`: absent
/// - `Err(TypeMismatch)`: present with another kind
///
/// The dirty flag is raised by any write that changes the map and lowered by
/// the owner with `clear_dirty` after it has persisted the context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: BTreeMap<String, ContextValue>,
    #[serde(skip)]
    dirty: bool,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        let value = value.into();
        if self.entries.get(&key) != Some(&value) {
            self.dirty = true;
            self.entries.insert(key, value);
        }
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value: String = value.into();
        self.put(key, value);
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) {
        self.put(key, value);
    }

    pub fn put_double(&mut self, key: impl Into<String>, value: f64) {
        self.put(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    pub fn get_string(&self, key: &str) -> Result<Option<&str>, ReaderError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(ContextValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(key, "string", other)),
        }
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>, ReaderError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(ContextValue::Long(n)) => Ok(Some(*n)),
            Some(other) => Err(mismatch(key, "long", other)),
        }
    }

    pub fn get_double(&self, key: &str) -> Result<Option<f64>, ReaderError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(ContextValue::Double(d)) => Ok(Some(*d)),
            Some(other) => Err(mismatch(key, "double", other)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Has the context changed since it was created, loaded, or last cleared?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl PartialEq for ExecutionContext {
    // The dirty flag is bookkeeping for the owner, not checkpoint state.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

mod double_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("not a double: {other:?}"))),
            },
        }
    }
}

fn mismatch(key: &str, expected: &'static str, found: &ContextValue) -> ReaderError {
    ReaderError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn typed_getters_return_stored_values() {
        let mut ctx = ExecutionContext::new();
        ctx.put_string("value", "foo");
        ctx.put_long("count", 42);
        ctx.put_double("ratio", 0.5);

        assert_eq!(ctx.get_string("value").unwrap(), Some("foo"));
        assert_eq!(ctx.get_long("count").unwrap(), Some(42));
        assert_eq!(ctx.get_double("ratio").unwrap(), Some(0.5));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn absent_key_is_not_a_zero_value() {
        let mut ctx = ExecutionContext::new();
        ctx.put_long("zero", 0);

        assert_eq!(ctx.get_long("zero").unwrap(), Some(0));
        assert_eq!(ctx.get_long("missing").unwrap(), None);
        assert_eq!(ctx.get_string("missing").unwrap(), None);
    }

    #[test]
    fn wrong_kind_is_a_context_error() {
        let mut ctx = ExecutionContext::new();
        ctx.put_string("count", "3");

        let err = ctx.get_long("count").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Context);
        assert!(matches!(
            err,
            ReaderError::TypeMismatch { expected: "long", found: "string", .. }
        ));
    }

    #[test]
    fn put_overwrites_previous_value_and_kind() {
        let mut ctx = ExecutionContext::new();
        ctx.put_string("k", "a");
        ctx.put_long("k", 7);

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("k"), Some(&ContextValue::Long(7)));
    }

    #[test]
    fn dirty_tracks_real_changes_only() {
        let mut ctx = ExecutionContext::new();
        assert!(!ctx.is_dirty());

        ctx.put_long("k", 1);
        assert!(ctx.is_dirty());
        ctx.clear_dirty();

        ctx.put_long("k", 1);
        assert!(!ctx.is_dirty());

        ctx.remove("missing");
        assert!(!ctx.is_dirty());

        ctx.remove("k");
        assert!(ctx.is_dirty());
    }

    #[test]
    fn keys_are_ordered() {
        let mut ctx = ExecutionContext::new();
        ctx.put_long("b", 2);
        ctx.put_long("a", 1);
        ctx.put_long("c", 3);

        let keys: Vec<&str> = ctx.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn json_keeps_value_kinds_and_starts_clean() {
        let mut ctx = ExecutionContext::new();
        ctx.put_long("n", 1);
        ctx.put_double("d", 1.0);
        ctx.put_string("s", "1");

        let json = ctx.to_json().unwrap();
        let restored = ExecutionContext::from_json(&json).unwrap();

        assert_eq!(restored.get_long("n").unwrap(), Some(1));
        assert_eq!(restored.get_double("d").unwrap(), Some(1.0));
        assert_eq!(restored.get_string("s").unwrap(), Some("1"));
        assert!(!restored.is_dirty());
    }

    #[test]
    fn clone_is_independent() {
        let mut source = ExecutionContext::new();
        source.put_long("k", 1);
        let copy = source.clone();
        source.put_long("k", 2);

        assert_eq!(copy.get_long("k").unwrap(), Some(1));
    }

    #[test]
    fn non_finite_doubles_survive_json() {
        let mut ctx = ExecutionContext::new();
        ctx.put_double("nan", f64::NAN);
        ctx.put_double("up", f64::INFINITY);
        ctx.put_double("down", f64::NEG_INFINITY);
        ctx.put_double("plain", -2.5);

        let restored = ExecutionContext::from_json(&ctx.to_json().unwrap()).unwrap();

        assert!(restored.get_double("nan").unwrap().unwrap().is_nan());
        assert_eq!(restored.get_double("up").unwrap(), Some(f64::INFINITY));
        assert_eq!(restored.get_double("down").unwrap(), Some(f64::NEG_INFINITY));
        assert_eq!(restored.get_double("plain").unwrap(), Some(-2.5));
        assert_eq!(restored, ctx);
    }

    #[test]
    fn rewriting_the_same_nan_is_not_a_change() {
        let mut ctx = ExecutionContext::new();
        ctx.put_double("ratio", f64::NAN);
        ctx.clear_dirty();

        ctx.put_double("ratio", f64::NAN);
        assert!(!ctx.is_dirty());
    }

    #[test]
    fn unknown_double_text_is_rejected() {
        let json = r#"{"d": {"kind": "double", "value": "lots"}}"#;
        assert!(ExecutionContext::from_json(json).is_err());
    }

    #[test]
    fn generic_put_and_iteration_show_every_entry() {
        let mut ctx = ExecutionContext::new();
        ctx.put("name", "orders");
        ctx.put("count", 3_i64);
        ctx.put("ratio", 0.25_f64);
        ctx.put("owner", String::from("batch"));

        let shown: Vec<String> = ctx.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(shown, vec!["count=3", "name=orders", "owner=batch", "ratio=0.25"]);
    }
}
