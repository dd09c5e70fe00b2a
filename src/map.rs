//! Ordered containers used inside a [`Value`] graph.
//!
//! - [`FieldMap`]: the named fields of a record, in declaration order. This is
//!   the field-listing contract generic records expose to the generator.
//! - [`ValueMap`]: a mapping whose keys are arbitrary values, in insertion order.
//!
//! Both keep insertion order so that generated trees are deterministic.

use crate::Value;
use indexmap::IndexMap;

/// The ordered `(name, value)` fields of a record.
///
/// # Examples
///
/// ```rust
/// use rmxml::{FieldMap, Value};
///
/// let mut fields = FieldMap::new();
/// fields.insert("name", Value::from("Ralph"));
/// fields.insert("level", Value::from(1));
///
/// let names: Vec<_> = fields.keys().cloned().collect();
/// assert_eq!(names, vec!["name", "level"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap(IndexMap<String, Value>);

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        FieldMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        FieldMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field. An existing field keeps its position and its old value is returned.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        FieldMap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A mapping from arbitrary values to values, in insertion order.
///
/// Record keys (structs, objects, specials) are compared by identity, every
/// other key structurally, so two distinct records stay two keys even when
/// their fields are equal. Lookups are linear.
///
/// # Examples
///
/// ```rust
/// use rmxml::{Value, ValueMap};
///
/// let mut map = ValueMap::new();
/// map.insert(Value::symbol("hp"), Value::from(450));
/// map.insert(Value::Array(vec![Value::from(1), Value::from(2)]), Value::from("pair"));
///
/// assert_eq!(map.get(&Value::symbol("hp")), Some(&Value::from(450)));
/// assert_eq!(map.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap(Vec<(Value, Value)>);

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        ValueMap(Vec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueMap(Vec::with_capacity(capacity))
    }

    /// Inserts an entry. If an equal key exists its value is replaced in place
    /// and the old value is returned.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.0.iter_mut().find(|(k, _)| same_key(k, &key)) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Appends an entry without looking for an equal key.
    ///
    /// Used when rebuilding a map whose keys may still be half-built records.
    pub(crate) fn push(&mut self, key: Value, value: Value) {
        self.0.push((key, value));
    }

    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| same_key(k, key)).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.0.iter()
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = &'a (Value, Value);
    type IntoIter = std::slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

fn same_key(a: &Value, b: &Value) -> bool {
    match (a.identity(), b.identity()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => a == b,
        _ => false,
    }
}
