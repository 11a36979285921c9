//! Multi-valued string collections.
//!
//! [`Values`] is one logical field value that may hold zero, one, or more
//! strings. [`ValueMap`] is an ordered multimap from case-insensitive string
//! keys to [`Values`], shared by headers, query, form fields, and cookies.
use std::{fmt, slice};

// ===== Values =====

/// One or more string values for a single field.
///
/// The empty state is a sentinel distinct from "one empty string": a map
/// lookup for an absent key yields [`Values::EMPTY`], while a field that was
/// present with an empty value yields one empty string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Values {
    repr: Repr,
}

#[derive(Clone, Default, PartialEq, Eq)]
enum Repr {
    #[default]
    Empty,
    One(String),
    Many(Vec<String>),
}

impl Values {
    /// The empty sentinel.
    pub const EMPTY: Values = Values { repr: Repr::Empty };

    /// Create [`Values`] holding a single string.
    #[inline]
    pub fn one(value: impl Into<String>) -> Self {
        Self {
            repr: Repr::One(value.into()),
        }
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Empty => 0,
            Repr::One(_) => 1,
            Repr::Many(values) => values.len(),
        }
    }

    /// Returns `true` if there is no value at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.repr, Repr::Empty)
    }

    /// Returns the first value, if any.
    pub fn first(&self) -> Option<&str> {
        match &self.repr {
            Repr::Empty => None,
            Repr::One(value) => Some(value),
            Repr::Many(values) => values.first().map(String::as_str),
        }
    }

    /// Returns the value at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        match &self.repr {
            Repr::Empty => None,
            Repr::One(value) => (index == 0).then_some(value.as_str()),
            Repr::Many(values) => values.get(index).map(String::as_str),
        }
    }

    /// Append one more value.
    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.repr = match std::mem::take(&mut self.repr) {
            Repr::Empty => Repr::One(value),
            Repr::One(first) => Repr::Many(vec![first, value]),
            Repr::Many(mut values) => {
                values.push(value);
                Repr::Many(values)
            }
        };
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> ValuesIter<'_> {
        ValuesIter {
            inner: match &self.repr {
                Repr::Empty => Inner::Done,
                Repr::One(value) => Inner::One(value),
                Repr::Many(values) => Inner::Many(values.iter()),
            },
        }
    }
}

impl From<String> for Values {
    #[inline]
    fn from(value: String) -> Self {
        Self {
            repr: Repr::One(value),
        }
    }
}

impl From<&str> for Values {
    #[inline]
    fn from(value: &str) -> Self {
        Self::one(value)
    }
}

impl From<Vec<String>> for Values {
    fn from(values: Vec<String>) -> Self {
        Self {
            repr: match values.len() {
                0 => Repr::Empty,
                1 => {
                    let mut values = values;
                    match values.pop() {
                        Some(one) => Repr::One(one),
                        None => Repr::Empty,
                    }
                }
                _ => Repr::Many(values),
            },
        }
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a str;

    type IntoIter = ValuesIter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq<str> for Values {
    fn eq(&self, other: &str) -> bool {
        matches!(&self.repr, Repr::One(value) if value == other)
    }
}

impl PartialEq<&str> for Values {
    fn eq(&self, other: &&str) -> bool {
        PartialEq::<str>::eq(self, other)
    }
}

/// Joined with `,` to mirror how repeated header fields combine on the wire.
impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.iter();
        if let Some(first) = iter.next() {
            f.write_str(first)?;
            for value in iter {
                f.write_str(",")?;
                f.write_str(value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over [`Values`].
#[derive(Debug)]
pub struct ValuesIter<'a> {
    inner: Inner<'a>,
}

#[derive(Debug)]
enum Inner<'a> {
    Done,
    One(&'a str),
    Many(slice::Iter<'a, String>),
}

impl<'a> Iterator for ValuesIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Done => None,
            Inner::One(value) => {
                let value = *value;
                self.inner = Inner::Done;
                Some(value)
            }
            Inner::Many(iter) => iter.next().map(String::as_str),
        }
    }
}

// ===== ValueMap =====

/// Ordered multimap with case-insensitive string keys.
///
/// Entries keep first-insertion order; key lookup is ASCII case-insensitive.
/// Typical entry counts are small, so lookup is a linear scan.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: Vec<(String, Values)>,
}

impl ValueMap {
    /// Create new empty [`ValueMap`].
    ///
    /// This function does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create new empty [`ValueMap`] with at least the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the map contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Returns the values for the given key, or [`None`] when absent.
    pub fn get(&self, key: &str) -> Option<&Values> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Returns the values for the given key, or the empty sentinel when
    /// absent.
    ///
    /// Use [`get`][ValueMap::get] to distinguish an absent key from a present
    /// key with an empty value.
    pub fn value(&self, key: &str) -> &Values {
        static EMPTY: Values = Values::EMPTY;
        match self.get(key) {
            Some(values) => values,
            None => &EMPTY,
        }
    }

    /// Returns the first value for the given key, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Values::first)
    }

    /// Replace the values at the key, returning the previous values if the
    /// key was present.
    pub fn insert(&mut self, key: impl Into<String>, values: impl Into<Values>) -> Option<Values> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, values.into())),
            None => {
                self.entries.push((key, values.into()));
                None
            }
        }
    }

    /// Append one value to the key, keeping any existing values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key, Values::one(value))),
        }
    }

    /// Remove the key, returning its values if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Values> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Remove every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns an iterator over entries in first-insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Values)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns an iterator over keys in first-insertion order.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Values>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (key, values) in iter {
            map.insert(key, values);
        }
        map
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn values_repr() {
        let mut values = Values::EMPTY;
        assert!(values.is_empty());
        assert_eq!(values.first(), None);

        values.push("1");
        assert_eq!(values.len(), 1);
        assert_eq!(values.first(), Some("1"));

        values.push("2");
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(1), Some("2"));
        assert_eq!(values.to_string(), "1,2");

        // one empty string is not the empty sentinel
        let present_empty = Values::one("");
        assert!(!present_empty.is_empty());
        assert_ne!(present_empty, Values::EMPTY);
    }

    #[test]
    fn map_ordering_and_case() {
        let mut map = ValueMap::new();
        map.append("b", "1");
        map.append("A", "2");
        map.append("B", "3");

        // case-insensitive append went to the first entry
        assert_eq!(map.len(), 2);
        assert_eq!(map.value("b").len(), 2);
        assert_eq!(map.first("a"), Some("2"));

        // first-insertion order preserved
        let keys = map.keys().collect::<Vec<_>>();
        assert_eq!(keys, ["b", "A"]);

        assert!(map.remove("B").is_some());
        assert!(map.get("b").is_none());
        assert_eq!(map.value("b"), &Values::EMPTY);
    }

    #[test]
    fn map_insert_replaces() {
        let mut map = ValueMap::new();
        map.append("k", "1");
        map.append("k", "2");
        let old = map.insert("K", Values::one("3"));
        assert_eq!(old.map(|v| v.len()), Some(2));
        assert_eq!(map.value("k").len(), 1);
        assert_eq!(map.first("k"), Some("3"));
    }
}
