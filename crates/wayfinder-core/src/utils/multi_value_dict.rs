//! A dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] keeps keys in first-insertion order so that anything
//! serialized from it (query strings in particular) comes out in a stable,
//! predictable order.

use std::slice;

/// An insertion-ordered dictionary mapping keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key,
/// [`first`](MultiValueDict::first) the first one, and
/// [`get_list`](MultiValueDict::get_list) all of them.
///
/// # Examples
///
/// ```
/// use wayfinder_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("size".to_string(), "large");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get(&"color".to_string()), Some(&"blue"));
/// assert_eq!(d.first(&"color".to_string()), Some(&"red"));
/// let keys: Vec<_> = d.keys().collect();
/// assert_eq!(keys, vec!["color", "size"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiValueDict<K: Eq, V> {
    entries: Vec<(K, Vec<V>)>,
}

impl<K: Eq, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Returns the **last** value associated with the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_list(key).and_then(|v| v.last())
    }

    /// Returns the first value associated with the key.
    pub fn first(&self, key: &K) -> Option<&V> {
        self.get_list(key).and_then(|v| v.first())
    }

    /// Returns all values associated with the key, in insertion order.
    pub fn get_list(&self, key: &K) -> Option<&Vec<V>> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Sets the value for a key, replacing any existing values. A new key
    /// goes to the end; an existing key keeps its position.
    pub fn set(&mut self, key: K, value: V) {
        self.set_list(key, vec![value]);
    }

    /// Replaces the whole value list for a key.
    pub fn set_list(&mut self, key: K, values: Vec<V>) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Removes a key, returning its values.
    pub fn remove(&mut self, key: &K) -> Option<Vec<V>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    /// Returns an iterator over (key, value-list) pairs in insertion order.
    pub fn iter(&self) -> MultiValueIter<'_, K, V> {
        MultiValueIter {
            inner: self.entries.iter(),
        }
    }
}

/// Borrowing iterator over a [`MultiValueDict`].
pub struct MultiValueIter<'a, K, V> {
    inner: slice::Iter<'a, (K, Vec<V>)>,
}

impl<'a, K, V> Iterator for MultiValueIter<'a, K, V> {
    type Item = (&'a K, &'a Vec<V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

impl<K: Eq, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (key, value) in iter {
            dict.append(key, value);
        }
        dict
    }
}

impl<K: Eq, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K: Eq, V> IntoIterator for &'a MultiValueDict<K, V> {
    type Item = (&'a K, &'a Vec<V>);
    type IntoIter = MultiValueIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
