//! Ordered map type for element objects.
//!
//! [`ElementMap`] wraps an [`IndexMap`] so iteration follows insertion order.
//! Setting a key that already exists removes the old entry first and appends
//! the new one, which moves that key to the end of the iteration order:
//!
//! ```rust
//! use treebind::{Element, ElementMap};
//!
//! let mut map = ElementMap::new();
//! map.set("a", Element::from(1));
//! map.set("b", Element::from(2));
//! map.set("a", Element::from(3));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["b", "a"]);
//! assert_eq!(map.get("a").unwrap(), &Element::from(3));
//! ```
//!
//! Looking up or removing a key that is not present fails with
//! [`Error::KeyNotFound`](crate::Error::KeyNotFound); [`ElementMap::find`] is the
//! non-failing lookup.

use crate::{Element, Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of string keys to elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementMap(IndexMap<String, Element>);

impl ElementMap {
    /// Creates an empty `ElementMap`.
    #[must_use]
    pub fn new() -> Self {
        ElementMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ElementMap(IndexMap::with_capacity(capacity))
    }

    /// Sets `key` to `value`, returning the previous value.
    ///
    /// An existing key is removed and re-appended, so it moves to the end of
    /// the iteration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treebind::{Element, ElementMap};
    ///
    /// let mut map = ElementMap::new();
    /// assert!(map.set("key", Element::from(42)).is_none());
    /// assert_eq!(map.set("key", Element::from(43)), Some(Element::from(42)));
    /// ```
    pub fn set(&mut self, key: impl Into<String>, value: Element) -> Option<Element> {
        let key = key.into();
        let previous = self.0.shift_remove(&key);
        self.0.insert(key, value);
        previous
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<&Element> {
        self.0.get(key).ok_or_else(|| Error::key_not_found(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Element> {
        self.0.get_mut(key).ok_or_else(|| Error::key_not_found(key))
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Element> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Result<Element> {
        self.0
            .shift_remove(key)
            .ok_or_else(|| Error::key_not_found(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Element> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Element> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Element> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, Element> {
        self.0.iter_mut()
    }
}

impl From<HashMap<String, Element>> for ElementMap {
    fn from(map: HashMap<String, Element>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ElementMap> for HashMap<String, Element> {
    fn from(map: ElementMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for ElementMap {
    type Item = (String, Element);
    type IntoIter = indexmap::map::IntoIter<String, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementMap {
    type Item = (&'a String, &'a Element);
    type IntoIter = indexmap::map::Iter<'a, String, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Element)> for ElementMap {
    fn from_iter<T: IntoIterator<Item = (String, Element)>>(iter: T) -> Self {
        let mut map = ElementMap::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}
