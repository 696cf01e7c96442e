//! The element tree.
//!
//! [`Element`] is the format-agnostic document model every other part of the
//! crate reads and writes. Exactly one case is active:
//!
//! - [`Element::Object`]: an ordered map with unique string keys ([`ElementMap`])
//! - [`Element::Array`]: an ordered sequence of elements ([`ElementArray`])
//! - [`Element::Primitive`]: a single [`Primitive`] leaf
//!
//! ## Creating Elements
//!
//! ```rust
//! use treebind::{element, Element, Primitive};
//!
//! let name = Element::from("Alice");
//! let age = Element::from(30);
//! assert_eq!(age, Element::Primitive(Primitive::Int(30)));
//!
//! let user = element!({
//!     "name": "Alice",
//!     "tags": ["admin", "ops"]
//! });
//! assert!(user.is_object());
//! ```
//!
//! ## Reading Elements
//!
//! Accessors are strict: asking for a kind that is not stored fails with
//! [`Error::ShapeMismatch`], and missing keys or indices fail with a lookup
//! error instead.
//!
//! ```rust
//! use treebind::{element, Error};
//!
//! let user = element!({ "age": 30 });
//! assert_eq!(user.get("age").unwrap().as_int().unwrap(), 30);
//! assert!(matches!(user.get("age").unwrap().as_long(), Err(Error::ShapeMismatch { .. })));
//! assert!(matches!(user.get("name"), Err(Error::KeyNotFound { .. })));
//! ```

use crate::{ElementMap, Error, Primitive, PrimitiveKind, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A node of the element tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Object(ElementMap),
    Array(ElementArray),
    Primitive(Primitive),
}

impl Default for Element {
    fn default() -> Self {
        Element::Primitive(Primitive::Null)
    }
}

impl Element {
    /// Creates an empty object.
    #[must_use]
    pub fn object() -> Self {
        Element::Object(ElementMap::new())
    }

    /// Creates an empty array.
    #[must_use]
    pub fn array() -> Self {
        Element::Array(ElementArray::new())
    }

    #[must_use]
    pub const fn null() -> Self {
        Element::Primitive(Primitive::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Element::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Element::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Element::Primitive(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Element::Primitive(Primitive::Null))
    }

    /// Name of the active case: `object`, `array`, or the primitive kind.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Element::Object(_) => "object",
            Element::Array(_) => "array",
            Element::Primitive(p) => p.kind().as_str(),
        }
    }

    /// Returns `true` for an empty object or an empty array.
    #[must_use]
    pub fn is_empty_container(&self) -> bool {
        match self {
            Element::Object(map) => map.is_empty(),
            Element::Array(array) => array.is_empty(),
            Element::Primitive(_) => false,
        }
    }

    pub fn as_object(&self) -> Result<&ElementMap> {
        match self {
            Element::Object(map) => Ok(map),
            _ => Err(Error::shape_mismatch("object", self.shape())),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut ElementMap> {
        match self {
            Element::Object(map) => Ok(map),
            _ => Err(Error::shape_mismatch("object", self.shape())),
        }
    }

    pub fn as_array(&self) -> Result<&ElementArray> {
        match self {
            Element::Array(array) => Ok(array),
            _ => Err(Error::shape_mismatch("array", self.shape())),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut ElementArray> {
        match self {
            Element::Array(array) => Ok(array),
            _ => Err(Error::shape_mismatch("array", self.shape())),
        }
    }

    pub fn as_primitive(&self) -> Result<&Primitive> {
        match self {
            Element::Primitive(p) => Ok(p),
            _ => Err(Error::shape_mismatch("primitive", self.shape())),
        }
    }

    /// Returns the primitive if it has exactly the given kind.
    pub fn as_kind(&self, kind: PrimitiveKind) -> Result<&Primitive> {
        let p = self.as_primitive()?;
        if p.kind() == kind {
            Ok(p)
        } else {
            Err(Error::shape_mismatch(kind.as_str(), p.kind().as_str()))
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        self.as_primitive()?.as_str()
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.as_primitive()?.as_bool()
    }

    pub fn as_byte(&self) -> Result<i8> {
        self.as_primitive()?.as_byte()
    }

    pub fn as_char(&self) -> Result<char> {
        self.as_primitive()?.as_char()
    }

    pub fn as_short(&self) -> Result<i16> {
        self.as_primitive()?.as_short()
    }

    pub fn as_int(&self) -> Result<i32> {
        self.as_primitive()?.as_int()
    }

    pub fn as_long(&self) -> Result<i64> {
        self.as_primitive()?.as_long()
    }

    pub fn as_big_integer(&self) -> Result<&BigInt> {
        self.as_primitive()?.as_big_integer()
    }

    pub fn as_float(&self) -> Result<f32> {
        self.as_primitive()?.as_float()
    }

    pub fn as_double(&self) -> Result<f64> {
        self.as_primitive()?.as_double()
    }

    pub fn as_big_decimal(&self) -> Result<&BigDecimal> {
        self.as_primitive()?.as_big_decimal()
    }

    /// Looks up `key` on an object.
    pub fn get(&self, key: &str) -> Result<&Element> {
        self.as_object()?.get(key)
    }

    /// Sets `key` on an object; see [`ElementMap::set`] for ordering.
    pub fn set(&mut self, key: impl Into<String>, value: Element) -> Result<Option<Element>> {
        Ok(self.as_object_mut()?.set(key, value))
    }

    pub fn remove(&mut self, key: &str) -> Result<Element> {
        self.as_object_mut()?.remove(key)
    }

    /// Looks up `index` on an array.
    pub fn at(&self, index: usize) -> Result<&Element> {
        self.as_array()?.get(index)
    }

    /// Appends to an array.
    pub fn push(&mut self, value: Element) -> Result<()> {
        self.as_array_mut()?.push(value);
        Ok(())
    }
}

/// An ordered sequence of elements with checked index operations.
///
/// # Examples
///
/// ```rust
/// use treebind::{Element, ElementArray, Error};
///
/// let mut array = ElementArray::new();
/// array.push(Element::from(1));
/// array.push(Element::from("two"));
/// array.insert(0, Element::null()).unwrap();
///
/// assert_eq!(array.len(), 3);
/// assert!(array.get(0).unwrap().is_null());
/// assert!(matches!(array.get(3), Err(Error::IndexOutOfBounds { index: 3, len: 3 })));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ElementArray(Vec<Element>);

impl ElementArray {
    #[must_use]
    pub fn new() -> Self {
        ElementArray(Vec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ElementArray(Vec::with_capacity(capacity))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Element> {
        let len = self.0.len();
        self.0
            .get(index)
            .ok_or_else(|| Error::index_out_of_bounds(index, len))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Element> {
        let len = self.0.len();
        self.0
            .get_mut(index)
            .ok_or_else(|| Error::index_out_of_bounds(index, len))
    }

    /// Replaces the element at `index`, returning the old one.
    pub fn set(&mut self, index: usize, value: Element) -> Result<Element> {
        let slot = self.get_mut(index)?;
        Ok(std::mem::replace(slot, value))
    }

    pub fn push(&mut self, value: Element) {
        self.0.push(value);
    }

    /// Inserts at `index`, shifting later elements; `index == len` appends.
    pub fn insert(&mut self, index: usize, value: Element) -> Result<()> {
        if index > self.0.len() {
            return Err(Error::index_out_of_bounds(index, self.0.len()));
        }
        self.0.insert(index, value);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Element> {
        if index >= self.0.len() {
            return Err(Error::index_out_of_bounds(index, self.0.len()));
        }
        Ok(self.0.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.0.iter_mut()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Element] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Element> {
        self.0
    }
}

impl From<Vec<Element>> for ElementArray {
    fn from(value: Vec<Element>) -> Self {
        ElementArray(value)
    }
}

impl IntoIterator for ElementArray {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ElementArray {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Element> for ElementArray {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        ElementArray(iter.into_iter().collect())
    }
}

impl From<Primitive> for Element {
    fn from(value: Primitive) -> Self {
        Element::Primitive(value)
    }
}

impl From<ElementMap> for Element {
    fn from(value: ElementMap) -> Self {
        Element::Object(value)
    }
}

impl From<ElementArray> for Element {
    fn from(value: ElementArray) -> Self {
        Element::Array(value)
    }
}

impl From<Vec<Element>> for Element {
    fn from(value: Vec<Element>) -> Self {
        Element::Array(ElementArray(value))
    }
}

macro_rules! element_from_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Element {
                fn from(value: $ty) -> Self {
                    Element::Primitive(Primitive::from(value))
                }
            }
        )*
    };
}

element_from_primitive!(
    String, &str, bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, BigInt, BigDecimal,
);

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Primitive(Primitive::String(s)) => write!(f, "{:?}", s),
            Element::Primitive(p) => write!(f, "{}", p),
            Element::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Element::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{:?}:{}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Element::Object(map) => {
                use serde::ser::SerializeMap;
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    state.serialize_entry(k, v)?;
                }
                state.end()
            }
            Element::Array(array) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(array.len()))?;
                for item in array.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Element::Primitive(p) => p.serialize(serializer),
        }
    }
}

impl Serialize for Primitive {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Primitive::String(s) => serializer.serialize_str(s),
            Primitive::Boolean(b) => serializer.serialize_bool(*b),
            Primitive::Null => serializer.serialize_unit(),
            Primitive::Byte(v) => serializer.serialize_i8(*v),
            Primitive::Char(v) => serializer.serialize_char(*v),
            Primitive::Short(v) => serializer.serialize_i16(*v),
            Primitive::Int(v) => serializer.serialize_i32(*v),
            Primitive::Long(v) => serializer.serialize_i64(*v),
            Primitive::BigInteger(v) => {
                if let Ok(small) = i64::try_from(v) {
                    serializer.serialize_i64(small)
                } else if let Ok(unsigned) = u64::try_from(v) {
                    serializer.serialize_u64(unsigned)
                } else {
                    serializer.serialize_str(&v.to_string())
                }
            }
            Primitive::Float(v) => serializer.serialize_f32(*v),
            Primitive::Double(v) => serializer.serialize_f64(*v),
            Primitive::BigDecimal(v) => serializer.serialize_str(&v.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ElementVisitor;

        impl<'de> Visitor<'de> for ElementVisitor {
            type Value = Element;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any element")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E> {
                Ok(Element::from(value))
            }

            // Integers take the narrowest of int, long and big-integer that holds them.
            fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(match i32::try_from(value) {
                    Ok(small) => Element::from(small),
                    Err(_) => Element::from(value),
                })
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
                match i64::try_from(value) {
                    Ok(signed) => self.visit_i64(signed),
                    Err(_) => Ok(Element::from(BigInt::from(value))),
                }
            }

            fn visit_i128<E: de::Error>(self, value: i128) -> std::result::Result<Self::Value, E> {
                match i64::try_from(value) {
                    Ok(signed) => self.visit_i64(signed),
                    Err(_) => Ok(Element::from(BigInt::from(value))),
                }
            }

            fn visit_u128<E: de::Error>(self, value: u128) -> std::result::Result<Self::Value, E> {
                match i64::try_from(value) {
                    Ok(signed) => self.visit_i64(signed),
                    Err(_) => Ok(Element::from(BigInt::from(value))),
                }
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(Element::from(value))
            }

            fn visit_char<E>(self, value: char) -> std::result::Result<Self::Value, E> {
                Ok(Element::from(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(Element::from(value))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E> {
                Ok(Element::from(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Element::null())
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Element::null())
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut array = ElementArray::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    array.push(item);
                }
                Ok(Element::Array(array))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut object = ElementMap::new();
                while let Some((key, value)) = map.next_entry::<String, Element>()? {
                    object.set(key, value);
                }
                Ok(Element::Object(object))
            }
        }

        deserializer.deserialize_any(ElementVisitor)
    }
}
