//! The [`Bind`] trait and its implementations for std and crate types.
//!
//! [`Bind`] is how a value takes part in binding. Scalars, strings, numbers,
//! collections, maps and smart pointers implement it here. Types handled by a
//! registered [`TypeProcessor`](crate::TypeProcessor) and structs described by
//! a [`Schema`](crate::Schema) only need an empty `impl Bind for MyType {}`:
//! the default methods defer to the binder, which consults the registry
//! first and then the schema or enumeration table.
//!
//! Numbers are written in their own primitive kind and read with range-checked
//! narrowing, so a `u8` field accepts a `long` element holding `200` but
//! rejects one holding `300`.

use crate::binder::{Decoder, Encoder};
use crate::processors::{InetAddress, InetSocketAddress};
use crate::{Element, ElementArray, ElementMap, Error, Primitive, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;
use url::Url;
use uuid::Uuid;

/// A value the binder can convert to and from an [`Element`].
///
/// # Examples
///
/// ```rust
/// use treebind::{Bind, Binder, Element, Schema};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// impl Bind for Point {}
///
/// let binder = Binder::builder()
///     .schema(
///         Schema::<Point>::new()
///             .field("x", |p| &p.x, |p| &mut p.x)
///             .field("y", |p| &p.y, |p| &mut p.y),
///     )
///     .build()
///     .unwrap();
///
/// let element = binder.to_element(&Point { x: 3, y: -4 }).unwrap();
/// assert_eq!(element.get("y").unwrap(), &Element::from(-4));
/// assert_eq!(binder.to_object::<Point>(&element).unwrap(), Point { x: 3, y: -4 });
/// ```
pub trait Bind: Sized + 'static {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        enc.structural(self)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        dec.structural(element)
    }
}

fn primitive<'e>(element: &'e Element, type_name: &str) -> Result<&'e Primitive> {
    match element {
        Element::Primitive(Primitive::Null) => Err(Error::conversion(type_name, type_name, "null")),
        Element::Primitive(p) => Ok(p),
        other => Err(Error::shape_mismatch(type_name, other.shape())),
    }
}

macro_rules! bind_integer {
    ($($ty:ty),*) => {
        $(
            impl Bind for $ty {
                fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
                    Ok(Element::from(*self))
                }

                fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
                    primitive(element, stringify!($ty))?.to_integer()
                }
            }
        )*
    };
}

bind_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl Bind for isize {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(*self as i64))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "isize")?.to_integer()
    }
}

impl Bind for usize {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(*self as u64))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "usize")?.to_integer()
    }
}

impl Bind for i128 {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(BigInt::from(*self)))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "i128")?.to_integer()
    }
}

impl Bind for u128 {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(BigInt::from(*self)))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "u128")?.to_integer()
    }
}

impl Bind for f32 {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(*self))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "f32")?.to_f32()
    }
}

impl Bind for f64 {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(*self))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "f64")?.to_f64()
    }
}

impl Bind for bool {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(*self))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "bool")?.to_bool()
    }
}

impl Bind for char {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(*self))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "char")?.to_char()
    }
}

impl Bind for String {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(self.as_str()))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        match primitive(element, "String")? {
            Primitive::String(s) => Ok(s.clone()),
            Primitive::Char(c) => Ok(c.to_string()),
            other => Err(Error::conversion("String", "string", other.describe())),
        }
    }
}

impl Bind for BigInt {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(self.clone()))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "BigInt")?.to_big_integer()
    }
}

impl Bind for BigDecimal {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::from(self.clone()))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        primitive(element, "BigDecimal")?.to_big_decimal()
    }
}

impl Bind for Primitive {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(Element::Primitive(self.clone()))
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        element.as_primitive().cloned()
    }
}

impl Bind for Element {
    fn to_element(&self, _: &mut Encoder<'_>) -> Result<Element> {
        Ok(self.clone())
    }

    fn from_element(element: &Element, _: &mut Decoder<'_>) -> Result<Self> {
        Ok(element.clone())
    }
}

// Converted by the default processors.
impl Bind for Uuid {}
impl Bind for InetAddress {}
impl Bind for InetSocketAddress {}
impl Bind for IpAddr {}
impl Bind for Ipv4Addr {}
impl Bind for Ipv6Addr {}
impl Bind for SocketAddr {}
impl Bind for DateTime<Utc> {}
impl Bind for DateTime<FixedOffset> {}
impl Bind for SystemTime {}
impl Bind for PathBuf {}
impl Bind for Url {}
impl Bind for Box<str> {}
impl Bind for Arc<str> {}

impl<T: Bind> Bind for Option<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        match self {
            Some(value) => enc.encode(value),
            None => Ok(Element::null()),
        }
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        if element.is_null() {
            Ok(None)
        } else {
            dec.decode(element).map(Some)
        }
    }
}

impl<T: Bind> Bind for Box<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        enc.encode(&**self)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        dec.decode(element).map(Box::new)
    }
}

impl<T: Bind> Bind for Rc<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        enc.encode(&**self)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        dec.decode(element).map(Rc::new)
    }
}

impl<T: Bind> Bind for Arc<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        enc.encode(&**self)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        dec.decode(element).map(Arc::new)
    }
}

impl<T: Bind> Bind for RefCell<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        let value = self
            .try_borrow()
            .map_err(|_| Error::custom("value is mutably borrowed while being converted"))?;
        enc.encode(&*value)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        dec.decode(element).map(RefCell::new)
    }
}

fn encode_items<'a, T: Bind>(
    items: impl Iterator<Item = &'a T>,
    enc: &mut Encoder<'_>,
) -> Result<Element> {
    let skip_nulls = enc.options().ignore_nulls;
    let mut array = ElementArray::new();
    for (index, item) in items.enumerate() {
        let element = enc
            .encode(item)
            .map_err(|e| Error::in_field("array", format!("[{}]", index), e))?;
        if !(skip_nulls && element.is_null()) {
            array.push(element);
        }
    }
    Ok(Element::Array(array))
}

fn decode_items<T: Bind>(element: &Element, dec: &mut Decoder<'_>) -> Result<Vec<T>> {
    let options = dec.options();
    element
        .as_array()?
        .iter()
        .enumerate()
        .filter(|(_, item)| !options.skips(item))
        .map(|(index, item)| {
            dec.decode(item)
                .map_err(|e| Error::in_field("array", format!("[{}]", index), e))
        })
        .collect()
}

impl<T: Bind> Bind for Vec<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_items(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        decode_items(element, dec)
    }
}

impl<T: Bind, const N: usize> Bind for [T; N] {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_items(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        let items = decode_items::<T>(element, dec)?;
        let len = items.len();
        items.try_into().map_err(|_| {
            Error::conversion(
                std::any::type_name::<Self>(),
                format!("array of {}", N),
                format!("array of {}", len),
            )
        })
    }
}

impl<T: Bind + Eq + Hash> Bind for HashSet<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_items(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(decode_items(element, dec)?.into_iter().collect())
    }
}

impl<T: Bind + Ord> Bind for BTreeSet<T> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_items(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(decode_items(element, dec)?.into_iter().collect())
    }
}

/// Reduces a map key to its object key string.
fn key_string<K: Bind>(key: &K, enc: &mut Encoder<'_>) -> Result<String> {
    match enc.encode(key)? {
        Element::Primitive(Primitive::Null) => Err(Error::unsupported_key("null")),
        Element::Primitive(p) => Ok(p.to_string_lossy()),
        other => Err(Error::unsupported_key(other.shape())),
    }
}

fn encode_entries<'a, K: Bind, V: Bind>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    enc: &mut Encoder<'_>,
) -> Result<Element> {
    let skip_nulls = enc.options().ignore_nulls;
    let mut map = ElementMap::new();
    for (key, value) in entries {
        let key = key_string(key, enc)?;
        let element = enc
            .encode(value)
            .map_err(|e| Error::in_field("map", key.as_str(), e))?;
        if !(skip_nulls && element.is_null()) {
            map.set(key, element);
        }
    }
    Ok(Element::Object(map))
}

fn decode_entries<K: Bind, V: Bind>(element: &Element, dec: &mut Decoder<'_>) -> Result<Vec<(K, V)>> {
    let options = dec.options();
    element
        .as_object()?
        .iter()
        .filter(|(_, value)| !options.skips(value))
        .map(|(key, value)| -> Result<(K, V)> {
            let k = dec
                .decode::<K>(&Element::from(key.as_str()))
                .map_err(|e| Error::in_field("map", key.as_str(), e))?;
            let v = dec
                .decode::<V>(value)
                .map_err(|e| Error::in_field("map", key.as_str(), e))?;
            Ok((k, v))
        })
        .collect()
}

impl<K: Bind + Eq + Hash, V: Bind> Bind for HashMap<K, V> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_entries(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(decode_entries(element, dec)?.into_iter().collect())
    }
}

impl<K: Bind + Ord, V: Bind> Bind for BTreeMap<K, V> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_entries(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(decode_entries(element, dec)?.into_iter().collect())
    }
}

impl<K: Bind + Eq + Hash, V: Bind> Bind for IndexMap<K, V> {
    fn to_element(&self, enc: &mut Encoder<'_>) -> Result<Element> {
        encode_entries(self.iter(), enc)
    }

    fn from_element(element: &Element, dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(decode_entries(element, dec)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{element, Binder};

    fn binder() -> Binder {
        Binder::builder().build().unwrap()
    }

    #[test]
    fn test_integer_narrowing() {
        let binder = binder();
        assert_eq!(binder.to_object::<u8>(&Element::from(200i64)).unwrap(), 200);
        assert!(binder.to_object::<u8>(&Element::from(300i64)).is_err());
        assert!(binder.to_object::<i32>(&Element::null()).is_err());
        assert!(binder.to_object::<i32>(&element!([1])).is_err());
        assert_eq!(binder.to_element(&7u16).unwrap(), Element::from(7u16));
    }

    #[test]
    fn test_option_and_null() {
        let binder = binder();
        assert_eq!(binder.to_element(&None::<i32>).unwrap(), Element::null());
        assert_eq!(binder.to_object::<Option<i32>>(&Element::null()).unwrap(), None);
        assert_eq!(binder.to_object::<Option<i32>>(&Element::from(5)).unwrap(), Some(5));
    }

    #[test]
    fn test_collections() {
        let binder = binder();
        let element = binder.to_element(&vec![1i64, 2, 3]).unwrap();
        assert_eq!(element, element!([1i64, 2i64, 3i64]));
        assert_eq!(binder.to_object::<[i64; 3]>(&element).unwrap(), [1, 2, 3]);
        assert!(binder.to_object::<[i64; 2]>(&element).is_err());

        let mut scores = BTreeMap::new();
        scores.insert(2u32, "two".to_string());
        scores.insert(10u32, "ten".to_string());
        let element = binder.to_element(&scores).unwrap();
        assert_eq!(element, element!({"2": "two", "10": "ten"}));
        assert_eq!(binder.to_object::<BTreeMap<u32, String>>(&element).unwrap(), scores);
    }

    #[test]
    fn test_unsupported_key() {
        let binder = binder();
        let mut map = HashMap::new();
        map.insert(vec![1i32], 1i32);
        let err = binder.to_element(&map).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKey { .. }));
    }

    #[test]
    fn test_array_item_errors_carry_index() {
        let binder = binder();
        let err = binder
            .to_object::<Vec<i8>>(&element!([1, 2, 1000]))
            .unwrap_err();
        assert_eq!(err.field_path(), vec!["[2]"]);
    }

    #[test]
    fn test_map_key_errors_carry_key() {
        let binder = binder();
        let err = binder
            .to_object::<BTreeMap<u8, String>>(&element!({"1": "one", "nine-hundred": "x"}))
            .unwrap_err();
        assert_eq!(err.field_path(), vec!["nine-hundred"]);
        assert!(matches!(err.root(), Error::TypeConversion { .. }));
    }

    #[test]
    fn test_ignore_switches_drop_items_on_read() {
        let binder = Binder::builder()
            .with_options(
                crate::BinderOptions::new()
                    .with_ignore_nulls(true)
                    .with_ignore_empty_objects(true),
            )
            .build()
            .unwrap();
        let items: Vec<Option<i32>> = binder.to_object(&element!([1, null, 2])).unwrap();
        assert_eq!(items, vec![Some(1), Some(2)]);

        let nested: Vec<Vec<i32>> = binder.to_object(&element!([[1], [], [2]])).unwrap();
        assert_eq!(nested, vec![vec![1], vec![2]]);

        let map: BTreeMap<String, Option<i32>> =
            binder.to_object(&element!({"a": 1, "b": null})).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_processor_types_go_through_registry() {
        let binder = binder();
        let id = Uuid::nil();
        let element = binder.to_element(&Some(id)).unwrap();
        assert_eq!(element, Element::from("00000000-0000-0000-0000-000000000000"));
        assert_eq!(binder.to_object::<Uuid>(&element).unwrap(), id);
        assert!(binder.to_object::<Uuid>(&Element::null()).is_err());
    }
}
