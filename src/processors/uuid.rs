//! UUIDs in six wire forms.
//!
//! | Mode | Element |
//! |---|---|
//! | `String` | `"e4ec171a-665d-43fa-946e-852cc67cc590"` |
//! | `ByteArray` | 16 bytes |
//! | `ShortArray` | 8 shorts |
//! | `IntArray` | 4 ints |
//! | `LongArray` | 2 longs |
//! | `Number` | one unsigned big-integer |
//!
//! Array chunks are big-endian and signed. On read, the array length picks the
//! chunk width, any integral kind is taken as the 128-bit value, and strings
//! are parsed.

use super::unexpected;
use crate::{Element, ElementArray, Error, Primitive, Result, TypeProcessor, UuidMode};
use num_bigint::{BigInt, Sign};
use uuid::Uuid;

const NAME: &str = "Uuid";

#[derive(Clone, Copy, Debug, Default)]
pub struct UuidProcessor {
    mode: UuidMode,
}

impl UuidProcessor {
    #[must_use]
    pub fn new(mode: UuidMode) -> Self {
        UuidProcessor { mode }
    }
}

fn chunk<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

impl TypeProcessor<Uuid> for UuidProcessor {
    fn to_element(&self, value: Option<&Uuid>) -> Result<Element> {
        let Some(uuid) = value else {
            return Ok(Element::null());
        };
        let bytes = uuid.as_bytes();

        let array: ElementArray = match self.mode {
            UuidMode::String => return Ok(Element::from(uuid.hyphenated().to_string())),
            UuidMode::Number => return Ok(Element::from(BigInt::from(uuid.as_u128()))),
            UuidMode::ByteArray => bytes.iter().map(|b| Element::from(*b as i8)).collect(),
            UuidMode::ShortArray => bytes
                .chunks_exact(2)
                .map(|c| Element::from(i16::from_be_bytes(chunk(c))))
                .collect(),
            UuidMode::IntArray => bytes
                .chunks_exact(4)
                .map(|c| Element::from(i32::from_be_bytes(chunk(c))))
                .collect(),
            UuidMode::LongArray => bytes
                .chunks_exact(8)
                .map(|c| Element::from(i64::from_be_bytes(chunk(c))))
                .collect(),
        };
        Ok(Element::Array(array))
    }

    fn to_object(&self, element: &Element) -> Result<Option<Uuid>> {
        match element {
            Element::Primitive(Primitive::Null) => Ok(None),
            Element::Primitive(Primitive::String(text)) => Uuid::parse_str(text.trim())
                .map(Some)
                .map_err(|_| Error::conversion(NAME, "hyphenated UUID", format!("{:?}", text))),
            Element::Primitive(p) if p.is_integral() => from_number(p).map(Some),
            Element::Array(array) => from_chunks(array).map(Some),
            other => Err(unexpected(NAME, "string, integer or array", other)),
        }
    }
}

/// Accepts the unsigned 128-bit value and, leniently, its signed two's-complement form.
fn from_number(p: &Primitive) -> Result<Uuid> {
    let mut n = p.to_big_integer()?;
    if n.sign() == Sign::Minus {
        n += BigInt::from(u128::MAX) + BigInt::from(1u8);
    }
    u128::try_from(&n)
        .map(Uuid::from_u128)
        .map_err(|_| Error::conversion(NAME, "128-bit integer", p.describe()))
}

fn from_chunks(array: &ElementArray) -> Result<Uuid> {
    let bits: u32 = match array.len() {
        16 => 8,
        8 => 16,
        4 => 32,
        2 => 64,
        n => {
            return Err(Error::conversion(
                NAME,
                "array of 16, 8, 4 or 2 numbers",
                format!("array of {}", n),
            ))
        }
    };
    let min = -(1i128 << (bits - 1));
    let max = (1i128 << bits) - 1;
    let mask = (1u128 << bits) - 1;

    let mut value: u128 = 0;
    for item in array.iter() {
        let p = item.as_primitive()?;
        let n: i128 = p.to_integer()?;
        if n < min || n > max {
            return Err(Error::conversion(
                NAME,
                format!("{}-bit chunk", bits),
                p.describe(),
            ));
        }
        value = (value << bits) | (n as u128 & mask);
    }
    Ok(Uuid::from_u128(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "e4ec171a-665d-43fa-946e-852cc67cc590";

    fn sample() -> Uuid {
        Uuid::parse_str(SAMPLE).unwrap()
    }

    fn ints(element: &Element) -> Vec<i64> {
        element
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e.as_primitive().unwrap().to_integer::<i64>().unwrap())
            .collect()
    }

    #[test]
    fn test_chunk_layouts() {
        let uuid = sample();

        let bytes = UuidProcessor::new(UuidMode::ByteArray)
            .to_element(Some(&uuid))
            .unwrap();
        assert_eq!(
            ints(&bytes),
            vec![-28, -20, 23, 26, 102, 93, 67, -6, -108, 110, -123, 44, -58, 124, -59, -112]
        );
        assert!(bytes.at(0).unwrap().as_byte().is_ok());

        let shorts = UuidProcessor::new(UuidMode::ShortArray)
            .to_element(Some(&uuid))
            .unwrap();
        assert_eq!(
            ints(&shorts),
            vec![-6932, 5914, 26205, 17402, -27538, -31444, -14724, -14960]
        );

        let words = UuidProcessor::new(UuidMode::IntArray)
            .to_element(Some(&uuid))
            .unwrap();
        assert_eq!(
            ints(&words),
            vec![-454289638, 1717388282, -1804696276, -964901488]
        );

        let longs = UuidProcessor::new(UuidMode::LongArray)
            .to_element(Some(&uuid))
            .unwrap();
        assert_eq!(
            ints(&longs),
            vec![-1951159136404290566, -7751111481302923888]
        );
    }

    #[test]
    fn test_any_mode_reads_any_form() {
        let uuid = sample();
        let reader = UuidProcessor::new(UuidMode::String);
        for mode in [
            UuidMode::String,
            UuidMode::ByteArray,
            UuidMode::ShortArray,
            UuidMode::IntArray,
            UuidMode::LongArray,
            UuidMode::Number,
        ] {
            let element = UuidProcessor::new(mode).to_element(Some(&uuid)).unwrap();
            assert_eq!(reader.to_object(&element).unwrap(), Some(uuid), "{:?}", mode);
        }
    }

    #[test]
    fn test_signed_number_is_accepted() {
        let uuid = sample();
        let signed = BigInt::from(uuid.as_u128() as i128);
        let element = Element::from(signed);
        assert_eq!(
            UuidProcessor::default().to_object(&element).unwrap(),
            Some(uuid)
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        let processor = UuidProcessor::default();
        assert!(processor.to_object(&Element::from("not-a-uuid")).is_err());
        assert!(processor.to_object(&Element::from(true)).is_err());
        assert!(processor
            .to_object(&Element::from(vec![Element::from(1), Element::from(2), Element::from(3)]))
            .is_err());
        let out_of_range: Vec<Element> = (0..16).map(|_| Element::from(300)).collect();
        assert!(processor.to_object(&Element::from(out_of_range)).is_err());
    }
}
