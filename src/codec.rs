//! The boundary to wire-format backends.
//!
//! A backend turns an [`Element`] tree into bytes and back. Decoding what was
//! encoded must give a structurally equal tree for every primitive kind the
//! format can represent; other kinds may come back as a narrower or different
//! kind (through JSON a `long` that fits comes back as an `int`, a `char` or a
//! `big-decimal` as a string).
//!
//! [`JsonCodec`] is the reference backend, built on `serde_json` through the
//! serde implementations of [`Element`].
//!
//! ```rust
//! use treebind::{element, Codec, JsonCodec};
//!
//! let tree = element!({"id": 7, "tags": ["a", "b"], "ratio": 0.5});
//! let bytes = JsonCodec::new().encode(&tree).unwrap();
//! assert_eq!(bytes, br#"{"id":7,"tags":["a","b"],"ratio":0.5}"#);
//! assert_eq!(JsonCodec::new().decode(&bytes).unwrap(), tree);
//! ```

use crate::{Element, Error, Result};

/// Encodes element trees to bytes and decodes them back.
pub trait Codec {
    fn encode(&self, element: &Element) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Element>;
}

/// JSON backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output instead of the compact default.
    #[must_use]
    pub fn pretty() -> Self {
        JsonCodec { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, element: &Element) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(element)
        } else {
            serde_json::to_vec(element)
        };
        bytes.map_err(|e| Error::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Element> {
        serde_json::from_slice(bytes).map_err(|e| Error::Codec(e.to_string()))
    }
}
