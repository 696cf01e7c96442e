//! # treebind
//!
//! A format-agnostic document tree and a type-directed object binder.
//!
//! Application values are converted to an [`Element`] tree (objects, arrays
//! and typed primitives) and back. Wire formats plug in behind the narrow
//! [`Codec`] contract, so the same bound types work with any backend that can
//! carry the tree.
//!
//! ## Key Features
//!
//! - **Exact primitives**: byte, short, int, long, big-integer, float, double
//!   and big-decimal stay distinct, so numeric encodings round-trip bit for bit
//! - **Processor registry**: converters are resolved by the most specific
//!   declared ancestor of a type, computed once when the registry is built
//! - **Default adapters**: UUIDs, IP and socket addresses, instants, paths and
//!   URLs, each with configurable wire encodings and liberal reading
//! - **Schemas instead of reflection**: per-type field tables with rename,
//!   skip, default literals and expectations, flattened once with parent fields
//! - **No partial results**: every failure is a typed [`Error`] that aborts the
//!   whole conversion and names the field it happened in
//!
//! ## Quick Start
//!
//! ```rust
//! use treebind::{Bind, Binder, Expectation, FieldPolicy, JsonCodec, Schema};
//! use uuid::Uuid;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Account {
//!     id: Uuid,
//!     owner: String,
//!     balance: i64,
//! }
//!
//! impl Bind for Account {}
//!
//! let binder = Binder::builder()
//!     .schema(
//!         Schema::<Account>::new()
//!             .field("id", |a| &a.id, |a| &mut a.id)
//!             .field("owner", |a| &a.owner, |a| &mut a.owner)
//!             .field_with(
//!                 "balance",
//!                 |a| &a.balance,
//!                 |a| &mut a.balance,
//!                 FieldPolicy::new().expect(Expectation::greater_than(0, true)),
//!             ),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let account = Account { id: Uuid::new_v4(), owner: "ada".into(), balance: 120 };
//! let bytes = treebind::to_bytes(&binder, &JsonCodec::new(), &account).unwrap();
//! let back: Account = treebind::from_bytes(&binder, &JsonCodec::new(), &bytes).unwrap();
//! assert_eq!(back, account);
//! ```
//!
//! ### Building trees by hand
//!
//! ```rust
//! use treebind::{element, Element};
//!
//! let tree = element!({
//!     "name": "Alice",
//!     "tags": ["rust", "binding"]
//! });
//! assert_eq!(tree.get("name").unwrap().as_str().unwrap(), "Alice");
//! assert!(tree.get("tags").unwrap().is_array());
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - All array indexing is bounds-checked and reported as [`Error::IndexOutOfBounds`]
//! - Shared-pointer cycles are detected and reported as [`Error::CycleDetected`]
//!
//! ## Examples
//!
//! See `demos/binding.rs` for a longer walk through schemas, inheritance,
//! processors and codecs. Run it with `cargo run --example binding`.

pub mod bind;
pub mod binder;
pub mod codec;
pub mod element;
pub mod error;
pub mod init;
pub mod macros;
pub mod map;
pub mod options;
pub mod primitive;
pub mod processors;
pub mod registry;
pub mod schema;
pub mod types;

pub use bind::Bind;
pub use binder::{Binder, BinderBuilder, Decoder, Encoder};
pub use codec::{Codec, JsonCodec};
pub use element::{Element, ElementArray};
pub use error::{Error, Result};
pub use init::Initializer;
pub use map::ElementMap;
pub use options::{
    BinderOptions, DateFormat, DateMode, DatePattern, InetAddressMode, MissingFieldPolicy,
    ProcessorOptions, UuidMode,
};
pub use primitive::{Primitive, PrimitiveKind};
pub use processors::{
    InetAddress, InetProcessor, InetSocketAddress, TemporalProcessor, TextProcessor, UuidProcessor,
};
pub use registry::{Registry, RegistryBuilder, Resolved, TypeProcessor};
pub use schema::{EnumTable, Expectation, FieldPolicy, Schema};
pub use types::{TypeGraph, TypeKey, Upcast};

use std::io;

/// Converts `value` with `binder` and encodes the tree with `codec`.
///
/// # Errors
///
/// Returns an error if the value cannot be bound or the codec fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes<T: Bind>(binder: &Binder, codec: &impl Codec, value: &T) -> Result<Vec<u8>> {
    codec.encode(&binder.to_element(value)?)
}

/// Decodes `bytes` with `codec` and materializes a `T` with `binder`.
///
/// # Errors
///
/// Returns an error if the bytes are malformed for the codec or the tree
/// cannot be bound to `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_bytes<T: Bind>(binder: &Binder, codec: &impl Codec, bytes: &[u8]) -> Result<T> {
    binder.to_object(&codec.decode(bytes)?)
}

/// Like [`to_bytes`], writing the encoded bytes to `writer`.
///
/// # Examples
///
/// ```rust
/// use treebind::{Binder, JsonCodec};
///
/// let binder = Binder::builder().build().unwrap();
/// let mut buffer = Vec::new();
/// treebind::to_writer(&mut buffer, &binder, &JsonCodec::new(), &vec![1i32, 2, 3]).unwrap();
/// assert_eq!(buffer, b"[1,2,3]");
/// ```
///
/// # Errors
///
/// Returns an error if binding or encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(mut writer: W, binder: &Binder, codec: &impl Codec, value: &T) -> Result<()>
where
    W: io::Write,
    T: Bind,
{
    let bytes = to_bytes(binder, codec, value)?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::Codec(e.to_string()))
}

/// Like [`from_bytes`], reading everything from `reader` first.
///
/// # Errors
///
/// Returns an error if reading fails, the bytes are malformed for the codec,
/// or the tree cannot be bound to `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R, binder: &Binder, codec: &impl Codec) -> Result<T>
where
    R: io::Read,
    T: Bind,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Codec(e.to_string()))?;
    from_bytes(binder, codec, &bytes)
}
