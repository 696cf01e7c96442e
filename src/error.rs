//! Error types for the element model, the registry and the binder.
//!
//! Every failure is raised where it is detected and aborts the enclosing
//! conversion. Errors that happen while a field is being processed are
//! wrapped in [`Error::InField`], so the caller sees the declaring type and
//! the field name; [`Error::root`] peels the wrapping off again.
//!
//! ## Error Categories
//!
//! - **Shape**: an [`Element`](crate::Element) is not the variant or primitive kind that was asked for
//! - **Lookup**: unknown object key or out-of-range array index
//! - **Conversion**: a value cannot be formatted or parsed by an adapter or narrowed to a field type
//! - **Binding**: uninitializable types, failed expectations, unsupported map keys, unknown types, cycles
//!
//! ## Examples
//!
//! ```rust
//! use treebind::{Element, Error};
//!
//! let element = Element::from("text");
//! let err = element.as_int().unwrap_err();
//! assert!(matches!(err, Error::ShapeMismatch { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all errors produced while building, reading or binding element trees.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The element is not the variant or primitive kind that was requested.
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    /// An object has no entry under the requested key.
    #[error("key not found: {key:?}")]
    KeyNotFound { key: String },

    /// An array index is outside the valid range.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A value could not be converted to or from its element form.
    #[error("cannot convert {type_name}: expected {expected}, found {found}")]
    TypeConversion {
        type_name: String,
        expected: String,
        found: String,
    },

    /// No instance of the target type can be created.
    #[error("cannot initialize {type_name}: {reason}")]
    Uninitializable { type_name: String, reason: String },

    /// A field value violated one of its expectations.
    #[error("expectation failed for {type_name}.{field}: {message}")]
    ExpectationFailed {
        type_name: String,
        field: String,
        message: String,
    },

    /// A map key does not reduce to a string-able primitive.
    #[error("unsupported map key: {found} cannot be used as an object key")]
    UnsupportedKey { found: String },

    /// Neither a processor nor a schema is known for the type.
    #[error("unknown type {type_name}: no processor, schema or enumeration registered")]
    UnknownType { type_name: String },

    /// The object graph refers back to a value that is still being converted.
    #[error("cycle detected while converting {type_name}")]
    CycleDetected { type_name: String },

    /// An error raised while processing a single field.
    #[error("{type_name}.{field}: {source}")]
    InField {
        type_name: String,
        field: String,
        #[source]
        source: Box<Error>,
    },

    /// A codec backend failed to encode or decode bytes.
    #[error("codec error: {0}")]
    Codec(String),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a shape mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treebind::Error;
    ///
    /// let err = Error::shape_mismatch("int", "string");
    /// assert!(err.to_string().contains("expected int"));
    /// ```
    pub fn shape_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn key_not_found(key: &str) -> Self {
        Error::KeyNotFound {
            key: key.to_string(),
        }
    }

    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Error::IndexOutOfBounds { index, len }
    }

    /// Creates a conversion error naming the target type and the expected and actual forms.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treebind::Error;
    ///
    /// let err = Error::conversion("Uuid", "string or integer", "boolean");
    /// assert!(err.to_string().contains("Uuid"));
    /// ```
    pub fn conversion(
        type_name: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeConversion {
            type_name: type_name.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn uninitializable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Uninitializable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn expectation_failed(
        type_name: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::ExpectationFailed {
            type_name: type_name.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_key(found: impl Into<String>) -> Self {
        Error::UnsupportedKey {
            found: found.into(),
        }
    }

    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Error::UnknownType {
            type_name: type_name.into(),
        }
    }

    pub fn cycle(type_name: impl Into<String>) -> Self {
        Error::CycleDetected {
            type_name: type_name.into(),
        }
    }

    /// Wraps an error with the declaring type and field it occurred in.
    pub fn in_field(type_name: impl Into<String>, field: impl Into<String>, source: Error) -> Self {
        Error::InField {
            type_name: type_name.into(),
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns the innermost error, skipping any field context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treebind::Error;
    ///
    /// let inner = Error::key_not_found("id");
    /// let err = Error::in_field("Outer", "inner", Error::in_field("Inner", "id", inner));
    /// assert!(matches!(err.root(), Error::KeyNotFound { .. }));
    /// ```
    #[must_use]
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::InField { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the dotted field path recorded by the field context, outermost first.
    #[must_use]
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Error::InField { field, source, .. } = current {
            path.push(field.as_str());
            current = source;
        }
        path
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Codec(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Codec(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
