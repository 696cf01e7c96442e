//! Zero-argument construction of bind targets.
//!
//! Every structural type tells the binder how to obtain a blank instance to
//! fill in. A type that only makes sense inside an enclosing value (the
//! equivalent of a nested type holding a captured outer reference) is marked
//! [`Initializer::Enclosed`]: it still has a detached constructor, but the
//! binder refuses to use it unless
//! [`BinderOptions::allow_unsafe_initialization`](crate::BinderOptions) is set.

use crate::{Error, Result};
use std::fmt;

/// How to obtain a blank `T`.
pub enum Initializer<T> {
    /// A plain zero-argument constructor.
    Constructor(fn() -> T),
    /// A constructor that leaves the link to the enclosing `outer` value unset.
    Enclosed { outer: &'static str, detached: fn() -> T },
    /// No zero-argument constructor exists.
    Unavailable,
}

impl<T> Clone for Initializer<T> {
    fn clone(&self) -> Self {
        match self {
            Initializer::Constructor(ctor) => Initializer::Constructor(*ctor),
            Initializer::Enclosed { outer, detached } => Initializer::Enclosed {
                outer: *outer,
                detached: *detached,
            },
            Initializer::Unavailable => Initializer::Unavailable,
        }
    }
}

impl<T> fmt::Debug for Initializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initializer::Constructor(_) => f.write_str("Constructor"),
            Initializer::Enclosed { outer, .. } => {
                f.debug_struct("Enclosed").field("outer", outer).finish()
            }
            Initializer::Unavailable => f.write_str("Unavailable"),
        }
    }
}

impl<T: Default> Default for Initializer<T> {
    fn default() -> Self {
        Initializer::Constructor(T::default)
    }
}

impl<T> Initializer<T> {
    /// Creates a blank `T`, named `type_name` in errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use treebind::{Error, Initializer};
    ///
    /// #[derive(Default)]
    /// struct Row { cells: Vec<String> }
    ///
    /// let init = Initializer::Enclosed { outer: "Table", detached: Row::default };
    /// assert!(matches!(init.instantiate("Row", false), Err(Error::Uninitializable { .. })));
    /// assert!(init.instantiate("Row", true).is_ok());
    /// ```
    pub fn instantiate(&self, type_name: &str, allow_unsafe: bool) -> Result<T> {
        match self {
            Initializer::Constructor(ctor) => Ok(ctor()),
            Initializer::Enclosed { detached, .. } if allow_unsafe => Ok(detached()),
            Initializer::Enclosed { outer, .. } => Err(Error::uninitializable(
                type_name,
                format!(
                    "it needs an enclosing {} value; make it a standalone type or allow unsafe initialization",
                    outer
                ),
            )),
            Initializer::Unavailable => Err(Error::uninitializable(
                type_name,
                "it has no zero-argument constructor",
            )),
        }
    }
}
