//! Configuration for the default processors and the binder.
//!
//! - [`ProcessorOptions`]: which wire encoding the built-in adapters write
//!   ([`UuidMode`], [`InetAddressMode`], [`DateMode`], [`DateFormat`])
//! - [`BinderOptions`]: what the binder emits and how strictly it reads
//!
//! Options are plain values with chained `with_*` setters and are handed over
//! once, when the registry or binder is built.
//!
//! ## Examples
//!
//! ```rust
//! use chrono::FixedOffset;
//! use treebind::{BinderOptions, DateFormat, DateMode, ProcessorOptions, UuidMode};
//!
//! let est = FixedOffset::west_opt(5 * 3600).unwrap();
//! let options = ProcessorOptions::new()
//!     .with_uuid_mode(UuidMode::LongArray)
//!     .with_date_mode(DateMode::String)
//!     .with_date_format(DateFormat::rfc3339().with_offset(est));
//! assert!(options.validate().is_ok());
//!
//! let binder = BinderOptions::new().with_ignore_nulls(true);
//! assert!(binder.ignore_nulls);
//! ```

use crate::{Element, Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{FixedOffset, Offset, Utc};

/// How UUIDs are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UuidMode {
    /// Canonical hyphenated string.
    #[default]
    String,
    /// 16 signed bytes, big-endian.
    ByteArray,
    /// 8 signed shorts, big-endian.
    ShortArray,
    /// 4 signed ints, big-endian.
    IntArray,
    /// 2 signed longs, big-endian.
    LongArray,
    /// One unsigned big-integer holding all 128 bits.
    Number,
}

/// How IP and socket addresses are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InetAddressMode {
    /// Dotted decimal or compressed colon-hex.
    #[default]
    String,
    /// Zero-padded, uncompressed full-width string.
    StringFill,
    /// Unsigned big-integer of the raw address bytes.
    Number,
}

/// How dates and instants are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DateMode {
    /// Formatted with the configured [`DateFormat`].
    #[default]
    String,
    /// Milliseconds since the Unix epoch.
    Number,
}

/// Text layout for dates in [`DateMode::String`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum DatePattern {
    /// RFC 3339 / ISO-8601 with offset, e.g. `2024-07-04T07:00:00-05:00`.
    #[default]
    Rfc3339,
    /// A chrono strftime pattern, e.g. `%Y-%m-%d %H:%M:%S`.
    Custom(String),
}

/// Pattern and offset used to format and parse dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat {
    pub pattern: DatePattern,
    pub offset: FixedOffset,
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat {
            pattern: DatePattern::Rfc3339,
            offset: Utc.fix(),
        }
    }
}

impl DateFormat {
    /// RFC 3339 in UTC.
    #[must_use]
    pub fn rfc3339() -> Self {
        Self::default()
    }

    /// A strftime pattern in UTC.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        DateFormat {
            pattern: DatePattern::Custom(pattern.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Fails when a custom pattern is empty or contains an invalid specifier.
    pub fn validate(&self) -> Result<()> {
        match &self.pattern {
            DatePattern::Rfc3339 => Ok(()),
            DatePattern::Custom(pattern) if pattern.is_empty() => {
                Err(Error::custom("date format pattern must not be empty"))
            }
            DatePattern::Custom(pattern) => {
                if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                    Err(Error::custom(format!(
                        "invalid date format pattern {:?}",
                        pattern
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Wire encodings used by the default processors.
///
/// # Examples
///
/// ```rust
/// use treebind::{InetAddressMode, ProcessorOptions};
///
/// let options = ProcessorOptions::new().with_inet_address_mode(InetAddressMode::Number);
/// assert_eq!(options.inet_address_mode, InetAddressMode::Number);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ProcessorOptions {
    pub uuid_mode: UuidMode,
    pub inet_address_mode: InetAddressMode,
    pub date_mode: DateMode,
    pub date_format: DateFormat,
}

impl ProcessorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_uuid_mode(mut self, mode: UuidMode) -> Self {
        self.uuid_mode = mode;
        self
    }

    #[must_use]
    pub fn with_inet_address_mode(mut self, mode: InetAddressMode) -> Self {
        self.inet_address_mode = mode;
        self
    }

    #[must_use]
    pub fn with_date_mode(mut self, mode: DateMode) -> Self {
        self.date_mode = mode;
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }

    /// Checks that the date format is usable. Reads accept strings in any mode,
    /// so the format is validated even when dates are written as numbers.
    pub fn validate(&self) -> Result<()> {
        self.date_format.validate()
    }
}

/// What to do with an object key that is absent and has no default literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MissingFieldPolicy {
    /// Leave the value the initializer produced.
    #[default]
    Keep,
    /// Fail with a lookup error.
    Error,
}

/// Switches controlling the binder.
///
/// # Examples
///
/// ```rust
/// use treebind::{BinderOptions, MissingFieldPolicy};
///
/// let options = BinderOptions::new()
///     .with_ignore_defaults(true)
///     .with_missing_fields(MissingFieldPolicy::Error);
/// assert!(options.ignore_defaults);
/// assert!(!options.case_sensitive_enums);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BinderOptions {
    /// Do not emit fields whose value is null. On read, a null field keeps its
    /// initial value and null collection items are dropped.
    pub ignore_nulls: bool,
    /// Same as `ignore_nulls`, for empty objects and arrays.
    pub ignore_empty_objects: bool,
    /// Do not emit fields equal to their default literal or to a fresh instance.
    pub ignore_defaults: bool,
    /// Match enumeration names exactly instead of ignoring ASCII case.
    pub case_sensitive_enums: bool,
    /// Allow initializers that detach a type from its enclosing instance.
    pub allow_unsafe_initialization: bool,
    pub missing_fields: MissingFieldPolicy,
}

impl BinderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ignore_nulls(mut self, value: bool) -> Self {
        self.ignore_nulls = value;
        self
    }

    #[must_use]
    pub fn with_ignore_empty_objects(mut self, value: bool) -> Self {
        self.ignore_empty_objects = value;
        self
    }

    #[must_use]
    pub fn with_ignore_defaults(mut self, value: bool) -> Self {
        self.ignore_defaults = value;
        self
    }

    #[must_use]
    pub fn with_case_sensitive_enums(mut self, value: bool) -> Self {
        self.case_sensitive_enums = value;
        self
    }

    #[must_use]
    pub fn with_unsafe_initialization(mut self, value: bool) -> Self {
        self.allow_unsafe_initialization = value;
        self
    }

    #[must_use]
    pub fn with_missing_fields(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_fields = policy;
        self
    }

    /// Whether a read value is passed over under the ignore switches.
    pub(crate) fn skips(&self, element: &Element) -> bool {
        (self.ignore_nulls && element.is_null())
            || (self.ignore_empty_objects && element.is_empty_container())
    }
}
