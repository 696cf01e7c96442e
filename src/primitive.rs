//! Primitive leaf values of the element tree.
//!
//! A [`Primitive`] is exactly one of a string, a boolean, null, or one of the
//! numeric kinds. Numeric kinds stay distinct: an `Int(5)` and a `Long(5)` are
//! different primitives, because some adapters and backends depend on the exact
//! width and signedness of what they are handed.
//!
//! Two families of accessors exist:
//!
//! - strict `as_*` accessors return the payload only when the stored kind is
//!   exactly the requested one and fail with [`Error::ShapeMismatch`] otherwise;
//! - lenient `to_*` conversions and [`Primitive::convert_to`] widen, narrow and
//!   parse between kinds, failing with [`Error::TypeConversion`] when the value
//!   does not fit.
//!
//! ```rust
//! use treebind::{Primitive, PrimitiveKind};
//!
//! let value = Primitive::from(300i32);
//! assert_eq!(value.as_int().unwrap(), 300);
//! assert!(value.as_long().is_err());
//!
//! assert_eq!(value.to_integer::<i64>().unwrap(), 300);
//! assert!(value.to_integer::<i8>().is_err());
//! assert_eq!(value.convert_to(PrimitiveKind::Double).unwrap(), Primitive::Double(300.0));
//! ```

use crate::{Error, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The kind tag of a [`Primitive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Null,
    Byte,
    Char,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
}

impl PrimitiveKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::BigInteger => "big-integer",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::BigDecimal => "big-decimal",
        }
    }

    /// Returns `true` for every numeric kind.
    #[inline]
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Int
                | PrimitiveKind::Long
                | PrimitiveKind::BigInteger
                | PrimitiveKind::Float
                | PrimitiveKind::Double
                | PrimitiveKind::BigDecimal
        )
    }

    /// Returns `true` for the whole-number kinds.
    #[inline]
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Int
                | PrimitiveKind::Long
                | PrimitiveKind::BigInteger
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf value of the element tree.
///
/// # Examples
///
/// ```rust
/// use treebind::{Primitive, PrimitiveKind};
///
/// let text = Primitive::from("hello");
/// assert_eq!(text.kind(), PrimitiveKind::String);
/// assert!(!text.is_numeric());
///
/// let big = Primitive::from(u64::MAX);
/// assert_eq!(big.kind(), PrimitiveKind::BigInteger);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Primitive {
    String(String),
    Boolean(bool),
    #[default]
    Null,
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInteger(BigInt),
    Float(f32),
    Double(f64),
    BigDecimal(BigDecimal),
}

impl Primitive {
    /// Returns the kind tag of this primitive.
    #[must_use]
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::String(_) => PrimitiveKind::String,
            Primitive::Boolean(_) => PrimitiveKind::Boolean,
            Primitive::Null => PrimitiveKind::Null,
            Primitive::Byte(_) => PrimitiveKind::Byte,
            Primitive::Char(_) => PrimitiveKind::Char,
            Primitive::Short(_) => PrimitiveKind::Short,
            Primitive::Int(_) => PrimitiveKind::Int,
            Primitive::Long(_) => PrimitiveKind::Long,
            Primitive::BigInteger(_) => PrimitiveKind::BigInteger,
            Primitive::Float(_) => PrimitiveKind::Float,
            Primitive::Double(_) => PrimitiveKind::Double,
            Primitive::BigDecimal(_) => PrimitiveKind::BigDecimal,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Primitive::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Primitive::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self, Primitive::Boolean(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    #[inline]
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        self.kind().is_integral()
    }

    fn mismatch(&self, expected: PrimitiveKind) -> Error {
        Error::shape_mismatch(expected.as_str(), self.kind().as_str())
    }

    fn cannot_convert(&self, target: &str, expected: &str) -> Error {
        Error::conversion(target, expected, self.describe())
    }

    /// Short description used in error messages, e.g. `int 5`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Primitive::Null => "null".to_string(),
            Primitive::String(s) => format!("string {:?}", s),
            other => format!("{} {}", other.kind(), other),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Primitive::String(s) => Ok(s),
            _ => Err(self.mismatch(PrimitiveKind::String)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Primitive::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch(PrimitiveKind::Boolean)),
        }
    }

    pub fn as_byte(&self) -> Result<i8> {
        match self {
            Primitive::Byte(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Byte)),
        }
    }

    pub fn as_char(&self) -> Result<char> {
        match self {
            Primitive::Char(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Char)),
        }
    }

    pub fn as_short(&self) -> Result<i16> {
        match self {
            Primitive::Short(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Short)),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            Primitive::Int(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Int)),
        }
    }

    pub fn as_long(&self) -> Result<i64> {
        match self {
            Primitive::Long(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Long)),
        }
    }

    pub fn as_big_integer(&self) -> Result<&BigInt> {
        match self {
            Primitive::BigInteger(v) => Ok(v),
            _ => Err(self.mismatch(PrimitiveKind::BigInteger)),
        }
    }

    pub fn as_float(&self) -> Result<f32> {
        match self {
            Primitive::Float(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Float)),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Primitive::Double(v) => Ok(*v),
            _ => Err(self.mismatch(PrimitiveKind::Double)),
        }
    }

    pub fn as_big_decimal(&self) -> Result<&BigDecimal> {
        match self {
            Primitive::BigDecimal(v) => Ok(v),
            _ => Err(self.mismatch(PrimitiveKind::BigDecimal)),
        }
    }

    /// Converts any whole number, integral float or numeric string to a [`BigInt`].
    pub fn to_big_integer(&self) -> Result<BigInt> {
        match self {
            Primitive::Byte(v) => Ok(BigInt::from(*v)),
            Primitive::Short(v) => Ok(BigInt::from(*v)),
            Primitive::Int(v) => Ok(BigInt::from(*v)),
            Primitive::Long(v) => Ok(BigInt::from(*v)),
            Primitive::BigInteger(v) => Ok(v.clone()),
            Primitive::Float(v) => self.whole_float(f64::from(*v)),
            Primitive::Double(v) => self.whole_float(*v),
            Primitive::BigDecimal(v) if v.is_integer() => Ok(v.with_scale(0).as_bigint_and_exponent().0),
            Primitive::String(s) => BigInt::from_str(s.trim())
                .map_err(|_| self.cannot_convert("big-integer", "integer literal")),
            _ => Err(self.cannot_convert("big-integer", "whole number")),
        }
    }

    fn whole_float(&self, v: f64) -> Result<BigInt> {
        if v.is_finite() && v.fract() == 0.0 {
            BigInt::from_str(&format!("{:.0}", v))
                .map_err(|_| self.cannot_convert("big-integer", "whole number"))
        } else {
            Err(self.cannot_convert("big-integer", "whole number"))
        }
    }

    /// Narrows this primitive to a fixed-width integer, failing when it is out of range.
    pub fn to_integer<T>(&self) -> Result<T>
    where
        T: TryFrom<i64> + TryFrom<BigInt>,
    {
        let target = std::any::type_name::<T>();
        let narrowed = match self {
            Primitive::Byte(v) => <T as TryFrom<i64>>::try_from(i64::from(*v)).ok(),
            Primitive::Short(v) => <T as TryFrom<i64>>::try_from(i64::from(*v)).ok(),
            Primitive::Int(v) => <T as TryFrom<i64>>::try_from(i64::from(*v)).ok(),
            Primitive::Long(v) => <T as TryFrom<i64>>::try_from(*v).ok(),
            _ => <T as TryFrom<BigInt>>::try_from(self.to_big_integer()?).ok(),
        };
        narrowed.ok_or_else(|| self.cannot_convert(target, "integer in range"))
    }

    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Primitive::Byte(v) => Ok(f64::from(*v)),
            Primitive::Short(v) => Ok(f64::from(*v)),
            Primitive::Int(v) => Ok(f64::from(*v)),
            Primitive::Long(v) => Ok(*v as f64),
            Primitive::Float(v) => Ok(f64::from(*v)),
            Primitive::Double(v) => Ok(*v),
            Primitive::BigInteger(v) => v
                .to_string()
                .parse()
                .map_err(|_| self.cannot_convert("double", "number")),
            Primitive::BigDecimal(v) => v
                .to_string()
                .parse()
                .map_err(|_| self.cannot_convert("double", "number")),
            Primitive::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.cannot_convert("double", "numeric literal")),
            _ => Err(self.cannot_convert("double", "number")),
        }
    }

    pub fn to_f32(&self) -> Result<f32> {
        if let Primitive::Float(v) = self {
            return Ok(*v);
        }
        let wide = self.to_f64()?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(self.cannot_convert("float", "number in float range"));
        }
        Ok(wide as f32)
    }

    pub fn to_big_decimal(&self) -> Result<BigDecimal> {
        match self {
            Primitive::BigDecimal(v) => Ok(v.clone()),
            Primitive::Float(_) | Primitive::Double(_) => {
                let wide = self.to_f64()?;
                if !wide.is_finite() {
                    return Err(self.cannot_convert("big-decimal", "finite number"));
                }
                BigDecimal::from_str(&wide.to_string())
                    .map_err(|_| self.cannot_convert("big-decimal", "finite number"))
            }
            Primitive::String(s) => BigDecimal::from_str(s.trim())
                .map_err(|_| self.cannot_convert("big-decimal", "decimal literal")),
            _ => Ok(BigDecimal::new(self.to_big_integer()?, 0)),
        }
    }

    /// Reads booleans, `"true"`/`"false"` strings, and numbers (non-zero is `true`).
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Primitive::Boolean(b) => Ok(*b),
            Primitive::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Primitive::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            p if p.is_integral() => Ok(p.to_big_integer()? != BigInt::from(0)),
            p if p.is_numeric() => Ok(p.to_f64()? != 0.0),
            _ => Err(self.cannot_convert("boolean", "boolean")),
        }
    }

    pub fn to_char(&self) -> Result<char> {
        match self {
            Primitive::Char(c) => Ok(*c),
            Primitive::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(self.cannot_convert("char", "single character")),
                }
            }
            _ => Err(self.cannot_convert("char", "character")),
        }
    }

    /// Renders any primitive as text; null renders as `null`.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.to_string()
    }

    /// Converts this primitive to another kind, range-checking narrowing conversions.
    ///
    /// Null only converts to null.
    pub fn convert_to(&self, kind: PrimitiveKind) -> Result<Primitive> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        if self.is_null() || kind == PrimitiveKind::Null {
            return Err(self.cannot_convert(kind.as_str(), kind.as_str()));
        }
        Ok(match kind {
            PrimitiveKind::String => Primitive::String(self.to_string_lossy()),
            PrimitiveKind::Boolean => Primitive::Boolean(self.to_bool()?),
            PrimitiveKind::Char => Primitive::Char(self.to_char()?),
            PrimitiveKind::Byte => Primitive::Byte(self.to_integer()?),
            PrimitiveKind::Short => Primitive::Short(self.to_integer()?),
            PrimitiveKind::Int => Primitive::Int(self.to_integer()?),
            PrimitiveKind::Long => Primitive::Long(self.to_integer()?),
            PrimitiveKind::BigInteger => Primitive::BigInteger(self.to_big_integer()?),
            PrimitiveKind::Float => Primitive::Float(self.to_f32()?),
            PrimitiveKind::Double => Primitive::Double(self.to_f64()?),
            PrimitiveKind::BigDecimal => Primitive::BigDecimal(self.to_big_decimal()?),
            PrimitiveKind::Null => Primitive::Null,
        })
    }

    /// Orders two numeric primitives.
    ///
    /// `other` is first cast to this primitive's kind so the comparison
    /// happens at this value's width; when that cast is impossible both sides
    /// are compared exactly. Returns `None` for non-numeric operands and NaN.
    #[must_use]
    pub fn compare_numeric(&self, other: &Primitive) -> Option<Ordering> {
        if !self.is_numeric() || !other.is_numeric() {
            return None;
        }
        if let Ok(cast) = other.convert_to(self.kind()) {
            if let Some(ordering) = self.cmp_same_kind(&cast) {
                return Some(ordering);
            }
        }
        if self.is_integral() && other.is_integral() {
            return Some(self.to_big_integer().ok()?.cmp(&other.to_big_integer().ok()?));
        }
        let left = self.to_big_decimal().ok()?;
        let right = other.to_big_decimal().ok()?;
        left.partial_cmp(&right)
    }

    fn cmp_same_kind(&self, other: &Primitive) -> Option<Ordering> {
        match (self, other) {
            (Primitive::Byte(a), Primitive::Byte(b)) => a.partial_cmp(b),
            (Primitive::Short(a), Primitive::Short(b)) => a.partial_cmp(b),
            (Primitive::Int(a), Primitive::Int(b)) => a.partial_cmp(b),
            (Primitive::Long(a), Primitive::Long(b)) => a.partial_cmp(b),
            (Primitive::BigInteger(a), Primitive::BigInteger(b)) => a.partial_cmp(b),
            (Primitive::Float(a), Primitive::Float(b)) => a.partial_cmp(b),
            (Primitive::Double(a), Primitive::Double(b)) => a.partial_cmp(b),
            (Primitive::BigDecimal(a), Primitive::BigDecimal(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Equality across kinds: numbers compare by value, everything else by `==`.
    #[must_use]
    pub fn loosely_equals(&self, other: &Primitive) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return self.compare_numeric(other) == Some(Ordering::Equal);
        }
        match other.convert_to(self.kind()) {
            Ok(cast) => *self == cast,
            Err(_) => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::String(s) => f.write_str(s),
            Primitive::Boolean(b) => write!(f, "{}", b),
            Primitive::Null => f.write_str("null"),
            Primitive::Byte(v) => write!(f, "{}", v),
            Primitive::Char(v) => write!(f, "{}", v),
            Primitive::Short(v) => write!(f, "{}", v),
            Primitive::Int(v) => write!(f, "{}", v),
            Primitive::Long(v) => write!(f, "{}", v),
            Primitive::BigInteger(v) => write!(f, "{}", v),
            Primitive::Float(v) => write!(f, "{}", v),
            Primitive::Double(v) => write!(f, "{}", v),
            Primitive::BigDecimal(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Boolean(value)
    }
}

impl From<char> for Primitive {
    fn from(value: char) -> Self {
        Primitive::Char(value)
    }
}

impl From<i8> for Primitive {
    fn from(value: i8) -> Self {
        Primitive::Byte(value)
    }
}

impl From<i16> for Primitive {
    fn from(value: i16) -> Self {
        Primitive::Short(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Int(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Long(value)
    }
}

// Unsigned values take the next signed width up.
impl From<u8> for Primitive {
    fn from(value: u8) -> Self {
        Primitive::Short(i16::from(value))
    }
}

impl From<u16> for Primitive {
    fn from(value: u16) -> Self {
        Primitive::Int(i32::from(value))
    }
}

impl From<u32> for Primitive {
    fn from(value: u32) -> Self {
        Primitive::Long(i64::from(value))
    }
}

impl From<u64> for Primitive {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Primitive::Long(v),
            Err(_) => Primitive::BigInteger(BigInt::from(value)),
        }
    }
}

impl From<BigInt> for Primitive {
    fn from(value: BigInt) -> Self {
        Primitive::BigInteger(value)
    }
}

impl From<f32> for Primitive {
    fn from(value: f32) -> Self {
        Primitive::Float(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Double(value)
    }
}

impl From<BigDecimal> for Primitive {
    fn from(value: BigDecimal) -> Self {
        Primitive::BigDecimal(value)
    }
}

impl<T: Into<Primitive>> From<Option<T>> for Primitive {
    fn from(value: Option<T>) -> Self {
        value.map_or(Primitive::Null, Into::into)
    }
}
