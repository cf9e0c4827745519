//! Dynamic SQL value used for bind parameters and row cells.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use compact_str::CompactString;

use crate::error::{Result, RowkitError};

/// Format used for `DATETIME` columns written by this crate.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for `DATE` columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents a MySQL value (owned version)
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Signed integer value
    Int(i64),
    /// Unsigned integer value (`BIGINT UNSIGNED`, insert ids)
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// Text value, also used for temporal and decimal columns
    Text(String),
    /// Binary value
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values that cannot identify a row: NULL, zero and empty text.
    pub fn is_zero_key(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Int(i) => *i == 0,
            Value::UInt(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty() || s == "0",
            Value::Bytes(b) => b.is_empty(),
        }
    }

    /// Converts into `T`, see [`FromValue`].
    pub fn get<T: FromValue>(self) -> Result<T> {
        T::from_value(self)
    }

    /// Current local time formatted with [`TIME_FORMAT`].
    pub fn now() -> Self {
        Value::Text(chrono::Local::now().format(TIME_FORMAT).to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

/// Substitutes each `?` in `sql` with the matching quoted argument, so a logged
/// statement can be pasted into a client as is. Unmatched placeholders stay.
pub fn full_sql(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut params = params.iter();
    for c in sql.chars() {
        if c != '?' {
            out.push(c);
            continue;
        }
        match params.next() {
            Some(Value::Null) => out.push_str("NULL"),
            Some(value) => {
                out.push('\'');
                out.push_str(&value.to_string());
                out.push('\'');
            }
            None => out.push('?'),
        }
    }
    out
}

//------------------------------------------------------------------------------
// Into Value
//------------------------------------------------------------------------------

macro_rules! impl_from_signed {
    ($($ty:ty),*) => { $(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Int(value as i64)
            }
        }
    )* }
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => { $(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::UInt(value as u64)
            }
        }
    )* }
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Value::Text(value.into_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Text(value.format(TIME_FORMAT).to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Text(value.format(DATE_FORMAT).to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

//------------------------------------------------------------------------------
// FromValue
//------------------------------------------------------------------------------

/// Conversion out of a [`Value`] read from a row.
///
/// Text values are parsed for numeric targets since the MySQL text protocol
/// delivers every cell as bytes.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &str, value: &Value) -> RowkitError {
    RowkitError::Conversion(format!("expected {expected}, found {value:?}"))
}

fn text_of(value: Value) -> std::result::Result<String, Value> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Bytes(b) => String::from_utf8(b).map_err(|e| Value::Bytes(e.into_bytes())),
        other => Err(other),
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => { $(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                let expected = stringify!($ty);
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|e| RowkitError::Conversion(e.to_string())),
                    Value::UInt(u) => <$ty>::try_from(u).map_err(|e| RowkitError::Conversion(e.to_string())),
                    // Through i128 so out-of-range floats fail instead of saturating.
                    Value::Float(f) if f.fract() == 0.0 => <$ty>::try_from(f as i128)
                        .map_err(|_| RowkitError::Conversion(format!("{f} out of range for {expected}"))),
                    other => match text_of(other) {
                        Ok(s) => s.trim().parse::<$ty>().map_err(|e| RowkitError::Conversion(format!("{e}: {s:?}"))),
                        Err(other) => Err(mismatch(expected, &other)),
                    },
                }
            }
        }
    )* }
}

impl_from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::UInt(u) => Ok(u as f64),
            other => match text_of(other) {
                Ok(s) => s
                    .trim()
                    .parse()
                    .map_err(|e| RowkitError::Conversion(format!("{e}: {s:?}"))),
                Err(other) => Err(mismatch("f64", &other)),
            },
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(i != 0),
            Value::UInt(u) => Ok(u != 0),
            other => match text_of(other) {
                Ok(s) => match s.trim() {
                    "1" | "true" | "TRUE" => Ok(true),
                    "0" | "false" | "FALSE" | "" => Ok(false),
                    _ => Err(RowkitError::Conversion(format!("expected bool, found {s:?}"))),
                },
                Err(other) => Err(mismatch("bool", &other)),
            },
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Err(mismatch("String", &Value::Null)),
            Value::Bytes(b) => {
                String::from_utf8(b).map_err(|e| RowkitError::Conversion(e.to_string()))
            }
            Value::Text(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for CompactString {
    fn from_value(value: Value) -> Result<Self> {
        String::from_value(value).map(CompactString::from)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        let s = text_of(value).map_err(|other| mismatch("datetime", &other))?;
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, TIME_FORMAT)
            .or_else(|_| s.parse::<NaiveDateTime>())
            // A bare date reads as midnight.
            .or_else(|e| {
                NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .map(|date| date.and_time(NaiveTime::MIN))
                    .map_err(|_| e)
            })
            .map_err(|e| RowkitError::Conversion(format!("{e}: {s:?}")))
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        let s = text_of(value).map_err(|other| mismatch("date", &other))?;
        let date = s.trim().get(..10).unwrap_or(s.trim());
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| RowkitError::Conversion(format!("{e}: {s:?}")))
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}
