//! Runtime values.
//!
//! A [`Value`] borrows from the input object graph for the duration of one
//! render. Records and maps are only ever borrowed, so navigation never
//! clones the input.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

/// A value produced while walking an input.
#[derive(Clone)]
pub enum Value<'a> {
    /// Absent: `None`, a missing map key, or a null member.
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    /// Variant name of an enum-like value.
    Enum(Cow<'a, str>),
    List(Vec<Value<'a>>),
    Map(&'a dyn MapAccess),
    /// A registered record, navigated through its schema accessors.
    Object(&'a dyn Any),
}

/// Read access to a string-keyed map.
pub trait MapAccess {
    /// Value under `key`, [`Value::Null`] when missing.
    fn get(&self, key: &str) -> Value<'_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> Value<'a> {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Lowercase kind name for diagnostics and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Integral payload widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(i64::from(v)),
            Value::Short(v) => Some(i64::from(v)),
            Value::Int(v) => Some(i64::from(v)),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Any numeric payload as `f64`.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Detach from the input. `None` for records and maps, which can only
    /// be borrowed.
    pub fn into_owned(self) -> Option<Value<'static>> {
        Some(match self {
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(v),
            Value::Byte(v) => Value::Byte(v),
            Value::Short(v) => Value::Short(v),
            Value::Int(v) => Value::Int(v),
            Value::Long(v) => Value::Long(v),
            Value::Float(v) => Value::Float(v),
            Value::Double(v) => Value::Double(v),
            Value::Str(s) => Value::Str(Cow::Owned(s.into_owned())),
            Value::Bytes(b) => Value::Bytes(Cow::Owned(b.into_owned())),
            Value::DateTime(v) => Value::DateTime(v),
            Value::Date(v) => Value::Date(v),
            Value::Enum(s) => Value::Enum(Cow::Owned(s.into_owned())),
            Value::List(items) => {
                let mut owned = Vec::with_capacity(items.len());
                for item in items {
                    owned.push(item.into_owned()?);
                }
                Value::List(owned)
            }
            Value::Map(_) | Value::Object(_) => return None,
        })
    }

    /// Plain text form used by functions and string casts.
    ///
    /// `None` for null, records and maps. Lists join their elements with
    /// commas; datetimes use RFC 3339 with millisecond precision.
    pub fn to_text(&self) -> Option<Cow<'a, str>> {
        Some(match self {
            Value::Null | Value::Map(_) | Value::Object(_) => return None,
            Value::Str(s) | Value::Enum(s) => s.clone(),
            Value::Bool(v) => Cow::Owned(v.to_string()),
            Value::Byte(v) => Cow::Owned(v.to_string()),
            Value::Short(v) => Cow::Owned(v.to_string()),
            Value::Int(v) => Cow::Owned(v.to_string()),
            Value::Long(v) => Cow::Owned(v.to_string()),
            Value::Float(v) => Cow::Owned(v.to_string()),
            Value::Double(v) => Cow::Owned(v.to_string()),
            Value::Bytes(b) => Cow::Owned(hex(b)),
            Value::DateTime(v) => {
                Cow::Owned(v.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            }
            Value::Date(v) => Cow::Owned(v.format("%Y-%m-%d").to_string()),
            Value::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| v.to_text().map(Cow::into_owned).unwrap_or_default())
                    .collect();
                Cow::Owned(parts.join(","))
            }
        })
    }
}

/// Lowercase hex.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Byte(v) => write!(f, "Byte({v})"),
            Value::Short(v) => write!(f, "Short({v})"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Long(v) => write!(f, "Long({v})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Double(v) => write!(f, "Double({v})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({})", hex(b)),
            Value::DateTime(v) => write!(f, "DateTime({v})"),
            Value::Date(v) => write!(f, "Date({v})"),
            Value::Enum(s) => write!(f, "Enum({s})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(m) => write!(f, "Map({} entries)", m.len()),
            Value::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Structural equality; records and maps compare by address.
impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) | (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => std::ptr::addr_eq(*a, *b),
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(*a, *b),
            _ => false,
        }
    }
}
