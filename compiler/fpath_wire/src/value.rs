//! Decoded values.

use chrono::{DateTime, NaiveDate, Utc};

use crate::Tag;

/// One decoded value, owning its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    Raw(Vec<u8>),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    List(Vec<WireValue>),
}

impl WireValue {
    /// The tag this value is written with.
    pub const fn tag(&self) -> Tag {
        match self {
            WireValue::Raw(_) => Tag::Raw,
            WireValue::DateTime(_) => Tag::DateTime,
            WireValue::Date(_) => Tag::Date,
            WireValue::Bool(_) => Tag::Boolean,
            WireValue::Byte(_) => Tag::Byte,
            WireValue::Short(_) => Tag::Short,
            WireValue::Int(_) => Tag::Integer,
            WireValue::Long(_) => Tag::Long,
            WireValue::Float(_) => Tag::Float,
            WireValue::Double(_) => Tag::Double,
            WireValue::Str(_) => Tag::String,
            WireValue::List(_) => Tag::List,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for WireValue {
    fn from(v: bool) -> Self {
        WireValue::Bool(v)
    }
}

impl From<i8> for WireValue {
    fn from(v: i8) -> Self {
        WireValue::Byte(v)
    }
}

impl From<i16> for WireValue {
    fn from(v: i16) -> Self {
        WireValue::Short(v)
    }
}

impl From<i32> for WireValue {
    fn from(v: i32) -> Self {
        WireValue::Int(v)
    }
}

impl From<i64> for WireValue {
    fn from(v: i64) -> Self {
        WireValue::Long(v)
    }
}

impl From<f64> for WireValue {
    fn from(v: f64) -> Self {
        WireValue::Double(v)
    }
}

impl From<&str> for WireValue {
    fn from(v: &str) -> Self {
        WireValue::Str(v.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(v: String) -> Self {
        WireValue::Str(v)
    }
}
