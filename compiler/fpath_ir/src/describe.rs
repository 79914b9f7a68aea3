//! Static type descriptions for schema members.
//!
//! [`Describe`] answers two questions about a Rust type: which [`Resolved`]
//! descriptor the resolver sees, and how a borrowed instance becomes a
//! [`Value`]. [`IntoValue`] covers owned results of computed members.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{MapAccess, Resolved, Ty, Value};

/// A type that can appear as a field or method result.
pub trait Describe {
    fn resolved() -> Resolved;

    fn to_value(&self) -> Value<'_>;
}

/// Owned conversion for members computed on the fly.
pub trait IntoValue {
    fn into_value(self) -> Value<'static>;
}

/// Opaque byte payload, rendered as hex text or a raw wire value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

macro_rules! scalar {
    ($($rust:ty => $ty:ident / $variant:ident),* $(,)?) => {$(
        impl Describe for $rust {
            fn resolved() -> Resolved {
                Resolved::new(Ty::$ty)
            }

            fn to_value(&self) -> Value<'_> {
                Value::$variant(*self)
            }
        }

        impl IntoValue for $rust {
            fn into_value(self) -> Value<'static> {
                Value::$variant(self)
            }
        }
    )*};
}

scalar! {
    bool => Bool / Bool,
    i8 => Byte / Byte,
    i16 => Short / Short,
    i32 => Int / Int,
    i64 => Long / Long,
    f32 => Float / Float,
    f64 => Double / Double,
    DateTime<Utc> => DateTime / DateTime,
    NaiveDate => Date / Date,
}

impl Describe for String {
    fn resolved() -> Resolved {
        Resolved::new(Ty::Str)
    }

    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value<'static> {
        Value::Str(Cow::Owned(self))
    }
}

impl IntoValue for &'static str {
    fn into_value(self) -> Value<'static> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl Describe for Bytes {
    fn resolved() -> Resolved {
        Resolved::new(Ty::Bytes)
    }

    fn to_value(&self) -> Value<'_> {
        Value::Bytes(Cow::Borrowed(&self.0))
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> Value<'static> {
        Value::Bytes(Cow::Owned(self.0))
    }
}

impl<T: Describe> Describe for Option<T> {
    fn resolved() -> Resolved {
        T::resolved().optional()
    }

    fn to_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value<'static> {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn resolved() -> Resolved {
        Resolved::new(Ty::List(Box::new(T::resolved().ty)))
    }

    fn to_value(&self) -> Value<'_> {
        Value::List(self.iter().map(Describe::to_value).collect())
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value<'static> {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<V: Describe> MapAccess for BTreeMap<String, V> {
    fn get(&self, key: &str) -> Value<'_> {
        BTreeMap::get(self, key).map_or(Value::Null, Describe::to_value)
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn resolved() -> Resolved {
        Resolved::new(Ty::Map(Box::new(V::resolved().ty)))
    }

    fn to_value(&self) -> Value<'_> {
        Value::Map(self)
    }
}

impl<V: Describe, S: BuildHasher> MapAccess for HashMap<String, V, S> {
    fn get(&self, key: &str) -> Value<'_> {
        HashMap::get(self, key).map_or(Value::Null, Describe::to_value)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

impl<V: Describe, S: BuildHasher> Describe for HashMap<String, V, S> {
    fn resolved() -> Resolved {
        Resolved::new(Ty::Map(Box::new(V::resolved().ty)))
    }

    fn to_value(&self) -> Value<'_> {
        Value::Map(self)
    }
}

/// Implement [`Describe`] for registered records.
///
/// ```text
/// impl Record for User { const NAME: &'static str = "User"; ... }
/// describe_record!(User, Address);
/// ```
#[macro_export]
macro_rules! describe_record {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Describe for $ty {
            fn resolved() -> $crate::Resolved {
                $crate::Resolved::new($crate::Ty::Object(
                    <$ty as $crate::Record>::NAME.to_owned(),
                ))
            }

            fn to_value(&self) -> $crate::Value<'_> {
                $crate::Value::Object(self)
            }
        }
    )+};
}

/// Implement [`Describe`] and [`IntoValue`] for enum-like types that
/// implement `AsRef<str>` (the variant name).
#[macro_export]
macro_rules! describe_enum {
    ($($ty:ident),+ $(,)?) => {$(
        impl $crate::Describe for $ty {
            fn resolved() -> $crate::Resolved {
                $crate::Resolved::new($crate::Ty::Enum(stringify!($ty).to_owned()))
            }

            fn to_value(&self) -> $crate::Value<'_> {
                $crate::Value::Enum(::std::borrow::Cow::Borrowed(
                    <Self as ::std::convert::AsRef<str>>::as_ref(self),
                ))
            }
        }

        impl $crate::IntoValue for $ty {
            fn into_value(self) -> $crate::Value<'static> {
                $crate::Value::Enum(::std::borrow::Cow::Owned(
                    <Self as ::std::convert::AsRef<str>>::as_ref(&self).to_owned(),
                ))
            }
        }
    )+};
}
