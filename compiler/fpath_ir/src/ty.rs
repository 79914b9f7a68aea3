//! Resolved type descriptors.

use std::fmt;

use bitflags::bitflags;

/// Declared shape of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Ty {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Str,
    Bytes,
    DateTime,
    Date,
    /// Enum-like value rendered by variant name.
    Enum(String),
    List(Box<Ty>),
    /// String-keyed map; the payload is the value type.
    Map(Box<Ty>),
    /// Registered record, by name.
    Object(String),
    /// Type of a lenient not-found marker. Accepts any default.
    Unknown,
}

impl Ty {
    /// Fixed-width scalars. A primitive value is never absent.
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Ty::Bool | Ty::Byte | Ty::Short | Ty::Int | Ty::Long | Ty::Float | Ty::Double
        )
    }

    pub const fn is_integral(&self) -> bool {
        matches!(self, Ty::Byte | Ty::Short | Ty::Int | Ty::Long)
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Ty::Byte | Ty::Short | Ty::Int | Ty::Long | Ty::Float | Ty::Double)
    }

    /// Whether an accumulator can write a value of this type.
    pub fn is_printable(&self) -> bool {
        match self {
            Ty::Object(_) | Ty::Map(_) => false,
            Ty::List(elem) => elem.is_printable(),
            _ => true,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("bool"),
            Ty::Byte => f.write_str("byte"),
            Ty::Short => f.write_str("short"),
            Ty::Int => f.write_str("int"),
            Ty::Long => f.write_str("long"),
            Ty::Float => f.write_str("float"),
            Ty::Double => f.write_str("double"),
            Ty::Str => f.write_str("string"),
            Ty::Bytes => f.write_str("bytes"),
            Ty::DateTime => f.write_str("datetime"),
            Ty::Date => f.write_str("date"),
            Ty::Enum(name) => write!(f, "enum {name}"),
            Ty::List(elem) => write!(f, "list<{elem}>"),
            Ty::Map(value) => write!(f, "map<string, {value}>"),
            Ty::Object(name) => f.write_str(name),
            Ty::Unknown => f.write_str("unknown"),
        }
    }
}

bitflags! {
    /// How a value may be absent.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Presence: u8 {
        /// Wrapped in `Option`.
        const OPTIONAL = 1 << 0;
        /// May yield null: map lookups, members marked nullable,
        /// functions declared nullable.
        const NULLABLE = 1 << 1;
    }
}

/// A [`Ty`] plus its presence flags.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resolved {
    pub ty: Ty,
    pub flags: Presence,
}

impl Resolved {
    pub const fn new(ty: Ty) -> Self {
        Resolved { ty, flags: Presence::empty() }
    }

    pub const fn unknown() -> Self {
        Resolved { ty: Ty::Unknown, flags: Presence::NULLABLE }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.flags |= Presence::OPTIONAL;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.flags |= Presence::NULLABLE;
        self
    }

    /// Same shape with no presence flags, as seen behind a guard.
    #[must_use]
    pub fn present(&self) -> Self {
        Resolved::new(self.ty.clone())
    }

    pub fn is_optional(&self) -> bool {
        self.flags.contains(Presence::OPTIONAL)
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.contains(Presence::NULLABLE)
    }

    /// Whether a presence check is needed before using the value.
    pub fn may_be_absent(&self) -> bool {
        !self.flags.is_empty() || matches!(self.ty, Ty::Unknown)
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;
        if self.is_optional() {
            f.write_str("?")?;
        }
        if self.is_nullable() {
            f.write_str(" (nullable)")?;
        }
        Ok(())
    }
}
