//! Typed constants, defaults and arithmetic operands.
//!
//! Floats are compared and hashed by bit pattern so nodes stay `Eq + Hash`.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Ty, Value};

/// A literal after type checking, already converted to its target type.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Const {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// Enum variant name.
    Enum(String),
}

impl Const {
    pub fn to_value(&self) -> Value<'_> {
        match self {
            Const::Bool(v) => Value::Bool(*v),
            Const::Byte(v) => Value::Byte(*v),
            Const::Short(v) => Value::Short(*v),
            Const::Int(v) => Value::Int(*v),
            Const::Long(v) => Value::Long(*v),
            Const::Float(v) => Value::Float(*v),
            Const::Double(v) => Value::Double(*v),
            Const::Str(s) => Value::Str(Cow::Borrowed(s)),
            Const::Enum(s) => Value::Enum(Cow::Borrowed(s)),
        }
    }

    pub fn ty(&self) -> Ty {
        match self {
            Const::Bool(_) => Ty::Bool,
            Const::Byte(_) => Ty::Byte,
            Const::Short(_) => Ty::Short,
            Const::Int(_) => Ty::Int,
            Const::Long(_) => Ty::Long,
            Const::Float(_) => Ty::Float,
            Const::Double(_) => Ty::Double,
            Const::Str(_) => Ty::Str,
            Const::Enum(name) => Ty::Enum(name.clone()),
        }
    }
}

impl PartialEq for Const {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Const::Bool(a), Const::Bool(b)) => a == b,
            (Const::Byte(a), Const::Byte(b)) => a == b,
            (Const::Short(a), Const::Short(b)) => a == b,
            (Const::Int(a), Const::Int(b)) => a == b,
            (Const::Long(a), Const::Long(b)) => a == b,
            (Const::Float(a), Const::Float(b)) => a.to_bits() == b.to_bits(),
            (Const::Double(a), Const::Double(b)) => a.to_bits() == b.to_bits(),
            (Const::Str(a), Const::Str(b)) | (Const::Enum(a), Const::Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Const {}

impl Hash for Const {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Const::Bool(v) => v.hash(state),
            Const::Byte(v) => v.hash(state),
            Const::Short(v) => v.hash(state),
            Const::Int(v) => v.hash(state),
            Const::Long(v) => v.hash(state),
            Const::Float(v) => v.to_bits().hash(state),
            Const::Double(v) => v.to_bits().hash(state),
            Const::Str(s) | Const::Enum(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Bool(v) => write!(f, "{v}"),
            Const::Byte(v) => write!(f, "{v}_i8"),
            Const::Short(v) => write!(f, "{v}_i16"),
            Const::Int(v) => write!(f, "{v}_i32"),
            Const::Long(v) => write!(f, "{v}_i64"),
            Const::Float(v) => write!(f, "{v:?}_f32"),
            Const::Double(v) => write!(f, "{v:?}_f64"),
            Const::Str(s) => write!(f, "{s:?}"),
            Const::Enum(s) => write!(f, "enum {s:?}"),
        }
    }
}

/// What a guard or print falls back to when its value is absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum DefaultValue {
    Const(Const),
    /// `$name`: looked up in the render's parameter table.
    Param(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Const(c) => write!(f, "{c}"),
            DefaultValue::Param(name) => write!(f, "params[{name:?}]"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl MathOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Sub => "-",
            MathOp::Mul => "*",
            MathOp::Div => "/",
            MathOp::Rem => "%",
        }
    }

    pub const fn from_symbol(c: char) -> Option<MathOp> {
        Some(match c {
            '+' => MathOp::Add,
            '-' => MathOp::Sub,
            '*' => MathOp::Mul,
            '/' => MathOp::Div,
            '%' => MathOp::Rem,
            _ => return None,
        })
    }
}

/// Arithmetic operand as written in the template.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Number::Int(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            Number::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v:?}"),
        }
    }
}
