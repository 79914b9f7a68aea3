//! Single-value output.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use fpath_ir::{hex, Value};

use crate::Accumulator;

/// Keeps the last value accepted, detached from the input.
///
/// Useful for templates that are a single expression: `${address.city}`
/// renders to the city value itself rather than its text.
#[derive(Clone, Debug, Default)]
pub struct ObjectAccumulator {
    value: Option<Value<'static>>,
}

impl ObjectAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<&Value<'static>> {
        self.value.as_ref()
    }

    fn set(&mut self, value: Value<'static>) {
        self.value = Some(value);
    }
}

impl Accumulator for ObjectAccumulator {
    const KIND: &'static str = "object";

    /// [`Value::Null`] when nothing was accepted.
    type Output = Value<'static>;
    type Buffer = Option<Value<'static>>;

    fn new_instance(&self) -> Self {
        Self::default()
    }

    fn with_buffer(&self, _buffer: Option<Value<'static>>) -> Self {
        Self::default()
    }

    fn into_buffer(self) -> Option<Value<'static>> {
        self.value
    }

    fn accept_bool(&mut self, v: bool) {
        self.set(Value::Bool(v));
    }

    fn accept_byte(&mut self, v: i8) {
        self.set(Value::Byte(v));
    }

    fn accept_short(&mut self, v: i16) {
        self.set(Value::Short(v));
    }

    fn accept_int(&mut self, v: i32) {
        self.set(Value::Int(v));
    }

    fn accept_long(&mut self, v: i64) {
        self.set(Value::Long(v));
    }

    fn accept_float(&mut self, v: f32) {
        self.set(Value::Float(v));
    }

    fn accept_double(&mut self, v: f64) {
        self.set(Value::Double(v));
    }

    fn accept_str(&mut self, v: &str) {
        self.set(Value::Str(Cow::Owned(v.to_owned())));
    }

    fn accept_bytes(&mut self, v: &[u8]) {
        self.set(Value::Bytes(Cow::Owned(v.to_vec())));
    }

    fn accept_datetime(&mut self, v: &DateTime<Utc>) {
        self.set(Value::DateTime(*v));
    }

    fn accept_date(&mut self, v: NaiveDate) {
        self.set(Value::Date(v));
    }

    fn accept_enum(&mut self, v: &str) {
        self.set(Value::Enum(Cow::Owned(v.to_owned())));
    }

    fn accept_list(&mut self, items: &[Value<'_>]) {
        let owned = items.iter().filter(|v| !v.is_null()).filter_map(|v| v.clone().into_owned());
        self.set(Value::List(owned.collect()));
    }

    fn accept_acc(&mut self, other: &Self) {
        if let Some(value) = &other.value {
            self.value = Some(value.clone());
        }
    }

    fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    fn build(&self) -> Value<'static> {
        self.value.clone().unwrap_or(Value::Null)
    }

    /// Text form of the value as UTF-8; raw payloads as hex.
    fn bytes(&self) -> Vec<u8> {
        match &self.value {
            Some(Value::Bytes(b)) => hex(b).into_bytes(),
            Some(value) => value.to_text().map(|t| t.into_owned().into_bytes()).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.value = None;
    }

    fn add_eol(&mut self, _force: bool) {}
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_keeps_last_value() {
        let mut acc = ObjectAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.build(), Value::Null);
        acc.accept_str("first");
        acc.accept_int(5);
        assert_eq!(acc.build(), Value::Int(5));
        assert_eq!(acc.bytes(), b"5".to_vec());
    }

    #[test]
    fn test_value_outlives_input() {
        let mut acc = ObjectAccumulator::new();
        {
            let text = String::from("scoped");
            acc.accept(&Value::Str(Cow::Borrowed(&text)));
        }
        assert_eq!(acc.build().as_str(), Some("scoped"));
    }

    #[test]
    fn test_splice_keeps_previous_when_other_is_empty() {
        let mut acc = ObjectAccumulator::new();
        acc.accept_bool(true);
        acc.accept_acc(&acc.new_instance());
        assert_eq!(acc.build(), Value::Bool(true));
        acc.add_eol(true);
        acc.reset();
        assert!(acc.is_empty());
    }
}
