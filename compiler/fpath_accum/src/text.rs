//! Text output.

use std::fmt::Write;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, Utc};
use fpath_ir::{hex, Value};

use crate::{AccumError, Accumulator};

/// RFC 3339 with millisecond precision.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
struct TextFormat {
    datetime: String,
    date: String,
    eol: String,
}

/// Renders values as text.
///
/// Numbers use their shortest round-trip form, booleans `true`/`false`,
/// byte payloads lowercase hex. Lists render as `[a,b]` with string-like
/// elements quoted:
///
/// ```text
/// ["red","green"]   [1,2,3]   ["2024-01-31",null]
/// ```
#[derive(Clone, Debug)]
pub struct TextAccumulator {
    buf: String,
    /// Length of `buf` after the last line terminator.
    line_start: usize,
    format: Arc<TextFormat>,
}

impl Default for TextAccumulator {
    fn default() -> Self {
        TextAccumulator::new()
    }
}

impl TextAccumulator {
    pub fn new() -> Self {
        TextAccumulator {
            buf: String::new(),
            line_start: 0,
            format: Arc::new(TextFormat {
                datetime: DEFAULT_DATETIME_FORMAT.to_owned(),
                date: DEFAULT_DATE_FORMAT.to_owned(),
                eol: "\n".to_owned(),
            }),
        }
    }

    /// Use a chrono `strftime` pattern for datetimes.
    pub fn with_datetime_format(self, pattern: &str) -> Result<Self, AccumError> {
        validate("datetime", pattern)?;
        Ok(self.reformat(|f| f.datetime = pattern.to_owned()))
    }

    /// Use a chrono `strftime` pattern for dates.
    pub fn with_date_format(self, pattern: &str) -> Result<Self, AccumError> {
        validate("date", pattern)?;
        Ok(self.reformat(|f| f.date = pattern.to_owned()))
    }

    /// Record terminator written by [`Accumulator::add_eol`].
    #[must_use]
    pub fn with_eol(self, eol: &str) -> Self {
        self.reformat(|f| f.eol = eol.to_owned())
    }

    fn reformat(mut self, f: impl FnOnce(&mut TextFormat)) -> Self {
        let mut format = TextFormat {
            datetime: self.format.datetime.clone(),
            date: self.format.date.clone(),
            eol: self.format.eol.clone(),
        };
        f(&mut format);
        self.format = Arc::new(format);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    fn list_element(&mut self, value: &Value<'_>) {
        match value {
            Value::Null => self.buf.push_str("null"),
            Value::Str(s) | Value::Enum(s) => self.quoted(s),
            Value::DateTime(v) => {
                self.buf.push('"');
                self.accept_datetime(v);
                self.buf.push('"');
            }
            Value::Date(v) => {
                self.buf.push('"');
                self.accept_date(*v);
                self.buf.push('"');
            }
            other => self.accept(other),
        }
    }

    fn quoted(&mut self, s: &str) {
        self.buf.push('"');
        for c in s.chars() {
            match c {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }
}

fn validate(what: &'static str, pattern: &str) -> Result<(), AccumError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(AccumError::InvalidPattern { what, pattern: pattern.to_owned() });
    }
    Ok(())
}

impl Accumulator for TextAccumulator {
    const KIND: &'static str = "text";

    type Output = String;
    type Buffer = String;

    fn new_instance(&self) -> Self {
        TextAccumulator { buf: String::new(), line_start: 0, format: Arc::clone(&self.format) }
    }

    fn with_buffer(&self, mut buffer: String) -> Self {
        buffer.clear();
        TextAccumulator { buf: buffer, line_start: 0, format: Arc::clone(&self.format) }
    }

    fn into_buffer(self) -> String {
        self.buf
    }

    fn accept_bool(&mut self, v: bool) {
        self.buf.push_str(if v { "true" } else { "false" });
    }

    fn accept_byte(&mut self, v: i8) {
        let _ = write!(self.buf, "{v}");
    }

    fn accept_short(&mut self, v: i16) {
        let _ = write!(self.buf, "{v}");
    }

    fn accept_int(&mut self, v: i32) {
        let _ = write!(self.buf, "{v}");
    }

    fn accept_long(&mut self, v: i64) {
        let _ = write!(self.buf, "{v}");
    }

    fn accept_float(&mut self, v: f32) {
        let _ = write!(self.buf, "{v}");
    }

    fn accept_double(&mut self, v: f64) {
        let _ = write!(self.buf, "{v}");
    }

    fn accept_str(&mut self, v: &str) {
        self.buf.push_str(v);
    }

    fn accept_bytes(&mut self, v: &[u8]) {
        self.buf.push_str(&hex(v));
    }

    fn accept_datetime(&mut self, v: &DateTime<Utc>) {
        let _ = write!(self.buf, "{}", v.format(&self.format.datetime));
    }

    fn accept_date(&mut self, v: NaiveDate) {
        let _ = write!(self.buf, "{}", v.format(&self.format.date));
    }

    fn accept_enum(&mut self, v: &str) {
        self.buf.push_str(v);
    }

    fn accept_list(&mut self, items: &[Value<'_>]) {
        self.buf.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.list_element(item);
        }
        self.buf.push(']');
    }

    fn accept_acc(&mut self, other: &Self) {
        self.buf.push_str(&other.buf);
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn build(&self) -> String {
        self.buf.clone()
    }

    fn bytes(&self) -> Vec<u8> {
        self.buf.as_bytes().to_vec()
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.line_start = 0;
    }

    fn add_eol(&mut self, force: bool) {
        if force || self.buf.len() > self.line_start {
            self.buf.push_str(&self.format.eol);
            self.line_start = self.buf.len();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::borrow::Cow;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_scalars() {
        let mut acc = TextAccumulator::new();
        acc.accept_bool(true);
        acc.accept_str(" ");
        acc.accept_short(-3);
        acc.accept_str(" ");
        acc.accept_double(2.5);
        acc.accept_str(" ");
        acc.accept_bytes(&[0xde, 0xad]);
        assert_eq!(acc.build(), "true -3 2.5 dead");
    }

    #[test]
    fn test_datetime_patterns() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let mut acc = TextAccumulator::new();
        acc.accept_datetime(&dt);
        acc.accept_str(" ");
        acc.accept_date(date);
        assert_eq!(acc.build(), "2024-03-09T14:05:00.000Z 2024-03-09");

        let mut acc = TextAccumulator::new()
            .with_datetime_format("%H:%M")
            .unwrap()
            .with_date_format("%d/%m/%Y")
            .unwrap();
        acc.accept_datetime(&dt);
        acc.accept_str(" ");
        acc.accept_date(date);
        assert_eq!(acc.build(), "14:05 09/03/2024");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = TextAccumulator::new().with_date_format("%Q").unwrap_err();
        assert_eq!(err, AccumError::InvalidPattern { what: "date", pattern: "%Q".into() });
    }

    #[test]
    fn test_list_quoting() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let mut acc = TextAccumulator::new();
        acc.accept_list(&[
            Value::Str(Cow::Borrowed("a\"b")),
            Value::Enum(Cow::Borrowed("Gold")),
            Value::Date(date),
            Value::Null,
        ]);
        acc.accept_list(&[Value::Int(1), Value::List(vec![Value::Bool(false)])]);
        assert_eq!(acc.build(), r#"["a\"b","Gold","2024-01-31",null][1,[false]]"#);
    }

    #[test]
    fn test_add_eol() {
        let mut acc = TextAccumulator::new().with_eol("\r\n");
        acc.add_eol(false);
        assert!(acc.is_empty());
        acc.accept_str("a");
        acc.add_eol(false);
        acc.add_eol(false);
        acc.add_eol(true);
        assert_eq!(acc.build(), "a\r\n\r\n");
    }

    #[test]
    fn test_instances_share_configuration() {
        let proto = TextAccumulator::new().with_eol(";");
        let mut scratch = proto.new_instance();
        scratch.accept_str("x");
        scratch.add_eol(false);

        let mut acc = proto.with_buffer(String::from("stale"));
        assert!(acc.is_empty());
        acc.accept_acc(&scratch);
        assert_eq!(acc.bytes(), b"x;".to_vec());
        acc.reset();
        assert!(acc.is_empty());
        assert!(acc.into_buffer().capacity() > 0);
    }
}
