//! Encoder.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    mutf8, EncodeError, Tag, WireValue, MAX_STRING_LEN, MILLIS_PER_DAY, UNIX_EPOCH_DAYS_FROM_CE,
};

/// Appends tagged values to a growable byte buffer.
///
/// Fixed-width writes cannot fail. Length-prefixed writes return
/// [`EncodeError`] when the payload does not fit its prefix, and leave the
/// buffer unchanged in that case.
#[derive(Clone, Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        WireWriter { buf: Vec::new() }
    }

    /// Write into an existing buffer, appending after its current content.
    pub fn with_buffer(buf: Vec<u8>) -> Self {
        WireWriter { buf }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop all content, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Splice already-encoded bytes.
    pub fn append(&mut self, encoded: &[u8]) {
        self.buf.extend_from_slice(encoded);
    }

    #[inline]
    fn tag(&mut self, tag: Tag) {
        self.buf.push(tag.byte());
    }

    pub fn end_record(&mut self) {
        self.tag(Tag::EndOfRecord);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.tag(Tag::Boolean);
        self.buf.push(u8::from(v));
    }

    pub fn write_byte(&mut self, v: i8) {
        self.tag(Tag::Byte);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_short(&mut self, v: i16) {
        self.tag(Tag::Short);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_int(&mut self, v: i32) {
        self.tag(Tag::Integer);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_long(&mut self, v: i64) {
        self.tag(Tag::Long);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_float(&mut self, v: f32) {
        self.tag(Tag::Float);
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    pub fn write_double(&mut self, v: f64) {
        self.tag(Tag::Double);
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    pub fn write_datetime(&mut self, v: &DateTime<Utc>) {
        self.tag(Tag::DateTime);
        self.buf.extend_from_slice(&v.timestamp_millis().to_be_bytes());
    }

    /// Written as the epoch milliseconds of the date's midnight, UTC.
    pub fn write_date(&mut self, v: NaiveDate) {
        let days = i64::from(v.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE;
        self.tag(Tag::Date);
        self.buf.extend_from_slice(&(days * MILLIS_PER_DAY).to_be_bytes());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let len = i32::try_from(bytes.len())
            .map_err(|_| EncodeError::RawTooLong { len: bytes.len() })?;
        self.tag(Tag::Raw);
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), EncodeError> {
        let len = mutf8::encoded_len(s);
        if len > MAX_STRING_LEN {
            return Err(EncodeError::StringTooLong { len, max: MAX_STRING_LEN });
        }
        self.str_payload(s, len);
        Ok(())
    }

    /// Write `s`, cutting it at the last character boundary that fits the
    /// length prefix. Returns `true` when something was cut.
    pub fn write_str_truncated(&mut self, s: &str) -> bool {
        let full = mutf8::encoded_len(s);
        if full <= MAX_STRING_LEN {
            self.str_payload(s, full);
            return false;
        }

        let mut len = 0;
        let mut end = 0;
        for (idx, c) in s.char_indices() {
            let width = mutf8::char_len(c);
            if len + width > MAX_STRING_LEN {
                break;
            }
            len += width;
            end = idx + c.len_utf8();
        }
        self.str_payload(&s[..end], len);
        true
    }

    fn str_payload(&mut self, s: &str, encoded_len: usize) {
        debug_assert!(encoded_len <= MAX_STRING_LEN);
        self.tag(Tag::String);
        let len = u16::try_from(encoded_len).unwrap_or(u16::MAX);
        self.buf.extend_from_slice(&len.to_be_bytes());
        mutf8::encode_into(s, &mut self.buf);
    }

    /// Start a list of `len` elements. The caller writes exactly `len`
    /// values afterwards.
    pub fn begin_list(&mut self, len: usize) -> Result<(), EncodeError> {
        let count = i32::try_from(len).map_err(|_| EncodeError::ListTooLong { len })?;
        self.tag(Tag::List);
        self.buf.extend_from_slice(&count.to_be_bytes());
        Ok(())
    }

    /// Write a decoded value back out.
    ///
    /// On error the buffer may hold a partially written list.
    pub fn write_value(&mut self, value: &WireValue) -> Result<(), EncodeError> {
        match value {
            WireValue::Raw(b) => self.write_raw(b)?,
            WireValue::DateTime(v) => self.write_datetime(v),
            WireValue::Date(v) => self.write_date(*v),
            WireValue::Bool(v) => self.write_bool(*v),
            WireValue::Byte(v) => self.write_byte(*v),
            WireValue::Short(v) => self.write_short(*v),
            WireValue::Int(v) => self.write_int(*v),
            WireValue::Long(v) => self.write_long(*v),
            WireValue::Float(v) => self.write_float(*v),
            WireValue::Double(v) => self.write_double(*v),
            WireValue::Str(s) => self.write_str(s)?,
            WireValue::List(items) => {
                self.begin_list(items.len())?;
                for item in items {
                    self.write_value(item)?;
                }
            }
        }
        Ok(())
    }

    /// Write every value of `row` followed by an end-of-record marker.
    pub fn write_record(&mut self, row: &[WireValue]) -> Result<(), EncodeError> {
        for value in row {
            self.write_value(value)?;
        }
        self.end_record();
        Ok(())
    }
}
