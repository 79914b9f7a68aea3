//! Decoder.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::{
    mutf8, DecodeError, Tag, WireValue, MAX_LIST_DEPTH, MILLIS_PER_DAY, UNIX_EPOCH_DAYS_FROM_CE,
};

/// One step of the tag stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Value(WireValue),
    EndOfRecord,
}

/// Cursor over an encoded buffer.
///
/// Positions reported in errors are absolute byte offsets into the buffer.
#[derive(Clone, Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Next value or end-of-record marker, `None` at end of input.
    pub fn next_item(&mut self) -> Result<Option<Item>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        let at = self.pos;
        let tag = self.tag()?;
        if tag == Tag::EndOfRecord {
            return Ok(Some(Item::EndOfRecord));
        }
        self.payload(tag, at, 0).map(|v| Some(Item::Value(v)))
    }

    /// Read exactly one value. An end-of-record marker here is an error.
    pub fn read_value(&mut self) -> Result<WireValue, DecodeError> {
        self.value_at_depth(0)
    }

    /// Read one record.
    ///
    /// Returns `None` when the input is exhausted on a record boundary. Input
    /// that ends inside a record is [`DecodeError::UnterminatedRecord`].
    pub fn read_record(&mut self) -> Result<Option<Vec<WireValue>>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        let start = self.pos;
        let mut row = Vec::new();
        loop {
            match self.next_item()? {
                Some(Item::Value(v)) => row.push(v),
                Some(Item::EndOfRecord) => return Ok(Some(row)),
                None => return Err(DecodeError::UnterminatedRecord { at: start }),
            }
        }
    }

    /// Iterate over the remaining records.
    pub fn records(self) -> Records<'a> {
        Records { reader: self, failed: false }
    }

    fn value_at_depth(&mut self, depth: usize) -> Result<WireValue, DecodeError> {
        let at = self.pos;
        match self.tag()? {
            Tag::EndOfRecord => Err(DecodeError::EndOfRecordInList { at }),
            tag => self.payload(tag, at, depth),
        }
    }

    fn payload(&mut self, tag: Tag, at: usize, depth: usize) -> Result<WireValue, DecodeError> {
        Ok(match tag {
            Tag::EndOfRecord => return Err(DecodeError::EndOfRecordInList { at }),
            Tag::Boolean => WireValue::Bool(self.array::<1>()?[0] != 0),
            Tag::Byte => WireValue::Byte(i8::from_be_bytes(self.array()?)),
            Tag::Short => WireValue::Short(i16::from_be_bytes(self.array()?)),
            Tag::Integer => WireValue::Int(i32::from_be_bytes(self.array()?)),
            Tag::Long => WireValue::Long(i64::from_be_bytes(self.array()?)),
            Tag::Float => WireValue::Float(f32::from_bits(u32::from_be_bytes(self.array()?))),
            Tag::Double => WireValue::Double(f64::from_bits(u64::from_be_bytes(self.array()?))),
            Tag::DateTime => {
                let millis = i64::from_be_bytes(self.array()?);
                let dt = Utc
                    .timestamp_millis_opt(millis)
                    .single()
                    .ok_or(DecodeError::DateTimeOutOfRange { at, millis })?;
                WireValue::DateTime(dt)
            }
            Tag::Date => {
                let millis = i64::from_be_bytes(self.array()?);
                let date = date_from_millis(millis)
                    .ok_or(DecodeError::DateTimeOutOfRange { at, millis })?;
                WireValue::Date(date)
            }
            Tag::Raw => {
                let len = self.length(at)?;
                WireValue::Raw(self.take(len)?.to_vec())
            }
            Tag::String => {
                let len = usize::from(u16::from_be_bytes(self.array()?));
                let start = self.pos;
                let bytes = self.take(len)?;
                let s = mutf8::decode(bytes)
                    .map_err(|e| DecodeError::MalformedString { at: start + e.offset })?;
                WireValue::Str(s)
            }
            Tag::List => {
                if depth >= MAX_LIST_DEPTH {
                    return Err(DecodeError::NestingTooDeep { at, max: MAX_LIST_DEPTH });
                }
                let count = self.length(at)?;
                // Every element takes at least one byte.
                let mut items = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    items.push(self.value_at_depth(depth + 1)?);
                }
                WireValue::List(items)
            }
        })
    }

    fn tag(&mut self) -> Result<Tag, DecodeError> {
        let at = self.pos;
        let [byte] = self.array::<1>()?;
        Tag::from_byte(byte).ok_or(DecodeError::UnknownTag { tag: byte, at })
    }

    /// Signed 4-byte length or count prefix.
    fn length(&mut self, at: usize) -> Result<usize, DecodeError> {
        let len = i32::from_be_bytes(self.array()?);
        usize::try_from(len).map_err(|_| DecodeError::NegativeLength { at, len: i64::from(len) })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if n > available {
            return Err(DecodeError::UnexpectedEof { at: self.pos, needed: n - available });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    let days = millis.div_euclid(MILLIS_PER_DAY) + UNIX_EPOCH_DAYS_FROM_CE;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(days).ok()?)
}

/// Iterator over the records of a buffer.
///
/// Yields each decode error once and then stops.
pub struct Records<'a> {
    reader: WireReader<'a>,
    failed: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Vec<WireValue>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.read_record() {
            Ok(row) => row.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Records<'_> {}

/// Decode every record in `buf`.
pub fn decode_records(buf: &[u8]) -> Result<Vec<Vec<WireValue>>, DecodeError> {
    WireReader::new(buf).records().collect()
}

#[cfg(test)]
mod tests;
