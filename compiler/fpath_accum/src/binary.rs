//! Wire-format output.

use chrono::{DateTime, NaiveDate, Utc};
use fpath_ir::Value;
use fpath_wire::WireWriter;
use tracing::{trace, warn};

use crate::Accumulator;

/// Encodes values as `fpath_wire` records.
///
/// Each accepted value becomes one tagged value; [`Accumulator::add_eol`]
/// ends the record. Strings longer than the wire limit are cut at a
/// character boundary.
#[derive(Clone, Debug, Default)]
pub struct BinaryAccumulator {
    writer: WireWriter,
    /// Buffer length after the last end-of-record marker.
    record_start: usize,
}

impl BinaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.writer.as_bytes()
    }

    fn string(&mut self, s: &str) {
        if self.writer.write_str_truncated(s) {
            trace!(len = s.len(), "string truncated to the wire limit");
        }
    }
}

impl Accumulator for BinaryAccumulator {
    const KIND: &'static str = "binary";

    type Output = Vec<u8>;
    type Buffer = Vec<u8>;

    fn new_instance(&self) -> Self {
        Self::default()
    }

    fn with_buffer(&self, mut buffer: Vec<u8>) -> Self {
        buffer.clear();
        BinaryAccumulator { writer: WireWriter::with_buffer(buffer), record_start: 0 }
    }

    fn into_buffer(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    fn accept_bool(&mut self, v: bool) {
        self.writer.write_bool(v);
    }

    fn accept_byte(&mut self, v: i8) {
        self.writer.write_byte(v);
    }

    fn accept_short(&mut self, v: i16) {
        self.writer.write_short(v);
    }

    fn accept_int(&mut self, v: i32) {
        self.writer.write_int(v);
    }

    fn accept_long(&mut self, v: i64) {
        self.writer.write_long(v);
    }

    fn accept_float(&mut self, v: f32) {
        self.writer.write_float(v);
    }

    fn accept_double(&mut self, v: f64) {
        self.writer.write_double(v);
    }

    fn accept_str(&mut self, v: &str) {
        self.string(v);
    }

    fn accept_bytes(&mut self, v: &[u8]) {
        if let Err(err) = self.writer.write_raw(v) {
            warn!(%err, "raw payload dropped");
        }
    }

    fn accept_datetime(&mut self, v: &DateTime<Utc>) {
        self.writer.write_datetime(v);
    }

    fn accept_date(&mut self, v: NaiveDate) {
        self.writer.write_date(v);
    }

    fn accept_enum(&mut self, v: &str) {
        self.string(v);
    }

    fn accept_list(&mut self, items: &[Value<'_>]) {
        let len = items.iter().filter(|v| !v.is_null()).count();
        if let Err(err) = self.writer.begin_list(len) {
            warn!(%err, "list dropped");
            return;
        }
        for item in items {
            self.accept(item);
        }
    }

    fn accept_acc(&mut self, other: &Self) {
        self.writer.append(other.writer.as_bytes());
    }

    fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    fn build(&self) -> Vec<u8> {
        self.writer.as_bytes().to_vec()
    }

    fn bytes(&self) -> Vec<u8> {
        self.build()
    }

    fn reset(&mut self) {
        self.writer.clear();
        self.record_start = 0;
    }

    fn add_eol(&mut self, force: bool) {
        if force || self.writer.len() > self.record_start {
            self.writer.end_record();
            self.record_start = self.writer.len();
        }
    }
}
