//! Accumulators: where rendered values go.
//!
//! A renderer never formats anything itself. It hands each typed value to
//! an [`Accumulator`], which decides the output representation:
//!
//! | accumulator | output |
//! |---|---|
//! | [`TextAccumulator`] | `String`, datetimes and dates through chrono patterns |
//! | [`BinaryAccumulator`] | `Vec<u8>` in the `fpath_wire` record format |
//! | [`ObjectAccumulator`] | the last value accepted, detached from the input |
//!
//! Accepting a value never fails. Records and maps are resolved away at
//! compile time, so reaching an accumulator with one is a bug; it trips a
//! debug assertion and is ignored in release builds.

mod binary;
mod error;
mod object;
mod text;

use chrono::{DateTime, NaiveDate, Utc};
use fpath_ir::Value;

pub use binary::BinaryAccumulator;
pub use error::AccumError;
pub use object::ObjectAccumulator;
pub use text::{TextAccumulator, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT};

/// Output sink receiving typed values during a render.
///
/// Instances are cheap to create: renders make disposable instances with
/// [`new_instance`](Accumulator::new_instance) for alternatives and joins,
/// then splice them back with [`accept_acc`](Accumulator::accept_acc).
pub trait Accumulator: Sized + 'static {
    /// Identity of the accumulator kind. Part of every cache key.
    const KIND: &'static str;

    /// Materialized result.
    type Output;

    /// Backing storage, reusable across renders.
    type Buffer: Default;

    /// Empty accumulator with the same configuration.
    #[must_use]
    fn new_instance(&self) -> Self;

    /// Empty accumulator with the same configuration writing into `buffer`.
    /// Existing content of `buffer` is discarded.
    #[must_use]
    fn with_buffer(&self, buffer: Self::Buffer) -> Self;

    fn into_buffer(self) -> Self::Buffer;

    fn accept_bool(&mut self, v: bool);
    fn accept_byte(&mut self, v: i8);
    fn accept_short(&mut self, v: i16);
    fn accept_int(&mut self, v: i32);
    fn accept_long(&mut self, v: i64);
    fn accept_float(&mut self, v: f32);
    fn accept_double(&mut self, v: f64);
    fn accept_str(&mut self, v: &str);
    fn accept_bytes(&mut self, v: &[u8]);
    fn accept_datetime(&mut self, v: &DateTime<Utc>);
    fn accept_date(&mut self, v: NaiveDate);

    /// Enum-like value, by variant name.
    fn accept_enum(&mut self, v: &str);

    /// List of printable values. Null elements are skipped.
    fn accept_list(&mut self, items: &[Value<'_>]);

    /// Dispatch on the value kind. Null accepts nothing.
    fn accept(&mut self, value: &Value<'_>) {
        match value {
            Value::Null => {}
            Value::Bool(v) => self.accept_bool(*v),
            Value::Byte(v) => self.accept_byte(*v),
            Value::Short(v) => self.accept_short(*v),
            Value::Int(v) => self.accept_int(*v),
            Value::Long(v) => self.accept_long(*v),
            Value::Float(v) => self.accept_float(*v),
            Value::Double(v) => self.accept_double(*v),
            Value::Str(s) => self.accept_str(s),
            Value::Bytes(b) => self.accept_bytes(b),
            Value::DateTime(v) => self.accept_datetime(v),
            Value::Date(v) => self.accept_date(*v),
            Value::Enum(s) => self.accept_enum(s),
            Value::List(items) => self.accept_list(items),
            Value::Map(_) | Value::Object(_) => {
                debug_assert!(false, "{} value reached an accumulator", value.kind());
            }
        }
    }

    /// Append everything `other` accumulated.
    fn accept_acc(&mut self, other: &Self);

    /// Whether nothing was accepted since creation or the last reset.
    fn is_empty(&self) -> bool;

    fn build(&self) -> Self::Output;

    /// Byte form of the current content.
    fn bytes(&self) -> Vec<u8>;

    fn reset(&mut self);

    /// Terminate the current record. Unless `force` is set, nothing is
    /// appended when nothing was written since the last terminator.
    fn add_eol(&mut self, force: bool);
}
