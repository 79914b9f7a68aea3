//! fpath wire format
//!
//! A self-describing binary encoding for rendered rows. Every encoded unit
//! starts with a one-byte [`Tag`] that fully determines the payload layout, so a
//! buffer can be decoded without any external schema.
//!
//! # Layout
//!
//! ```text
//! buffer  := record*
//! record  := value* END_OF_RECORD
//! value   := tag payload
//! ```
//!
//! | tag | payload |
//! |-----|---------|
//! | `END_OF_RECORD` | none |
//! | `RAW` | i32 length + bytes |
//! | `DATETIME` | i64 epoch milliseconds (UTC) |
//! | `DATE` | i64 epoch milliseconds of midnight UTC |
//! | `BOOLEAN` | one byte, 0 or 1 |
//! | `BYTE` / `SHORT` / `INTEGER` / `LONG` | 1 / 2 / 4 / 8 bytes, two's complement |
//! | `FLOAT` / `DOUBLE` | IEEE-754 bits, 4 / 8 bytes |
//! | `STRING` | u16 length + modified UTF-8 |
//! | `LIST` | i32 element count + values |
//!
//! All multi-byte integers are big-endian. Length and count prefixes are
//! signed; a negative prefix is a decode error.
//!
//! # Usage
//!
//! ```text
//! let mut w = WireWriter::new();
//! w.write_bool(true);
//! w.write_str("hi")?;
//! w.end_record();
//! let rows = decode_records(w.as_bytes())?;
//! ```

mod error;
pub mod mutf8;
mod reader;
mod tag;
mod value;
mod writer;

pub use error::{DecodeError, EncodeError};
pub use reader::{decode_records, Item, Records, WireReader};
pub use tag::Tag;
pub use value::WireValue;
pub use writer::WireWriter;

/// Maximum encoded length of a string payload (u16 length prefix).
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Maximum list nesting accepted by the reader.
///
/// Guards the recursive decoder against adversarial input.
pub const MAX_LIST_DEPTH: usize = 64;

/// Milliseconds per day, used for the `DATE` payload.
const MILLIS_PER_DAY: i64 = 86_400_000;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
