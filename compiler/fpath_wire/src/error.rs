//! Encode and decode errors.
//!
//! Decode errors mean the buffer is corrupt or truncated. They are data
//! errors, not transient conditions, and retrying the same read fails the
//! same way.

use thiserror::Error;

/// Failure while decoding a wire buffer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {at}: {needed} more byte(s) needed")]
    UnexpectedEof { at: usize, needed: usize },

    #[error("unknown wire tag 0x{tag:02x} at byte {at}")]
    UnknownTag { tag: u8, at: usize },

    #[error("malformed modified UTF-8 string at byte {at}")]
    MalformedString { at: usize },

    #[error("datetime of {millis} ms at byte {at} is out of range")]
    DateTimeOutOfRange { at: usize, millis: i64 },

    #[error("end-of-record marker inside a list at byte {at}")]
    EndOfRecordInList { at: usize },

    #[error("negative length {len} at byte {at}")]
    NegativeLength { at: usize, len: i64 },

    #[error("lists nested deeper than {max} levels at byte {at}")]
    NestingTooDeep { at: usize, max: usize },

    #[error("record starting at byte {at} has no end-of-record marker")]
    UnterminatedRecord { at: usize },
}

/// Failure while encoding a value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("string of {len} encoded bytes exceeds the {max}-byte limit")]
    StringTooLong { len: usize, max: usize },

    #[error("raw payload of {len} bytes exceeds the 4-byte length prefix")]
    RawTooLong { len: usize },

    #[error("list of {len} elements exceeds the 4-byte count prefix")]
    ListTooLong { len: usize },
}
