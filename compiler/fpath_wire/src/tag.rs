//! Wire tags.

use std::fmt;

/// One-byte type tag preceding every encoded value.
///
/// The discriminants are part of the wire format and must never change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Terminates one record (row). No payload.
    EndOfRecord = 0,
    /// Opaque bytes with a 4-byte length prefix.
    Raw = 1,
    /// Instant as 8-byte signed epoch milliseconds (UTC).
    DateTime = 2,
    /// Calendar date as the epoch milliseconds of its midnight (UTC).
    Date = 3,
    Boolean = 4,
    Byte = 5,
    Short = 6,
    Integer = 7,
    Long = 8,
    Float = 9,
    Double = 10,
    /// 2-byte length prefix + modified UTF-8.
    String = 11,
    /// 4-byte element count + that many tagged values.
    List = 12,
}

impl Tag {
    /// Decode a tag byte.
    #[inline]
    pub const fn from_byte(byte: u8) -> Option<Tag> {
        Some(match byte {
            0 => Tag::EndOfRecord,
            1 => Tag::Raw,
            2 => Tag::DateTime,
            3 => Tag::Date,
            4 => Tag::Boolean,
            5 => Tag::Byte,
            6 => Tag::Short,
            7 => Tag::Integer,
            8 => Tag::Long,
            9 => Tag::Float,
            10 => Tag::Double,
            11 => Tag::String,
            12 => Tag::List,
            _ => return None,
        })
    }

    /// The byte written for this tag.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Payload width for fixed-width tags, `None` for length-prefixed ones.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Tag::EndOfRecord => Some(0),
            Tag::Boolean | Tag::Byte => Some(1),
            Tag::Short => Some(2),
            Tag::Integer | Tag::Float => Some(4),
            Tag::Long | Tag::Double | Tag::DateTime | Tag::Date => Some(8),
            Tag::Raw | Tag::String | Tag::List => None,
        }
    }

    /// Lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Tag::EndOfRecord => "end-of-record",
            Tag::Raw => "raw",
            Tag::DateTime => "datetime",
            Tag::Date => "date",
            Tag::Boolean => "boolean",
            Tag::Byte => "byte",
            Tag::Short => "short",
            Tag::Integer => "integer",
            Tag::Long => "long",
            Tag::Float => "float",
            Tag::Double => "double",
            Tag::String => "string",
            Tag::List => "list",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
