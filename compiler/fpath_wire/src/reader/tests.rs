#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::{EncodeError, WireWriter, MAX_STRING_LEN};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_two_rows_decode_in_order() {
    let mut w = WireWriter::new();
    w.write_bool(true);
    w.write_byte(7);
    w.write_str("hi").unwrap();
    w.end_record();
    w.write_bool(false);
    w.write_byte(0);
    w.write_str("").unwrap();
    w.end_record();

    let rows = decode_records(w.as_bytes()).unwrap();
    assert_eq!(
        rows,
        vec![
            vec![WireValue::Bool(true), WireValue::Byte(7), WireValue::from("hi")],
            vec![WireValue::Bool(false), WireValue::Byte(0), WireValue::from("")],
        ]
    );
}

#[test]
fn test_exact_bytes_for_small_row() {
    let mut w = WireWriter::new();
    w.write_short(0x0102);
    w.write_str("a").unwrap();
    w.end_record();
    assert_eq!(w.as_bytes(), &[6, 0x01, 0x02, 11, 0, 1, b'a', 0][..]);
}

#[test]
fn test_empty_buffer_has_no_records() {
    assert_eq!(decode_records(&[]).unwrap(), Vec::<Vec<WireValue>>::new());
}

#[test]
fn test_empty_record() {
    assert_eq!(decode_records(&[0, 0]).unwrap(), vec![vec![], vec![]]);
}

#[test]
fn test_date_is_midnight_millis() {
    let mut w = WireWriter::new();
    w.write_date(ymd(1970, 1, 2));
    assert_eq!(&w.as_bytes()[1..], &86_400_000i64.to_be_bytes()[..]);

    let mut r = WireReader::new(w.as_bytes());
    assert_eq!(r.read_value().unwrap(), WireValue::Date(ymd(1970, 1, 2)));
}

#[test]
fn test_date_before_epoch() {
    let mut w = WireWriter::new();
    w.write_date(ymd(1969, 12, 31));
    let mut r = WireReader::new(w.as_bytes());
    assert_eq!(r.read_value().unwrap(), WireValue::Date(ymd(1969, 12, 31)));
}

#[test]
fn test_datetime_keeps_millis() {
    let dt = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let mut w = WireWriter::new();
    w.write_datetime(&dt);
    let mut r = WireReader::new(w.as_bytes());
    assert_eq!(r.read_value().unwrap(), WireValue::DateTime(dt));
}

#[test]
fn test_datetime_out_of_range() {
    let mut buf = vec![2];
    buf.extend_from_slice(&i64::MAX.to_be_bytes());
    let err = WireReader::new(&buf).read_value().unwrap_err();
    assert_eq!(err, DecodeError::DateTimeOutOfRange { at: 0, millis: i64::MAX });
}

#[test]
fn test_truncated_payload() {
    let err = WireReader::new(&[7, 0, 0]).read_value().unwrap_err();
    assert_eq!(err, DecodeError::UnexpectedEof { at: 1, needed: 2 });
}

#[test]
fn test_unknown_tag() {
    let err = decode_records(&[4, 1, 99]).unwrap_err();
    assert_eq!(err, DecodeError::UnknownTag { tag: 99, at: 2 });
}

#[test]
fn test_end_of_record_inside_list() {
    let err = decode_records(&[12, 0, 0, 0, 2, 4, 1, 0]).unwrap_err();
    assert_eq!(err, DecodeError::EndOfRecordInList { at: 7 });
}

#[test]
fn test_negative_list_count() {
    let mut buf = vec![12];
    buf.extend_from_slice(&(-1i32).to_be_bytes());
    let err = WireReader::new(&buf).read_value().unwrap_err();
    assert_eq!(err, DecodeError::NegativeLength { at: 0, len: -1 });
}

#[test]
fn test_huge_list_count_fails_without_allocating() {
    let mut buf = vec![12];
    buf.extend_from_slice(&i32::MAX.to_be_bytes());
    let err = WireReader::new(&buf).read_value().unwrap_err();
    assert_eq!(err, DecodeError::UnexpectedEof { at: 5, needed: 1 });
}

#[test]
fn test_malformed_string_offset() {
    let err = WireReader::new(&[11, 0, 2, b'a', 0xFF]).read_value().unwrap_err();
    assert_eq!(err, DecodeError::MalformedString { at: 4 });
}

#[test]
fn test_unterminated_record() {
    let err = decode_records(&[4, 1, 0, 4, 0]).unwrap_err();
    assert_eq!(err, DecodeError::UnterminatedRecord { at: 3 });
}

#[test]
fn test_records_iterator_stops_after_error() {
    let mut it = WireReader::new(&[0, 99, 0]).records();
    assert_eq!(it.next(), Some(Ok(vec![])));
    assert!(matches!(it.next(), Some(Err(DecodeError::UnknownTag { .. }))));
    assert_eq!(it.next(), None);
}

#[test]
fn test_nesting_limit() {
    let mut buf = Vec::new();
    for _ in 0..=crate::MAX_LIST_DEPTH {
        buf.push(12);
        buf.extend_from_slice(&1i32.to_be_bytes());
    }
    buf.extend_from_slice(&[4, 1]);
    let err = WireReader::new(&buf).read_value().unwrap_err();
    assert!(matches!(err, DecodeError::NestingTooDeep { .. }));
}

#[test]
fn test_next_item_reports_markers() {
    let mut r = WireReader::new(&[5, 3, 0]);
    assert_eq!(r.next_item().unwrap(), Some(Item::Value(WireValue::Byte(3))));
    assert_eq!(r.next_item().unwrap(), Some(Item::EndOfRecord));
    assert_eq!(r.next_item().unwrap(), None);
}

#[test]
fn test_string_limit() {
    let long = "x".repeat(MAX_STRING_LEN + 1);
    let mut w = WireWriter::new();
    assert_eq!(
        w.write_str(&long),
        Err(EncodeError::StringTooLong { len: MAX_STRING_LEN + 1, max: MAX_STRING_LEN })
    );
    assert!(w.is_empty());
}

#[test]
fn test_truncation_respects_char_boundary() {
    // 'é' is two bytes, so MAX_STRING_LEN (odd) cannot be filled exactly.
    let long = "é".repeat(MAX_STRING_LEN);
    let mut w = WireWriter::new();
    assert!(w.write_str_truncated(&long));

    let s = WireReader::new(w.as_bytes()).read_value().unwrap();
    let s = s.as_str().unwrap();
    assert_eq!(s.len(), MAX_STRING_LEN - 1);
    assert!(s.chars().all(|c| c == 'é'));
}

#[test]
fn test_short_string_is_not_truncated() {
    let mut w = WireWriter::new();
    assert!(!w.write_str_truncated("abc"));
    assert_eq!(WireReader::new(w.as_bytes()).read_value().unwrap(), WireValue::from("abc"));
}

#[test]
fn test_with_buffer_appends() {
    let mut w = WireWriter::with_buffer(vec![4, 1]);
    w.end_record();
    assert_eq!(decode_records(&w.into_inner()).unwrap(), vec![vec![WireValue::Bool(true)]]);
}

fn leaf() -> impl Strategy<Value = WireValue> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(WireValue::Raw),
        (-10_000_000_000_000i64..10_000_000_000_000)
            .prop_map(|ms| WireValue::DateTime(DateTime::from_timestamp_millis(ms).unwrap())),
        (-200_000i32..200_000).prop_map(|d| {
            WireValue::Date(NaiveDate::from_num_days_from_ce_opt(719_163 + d).unwrap())
        }),
        any::<bool>().prop_map(WireValue::Bool),
        any::<i8>().prop_map(WireValue::Byte),
        any::<i16>().prop_map(WireValue::Short),
        any::<i32>().prop_map(WireValue::Int),
        any::<i64>().prop_map(WireValue::Long),
        (-1.0e6f32..1.0e6).prop_map(WireValue::Float),
        (-1.0e12f64..1.0e12).prop_map(WireValue::Double),
        any::<String>().prop_map(WireValue::Str),
    ]
}

fn value() -> impl Strategy<Value = WireValue> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        proptest::collection::vec(inner, 0..4).prop_map(WireValue::List)
    })
}

proptest! {
    #[test]
    fn prop_value_round_trip(v in value()) {
        let mut w = WireWriter::new();
        w.write_value(&v).unwrap();
        let mut r = WireReader::new(w.as_bytes());
        prop_assert_eq!(r.read_value().unwrap(), v);
        prop_assert!(r.is_at_end());
    }

    #[test]
    fn prop_rows_recovered_in_order(rows in proptest::collection::vec(
        proptest::collection::vec(value(), 0..4), 0..8)
    ) {
        let mut w = WireWriter::new();
        for row in &rows {
            w.write_record(row).unwrap();
        }
        prop_assert_eq!(decode_records(w.as_bytes()).unwrap(), rows);
    }
}
