use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rowbind_db::{StorageClass, ValueRef};
use test_case::test_case;
use uuid::Uuid;

use super::guid::{self, GuidLayout};
use super::ticks::{self, TicksError, TICKS_PER_SECOND};
use super::*;

fn read<F: SqlType>(value: ValueRef<'_>) -> Result<F, BoxError> {
    let codec = registry::read_codec::<F>();
    let handler = codec
        .get(value.storage_class())
        .expect("handler for storage class");
    handler(value)
}

fn write<F: SqlType>(value: &F) -> Param<'_> {
    let codec = registry::write_codec::<F>();
    let slot = codec.select(value).expect("applicable conversion");
    slot.convert(value).expect("conversion")
}

const SAMPLE: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

// ── Defaults ────────────────────────────────────────────────────────────

#[test]
fn test_integer_bounds_round_trip() {
    assert_eq!(read::<i64>(ValueRef::Integer(i64::MIN)).unwrap(), i64::MIN);
    assert_eq!(read::<i64>(ValueRef::Integer(i64::MAX)).unwrap(), i64::MAX);
    assert_eq!(read::<i8>(ValueRef::Integer(-128)).unwrap(), i8::MIN);
    assert_eq!(read::<u8>(ValueRef::Integer(255)).unwrap(), u8::MAX);
    assert_eq!(write(&i32::MIN), Param::Integer(i64::from(i32::MIN)));
    assert_eq!(write(&u32::MAX), Param::Integer(i64::from(u32::MAX)));
}

#[test_case(ValueRef::Integer(128) ; "i8 overflow")]
#[test_case(ValueRef::Integer(-129) ; "i8 underflow")]
fn test_narrow_integer_rejects_out_of_range(value: ValueRef<'static>) {
    let err = read::<i8>(value).expect_err("out of range");
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn test_unsigned_rejects_negative() {
    assert!(read::<u8>(ValueRef::Integer(-1)).is_err());
    assert!(read::<u32>(ValueRef::Integer(-1)).is_err());
}

#[test_case(0, 0 ; "zero")]
#[test_case(0x7fff_ffff_ffff_ffff, i64::MAX ; "largest positive")]
#[test_case(1 << 63, i64::MIN ; "sign bit")]
#[test_case(u64::MAX, -1 ; "all bits")]
fn test_u64_keeps_its_bit_pattern(value: u64, stored: i64) {
    assert_eq!(write(&value), Param::Integer(stored));
    assert_eq!(read::<u64>(ValueRef::Integer(stored)).unwrap(), value);
}

#[test]
fn test_usize_max_round_trips() {
    let Param::Integer(stored) = write(&usize::MAX) else {
        panic!("usize writes as Integer");
    };
    assert_eq!(read::<usize>(ValueRef::Integer(stored)).unwrap(), usize::MAX);
}

#[test_case(0, false ; "zero")]
#[test_case(1, true ; "one")]
#[test_case(-7, true ; "negative")]
fn test_bool_from_integer(raw: i64, expected: bool) {
    assert_eq!(read::<bool>(ValueRef::Integer(raw)).unwrap(), expected);
}

#[test]
fn test_bool_writes_zero_or_one() {
    assert_eq!(write(&true), Param::Integer(1));
    assert_eq!(write(&false), Param::Integer(0));
}

#[test]
fn test_float_reads_integer_and_keeps_negative_zero() {
    assert!((read::<f64>(ValueRef::Integer(3)).unwrap() - 3.0).abs() < f64::EPSILON);
    let zero = read::<f64>(ValueRef::Float(-0.0)).unwrap();
    assert!(zero.abs() < f64::EPSILON && zero.is_sign_negative());
    assert_eq!(write(&1.5_f32), Param::Float(1.5));
}

#[test]
fn test_text_types() {
    assert_eq!(read::<String>(ValueRef::Text(b"")).unwrap(), "");
    assert_eq!(&*read::<Box<str>>(ValueRef::Text(b"boxed")).unwrap(), "boxed");
    assert_eq!(&*read::<Arc<str>>(ValueRef::Text(b"shared")).unwrap(), "shared");
    assert_eq!(write(&String::from("hi")), Param::Text(Cow::Owned("hi".into())));
}

#[test]
fn test_string_write_borrows_field() {
    let codec = registry::write_codec::<String>();
    let value = String::from("borrowed");
    let param = codec.select(&value).unwrap().convert(&value).unwrap();
    assert!(matches!(param, Param::Text(Cow::Borrowed("borrowed"))));
}

#[test]
fn test_text_rejects_invalid_utf8() {
    assert!(read::<String>(ValueRef::Text(&[0xff, 0xfe])).is_err());
}

#[test]
fn test_char_needs_exactly_one_character() {
    assert_eq!(read::<char>(ValueRef::Text("é".as_bytes())).unwrap(), 'é');
    assert!(read::<char>(ValueRef::Text(b"")).is_err());
    assert!(read::<char>(ValueRef::Text(b"ab")).is_err());
}

#[test]
fn test_utf16_text() {
    let units = read::<Vec<u16>>(ValueRef::Text("h€".as_bytes())).unwrap();
    assert_eq!(units, "h€".encode_utf16().collect::<Vec<_>>());
    assert_eq!(write(&units), Param::Text(Cow::Owned("h€".into())));
}

#[test]
fn test_blob_has_no_default_reader() {
    assert!(!registry::can_read::<Vec<u8>>(StorageClass::Blob));
    assert!(registry::read_codec::<Vec<u8>>().is_empty());
    assert_eq!(write(&Vec::<u8>::new()), Param::Blob(Cow::Owned(Vec::new())));
}

#[test]
fn test_option_lifts_inner_codec() {
    assert_eq!(read::<Option<i64>>(ValueRef::Null).unwrap(), None);
    assert_eq!(read::<Option<i64>>(ValueRef::Integer(4)).unwrap(), Some(4));
    assert_eq!(write(&None::<String>), Param::Null);
    assert_eq!(write(&Some(5_i32)), Param::Integer(5));
    assert!(!registry::can_read::<i64>(StorageClass::Null));
}

#[test]
fn test_nested_option_reads_null_as_outer_none() {
    assert_eq!(read::<Option<Option<i64>>>(ValueRef::Null).unwrap(), None);
    assert_eq!(
        read::<Option<Option<i64>>>(ValueRef::Integer(1)).unwrap(),
        Some(Some(1))
    );
}

crate::sql_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red = 1,
        Blue = 4,
    }
}

#[test]
fn test_sql_enum_reads_discriminant() {
    assert_eq!(read::<Color>(ValueRef::Integer(4)).unwrap(), Color::Blue);
    assert_eq!(write(&Color::Red), Param::Integer(1));
    let err = read::<Color>(ValueRef::Integer(2)).expect_err("unknown discriminant");
    assert!(err.to_string().contains("Color"));
}

// ── GUID layouts ────────────────────────────────────────────────────────

#[test_case("6f9619ff8b86d011b42d00c04fc964ff", GuidLayout::Digits ; "digits")]
#[test_case("6f9619ff-8b86-d011-b42d-00c04fc964ff", GuidLayout::Hyphenated ; "hyphenated")]
#[test_case("{6f9619ff-8b86-d011-b42d-00c04fc964ff}", GuidLayout::Braced ; "braced")]
#[test_case("(6F9619FF-8B86-D011-B42D-00C04FC964FF)", GuidLayout::Parenthesized ; "parenthesized upper")]
fn test_guid_layouts(text: &str, layout: GuidLayout) {
    assert_eq!(GuidLayout::detect(text), layout);
    let parsed = guid::parse(text).expect("valid guid");
    assert_eq!(parsed, Uuid::parse_str(SAMPLE).unwrap());
    assert_eq!(layout.format(&parsed).to_lowercase(), text.to_lowercase());
}

#[test_case("" ; "empty")]
#[test_case("6f9619ff-8b86-d011-b42d-00c04fc964f" ; "short")]
#[test_case("{6f9619ff-8b86-d011-b42d-00c04fc964ff)" ; "mismatched delimiters")]
#[test_case("{6f9619ff8b86d011b42d00c04fc964ff----}" ; "braced without hyphen layout")]
#[test_case("6f9619ff-8b86-d011-b42d-00c04fc964fg" ; "bad digit")]
fn test_guid_rejects(text: &str) {
    assert!(guid::parse(text).is_err());
}

#[test]
fn test_guid_field_writes_hyphenated() {
    let id = read::<Uuid>(ValueRef::Text(b"{6f9619ff-8b86-d011-b42d-00c04fc964ff}")).unwrap();
    assert_eq!(write(&id), Param::Text(Cow::Owned(SAMPLE.into())));
}

// ── Ticks ───────────────────────────────────────────────────────────────

#[test_case("00:00", 0 ; "zero clock")]
#[test_case("01:02", (3_600 + 120) * TICKS_PER_SECOND ; "hours minutes")]
#[test_case("1.02:03:04", (86_400 + 7_384) * TICKS_PER_SECOND ; "days clock")]
#[test_case("00:00:01.5", 15_000_000 ; "short fraction")]
#[test_case("00:00:00.0000001", 1 ; "one tick")]
#[test_case("-00:00:01", -TICKS_PER_SECOND ; "negative")]
#[test_case("3", 3 * 86_400 * TICKS_PER_SECOND ; "bare days")]
fn test_parse_ticks(text: &str, expected: i64) {
    assert_eq!(ticks::parse_ticks(text).unwrap(), expected);
}

#[test_case("24:00" ; "hour out of range")]
#[test_case("00:60" ; "minute out of range")]
#[test_case("00:00:00.12345678" ; "fraction too long")]
#[test_case("1:2:3:4" ; "too many parts")]
#[test_case("abc" ; "not a number")]
#[test_case("" ; "empty")]
fn test_parse_ticks_rejects(text: &str) {
    assert!(matches!(
        ticks::parse_ticks(text),
        Err(TicksError::InvalidDuration(_))
    ));
}

#[test]
fn test_negative_ticks_round_trip_through_delta() {
    let delta = ticks::delta_from_ticks(-15).unwrap();
    assert_eq!(delta, TimeDelta::nanoseconds(-1_500));
    assert_eq!(ticks::delta_to_ticks(&delta).unwrap(), -15);
}

#[test]
fn test_unsigned_duration_rejects_negative_ticks() {
    assert_eq!(
        ticks::duration_from_ticks(-1),
        Err(TicksError::Negative(-1))
    );
    let duration = read::<std::time::Duration>(ValueRef::Integer(25_000_000)).unwrap();
    assert_eq!(duration, std::time::Duration::from_millis(2_500));
}

#[test]
fn test_timestamp_ticks_count_from_unix_epoch() {
    let epoch = read::<DateTime<Utc>>(ValueRef::Integer(0)).unwrap();
    assert_eq!(epoch, DateTime::UNIX_EPOCH);
    let later = DateTime::from_timestamp(1, 100).unwrap();
    assert_eq!(write(&later), Param::Integer(TICKS_PER_SECOND + 1));
}

#[test_case("2024-03-01T12:30:00Z" ; "rfc3339")]
#[test_case("2024-03-01T14:30:00+02:00" ; "rfc3339 offset")]
#[test_case("2024-03-01 12:30:00" ; "sqlite datetime")]
#[test_case("2024-03-01 12:30" ; "sqlite minutes")]
fn test_parse_timestamp(text: &str) {
    let expected = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(ticks::parse_timestamp(text).unwrap(), expected);
}

#[test]
fn test_duration_text_column() {
    let delta = read::<TimeDelta>(ValueRef::Text(b"00:01:00")).unwrap();
    assert_eq!(delta, TimeDelta::minutes(1));
}

// ── Codec mechanics ─────────────────────────────────────────────────────

#[test]
fn test_registry_returns_shared_instance() {
    let first = registry::read_codec::<i16>();
    let second = registry::read_codec::<i16>();
    assert!(Arc::ptr_eq(&first, &second));
    let first = registry::write_codec::<i16>();
    let second = registry::write_codec::<i16>();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_registry_is_shared_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(registry::read_codec::<u16>))
        .collect();
    let codecs: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert!(codecs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_registry_lookup() {
    let handler = registry::lookup::<f64>(StorageClass::Integer).expect("integer handler");
    assert!((handler(ValueRef::Integer(2)).unwrap() - 2.0).abs() < f64::EPSILON);
    assert!(registry::lookup::<f64>(StorageClass::Text).is_none());
}

#[test]
fn test_read_merge_replaces_only_overridden_classes() {
    let base = ReadCodec::<i64>::new()
        .from_integer(Ok)
        .from_text(|_| Ok(-1));
    let overrides = ReadCodec::new().from_integer(|v| Ok(v * 10));
    let merged = base.merge(&overrides);

    assert_eq!(
        merged.classes().collect::<Vec<_>>(),
        [StorageClass::Integer, StorageClass::Text]
    );
    assert_eq!(merged.integer().unwrap()(ValueRef::Integer(2)).unwrap(), 20);
    assert_eq!(merged.text().unwrap()(ValueRef::Text(b"x")).unwrap(), -1);
}

#[test]
fn test_read_handler_rejects_other_class() {
    let codec = ReadCodec::<i64>::new().from_integer(Ok);
    let err = codec.integer().unwrap()(ValueRef::Null).expect_err("class mismatch");
    assert!(err.to_string().contains("Null"));
}

#[test]
fn test_write_select_prefers_matching_guard() {
    let codec = WriteCodec::<i64>::new()
        .to_integer(|v| Ok(*v))
        .to_text(|v| Ok(Cow::Owned(format!("big:{v}"))))
        .guard(StorageClass::Text, |v| *v > 100);

    assert_eq!(codec.select(&5).unwrap().class(), StorageClass::Integer);
    assert_eq!(codec.select(&500).unwrap().class(), StorageClass::Text);
}

#[test]
fn test_write_select_without_fallback() {
    let codec = WriteCodec::<i64>::new()
        .to_null()
        .guard(StorageClass::Null, |v| *v == 0);
    assert!(codec.select(&0).is_some());
    assert!(codec.select(&1).is_none());
}

#[test]
fn test_write_push_replaces_same_class_in_place() {
    let codec = WriteCodec::<i64>::new()
        .to_integer(|v| Ok(*v))
        .to_float(|_| Ok(0.0))
        .to_integer(|v| Ok(-v));
    assert_eq!(codec.slots().len(), 2);
    assert_eq!(codec.slots()[0].class(), StorageClass::Integer);
    assert_eq!(codec.slots()[0].convert(&3).unwrap(), Param::Integer(-3));
}

#[test]
fn test_write_merge_puts_overrides_first() {
    let defaults = WriteCodec::<i64>::new()
        .to_integer(|v| Ok(*v))
        .to_float(|_| Ok(1.0));
    let overrides = WriteCodec::<i64>::new().to_text(|v| Ok(Cow::Owned(v.to_string())));
    let merged = defaults.merge(&overrides);

    let classes: Vec<_> = merged.slots().iter().map(WriteSlot::class).collect();
    assert_eq!(
        classes,
        [StorageClass::Text, StorageClass::Integer, StorageClass::Float]
    );
    assert_eq!(merged.select(&7).unwrap().class(), StorageClass::Text);
}

#[test]
fn test_optional_keeps_inner_guards() {
    let inner = WriteCodec::<i64>::new()
        .to_integer(|v| Ok(*v))
        .guard(StorageClass::Integer, |v| *v >= 0);
    let codec = WriteCodec::optional(&inner);

    assert!(codec.slots().iter().all(WriteSlot::is_guarded));
    assert_eq!(codec.select(&None).unwrap().class(), StorageClass::Null);
    assert_eq!(codec.select(&Some(1)).unwrap().class(), StorageClass::Integer);
    assert!(codec.select(&Some(-1)).is_none());
}

#[test]
fn test_codec_debug_lists_classes() {
    let codec = WriteCodec::<i64>::new()
        .to_integer(|v| Ok(*v))
        .to_null()
        .guard(StorageClass::Null, |v| *v == 0);
    assert_eq!(format!("{codec:?}"), "[\"Integer\", \"Null?\"]");
    let codec = ReadCodec::<i64>::new().from_integer(Ok);
    assert_eq!(format!("{codec:?}"), "[Integer]");
}
