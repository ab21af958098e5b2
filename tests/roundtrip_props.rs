use chrono::{DateTime, NaiveDateTime};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use xmlrpc_serde::{Response, Value, encode_response, from_value, read_response, to_value, xml};

fn through_text(value: &Value) -> Value {
    xml::from_str(&xml::to_string(value).unwrap()).unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: i32,
    label: String,
    ratio: f64,
    flags: Vec<bool>,
    parent: Option<i32>,
}

fn record() -> impl Strategy<Value = Record> {
    (
        any::<i32>(),
        "\\PC*",
        -1e12f64..1e12,
        prop::collection::vec(any::<bool>(), 0..8),
        any::<Option<i32>>(),
    )
        .prop_map(|(id, label, ratio, flags, parent)| Record {
            id,
            label,
            ratio,
            flags,
            parent,
        })
}

proptest! {
    #[test]
    fn prop_int_roundtrip(v in any::<i32>()) {
        let decoded: i32 = from_value(&through_text(&to_value(&v).unwrap())).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn prop_double_roundtrip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let decoded: f64 = from_value(&through_text(&to_value(&v).unwrap())).unwrap();
        prop_assert_eq!(decoded.to_bits(), v.to_bits());
    }

    #[test]
    fn prop_string_roundtrip(s in "\\PC*") {
        let decoded: String = from_value(&through_text(&to_value(&s).unwrap())).unwrap();
        prop_assert_eq!(decoded, s);
    }

    #[test]
    fn prop_datetime_truncates_to_seconds(secs in 0i64..4_102_444_800, nanos in 0u32..1_000_000_000) {
        let Some(naive) = DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc()) else {
            return Ok(());
        };
        let text = xmlrpc_serde::datetime::format(&naive);
        let parsed: NaiveDateTime = xmlrpc_serde::datetime::parse(&text).unwrap();
        prop_assert_eq!(parsed, xmlrpc_serde::datetime::truncate(naive));
    }

    #[test]
    fn prop_array_roundtrip(v in prop::collection::vec(any::<i32>(), 0..32)) {
        let decoded: Vec<i32> = from_value(&through_text(&to_value(&v).unwrap())).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn prop_base64_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let buf = ByteBuf::from(bytes);
        let decoded: ByteBuf = from_value(&through_text(&to_value(&buf).unwrap())).unwrap();
        prop_assert_eq!(decoded, buf);
    }

    #[test]
    fn prop_record_member_order_is_irrelevant(r in record(), shift in 0usize..5) {
        let Value::Struct(mut members) = to_value(&r).unwrap() else {
            panic!("records encode as structs");
        };
        members.rotate_left(shift);
        members.reverse();
        let decoded: Record = from_value(&through_text(&Value::Struct(members))).unwrap();
        prop_assert_eq!(decoded, r);
    }

    #[test]
    fn prop_response_roundtrip(r in record()) {
        let xml = encode_response(&r).unwrap();
        prop_assert_eq!(read_response::<Record>(&xml).unwrap(), Response::Success(r));
    }
}
