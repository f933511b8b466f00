//! Property tests for the primitive text format: parsing the text form of
//! any value gives the value back.

use parspec_core::primitives::{coerce, parse_text, to_text};
use parspec_core::{PrimitiveType, Value};
use proptest::prelude::*;

/// Doubles with at most eight decimals, so the fixed-width text form is exact.
fn decimal() -> impl Strategy<Value = f64> {
    (-1_000_000_000i64..1_000_000_000, 0u32..=8).prop_map(|(n, k)| n as f64 / 10f64.powi(k as i32))
}

/// Any text an array item can carry: no commas, and not blank.
fn word() -> impl Strategy<Value = String> {
    "[^,\\s][^,]{0,7}"
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        decimal().prop_map(Value::Double),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        word().prop_map(Value::String),
        prop::collection::vec(decimal(), 0..6).prop_map(Value::DoubleArray),
        prop::collection::vec(any::<i64>(), 0..6).prop_map(Value::IntArray),
        prop::collection::vec(any::<bool>(), 0..6).prop_map(Value::BoolArray),
        prop::collection::vec(word(), 1..6).prop_map(Value::StringArray),
    ]
}

proptest! {
    #[test]
    fn text_form_round_trips(v in value()) {
        let text = to_text(&v);
        let back = parse_text(v.primitive_type(), &text).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn ints_widen_to_doubles(i in -1_000_000i64..1_000_000) {
        prop_assert_eq!(
            coerce(PrimitiveType::Double, Value::Int(i)).unwrap(),
            Value::Double(i as f64)
        );
    }

    #[test]
    fn text_coerces_like_parse(i in any::<i64>()) {
        prop_assert_eq!(
            coerce(PrimitiveType::Int, Value::String(i.to_string())).unwrap(),
            Value::Int(i)
        );
    }
}

#[test]
fn doubles_use_eight_decimals() {
    assert_eq!(to_text(&Value::Double(1.0)), "1.00000000");
    assert_eq!(to_text(&Value::DoubleArray(vec![0.5, 2.0])), "{0.50000000,2.00000000}");
}

#[test]
fn coercion_failures_name_value_and_type() {
    let err = coerce(PrimitiveType::Bool, Value::Int(2)).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains('2') && msg.contains("bool"), "{}", msg);
    assert!(parse_text(PrimitiveType::IntArray, "1,2").is_err());
    assert!(parse_text(PrimitiveType::IntArray, "{1,x}").is_err());
}
