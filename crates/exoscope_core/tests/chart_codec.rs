use exoscope_core::model::chart::{decode, encode, MAX_CHART_DEPTH};
use exoscope_core::{ChartDataError, ChartValue};

#[test]
fn encode_decode_preserves_structure_and_key_order() {
    let value = ChartValue::map([
        ("zeta", ChartValue::Integer(-3)),
        (
            "alpha",
            ChartValue::list([
                ChartValue::Float(0.5),
                ChartValue::Null,
                ChartValue::Bool(true),
                ChartValue::from("label"),
            ]),
        ),
        ("mid", ChartValue::map([("inner", ChartValue::Float(2.25))])),
    ]);

    let text = encode(&value).unwrap();
    assert_eq!(
        text,
        r#"{"zeta":-3,"alpha":[0.5,null,true,"label"],"mid":{"inner":2.25}}"#
    );
    assert_eq!(decode(&text), Some(value));
}

#[test]
fn full_precision_floats_decode_to_the_same_bits() {
    let samples = [
        971.9863718547629,
        1.0715660391465826e-75,
        0.1 + 0.2,
        std::f64::consts::PI,
        -2.2250738585072014e-308,
        5e-324,
        f64::MAX,
        123_456_789.123_456_78,
    ];
    let value = ChartValue::list(samples.iter().copied().map(ChartValue::Float));

    let decoded = decode(&encode(&value).unwrap()).unwrap();
    let items = decoded.as_list().unwrap();
    assert_eq!(items.len(), samples.len());
    for (item, expected) in items.iter().zip(samples) {
        let actual = item.as_f64().unwrap();
        assert_eq!(actual.to_bits(), expected.to_bits(), "{expected:e} became {actual:e}");
    }
}

#[test]
fn light_curve_samples_survive_roundtrip() {
    // Deterministic spread of long-mantissa values across [0, 1000).
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let samples: Vec<f64> = (0..2_000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 * 1000.0
        })
        .collect();
    let value = ChartValue::map([(
        "flux",
        ChartValue::list(samples.iter().copied().map(ChartValue::Float)),
    )]);

    let decoded = decode(&encode(&value).unwrap()).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn integers_and_floats_stay_distinct() {
    let decoded = decode("[1, 1.0, 18446744073709551615]").unwrap();
    let items = decoded.as_list().unwrap();

    assert_eq!(items[0], ChartValue::Integer(1));
    assert_eq!(items[1], ChartValue::Float(1.0));
    assert!(matches!(items[2], ChartValue::Float(_)));
}

#[test]
fn encode_rejects_duplicate_keys_with_path() {
    let value = ChartValue::map([(
        "series",
        ChartValue::map([
            ("x", ChartValue::Integer(1)),
            ("x", ChartValue::Integer(2)),
        ]),
    )]);

    match encode(&value).unwrap_err() {
        ChartDataError::DuplicateKey { path, key } => {
            assert_eq!(path, "$.series");
            assert_eq!(key, "x");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn encode_rejects_infinity() {
    let value = ChartValue::list([ChartValue::Float(f64::INFINITY)]);
    assert!(matches!(
        encode(&value).unwrap_err(),
        ChartDataError::NonFiniteNumber { .. }
    ));
}

#[test]
fn nesting_below_limit_survives_roundtrip() {
    let mut value = ChartValue::Integer(7);
    for _ in 0..MAX_CHART_DEPTH {
        value = ChartValue::list([value]);
    }

    let text = encode(&value).unwrap();
    assert_eq!(decode(&text), Some(value));
}

#[test]
fn decode_repeated_keys_keeps_first_position_and_last_value() {
    let decoded = decode(r#"{"a":1,"b":2,"a":3}"#).unwrap();
    assert_eq!(
        decoded,
        ChartValue::map([("a", ChartValue::Integer(3)), ("b", ChartValue::Integer(2))])
    );
}

#[test]
fn decode_malformed_text_returns_none() {
    for text in ["", "{", "[1, 2", "{\"a\": }", "not json", "{\"a\":1} trailing"] {
        assert_eq!(decode(text), None, "expected None for {text:?}");
    }
}

#[test]
fn chart_value_accessors_read_nested_entries() {
    let decoded = decode(r#"{"title":"Transit","visible":true,"depth":0.012}"#).unwrap();

    assert_eq!(decoded.get("title").and_then(ChartValue::as_str), Some("Transit"));
    assert_eq!(decoded.get("visible").and_then(ChartValue::as_bool), Some(true));
    assert_eq!(decoded.get("depth").and_then(ChartValue::as_f64), Some(0.012));
    assert!(decoded.get("missing").is_none());
    assert!(ChartValue::default().is_null());
}
