use safe_yaml::{load, Timestamp, Value};

#[test]
fn boolean_literals() {
    for word in ["yes", "Yes", "TRUE", "on"] {
        assert_eq!(load(word).unwrap(), Value::Bool(true), "{word}");
    }
    for word in ["no", "False", "OFF"] {
        assert_eq!(load(word).unwrap(), Value::Bool(false), "{word}");
    }
    // Words outside the six are plain strings.
    assert_eq!(load("yep").unwrap(), Value::Str("yep".to_string()));
}

#[test]
fn integer_bases_and_underscores() {
    assert_eq!(load("0b101").unwrap(), Value::Int(5));
    assert_eq!(load("0x1A").unwrap(), Value::Int(26));
    assert_eq!(load("0o17").unwrap(), Value::Str("0o17".to_string())); // not a YAML 1.1 form
    assert_eq!(load("017").unwrap(), Value::Int(15));
    assert_eq!(load("-42").unwrap(), Value::Int(-42));
    assert_eq!(load("+42").unwrap(), Value::Int(42));
    assert_eq!(load("1_000_000").unwrap(), Value::Int(1_000_000));
}

#[test]
fn sexagesimal_numbers() {
    assert_eq!(load("1:30").unwrap(), Value::Int(90));
    assert_eq!(load("-2:00:05").unwrap(), Value::Int(-7205));
    assert_eq!(load("1:20.5").unwrap(), Value::Float(80.5));
}

#[test]
fn integers_widen_past_the_native_width() {
    assert_eq!(
        load("9223372036854775807").unwrap(),
        Value::Int(i64::MAX)
    );
    assert_eq!(
        load("9223372036854775808").unwrap(),
        Value::BigInt(i64::MAX as i128 + 1)
    );
    let err = load("!!int 340282366920938463463374607431768211456").unwrap_err();
    assert!(err.to_string().contains("out of range"), "{err}");
}

#[test]
fn float_forms() {
    assert_eq!(load("3.14").unwrap(), Value::Float(3.14));
    assert_eq!(load("-1e3").unwrap(), Value::Float(-1000.0));
    assert_eq!(load(".inf").unwrap(), Value::Float(f64::INFINITY));
    assert_eq!(load("-.inf").unwrap(), Value::Float(f64::NEG_INFINITY));
    match load(".nan").unwrap() {
        Value::Float(f) => assert!(f.is_nan()),
        other => panic!("expected a float, got {other:?}"),
    }
}

#[test]
fn explicit_tags_override_resolution() {
    assert_eq!(load("!!str 42").unwrap(), Value::Str("42".to_string()));
    assert_eq!(load("!!int '42'").unwrap(), Value::Int(42));
    let err = load("!!int 'not a number'").unwrap_err();
    assert!(err.to_string().contains("invalid integer"), "{err}");
}

#[test]
fn quoted_scalars_stay_strings() {
    assert_eq!(load("'42'").unwrap(), Value::Str("42".to_string()));
    assert_eq!(load("\"yes\"").unwrap(), Value::Str("yes".to_string()));
    assert_eq!(load("\"~\"").unwrap(), Value::Str("~".to_string()));
}

#[test]
fn null_spellings() {
    for spelling in ["~", "null", "Null", "NULL", ""] {
        assert_eq!(load(spelling).unwrap(), Value::Null, "{spelling:?}");
    }
}

#[test]
fn binary_decodes_across_line_breaks() {
    let yaml = "data: !!binary |\n  R0lG\n  ODlh\n";
    let value = load(yaml).unwrap();
    assert_eq!(
        value.get("data"),
        Some(Value::Binary(vec![0x47, 0x49, 0x46, 0x38, 0x39, 0x61]))
    );
}

#[test]
fn malformed_binary_is_a_construction_error() {
    let err = load("!!binary 'not base64!'").unwrap_err();
    assert!(err.to_string().contains("base64"), "{err}");
}

#[test]
fn timestamps_resolve_and_normalize() {
    let value = load("date: 2002-12-14\nstamp: 2001-12-14 21:59:43.10 -5\n").unwrap();
    match value.get("date") {
        Some(Value::Timestamp(Timestamp::Date(date))) => {
            assert_eq!(date.to_string(), "2002-12-14");
        }
        other => panic!("expected a date, got {other:?}"),
    }
    match value.get("stamp") {
        Some(Value::Timestamp(Timestamp::DateTime(stamp))) => {
            assert_eq!(stamp.to_rfc3339(), "2001-12-15T02:59:43.100+00:00");
        }
        other => panic!("expected a timestamp, got {other:?}"),
    }
}

#[test]
fn malformed_timestamp_is_a_construction_error() {
    let err = load("!!timestamp 2001-99-99").unwrap_err();
    assert!(err.to_string().contains("invalid timestamp"), "{err}");
}

#[test]
fn double_quoted_escapes_decode() {
    let value = load(r#"s: "tab\t break\n \x41 Ж \U0001F600""#).unwrap();
    assert_eq!(
        value.get("s"),
        Some(Value::Str("tab\t break\n A \u{416} \u{1F600}".to_string()))
    );
}
