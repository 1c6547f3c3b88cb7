use safe_yaml::{load, load_all, Value};

#[test]
fn simple_mapping_preserves_order() {
    let value = load("a: 1\nb: 2\n").unwrap();
    assert_eq!(value.get("a"), Some(Value::Int(1)));
    assert_eq!(value.get("b"), Some(Value::Int(2)));
    let map = value.as_map().unwrap().borrow();
    let keys: Vec<&str> = map.keys().filter_map(Value::as_str).collect();
    assert_eq!(keys, ["a", "b"]);
}

#[test]
fn nested_collections() {
    let value = load("name: John\nage: 80\ndetails: { city: Paris }\n").unwrap();
    assert_eq!(value.get("name"), Some(Value::Str("John".to_string())));
    assert_eq!(value.get("age"), Some(Value::Int(80)));
    let details = value.get("details").unwrap();
    assert_eq!(details.get("city"), Some(Value::Str("Paris".to_string())));
}

#[test]
fn block_sequence_of_mappings() {
    let value = load("- x: 1\n- x: 2\n  y: 3\n").unwrap();
    let seq = value.as_seq().unwrap().borrow();
    assert_eq!(seq.len(), 2);
    assert_eq!(seq[0].get("x"), Some(Value::Int(1)));
    assert_eq!(seq[1].get("y"), Some(Value::Int(3)));
}

#[test]
fn flow_and_block_styles_agree() {
    let flow = load("{a: [1, 2], b: {c: 3}}").unwrap();
    let block = load("a:\n  - 1\n  - 2\nb:\n  c: 3\n").unwrap();
    assert_eq!(flow, block);
}

#[test]
fn empty_input_loads_as_null() {
    assert_eq!(load("").unwrap(), Value::Null);
    assert_eq!(load("# only a comment\n").unwrap(), Value::Null);
}

#[test]
fn missing_values_are_null() {
    let value = load("a:\nb: 1\n").unwrap();
    assert_eq!(value.get("a"), Some(Value::Null));
    assert_eq!(value.get("b"), Some(Value::Int(1)));
}

#[test]
fn single_quote_escape() {
    let value = load("a: 'it''s'\n").unwrap();
    assert_eq!(value.get("a"), Some(Value::Str("it's".to_string())));
}

#[test]
fn second_document_is_rejected_by_load() {
    let err = load("a: 1\n---\nb: 2\n").unwrap_err();
    assert!(err.to_string().contains("single document"), "{err}");
}

#[test]
fn load_all_returns_documents_in_order() {
    let docs = load_all("---\n1\n---\ntwo\n---\n[3]\n").unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0], Value::Int(1));
    assert_eq!(docs[1], Value::Str("two".to_string()));
    assert_eq!(docs[2].as_seq().unwrap().borrow()[0], Value::Int(3));
}

#[test]
fn errors_carry_positions() {
    let err = load("a: 'unterminated\n").unwrap_err();
    let mark = err.mark();
    assert!(mark.line() >= 1);
    assert!(err.to_string().contains("line"), "{err}");
}

#[test]
fn equivalent_scalar_spellings_construct_equal_values() {
    // Scalars round-trip through the allow-listed shapes regardless of
    // presentation style.
    for (a, b) in [
        ("42", "!!int '42'"),
        ("hello", "\"hello\""),
        ("yes", "!!bool 'yes'"),
        ("3.5", "!!float '3.5'"),
        ("~", "!!null ''"),
    ] {
        assert_eq!(load(a).unwrap(), load(b).unwrap(), "{a} vs {b}");
    }
}
