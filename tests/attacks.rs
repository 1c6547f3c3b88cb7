//! Adversarial inputs: everything here must fail cleanly or produce a
//! bounded value, never panic, hang, or recurse unboundedly.

use safe_yaml::{load, Value};

#[test]
fn arbitrary_type_instantiation_is_refused() {
    for input in [
        "!!python/object/apply:os.system ['rm -rf /']",
        "!!java/object:java.lang.Runtime {}",
        "!custom {a: 1}",
        "!<tag:example.com,2024:exploit> payload",
    ] {
        let err = load(input).unwrap_err();
        assert!(
            err.to_string().contains("could not determine a constructor"),
            "{input}: {err}"
        );
    }
}

#[test]
fn alias_reuse_is_shared_not_expanded() {
    // The classic amplification shape: each level refers to the previous
    // one twice. Sharing keeps the result small.
    let yaml = "a: &a [x]\nb: &b [*a, *a]\nc: &c [*b, *b]\nd: &d [*c, *c]\n";
    let value = load(yaml).unwrap();
    let d = value.get("d").unwrap();
    let d = d.as_seq().unwrap().borrow();
    assert_eq!(d.len(), 2);
    assert_eq!(d[0].collection_id(), d[1].collection_id());
}

#[test]
fn deeply_nested_flow_sequences_parse() {
    let depth = 200;
    let yaml = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let value = load(&yaml).unwrap();
    assert!(value.as_seq().is_some());
}

#[test]
fn unterminated_collections_fail_cleanly() {
    assert!(load("[1, 2").is_err());
    assert!(load("{a: 1").is_err());
    assert!(load("\"open").is_err());
    assert!(load("'open").is_err());
}

#[test]
fn reserved_indicators_cannot_start_tokens() {
    for input in ["@reserved\n", "`reserved\n"] {
        let err = load(input).unwrap_err();
        assert!(
            err.to_string().contains("cannot start any token"),
            "{input}: {err}"
        );
    }
}

#[test]
fn self_referential_structures_stay_bounded() {
    // A cycle constructs as a shared handle; walking one level proves the
    // loop closes instead of expanding.
    let value = load("&a {self: *a}").unwrap();
    let inner = value.get("self").unwrap();
    let inner_again = inner.get("self").unwrap();
    assert_eq!(inner.collection_id(), inner_again.collection_id());
}

#[test]
fn cyclic_mapping_key_is_refused_not_looped() {
    assert!(load("&a {*a: 1}").is_err());
    assert!(load("? &k {inner: *k}\n: v\n").is_err());
}

#[test]
fn huge_plain_scalar_scans() {
    let body = "word ".repeat(10_000);
    let yaml = format!("key: {body}\n");
    let value = load(&yaml).unwrap();
    match value.get("key") {
        Some(Value::Str(s)) => assert!(s.len() >= 40_000),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn nul_and_control_bytes_do_not_confuse_the_scanner() {
    // A decoded stream cannot contain a real NUL; the sentinel must not be
    // forgeable through escapes.
    let value = load(r#""\0""#).unwrap();
    assert_eq!(value, Value::Str("\0".to_string()));
}
