use safe_yaml::{load, Value};

#[test]
fn alias_shares_collection_identity() {
    let value = load("a: &x [1, 2]\nb: *x\n").unwrap();
    let a = value.get("a").unwrap();
    let b = value.get("b").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.collection_id(), b.collection_id());
}

#[test]
fn mutating_shared_collection_is_visible_through_both_names() {
    let value = load("a: &x [1]\nb: *x\n").unwrap();
    let a = value.get("a").unwrap();
    a.as_seq().unwrap().borrow_mut().push(Value::Int(9));
    let b = value.get("b").unwrap();
    assert_eq!(b.as_seq().unwrap().borrow().len(), 2);
}

#[test]
fn scalar_aliases_share_the_value() {
    let value = load("a: &n 5\nb: *n\n").unwrap();
    assert_eq!(value.get("a"), Some(Value::Int(5)));
    assert_eq!(value.get("b"), Some(Value::Int(5)));
}

#[test]
fn self_referential_sequence() {
    let value = load("&a [head, *a]").unwrap();
    let seq = value.as_seq().unwrap();
    assert_eq!(seq.borrow()[0], Value::Str("head".to_string()));
    let tail = seq.borrow()[1].clone();
    assert_eq!(tail.collection_id(), value.collection_id());
}

#[test]
fn self_referential_mapping_value() {
    let value = load("&root\nname: top\nme: *root\n").unwrap();
    let me = value.get("me").unwrap();
    assert_eq!(me.collection_id(), value.collection_id());
    // The inner reference sees the complete mapping.
    assert_eq!(me.get("name"), Some(Value::Str("top".to_string())));
}

#[test]
fn mutual_references_between_siblings() {
    let value = load("left: &l\n  partner: *r\nright: &r\n  partner: *l\n");
    // `*r` appears before `&r` is defined, which is undefined.
    assert!(value.is_err());

    let value = load("left: &l\n  name: l\nright: &r\n  partner: *l\n").unwrap();
    let right = value.get("right").unwrap();
    let partner = right.get("partner").unwrap();
    assert_eq!(
        partner.collection_id(),
        value.get("left").unwrap().collection_id()
    );
}

#[test]
fn recursive_key_raises_a_construction_error() {
    let err = load("? &a [*a]\n: 1\n").unwrap_err();
    assert!(
        err.to_string().contains("found unconstructable recursive node"),
        "{err}"
    );
}

#[test]
fn collection_key_is_allowed_when_acyclic() {
    let value = load("? [1, 2]\n: pair\n").unwrap();
    let map = value.as_map().unwrap().borrow();
    let (key, val) = map.iter().next().unwrap();
    assert_eq!(val, &Value::Str("pair".to_string()));
    assert_eq!(key.as_seq().unwrap().borrow().len(), 2);
}

#[test]
fn undefined_alias_is_an_error() {
    let err = load("a: *ghost\n").unwrap_err();
    assert!(err.to_string().contains("undefined alias"), "{err}");
}

#[test]
fn duplicate_anchor_is_an_error() {
    let err = load("a: &x 1\nb: &x 2\n").unwrap_err();
    assert!(err.to_string().contains("duplicate anchor"), "{err}");
}

#[test]
fn anchors_reset_at_document_boundaries() {
    let err = safe_yaml::load_all("&x 1\n---\n*x\n").unwrap_err();
    assert!(err.to_string().contains("undefined alias"), "{err}");
}

#[test]
fn alias_reuse_does_not_duplicate_contents() {
    // One shared sequence referenced many times stays one object.
    let value = load("base: &b [1, 2, 3]\nuses: [*b, *b, *b]\n").unwrap();
    let uses = value.get("uses").unwrap();
    let uses = uses.as_seq().unwrap().borrow();
    let first = uses[0].collection_id();
    assert!(uses.iter().all(|item| item.collection_id() == first));
}
