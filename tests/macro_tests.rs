use rmxml::{generate, parse, value, Value, ValueMap};

#[test]
fn test_value_macro_nil() {
    let value = value!(nil);
    assert_eq!(value, Value::Nil);
}

#[test]
fn test_value_macro_booleans() {
    assert_eq!(value!(true), Value::Bool(true));
    assert_eq!(value!(false), Value::Bool(false));
}

#[test]
fn test_value_macro_numbers() {
    assert_eq!(value!(42), Value::Integer(42));
    assert_eq!(value!(3.5), Value::Float(3.5));
    assert_eq!(value!(-123), Value::Integer(-123));
    assert_eq!(value!(u64::MAX).type_name(), "bigint");
}

#[test]
fn test_value_macro_strings() {
    assert_eq!(value!("hello world"), Value::Str("hello world".to_string()));
    assert_eq!(value!(""), Value::Str(String::new()));
}

#[test]
fn test_value_macro_arrays() {
    assert_eq!(value!([]), Value::Array(vec![]));
    assert_eq!(
        value!([1, 2, 3]),
        Value::Array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );
    assert_eq!(
        value!([[1], [nil, true]]),
        Value::Array(vec![
            Value::Array(vec![Value::Integer(1)]),
            Value::Array(vec![Value::Nil, Value::Bool(true)]),
        ])
    );
}

#[test]
fn test_value_macro_maps_keep_order() {
    let map = value!({"zeta": 1, "alpha": 2, 3: "three"});
    let keys: Vec<_> = map.as_map().unwrap().keys().cloned().collect();
    assert_eq!(
        keys,
        vec![Value::from("zeta"), Value::from("alpha"), Value::from(3)]
    );
}

#[test]
fn test_value_macro_nested_roundtrip() {
    let value = value!({
        "party": {"gold": 500, "steps": 1024},
        "switches": [true, false, true],
        "variables": [0, "", 2.5]
    });
    let back = parse(&generate(&value).unwrap()).unwrap();
    assert_eq!(back, value);

    let mut expected = ValueMap::new();
    expected.insert(Value::from("gold"), Value::from(500));
    expected.insert(Value::from("steps"), Value::from(1024));
    assert_eq!(
        back.as_map().unwrap().get(&Value::from("party")),
        Some(&Value::Map(expected))
    );
}
