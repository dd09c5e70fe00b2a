use chrono::{FixedOffset, TimeZone};
use num_bigint::BigInt;
use rmxml::{
    from_tree, generate, generate_with, parse, parse_with, to_tree, value, CodecOptions, Error,
    FieldMap, TreeNode, TypeRegistry, Value, ValueMap,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Actor {
    name: String,
    level: u32,
    skills: Vec<u16>,
    class: Class,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Class {
    Warrior,
    Mage { school: String },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Party {
    gold: u64,
    members: Vec<Actor>,
    leader: Option<String>,
}

fn roundtrip(value: &Value) -> Value {
    let tree = generate(value).unwrap();
    parse(&tree).unwrap()
}

fn actor(name: &str) -> Value {
    let actor = Value::object("Actor", FieldMap::new());
    actor.set_field("name", Value::from(name));
    actor
}

#[test]
fn test_scalars_roundtrip() {
    for value in [
        Value::Nil,
        Value::Bool(true),
        Value::Bool(false),
        Value::from(-42),
        Value::Float(0.1),
        Value::Float(-2.5e-10),
        Value::from("hello world"),
        Value::from(""),
        Value::symbol("attack"),
    ] {
        assert_eq!(roundtrip(&value), value);
    }
}

#[test]
fn test_symbol_and_string_stay_distinct() {
    let tree = generate(&Value::Array(vec![Value::symbol("a"), Value::from("a")])).unwrap();
    assert_eq!(tree.children[0].tag, "sym");
    assert_eq!(tree.children[1].tag, "str");
    let back = roundtrip(&Value::symbol("a"));
    assert_eq!(back.as_symbol(), Some("a"));
    assert_eq!(back.as_str(), None);
}

#[test]
fn test_bigint_roundtrip() {
    let big: BigInt = "123456789012345678901234567890".parse().unwrap();
    let value = Value::BigInt(big.clone());
    let tree = generate(&value).unwrap();
    assert_eq!(tree.tag, "bigint");
    assert_eq!(tree.text(), Some("123456789012345678901234567890"));
    assert_eq!(roundtrip(&value).to_bigint(), Some(big));
}

#[test]
fn test_rational_three_quarters() {
    let value = Value::rational(3, 4);
    let tree = generate(&value).unwrap();
    assert_eq!(tree.tag, "rational");
    assert_eq!(tree.children[0].text(), Some("3"));
    assert_eq!(tree.children[1].text(), Some("4"));

    let back = roundtrip(&value);
    let r = back.as_rational().unwrap();
    assert_eq!(*r.numer(), BigInt::from(3));
    assert_eq!(*r.denom(), BigInt::from(4));
}

#[test]
fn test_exclusive_range() {
    let value = Value::range(Value::from(1), Value::from(5), true);
    let back = roundtrip(&value);
    let range = back.as_range().unwrap();
    assert_eq!(range.begin, Value::from(1));
    assert_eq!(range.end, Value::from(5));
    assert!(range.exclude_end);

    let inclusive = Value::range(Value::from("a"), Value::from("z"), false);
    assert!(!roundtrip(&inclusive).as_range().unwrap().exclude_end);
}

#[test]
fn test_complex_and_time() {
    let complex = Value::complex(Value::from(1), Value::Float(2.5));
    assert_eq!(roundtrip(&complex), complex);

    let offset = FixedOffset::east_opt(9 * 3600).unwrap();
    let time = offset.with_ymd_and_hms(2024, 2, 29, 12, 30, 45).unwrap();
    let value = Value::Time(time);
    let tree = generate(&value).unwrap();
    let parts: Vec<_> = tree.children.iter().map(|c| c.text().unwrap()).collect();
    assert_eq!(parts, vec!["2024", "2", "29", "12", "30", "45", "32400"]);

    let back = roundtrip(&value);
    assert_eq!(back.as_time(), Some(&time));
    assert_eq!(back.as_time().unwrap().offset(), &offset);
}

#[test]
fn test_map_with_record_keys() {
    let key = actor("Ralph");
    let mut map = ValueMap::new();
    map.insert(key.clone(), Value::from(1));
    map.insert(Value::from(2), key.clone());

    let back = roundtrip(&Value::Map(map));
    let map = back.as_map().unwrap();
    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys[1], Value::from(2));
    assert!(keys[0].same_object(map.get(&Value::from(2)).unwrap()));
}

#[test]
fn test_shared_record_scenario() {
    let obj = actor("Ralph");
    let mut map = ValueMap::new();
    map.insert(
        Value::from("a"),
        Value::Array(vec![Value::from(1), Value::from(2), obj.clone()]),
    );
    map.insert(Value::from("b"), obj);

    let tree = generate(&Value::Map(map)).unwrap();
    let expanded = tree.descendants().filter(|n| n.tag == "object").count();
    let refs: Vec<_> = tree.descendants().filter(|n| n.tag == "ref").collect();
    assert_eq!(expanded, 1);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].text(), Some("0"));

    let back = parse(&tree).unwrap();
    let map = back.as_map().unwrap();
    let third = &map.get(&Value::from("a")).unwrap().as_array().unwrap()[2];
    let other = map.get(&Value::from("b")).unwrap();
    assert!(third.same_object(other));
    assert_eq!(third.field("name"), Some(Value::from("Ralph")));
}

#[test]
fn test_record_keys_made_equal_after_insert() {
    let first = actor("Ralph");
    let second = actor("Ulrika");
    let mut map = ValueMap::new();
    map.insert(first, Value::from(1));
    map.insert(second.clone(), Value::from(2));
    second.set_field("name", Value::from("Ralph"));

    let value = Value::Map(map);
    let tree = generate(&value).unwrap();
    assert_eq!(tree.children.len(), 4);

    let back = parse(&tree).unwrap();
    assert_eq!(back, value);
    let map = back.as_map().unwrap();
    assert_eq!(map.len(), 2);
    let entries: Vec<_> = map.values().cloned().collect();
    assert_eq!(entries, vec![Value::from(1), Value::from(2)]);
}

#[test]
fn test_record_keys_pointing_at_unfinished_owner() {
    // While `m` is read back the owner has no fields yet, so both keys
    // look alike until the owner is filled in.
    let owner = Value::object("Owner", FieldMap::new());
    let stranger = Value::object("Owner", FieldMap::new());
    let near = Value::object("Key", FieldMap::new());
    near.set_field("r", owner.clone());
    let far = Value::object("Key", FieldMap::new());
    far.set_field("r", stranger);
    let mut m = ValueMap::new();
    m.insert(near, Value::from(1));
    m.insert(far, Value::from(2));
    owner.set_field("m", Value::Map(m));
    owner.set_field("z", Value::from(0));

    let back = roundtrip(&owner);
    assert_eq!(back.field("z"), Some(Value::from(0)));
    let m = back.field("m").unwrap();
    let m = m.as_map().unwrap();
    assert_eq!(m.len(), 2);
    let keys: Vec<_> = m.keys().cloned().collect();
    assert!(keys[0].field("r").unwrap().same_object(&back));
    assert!(!keys[1].field("r").unwrap().same_object(&back));
}

#[test]
fn test_self_cycle() {
    let node = actor("loop");
    node.set_field("next", node.clone());

    let back = roundtrip(&node);
    let next = back.field("next").unwrap();
    assert!(next.same_object(&back));
    assert_eq!(next.field("name"), Some(Value::from("loop")));
}

#[test]
fn test_two_record_cycle() {
    let a = actor("a");
    let b = actor("b");
    a.set_field("partner", b.clone());
    b.set_field("partner", a.clone());

    let back = roundtrip(&Value::Array(vec![a, b]));
    let items = back.as_array().unwrap();
    assert!(items[0].field("partner").unwrap().same_object(&items[1]));
    assert!(items[1].field("partner").unwrap().same_object(&items[0]));
}

#[test]
fn test_ids_follow_visit_order() {
    let a = actor("a");
    let b = actor("b");
    let c = actor("c");
    b.set_field("child", c);
    let tree = generate(&Value::Array(vec![a, b])).unwrap();
    let ids: Vec<_> = tree
        .descendants()
        .filter_map(|n| n.attribute("id"))
        .collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
}

#[test]
fn test_struct_and_object_kinds_survive() {
    let record = Value::new_struct("Point", FieldMap::new());
    record.set_field("x", Value::from(1));
    let back = roundtrip(&record);
    assert!(matches!(back, Value::Struct(_)));
    assert!(matches!(roundtrip(&actor("x")), Value::Object(_)));
}

#[test]
fn test_tree_survives_json() {
    let node = actor("Ralph");
    node.set_field("self", node.clone());
    node.set_field("range", Value::range(Value::from(0), Value::from(3), true));
    let tree = generate(&node).unwrap();

    let json = serde_json::to_string(&tree).unwrap();
    let tree_back: TreeNode = serde_json::from_str(&json).unwrap();
    assert_eq!(tree_back, tree);

    let back = parse(&tree_back).unwrap();
    assert!(back.field("self").unwrap().same_object(&back));
}

#[test]
fn test_unknown_tag_policy() {
    let tree = TreeNode::new("array")
        .with_child(TreeNode::new("int").with_text("1"))
        .with_child(TreeNode::new("window"));

    let permissive = parse(&tree).unwrap();
    assert_eq!(permissive, value!([1, nil]));

    let strict = parse_with(&tree, TypeRegistry::global(), CodecOptions::strict());
    match strict {
        Err(Error::UnknownTag { tag, path }) => {
            assert_eq!(tag, "window");
            assert_eq!(path, "array/window");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_forward_reference_is_rejected() {
    let tree = TreeNode::new("array")
        .with_child(TreeNode::new("ref").with_text("0"))
        .with_child(
            TreeNode::new("object")
                .with_attribute("class-name", "Actor")
                .with_attribute("id", "0"),
        );
    assert!(matches!(
        parse(&tree),
        Err(Error::UnresolvedReference { id: 0, .. })
    ));
}

#[test]
fn test_malformed_error_names_path() {
    let tree = TreeNode::new("object")
        .with_attribute("class-name", "Actor")
        .with_attribute("id", "0")
        .with_child(
            TreeNode::new("range")
                .with_attribute("attribute-name", "span")
                .with_child(TreeNode::new("int").with_text("1")),
        );
    match parse(&tree) {
        Err(Error::MalformedNode { tag, path, .. }) => {
            assert_eq!(tag, "range");
            assert_eq!(path, "object/range@span");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_depth_limit_on_parse() {
    let mut tree = TreeNode::new("int").with_text("0");
    for _ in 0..10 {
        tree = TreeNode::new("array").with_child(tree);
    }
    let options = CodecOptions::new().with_max_depth(5);
    assert!(matches!(
        parse_with(&tree, TypeRegistry::global(), options),
        Err(Error::DepthLimitExceeded { limit: 5, .. })
    ));
    assert!(parse(&tree).is_ok());
}

#[test]
fn test_default_depth_limit_fits_small_stack() {
    let nested = |depth: usize| {
        let mut value = Value::from(0);
        for _ in 0..depth {
            value = Value::Array(vec![value]);
        }
        value
    };
    let chain = |length: usize| {
        let mut value = Value::Nil;
        for _ in 0..length {
            let link = Value::object("Link", FieldMap::new());
            link.set_field("next", value);
            value = link;
        }
        value
    };

    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let limit = CodecOptions::new().max_depth;

            // the deepest graphs the defaults accept
            for value in [nested(limit - 1), chain(limit - 1)] {
                let tree = generate(&value).unwrap();
                assert_eq!(parse(&tree).unwrap(), value);
            }

            for value in [nested(limit * 4), chain(limit * 4)] {
                assert!(matches!(
                    generate(&value),
                    Err(Error::DepthLimitExceeded { .. })
                ));
            }

            let mut tree = TreeNode::new("nil");
            for _ in 0..limit * 4 {
                tree = TreeNode::new("array").with_child(tree);
            }
            assert!(matches!(
                parse(&tree),
                Err(Error::DepthLimitExceeded { .. })
            ));
        })
        .unwrap();
    worker.join().unwrap();
}

#[test]
fn test_time_keeps_whole_seconds() {
    let offset = FixedOffset::west_opt(5 * 3600).unwrap();
    let time = offset
        .with_ymd_and_hms(2023, 11, 5, 1, 2, 3)
        .unwrap()
        + chrono::Duration::milliseconds(750);

    let back = roundtrip(&Value::Time(time));
    let expected = offset.with_ymd_and_hms(2023, 11, 5, 1, 2, 3).unwrap();
    assert_eq!(back.as_time(), Some(&expected));
}

#[test]
fn test_generate_with_empty_registry_rejects_specials() {
    let value = Value::special(rmxml::special::Color::rgb(1.0, 2.0, 3.0));
    let result = generate_with(&value, &TypeRegistry::empty(), CodecOptions::new());
    assert!(matches!(result, Err(Error::UnsupportedType { .. })));
}

#[test]
fn test_serde_types_roundtrip() {
    let party = Party {
        gold: 500,
        members: vec![
            Actor {
                name: "Ralph".to_string(),
                level: 12,
                skills: vec![1, 7],
                class: Class::Warrior,
            },
            Actor {
                name: "Ulrika".to_string(),
                level: 9,
                skills: vec![],
                class: Class::Mage {
                    school: "fire".to_string(),
                },
            },
        ],
        leader: None,
    };

    let tree = to_tree(&party).unwrap();
    assert_eq!(tree.attribute("class-name"), Some("Party"));
    let back: Party = from_tree(&tree).unwrap();
    assert_eq!(back, party);
}

#[test]
fn test_generator_is_reusable() {
    let registry = TypeRegistry::default();
    let mut generator = rmxml::Generator::new(&registry);
    let record = actor("x");
    let first = generator.generate(&record).unwrap();
    let second = generator.generate(&record).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.tag, "object");
}
