//! Object graph → tagged tree.
//!
//! The [`Generator`] walks a [`Value`] depth-first. Every record gets an id the
//! first time it is visited, before its fields are walked; every later visit
//! of the same record emits a `ref` node carrying that id instead of expanding
//! it again. This is what lets shared records and cycles survive the trip.
//!
//! ## Usage
//!
//! ```rust
//! use rmxml::{generate, FieldMap, Value};
//!
//! let actor = Value::object("Actor", FieldMap::new());
//! actor.set_field("name", Value::from("Ralph"));
//! actor.set_field("self", actor.clone());
//!
//! let tree = generate(&actor).unwrap();
//! assert_eq!(tree.tag, "object");
//! assert_eq!(tree.attribute("id"), Some("0"));
//! assert_eq!(tree.children[1].tag, "ref");
//! assert_eq!(tree.children[1].text(), Some("0"));
//! ```
//!
//! ## Node Shapes
//!
//! | Value | Node |
//! |---|---|
//! | nil, true, false | tag only |
//! | int, bigint, float, str, sym | text content |
//! | array | one child per element |
//! | map | key, value, key, value, ... |
//! | range | begin (`a="begin"`), end (`a="end"`), then a `true`/`false` node with `a="exclude_end"` |
//! | rational, complex | two children |
//! | time | year, month, day, hour, minute, second, UTC offset in seconds (sub-second digits are dropped) |
//! | struct, object | `class-name` and `id` attributes, one child per field stamped with `attribute-name` |
//! | special | `class-name` and `id` attributes, children written by the type's encoder |
//! | ref | the referenced id as text |

use crate::node::TreeNode;
use crate::options::CodecOptions;
use crate::registry::TypeRegistry;
use crate::table::{IdentityTable, ObjectId};
use crate::tag::{
    Tag, ATTR_CLASS_NAME, ATTR_FIELD, ATTR_ID, ATTR_RANGE_PART, RANGE_BEGIN, RANGE_END,
    RANGE_EXCLUDE_END,
};
use crate::value::Value;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Encodes object graphs into tagged trees.
///
/// A generator borrows a read-only [`TypeRegistry`] and owns the identity
/// table for the call in progress; [`Generator::generate`] resets it, so one
/// generator can be reused for several independent graphs.
pub struct Generator<'r> {
    registry: &'r TypeRegistry,
    options: CodecOptions,
    ids: IdentityTable,
    path: Vec<String>,
}

impl<'r> Generator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_options(registry, CodecOptions::default())
    }

    pub fn with_options(registry: &'r TypeRegistry, options: CodecOptions) -> Self {
        Generator {
            registry,
            options,
            ids: IdentityTable::new(),
            path: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Encodes a whole graph, starting from a fresh identity table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for special values whose type is not
    /// registered, and [`Error::DepthLimitExceeded`] for graphs nested deeper
    /// than [`CodecOptions::max_depth`].
    pub fn generate(&mut self, root: &Value) -> Result<TreeNode> {
        self.ids.clear();
        self.path.clear();
        let result = self.visit(root, None);
        let records = self.ids.len();
        // release the handles the table kept for this graph
        self.ids.clear();
        let node = result?;
        log::debug!(
            "generated {} nodes for {} records",
            node.node_count(),
            records
        );
        Ok(node)
    }

    /// Picks the tag `value` is written with.
    ///
    /// Nil first, then references to records already visited in this call, then
    /// the value's own kind. The reference check runs before the kind so that a
    /// record seen twice is never expanded twice.
    pub fn type_of(&self, value: &Value) -> Result<Tag> {
        if value.is_nil() {
            return Ok(Tag::Nil);
        }
        if let Some(identity) = value.identity() {
            if self.ids.lookup(identity).is_some() {
                return Ok(Tag::Reference);
            }
        }
        let tag = match value {
            Value::Nil => Tag::Nil,
            Value::Bool(b) => Tag::from_bool(*b),
            Value::Integer(_) => Tag::Integer,
            Value::BigInt(_) => Tag::BigInt,
            Value::Float(_) => Tag::Float,
            Value::Str(_) => Tag::Str,
            Value::Symbol(_) => Tag::Symbol,
            Value::Array(_) => Tag::Array,
            Value::Map(_) => Tag::Map,
            Value::Range(_) => Tag::Range,
            Value::Rational(_) => Tag::Rational,
            Value::Complex(_) => Tag::Complex,
            Value::Time(_) => Tag::Time,
            Value::Struct(_) => Tag::Struct,
            Value::Object(_) => Tag::Object,
            Value::Special(shared) => {
                let special = shared.borrow();
                match self.registry.tag_of(&*special) {
                    Some(tag) => tag,
                    None => {
                        return Err(Error::unsupported_type(
                            special.class_name(),
                            &self.current_path(),
                        ))
                    }
                }
            }
        };
        Ok(tag)
    }

    /// Encodes one value (and everything below it) into a new node.
    pub fn add_node(&mut self, value: &Value) -> Result<TreeNode> {
        self.visit(value, None)
    }

    /// Encodes `value` and appends it to `parent`.
    pub fn add_child(&mut self, parent: &mut TreeNode, value: &Value) -> Result<()> {
        let child = self.visit(value, None)?;
        parent.push(child);
        Ok(())
    }

    /// Encodes a named field of a record and appends it to `parent`,
    /// stamped with an `attribute-name` marker.
    pub fn add_field(&mut self, parent: &mut TreeNode, name: &str, value: &Value) -> Result<()> {
        let mut child = self.visit(value, Some(name))?;
        child.set_attribute(ATTR_FIELD, name);
        parent.push(child);
        Ok(())
    }

    fn visit(&mut self, value: &Value, label: Option<&str>) -> Result<TreeNode> {
        let tag = self.type_of(value)?;
        let segment = match label {
            Some(label) => format!("{}@{}", tag, label),
            None => tag.name().to_string(),
        };
        self.path.push(segment);
        if self.path.len() > self.options.max_depth {
            return Err(Error::depth_limit(self.options.max_depth, &self.current_path()));
        }
        let mut node = TreeNode::tagged(tag);
        self.encode(tag, value, &mut node)?;
        self.path.pop();
        Ok(node)
    }

    fn encode(&mut self, tag: Tag, value: &Value, node: &mut TreeNode) -> Result<()> {
        match (tag, value) {
            (Tag::Nil | Tag::True | Tag::False, _) => {}
            (Tag::Reference, _) => {
                let id = self.reference_id(value)?;
                log::trace!("{} -> ref {}", self.current_path(), id);
                node.text = Some(id.to_string());
            }
            (Tag::Integer, Value::Integer(i)) => node.text = Some(i.to_string()),
            (Tag::BigInt, Value::BigInt(b)) => node.text = Some(b.to_string()),
            (Tag::Float, Value::Float(x)) => node.text = Some(format!("{:?}", x)),
            (Tag::Str, Value::Str(s)) | (Tag::Symbol, Value::Symbol(s)) => {
                node.text = Some(s.clone())
            }
            (Tag::Array, Value::Array(items)) => {
                for item in items {
                    self.add_child(node, item)?;
                }
            }
            (Tag::Map, Value::Map(map)) => {
                for (key, item) in map.iter() {
                    self.add_child(node, key)?;
                    self.add_child(node, item)?;
                }
            }
            (Tag::Range, Value::Range(range)) => {
                let mut begin = self.visit(&range.begin, Some(RANGE_BEGIN))?;
                begin.set_attribute(ATTR_RANGE_PART, RANGE_BEGIN);
                node.push(begin);

                let mut end = self.visit(&range.end, Some(RANGE_END))?;
                end.set_attribute(ATTR_RANGE_PART, RANGE_END);
                node.push(end);

                // the flag's tag is its value
                node.push(
                    TreeNode::tagged(Tag::from_bool(range.exclude_end))
                        .with_attribute(ATTR_RANGE_PART, RANGE_EXCLUDE_END),
                );
            }
            (Tag::Rational, Value::Rational(r)) => {
                self.add_child(node, &integer_value(r.numer()))?;
                self.add_child(node, &integer_value(r.denom()))?;
            }
            (Tag::Complex, Value::Complex(c)) => {
                self.add_child(node, &c.re)?;
                self.add_child(node, &c.im)?;
            }
            (Tag::Time, Value::Time(t)) => encode_time(t, node),
            (Tag::Struct, Value::Struct(shared)) | (Tag::Object, Value::Object(shared)) => {
                let id = self.assign_id(value)?;
                let object = shared.borrow();
                log::trace!("{} assigned id {} to {}", self.current_path(), id, object.class_name);
                node.set_attribute(ATTR_CLASS_NAME, object.class_name.as_str());
                node.set_attribute(ATTR_ID, id.to_string());
                for (name, field) in object.fields.iter() {
                    self.add_field(node, name, field)?;
                }
            }
            (Tag::Special(_), Value::Special(shared)) => {
                let id = self.assign_id(value)?;
                let special = shared.borrow();
                log::trace!(
                    "{} assigned id {} to special {}",
                    self.current_path(),
                    id,
                    special.class_name()
                );
                node.set_attribute(ATTR_CLASS_NAME, special.class_name());
                node.set_attribute(ATTR_ID, id.to_string());
                special.encode(self, node)?;
            }
            (tag, value) => {
                return Err(Error::custom(format!(
                    "tag <{}> does not match a {} value at {}",
                    tag,
                    value.type_name(),
                    self.current_path()
                )))
            }
        }
        Ok(())
    }

    fn assign_id(&mut self, value: &Value) -> Result<ObjectId> {
        match self.ids.assign(value) {
            Some(id) => Ok(id),
            None => Err(Error::custom(format!(
                "{} value has no identity at {}",
                value.type_name(),
                self.current_path()
            ))),
        }
    }

    fn reference_id(&self, value: &Value) -> Result<ObjectId> {
        value
            .identity()
            .and_then(|identity| self.ids.lookup(identity))
            .ok_or_else(|| Error::custom(format!("no id assigned at {}", self.current_path())))
    }

    fn current_path(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.join("/")
        }
    }
}

/// Whole seconds only; sub-second digits are not written.
fn encode_time(time: &DateTime<FixedOffset>, node: &mut TreeNode) {
    let parts = [
        i64::from(time.year()),
        i64::from(time.month()),
        i64::from(time.day()),
        i64::from(time.hour()),
        i64::from(time.minute()),
        i64::from(time.second()),
        i64::from(time.offset().local_minus_utc()),
    ];
    for part in parts {
        node.push(TreeNode::tagged(Tag::Integer).with_text(part.to_string()));
    }
}

/// Narrows an integer to the fixed-width kind when it fits.
fn integer_value(value: &BigInt) -> Value {
    match value.to_i64() {
        Some(i) => Value::Integer(i),
        None => Value::BigInt(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{FieldMap, ValueMap};

    fn generate(value: &Value) -> Result<TreeNode> {
        Generator::new(TypeRegistry::global()).generate(value)
    }

    #[test]
    fn test_scalar_nodes() {
        let node = generate(&Value::from(42)).unwrap();
        assert_eq!(node.tag, "int");
        assert_eq!(node.text(), Some("42"));
        assert!(node.children.is_empty());

        let node = generate(&Value::Nil).unwrap();
        assert_eq!(node.tag, "nil");
        assert_eq!(node.text(), None);

        let node = generate(&Value::from(false)).unwrap();
        assert_eq!(node.tag, "false");

        let node = generate(&Value::symbol("hp")).unwrap();
        assert_eq!(node.tag, "sym");
        assert_eq!(node.text(), Some("hp"));

        let node = generate(&Value::from(1.5)).unwrap();
        assert_eq!(node.text(), Some("1.5"));
    }

    #[test]
    fn test_range_flag_is_a_tag() {
        let node = generate(&Value::range(Value::from(1), Value::from(5), true)).unwrap();
        assert_eq!(node.children.len(), 3);
        assert_eq!(node.children[0].attribute("a"), Some("begin"));
        assert_eq!(node.children[1].attribute("a"), Some("end"));
        let flag = &node.children[2];
        assert_eq!(flag.tag, "true");
        assert_eq!(flag.attribute("a"), Some("exclude_end"));
        assert_eq!(flag.text(), None);
        assert!(flag.children.is_empty());
    }

    #[test]
    fn test_map_alternates_keys_and_values() {
        let mut map = ValueMap::new();
        map.insert(Value::from("a"), Value::from(1));
        map.insert(Value::Array(vec![Value::from(2)]), Value::from(3));
        let node = generate(&Value::Map(map)).unwrap();
        let tags: Vec<_> = node.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["str", "int", "array", "int"]);
    }

    #[test]
    fn test_ids_assigned_in_visit_order() {
        let a = Value::object("A", FieldMap::new());
        let b = Value::new_struct("B", FieldMap::new());
        a.set_field("b", b.clone());
        let root = Value::Array(vec![a.clone(), b.clone(), a]);

        let node = generate(&root).unwrap();
        let first = &node.children[0];
        assert_eq!(first.attribute("id"), Some("0"));
        assert_eq!(first.children[0].attribute("id"), Some("1"));
        assert_eq!(first.children[0].attribute("attribute-name"), Some("b"));
        assert_eq!(node.children[1].tag, "ref");
        assert_eq!(node.children[1].text(), Some("1"));
        assert_eq!(node.children[2].text(), Some("0"));
    }

    #[test]
    fn test_generate_resets_ids_between_calls() {
        let a = Value::object("A", FieldMap::new());
        let mut generator = Generator::new(TypeRegistry::global());
        let first = generator.generate(&a).unwrap();
        let second = generator.generate(&a).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.tag, "object");
    }

    #[test]
    fn test_rational_parts_narrow_to_int() {
        let node = generate(&Value::rational(3, 4)).unwrap();
        assert_eq!(node.children[0].tag, "int");
        assert_eq!(node.children[0].text(), Some("3"));
        assert_eq!(node.children[1].text(), Some("4"));
    }

    #[test]
    fn test_unregistered_special_is_unsupported() {
        let registry = TypeRegistry::empty();
        let value = Value::special(crate::special::Rect::new(0, 0, 1, 1));
        let err = Generator::new(&registry).generate(&value).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { ref type_name, .. } if type_name == "Rect"));
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::from(0);
        for _ in 0..10 {
            value = Value::Array(vec![value]);
        }
        let options = CodecOptions::new().with_max_depth(5);
        let err = Generator::with_options(TypeRegistry::global(), options)
            .generate(&value)
            .unwrap_err();
        assert!(matches!(err, Error::DepthLimitExceeded { limit: 5, .. }));
    }
}
