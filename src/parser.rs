//! Tagged tree → object graph.
//!
//! The [`Parser`] walks a [`TreeNode`] depth-first and dispatches on each
//! node's tag. Records are allocated empty and registered under their `id`
//! *before* their children are read, so a field may refer back to the record
//! that contains it, or to any record completed earlier in traversal order.
//! References to ids that appear later in the tree are not supported and fail
//! with [`Error::UnresolvedReference`].
//!
//! ## Usage
//!
//! ```rust
//! use rmxml::{generate, parse, FieldMap, Value};
//!
//! let node = Value::object("Node", FieldMap::new());
//! node.set_field("next", node.clone());
//!
//! let back = parse(&generate(&node).unwrap()).unwrap();
//! assert!(back.field("next").unwrap().same_object(&back));
//! ```
//!
//! ## Unknown Tags
//!
//! By default a tag that is neither built in nor registered decodes to
//! [`Value::Nil`] and logs a warning. With [`CodecOptions::strict_tags`] it
//! fails with [`Error::UnknownTag`] instead.

use crate::map::ValueMap;
use crate::node::TreeNode;
use crate::options::CodecOptions;
use crate::registry::TypeRegistry;
use crate::table::{ObjectId, ReferenceTable};
use crate::tag::{Tag, ATTR_CLASS_NAME, ATTR_FIELD, ATTR_ID, ATTR_RANGE_PART};
use crate::value::{ComplexValue, Object, RangeValue, Value};
use crate::{Error, Result};
use chrono::{FixedOffset, TimeZone};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

/// Decodes tagged trees back into object graphs.
///
/// Owns the id → record table for the call in progress; [`Parser::parse`]
/// resets it.
pub struct Parser<'r> {
    registry: &'r TypeRegistry,
    options: CodecOptions,
    refs: ReferenceTable,
    path: Vec<String>,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_options(registry, CodecOptions::default())
    }

    pub fn with_options(registry: &'r TypeRegistry, options: CodecOptions) -> Self {
        Parser {
            registry,
            options,
            refs: ReferenceTable::new(),
            path: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Decodes a whole tree, starting from a fresh reference table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedNode`] when a node lacks what its decoder
    /// needs, [`Error::UnresolvedReference`] for dangling or forward
    /// references, [`Error::UnknownTag`] in strict mode, and
    /// [`Error::DepthLimitExceeded`] for trees nested too deeply.
    pub fn parse(&mut self, root: &TreeNode) -> Result<Value> {
        self.refs.clear();
        self.path.clear();
        let value = self.load_node(root)?;
        log::debug!("parsed {} records", self.refs.len());
        Ok(value)
    }

    /// Decodes one node and everything below it.
    pub fn load_node(&mut self, node: &TreeNode) -> Result<Value> {
        let segment = match node
            .attribute(ATTR_FIELD)
            .or_else(|| node.attribute(ATTR_RANGE_PART))
        {
            Some(label) => format!("{}@{}", node.tag, label),
            None => node.tag.clone(),
        };
        self.path.push(segment);
        if self.path.len() > self.options.max_depth {
            return Err(Error::depth_limit(self.options.max_depth, &self.current_path()));
        }
        let value = self.decode(node)?;
        self.path.pop();
        Ok(value)
    }

    fn decode(&mut self, node: &TreeNode) -> Result<Value> {
        let tag = match self.registry.resolve(&node.tag) {
            Some(tag) => tag,
            None if self.options.strict_tags => {
                return Err(Error::unknown_tag(&node.tag, &self.current_path()))
            }
            None => {
                log::warn!(
                    "unknown tag <{}> at {} read as nil",
                    node.tag,
                    self.current_path()
                );
                return Ok(Value::Nil);
            }
        };

        let value = match tag {
            Tag::Nil => Value::Nil,
            Tag::True => Value::Bool(true),
            Tag::False => Value::Bool(false),
            Tag::Integer => Value::Integer(self.parse_text(node)?),
            Tag::BigInt => Value::BigInt(self.parse_text::<BigInt>(node)?),
            Tag::Float => Value::Float(self.parse_text(node)?),
            Tag::Str => Value::Str(node.text().unwrap_or_default().to_string()),
            Tag::Symbol => Value::Symbol(node.text().unwrap_or_default().to_string()),
            Tag::Array => Value::Array(
                node.children
                    .iter()
                    .map(|child| self.load_node(child))
                    .collect::<Result<_>>()?,
            ),
            Tag::Map => {
                if node.children.len() % 2 != 0 {
                    return Err(self.malformed(node, "map needs an even number of children"));
                }
                let mut map = ValueMap::with_capacity(node.children.len() / 2);
                for pair in node.children.chunks_exact(2) {
                    let key = self.load_node(&pair[0])?;
                    let item = self.load_node(&pair[1])?;
                    // keys may reference records still being filled in
                    map.push(key, item);
                }
                Value::Map(map)
            }
            Tag::Range => {
                self.expect_children(node, 3)?;
                let begin = self.load_child(node, 0)?;
                let end = self.load_child(node, 1)?;
                let exclude_end = match Tag::builtin(&node.children[2].tag) {
                    Some(Tag::True) => true,
                    Some(Tag::False) => false,
                    _ => {
                        return Err(self.malformed(
                            node,
                            &format!(
                                "exclude_end flag must be <true> or <false>, found <{}>",
                                node.children[2].tag
                            ),
                        ))
                    }
                };
                Value::Range(Box::new(RangeValue {
                    begin,
                    end,
                    exclude_end,
                }))
            }
            Tag::Rational => {
                self.expect_children(node, 2)?;
                let numer = self.child_bigint(node, 0)?;
                let denom = self.child_bigint(node, 1)?;
                if denom.is_zero() {
                    return Err(self.malformed(node, "zero denominator"));
                }
                Value::Rational(BigRational::new(numer, denom))
            }
            Tag::Complex => {
                self.expect_children(node, 2)?;
                let re = self.load_child(node, 0)?;
                let im = self.load_child(node, 1)?;
                Value::Complex(Box::new(ComplexValue { re, im }))
            }
            Tag::Time => self.decode_time(node)?,
            Tag::Struct | Tag::Object => self.decode_object(tag, node)?,
            Tag::Reference => {
                let id = ObjectId::parse(node.text().unwrap_or_default())
                    .ok_or_else(|| self.malformed(node, "reference text is not an id"))?;
                match self.refs.resolve(id) {
                    Some(value) => {
                        log::trace!("{} resolved ref {}", self.current_path(), id);
                        value
                    }
                    None => {
                        return Err(Error::unresolved_reference(
                            id.as_u32(),
                            &self.current_path(),
                        ))
                    }
                }
            }
            Tag::Special(tag) => self.decode_special(tag, node)?,
        };
        Ok(value)
    }

    fn decode_time(&mut self, node: &TreeNode) -> Result<Value> {
        self.expect_children(node, 7)?;
        let mut parts = [0i64; 7];
        for (index, part) in parts.iter_mut().enumerate() {
            *part = self.child_i64(node, index)?;
        }
        let narrow = |parser: &Self, value: i64| {
            i32::try_from(value).map_err(|_| parser.malformed(node, "time component out of range"))
        };
        let [year, month, day, hour, minute, second, offset] = parts;
        let offset = FixedOffset::east_opt(narrow(self, offset)?)
            .ok_or_else(|| self.malformed(node, "UTC offset out of range"))?;
        let time = offset
            .with_ymd_and_hms(
                narrow(self, year)?,
                narrow(self, month)? as u32,
                narrow(self, day)? as u32,
                narrow(self, hour)? as u32,
                narrow(self, minute)? as u32,
                narrow(self, second)? as u32,
            )
            .single()
            .ok_or_else(|| self.malformed(node, "not a valid calendar time"))?;
        Ok(Value::Time(time))
    }

    fn decode_object(&mut self, tag: Tag, node: &TreeNode) -> Result<Value> {
        let class_name = self.require_attribute(node, ATTR_CLASS_NAME)?.to_string();
        let id = self.require_id(node)?;

        // Register the empty record first so fields can point back at it.
        let shared = Rc::new(RefCell::new(Object::new(class_name)));
        let value = match tag {
            Tag::Struct => Value::Struct(Rc::clone(&shared)),
            _ => Value::Object(Rc::clone(&shared)),
        };
        self.refs.register(id, value.clone());

        for child in &node.children {
            let name = match child.attribute(ATTR_FIELD) {
                Some(name) => name,
                None => return Err(self.malformed(node, "field node without attribute-name")),
            };
            let field = self.load_node(child)?;
            shared.borrow_mut().fields.insert(name, field);
        }
        Ok(value)
    }

    fn decode_special(&mut self, tag: &'static str, node: &TreeNode) -> Result<Value> {
        let class_name = self.require_attribute(node, ATTR_CLASS_NAME)?.to_string();
        let id = self.require_id(node)?;
        let decode = self
            .registry
            .decoder(tag)
            .ok_or_else(|| Error::unknown_tag(tag, &self.current_path()))?;

        // Placeholder until the special decoder hands back the finished value.
        let placeholder = Rc::new(RefCell::new(Object::new(class_name)));
        self.refs.register(id, Value::Object(placeholder));
        let value = Value::Special(decode(self, node)?);
        self.refs.register(id, value.clone());
        Ok(value)
    }

    /// Fails unless `node` has exactly `count` children.
    pub fn expect_children(&self, node: &TreeNode, count: usize) -> Result<()> {
        if node.children.len() == count {
            Ok(())
        } else {
            Err(self.malformed(
                node,
                &format!(
                    "expected {} children, found {}",
                    count,
                    node.children.len()
                ),
            ))
        }
    }

    /// Returns the child at `index`.
    pub fn child<'n>(&self, node: &'n TreeNode, index: usize) -> Result<&'n TreeNode> {
        node.children
            .get(index)
            .ok_or_else(|| self.malformed(node, &format!("missing child {}", index)))
    }

    /// Decodes the child at `index`.
    pub fn load_child(&mut self, node: &TreeNode, index: usize) -> Result<Value> {
        let child = self.child(node, index)?;
        self.load_node(child)
    }

    /// Decodes the child at `index` as a fixed-width integer.
    pub fn child_i64(&mut self, node: &TreeNode, index: usize) -> Result<i64> {
        let value = self.load_child(node, index)?;
        value.as_i64().ok_or_else(|| {
            self.malformed(
                node,
                &format!("child {} must be an integer, found {}", index, value.type_name()),
            )
        })
    }

    /// Decodes the child at `index` as an integer of any size.
    pub fn child_bigint(&mut self, node: &TreeNode, index: usize) -> Result<BigInt> {
        let value = self.load_child(node, index)?;
        value.to_bigint().ok_or_else(|| {
            self.malformed(
                node,
                &format!("child {} must be an integer, found {}", index, value.type_name()),
            )
        })
    }

    /// Decodes the child at `index` as a real number.
    pub fn child_f64(&mut self, node: &TreeNode, index: usize) -> Result<f64> {
        let value = self.load_child(node, index)?;
        value.as_f64().ok_or_else(|| {
            self.malformed(
                node,
                &format!("child {} must be a number, found {}", index, value.type_name()),
            )
        })
    }

    /// Builds a [`Error::MalformedNode`] for `node` at the current path.
    pub fn malformed(&self, node: &TreeNode, msg: &str) -> Error {
        Error::malformed(&node.tag, &self.current_path(), msg)
    }

    fn parse_text<T: FromStr>(&self, node: &TreeNode) -> Result<T> {
        let text = node
            .text()
            .ok_or_else(|| self.malformed(node, "missing text content"))?;
        text.trim()
            .parse()
            .map_err(|_| self.malformed(node, &format!("cannot read {:?}", text)))
    }

    fn require_attribute<'n>(&self, node: &'n TreeNode, name: &str) -> Result<&'n str> {
        node.attribute(name)
            .ok_or_else(|| self.malformed(node, &format!("missing {} attribute", name)))
    }

    fn require_id(&self, node: &TreeNode) -> Result<ObjectId> {
        let text = self.require_attribute(node, ATTR_ID)?;
        ObjectId::parse(text).ok_or_else(|| self.malformed(node, &format!("bad id {:?}", text)))
    }

    fn current_path(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.join("/")
        }
    }
}
