//! # rmxml
//!
//! An object-graph codec. It turns an in-memory graph of values into a tagged
//! tree ready for a markup writer, and rebuilds an equivalent graph from such
//! a tree.
//!
//! ## What it preserves
//!
//! - **Identity**: a record reachable from two places is written once and
//!   referenced by id from the other, so it comes back as one shared record
//! - **Cycles**: a record may contain itself, directly or through others
//! - **Scalar kinds**: fixed-width and arbitrary-precision integers, rationals,
//!   complex numbers, symbols and strings all keep their kind
//! - **Special types**: composite types with their own compact encoding, like
//!   the stock [`special::Table`] grid
//!
//! The tree ([`TreeNode`]) is the only contract between the two directions.
//! Writing it out as text is left to the caller; it implements `Serialize` and
//! `Deserialize`, so any serde format works.
//!
//! ## Quick Start
//!
//! ```rust
//! use rmxml::{generate, parse, FieldMap, Value};
//!
//! let actor = Value::object("Actor", FieldMap::new());
//! actor.set_field("name", Value::from("Ralph"));
//! actor.set_field("level", Value::from(12));
//! actor.set_field("rival", actor.clone());
//!
//! let tree = generate(&actor).unwrap();
//! assert_eq!(tree.attribute("class-name"), Some("Actor"));
//!
//! let back = parse(&tree).unwrap();
//! assert_eq!(back.field("name"), Some(Value::from("Ralph")));
//! assert!(back.field("rival").unwrap().same_object(&back));
//! ```
//!
//! ### Shared Records
//!
//! ```rust
//! use rmxml::{generate, parse, FieldMap, Value, ValueMap};
//!
//! let hero = Value::object("Actor", FieldMap::new());
//! let mut map = ValueMap::new();
//! map.insert(Value::from("a"), Value::Array(vec![Value::from(1), Value::from(2), hero.clone()]));
//! map.insert(Value::from("leader"), hero);
//!
//! let tree = generate(&Value::Map(map)).unwrap();
//! let refs = tree.descendants().filter(|n| n.tag == "ref").count();
//! assert_eq!(refs, 1);
//!
//! let back = parse(&tree).unwrap();
//! let map = back.as_map().unwrap();
//! let first = &map.get(&Value::from("a")).unwrap().as_array().unwrap()[2];
//! assert!(first.same_object(map.get(&Value::from("leader")).unwrap()));
//! ```
//!
//! ### Rust Types
//!
//! Anything implementing serde's traits goes through [`to_tree`] and
//! [`from_tree`]:
//!
//! ```rust
//! use rmxml::{from_tree, to_tree};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Item { id: u32, name: String, price: u64 }
//!
//! let item = Item { id: 1, name: "Potion".to_string(), price: 50 };
//! let tree = to_tree(&item).unwrap();
//! assert_eq!(tree.tag, "struct");
//!
//! let back: Item = from_tree(&tree).unwrap();
//! assert_eq!(back, item);
//! ```
//!
//! ## Special Types
//!
//! [`Table`](special::Table), [`Color`](special::Color),
//! [`Tone`](special::Tone) and [`Rect`](special::Rect) are registered by
//! default. See [`registry`] for adding your own.
//!
//! ## Limits
//!
//! - Both engines recurse; [`CodecOptions::max_depth`] bounds the nesting
//! - A `ref` may only point at a record already decoded (no forward references)
//! - Unknown tags decode as nil unless [`CodecOptions::strict_tags`] is set
//! - Times are written to whole seconds
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: `debug` once
//! per call, `trace` for every id assigned or resolved, `warn` for dropped
//! tags. No logger is installed.
//!
//! ## Demos
//!
//! - **`actor_roundtrip.rs`** - A game record written as JSON and read back
//! - **`shared_graph.rs`** - Shared records and cycles
//! - **`special_types.rs`** - Stock and custom special types
//!
//! Run any demo with: `cargo run --example <name>`

pub mod de;
pub mod error;
pub mod generator;
pub mod macros;
pub mod map;
pub mod node;
pub mod options;
pub mod parser;
pub mod registry;
pub mod ser;
pub mod special;
pub mod table;
pub mod tag;
pub mod value;

pub use de::{from_value, ValueDeserializer};
pub use error::{Error, Result};
pub use generator::Generator;
pub use map::{FieldMap, ValueMap};
pub use node::TreeNode;
pub use options::CodecOptions;
pub use parser::Parser;
pub use registry::{Special, SpecialDecode, TypeRegistry};
pub use ser::{to_value, ValueSerializer};
pub use table::ObjectId;
pub use tag::Tag;
pub use value::{ComplexValue, Object, ObjectRef, RangeValue, SpecialRef, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes an object graph with the default registry and options.
///
/// # Examples
///
/// ```rust
/// use rmxml::{generate, Value};
///
/// let tree = generate(&Value::range(Value::from(1), Value::from(5), true)).unwrap();
/// assert_eq!(tree.tag, "range");
/// assert_eq!(tree.children[2].tag, "true");
/// ```
///
/// # Errors
///
/// Returns an error if the graph holds an unregistered special type or nests
/// deeper than the default depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn generate(value: &Value) -> Result<TreeNode> {
    generate_with(value, TypeRegistry::global(), CodecOptions::default())
}

/// Encodes an object graph with a custom registry and options.
///
/// # Errors
///
/// Returns an error if the graph holds a special type `registry` does not
/// know, or nests deeper than `options.max_depth`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn generate_with(
    value: &Value,
    registry: &TypeRegistry,
    options: CodecOptions,
) -> Result<TreeNode> {
    Generator::with_options(registry, options).generate(value)
}

/// Rebuilds an object graph with the default registry and options.
///
/// # Examples
///
/// ```rust
/// use rmxml::{parse, TreeNode, Value};
///
/// let node = TreeNode::new("array")
///     .with_child(TreeNode::new("int").with_text("1"))
///     .with_child(TreeNode::new("sym").with_text("ok"));
/// let value = parse(&node).unwrap();
/// assert_eq!(value, Value::Array(vec![Value::from(1), Value::symbol("ok")]));
/// ```
///
/// # Errors
///
/// Returns an error if a node is malformed, a reference cannot be resolved,
/// or the tree nests deeper than the default depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(node: &TreeNode) -> Result<Value> {
    parse_with(node, TypeRegistry::global(), CodecOptions::default())
}

/// Rebuilds an object graph with a custom registry and options.
///
/// # Errors
///
/// As [`parse`], plus [`Error::UnknownTag`] when `options.strict_tags` is set.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with(
    node: &TreeNode,
    registry: &TypeRegistry,
    options: CodecOptions,
) -> Result<Value> {
    Parser::with_options(registry, options).parse(node)
}

/// Serializes any `T: Serialize` straight to a tree.
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` implementation fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_tree<T>(value: &T) -> Result<TreeNode>
where
    T: ?Sized + Serialize,
{
    generate(&to_value(value)?)
}

/// Deserializes an instance of `T` from a tree.
///
/// # Errors
///
/// Returns an error if the tree does not parse or its graph does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_tree<T>(node: &TreeNode) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(parse(node)?)
}
