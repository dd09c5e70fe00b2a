//! Special types and the registry that dispatches to them.
//!
//! A special type is a record with its own encoder and decoder instead of the
//! generic field-by-field path. It implements [`Special`] (encoding, run on a
//! live value) and [`SpecialDecode`] (decoding, which constructs a new value),
//! then gets registered once under an extension tag:
//!
//! ```rust
//! use rmxml::{
//!     generate_with, parse_with, CodecOptions, Generator, Parser, Result, Special,
//!     SpecialDecode, TreeNode, TypeRegistry, Value,
//! };
//! use std::any::Any;
//!
//! #[derive(Debug, PartialEq)]
//! struct Point(i64, i64);
//!
//! impl Special for Point {
//!     fn class_name(&self) -> &str {
//!         "Point"
//!     }
//!
//!     fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()> {
//!         generator.add_child(node, &Value::from(self.0))?;
//!         generator.add_child(node, &Value::from(self.1))
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn eq_special(&self, other: &dyn Special) -> bool {
//!         other.as_any().downcast_ref::<Self>() == Some(self)
//!     }
//! }
//!
//! impl SpecialDecode for Point {
//!     const TAG: &'static str = "point";
//!
//!     fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self> {
//!         Ok(Point(parser.child_i64(node, 0)?, parser.child_i64(node, 1)?))
//!     }
//! }
//!
//! let mut registry = TypeRegistry::default();
//! registry.register::<Point>().unwrap();
//!
//! let value = Value::special(Point(3, 4));
//! let tree = generate_with(&value, &registry, CodecOptions::new()).unwrap();
//! assert_eq!(tree.tag, "point");
//!
//! let back = parse_with(&tree, &registry, CodecOptions::new()).unwrap();
//! assert_eq!(back, value);
//! ```

use crate::generator::Generator;
use crate::node::TreeNode;
use crate::parser::Parser;
use crate::special::{Color, Rect, Table, Tone};
use crate::tag::Tag;
use crate::value::SpecialRef;
use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

/// Encoding side of a special type.
pub trait Special: Any + fmt::Debug {
    /// Written into the node's `class-name` attribute.
    fn class_name(&self) -> &str;

    /// Appends this value's components to `node` as ordered children.
    ///
    /// `node` already carries the tag, `class-name` and `id`.
    fn encode(&self, generator: &mut Generator<'_>, node: &mut TreeNode) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another special value.
    fn eq_special(&self, other: &dyn Special) -> bool;
}

/// Decoding side of a special type.
pub trait SpecialDecode: Special + Sized {
    /// Extension tag, unique across built-in and registered tags.
    const TAG: &'static str;

    /// Builds a value from a node produced by [`Special::encode`].
    fn decode(parser: &mut Parser<'_>, node: &TreeNode) -> Result<Self>;
}

/// Type-erased decoder stored in the registry.
pub type DecodeFn = fn(&mut Parser<'_>, &TreeNode) -> Result<SpecialRef>;

fn decode_special<T: SpecialDecode>(
    parser: &mut Parser<'_>,
    node: &TreeNode,
) -> Result<SpecialRef> {
    let shared: SpecialRef = Rc::new(RefCell::new(T::decode(parser, node)?));
    Ok(shared)
}

#[derive(Clone, Copy)]
struct SpecialEntry {
    tag: &'static str,
    decode: DecodeFn,
}

/// Maps special types to their extension tags and decoders.
///
/// Populated once at startup and only read afterwards. Built-in tags are not
/// stored here; [`TypeRegistry::resolve`] falls back to them.
pub struct TypeRegistry {
    by_tag: HashMap<&'static str, SpecialEntry>,
    by_type: HashMap<TypeId, &'static str>,
}

impl TypeRegistry {
    /// Creates a registry with no special types.
    #[must_use]
    pub fn empty() -> Self {
        TypeRegistry {
            by_tag: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// The process-wide default registry holding the stock special types.
    pub fn global() -> &'static TypeRegistry {
        static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TypeRegistry::default)
    }

    /// Registers a special type under [`SpecialDecode::TAG`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTag`] if the tag is a built-in tag, is already
    /// registered, or the type was registered before under another tag.
    pub fn register<T: SpecialDecode>(&mut self) -> Result<&mut Self> {
        let tag = T::TAG;
        if Tag::builtin(tag).is_some()
            || self.by_tag.contains_key(tag)
            || self.by_type.contains_key(&TypeId::of::<T>())
        {
            return Err(Error::DuplicateTag(tag.to_string()));
        }
        self.by_tag.insert(
            tag,
            SpecialEntry {
                tag,
                decode: decode_special::<T>,
            },
        );
        self.by_type.insert(TypeId::of::<T>(), tag);
        log::debug!(
            "registered special type {} as <{}>",
            std::any::type_name::<T>(),
            tag
        );
        Ok(self)
    }

    /// Returns the extension tag of a special value, `None` if its type was never registered.
    #[must_use]
    pub fn tag_of(&self, value: &dyn Special) -> Option<Tag> {
        self.by_type
            .get(&value.as_any().type_id())
            .map(|tag| Tag::Special(*tag))
    }

    /// Resolves a wire name to a built-in or registered tag.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Tag> {
        Tag::builtin(name).or_else(|| {
            self.by_tag
                .get(name)
                .map(|entry| Tag::Special(entry.tag))
        })
    }

    /// Returns the decoder registered for an extension tag.
    #[must_use]
    pub fn decoder(&self, tag: &str) -> Option<DecodeFn> {
        self.by_tag.get(tag).map(|entry| entry.decode)
    }

    /// Registered extension tags, in no particular order.
    pub fn special_tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_tag.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl Default for TypeRegistry {
    /// A registry holding [`Table`], [`Color`], [`Tone`] and [`Rect`].
    fn default() -> Self {
        let mut registry = TypeRegistry::empty();
        let stock = registry
            .register::<Table>()
            .and_then(|r| r.register::<Color>())
            .and_then(|r| r.register::<Tone>())
            .and_then(|r| r.register::<Rect>())
            .map(|_| ());
        if let Err(err) = stock {
            log::error!("stock special type rejected: {}", err);
        }
        registry
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.by_tag.keys().collect();
        tags.sort();
        f.debug_struct("TypeRegistry").field("special_tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_stock_types() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.len(), 4);
        for tag in ["table", "color", "tone", "rect"] {
            assert_eq!(registry.resolve(tag), Some(Tag::Special(tag)));
            assert!(registry.decoder(tag).is_some());
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = TypeRegistry::default();
        assert!(matches!(
            registry.register::<Color>(),
            Err(Error::DuplicateTag(tag)) if tag == "color"
        ));
    }

    #[test]
    fn test_resolve_prefers_builtin() {
        let registry = TypeRegistry::empty();
        assert_eq!(registry.resolve("array"), Some(Tag::Array));
        assert_eq!(registry.resolve("table"), None);
    }

    #[test]
    fn test_tag_of_special_value() {
        let registry = TypeRegistry::default();
        let rect = Rect::new(1, 2, 3, 4);
        assert_eq!(registry.tag_of(&rect), Some(Tag::Special("rect")));
        assert_eq!(TypeRegistry::empty().tag_of(&rect), None);
    }
}
