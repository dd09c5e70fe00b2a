//! [`Value`] graphs → serde data.
//!
//! [`ValueDeserializer`] reads a value graph back into any type implementing
//! `Deserialize`. Records are presented as maps keyed by field name, so a
//! struct record produced by [`to_value`](crate::to_value) deserializes into
//! the Rust struct it came from:
//!
//! ```rust
//! use rmxml::{from_value, FieldMap, Value};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Actor { name: String, level: u32 }
//!
//! let value = Value::object("Actor", FieldMap::new());
//! value.set_field("name", Value::from("Ralph"));
//! value.set_field("level", Value::from(3));
//!
//! let actor: Actor = from_value(value).unwrap();
//! assert_eq!(actor, Actor { name: "Ralph".to_string(), level: 3 });
//! ```
//!
//! ## Lossy Kinds
//!
//! Serde's data model has no rationals, complex numbers or times. These are
//! handed to the visitor as strings (`3/4`, `(1+2i)`, RFC 3339). Ranges become
//! maps with `begin`, `end` and `exclude_end` keys. Special values cannot be
//! deserialized; use [`Value::downcast_special`] instead.
//!
//! Records are copied out field by field, so a cyclic graph fails with
//! [`Error::DepthLimitExceeded`](crate::Error::DepthLimitExceeded) instead of
//! overflowing the stack.

use crate::{Error, Result, Value};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::de::{self, DeserializeOwned};
use serde::forward_to_deserialize_any;

/// Nesting limit while copying a graph out. Lower than the codec's default
/// since every level costs several visitor frames.
const MAX_DEPTH: usize = 128;

/// Deserializer that reads from an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
    depth: usize,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value, depth: 0 }
    }
}

/// Deserializer for a value nested one level below `depth`.
fn nested(value: Value, depth: usize) -> Result<ValueDeserializer> {
    let depth = depth + 1;
    if depth > MAX_DEPTH {
        return Err(Error::depth_limit(MAX_DEPTH, &value.type_name()));
    }
    Ok(ValueDeserializer { value, depth })
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let depth = self.depth;
        match self.value {
            Value::Nil => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::BigInt(b) => visit_bigint(b, visitor),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Str(s) | Value::Symbol(s) => visitor.visit_string(s),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items, depth)),
            Value::Map(map) => {
                let entries = map.into_iter().collect();
                visitor.visit_map(MapDeserializer::new(entries, depth))
            }
            Value::Range(range) => {
                let entries = vec![
                    (Value::from("begin"), range.begin),
                    (Value::from("end"), range.end),
                    (Value::from("exclude_end"), Value::Bool(range.exclude_end)),
                ];
                visitor.visit_map(MapDeserializer::new(entries, depth))
            }
            Value::Rational(r) => visitor.visit_string(r.to_string()),
            value @ Value::Complex(_) => visitor.visit_string(value.to_string()),
            Value::Time(t) => visitor.visit_string(t.to_rfc3339()),
            Value::Struct(shared) | Value::Object(shared) => {
                let entries = shared
                    .borrow()
                    .fields
                    .iter()
                    .map(|(name, field)| (Value::from(name.as_str()), field.clone()))
                    .collect();
                visitor.visit_map(MapDeserializer::new(entries, depth))
            }
            Value::Special(shared) => {
                let class_name = shared.borrow().class_name().to_string();
                Err(Error::custom(format!(
                    "special value {} cannot be deserialized",
                    class_name
                )))
            }
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Nil => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Symbol(variant) | Value::Str(variant) => {
                visitor.visit_enum(EnumDeserializer::new(variant, None, self.depth))
            }
            Value::Map(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((Value::Symbol(variant) | Value::Str(variant), payload)) => visitor
                        .visit_enum(EnumDeserializer::new(variant, Some(payload), self.depth)),
                    _ => Err(Error::custom("enum variant key must be a symbol or string")),
                }
            }
            other => Err(Error::custom(format!(
                "expected enum variant, found {}",
                other.type_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

fn visit_bigint<'de, V>(value: BigInt, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    if let Some(i) = value.to_i64() {
        visitor.visit_i64(i)
    } else if let Some(u) = value.to_u64() {
        visitor.visit_u64(u)
    } else if let Some(i) = value.to_i128() {
        visitor.visit_i128(i)
    } else if let Some(u) = value.to_u128() {
        visitor.visit_u128(u)
    } else {
        visitor.visit_string(value.to_string())
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
    depth: usize,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>, depth: usize) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
            depth,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(nested(value, self.depth)?).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
    depth: usize,
}

impl MapDeserializer {
    fn new(entries: Vec<(Value, Value)>, depth: usize) -> Self {
        MapDeserializer {
            iter: entries.into_iter(),
            value: None,
            depth,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(nested(key, self.depth)?).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(nested(value, self.depth)?),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
    depth: usize,
}

impl EnumDeserializer {
    fn new(variant: String, value: Option<Value>, depth: usize) -> Self {
        EnumDeserializer {
            variant,
            value,
            depth,
        }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::Str(self.variant)))?;
        let access = VariantDeserializer {
            value: self.value,
            depth: self.depth,
        };
        Ok((variant, access))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
    depth: usize,
}

impl VariantDeserializer {
    fn payload(self, expected: &str) -> Result<ValueDeserializer> {
        match self.value {
            Some(value) => nested(value, self.depth),
            None => Err(Error::custom(format!("expected {} variant", expected))),
        }
    }
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Nil) | None => Ok(()),
            _ => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.payload("newtype")?)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self.payload("tuple")?, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self.payload("struct")?, visitor)
    }
}

/// Converts a [`Value`] into any `T: DeserializeOwned`.
///
/// # Errors
///
/// Fails when the graph's shape does not match `T`, when it contains a
/// special value, or when it nests (or cycles) deeper than the default depth
/// limit.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}
