//! The in-memory object graph.
//!
//! [`Value`] represents anything the codec can encode: scalars, collections,
//! composite numbers, times and records. Records ([`Value::Struct`],
//! [`Value::Object`] and [`Value::Special`]) live behind `Rc<RefCell<_>>`, so
//! one record may appear at several positions of a graph, or inside itself.
//! Identity is pointer identity; everything else is compared by value.
//!
//! ## Creating Values
//!
//! ```rust
//! use rmxml::{FieldMap, Value};
//!
//! let number = Value::from(42);
//! let name = Value::symbol("ralph");
//! let actor = Value::object("Actor", FieldMap::new());
//!
//! // The same record referenced twice
//! let party = Value::Array(vec![actor.clone(), actor.clone()]);
//! assert!(party.as_array().unwrap()[0].same_object(&party.as_array().unwrap()[1]));
//! ```
//!
//! ## Equality
//!
//! `==` is structural and recurses into records. Comparing two *distinct*
//! cyclic graphs recurses without bound; check identity with
//! [`Value::same_object`] there instead.

use crate::map::{FieldMap, ValueMap};
use crate::registry::Special;
use crate::table::Identity;
use chrono::{DateTime, FixedOffset, Utc};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a generic record.
pub type ObjectRef = Rc<RefCell<Object>>;

/// Shared handle to a special-typed record.
pub type SpecialRef = Rc<RefCell<dyn Special>>;

/// A node of an object graph.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    BigInt(BigInt),
    Float(f64),
    Str(String),
    Symbol(String),
    Array(Vec<Value>),
    Map(ValueMap),
    Range(Box<RangeValue>),
    Rational(BigRational),
    Complex(Box<ComplexValue>),
    /// Calendar time with a fixed UTC offset. Encoded to whole seconds, so
    /// sub-second precision does not survive a round trip.
    Time(DateTime<FixedOffset>),
    /// Record with a fixed member list
    Struct(ObjectRef),
    /// Generic record serialized through its field listing
    Object(ObjectRef),
    /// Record with a registered custom encoder and decoder
    Special(SpecialRef),
}

/// A named record: its class name plus its ordered fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub class_name: String,
    pub fields: FieldMap,
}

impl Object {
    /// Creates a record with no fields.
    pub fn new(class_name: impl Into<String>) -> Self {
        Object {
            class_name: class_name.into(),
            fields: FieldMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name, value);
        self
    }
}

/// An interval between two values.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValue {
    pub begin: Value,
    pub end: Value,
    pub exclude_end: bool,
}

/// A complex number with real-valued parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexValue {
    pub re: Value,
    pub im: Value,
}

impl Value {
    /// Creates a symbol.
    pub fn symbol(name: impl Into<String>) -> Value {
        Value::Symbol(name.into())
    }

    /// Allocates a new generic record.
    pub fn object(class_name: impl Into<String>, fields: FieldMap) -> Value {
        Value::Object(Rc::new(RefCell::new(Object {
            class_name: class_name.into(),
            fields,
        })))
    }

    /// Allocates a new struct record.
    pub fn new_struct(class_name: impl Into<String>, fields: FieldMap) -> Value {
        Value::Struct(Rc::new(RefCell::new(Object {
            class_name: class_name.into(),
            fields,
        })))
    }

    /// Wraps a special-typed record.
    pub fn special<T: Special>(value: T) -> Value {
        let shared: SpecialRef = Rc::new(RefCell::new(value));
        Value::Special(shared)
    }

    pub fn range(begin: Value, end: Value, exclude_end: bool) -> Value {
        Value::Range(Box::new(RangeValue {
            begin,
            end,
            exclude_end,
        }))
    }

    /// Creates a reduced rational number.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    pub fn rational(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Value {
        Value::Rational(BigRational::new(numer.into(), denom.into()))
    }

    pub fn complex(re: Value, im: Value) -> Value {
        Value::Complex(Box::new(ComplexValue { re, im }))
    }

    /// A short name for the kind of value, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Integer(_) => "integer".to_string(),
            Value::BigInt(_) => "bigint".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Symbol(_) => "symbol".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Range(_) => "range".to_string(),
            Value::Rational(_) => "rational".to_string(),
            Value::Complex(_) => "complex".to_string(),
            Value::Time(_) => "time".to_string(),
            Value::Struct(r) | Value::Object(r) => match r.try_borrow() {
                Ok(object) => object.class_name.clone(),
                Err(_) => "object".to_string(),
            },
            Value::Special(r) => match r.try_borrow() {
                Ok(special) => special.class_name().to_string(),
                Err(_) => "special".to_string(),
            },
        }
    }

    /// The identity of a record, `None` for plain values.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Value::Struct(r) | Value::Object(r) => Some(Identity::of(r)),
            Value::Special(r) => Some(Identity::of(r)),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same record.
    #[must_use]
    pub fn same_object(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns `true` for values that carry identity.
    #[inline]
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Value::Struct(_) | Value::Object(_) | Value::Special(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an integer that fits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use num_bigint::BigInt;
    /// use rmxml::Value;
    ///
    /// assert_eq!(Value::from(7).as_i64(), Some(7));
    /// assert_eq!(Value::BigInt(BigInt::from(7)).as_i64(), Some(7));
    /// assert_eq!(Value::from(7.0).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::BigInt(b) => b.to_i64(),
            _ => None,
        }
    }

    /// Returns any integer as a `BigInt`.
    #[must_use]
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Value::Integer(i) => Some(BigInt::from(*i)),
            Value::BigInt(b) => Some(b.clone()),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is any real number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::BigInt(b) => b.to_f64(),
            Value::Float(f) => Some(*f),
            Value::Rational(r) => r.to_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_range(&self) -> Option<&RangeValue> {
        match self {
            Value::Range(range) => Some(range),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Value::Rational(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            Value::Complex(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the shared record behind a struct or generic object.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Struct(r) | Value::Object(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_special(&self) -> Option<&SpecialRef> {
        match self {
            Value::Special(r) => Some(r),
            _ => None,
        }
    }

    /// Borrows a special record as its concrete type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rmxml::{special::Rect, Value};
    ///
    /// let value = Value::special(Rect::new(0, 0, 32, 16));
    /// let rect = value.downcast_special::<Rect>().unwrap();
    /// assert_eq!(rect.width, 32);
    /// ```
    #[must_use]
    pub fn downcast_special<T: Special>(&self) -> Option<Ref<'_, T>> {
        let shared = self.as_special()?;
        Ref::filter_map(shared.borrow(), |special| special.as_any().downcast_ref::<T>()).ok()
    }

    /// Clones a field out of a struct or generic object.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.as_object()
            .and_then(|r| r.borrow().fields.get(name).cloned())
    }

    /// Sets a field on a struct or generic object. Returns `false` for other values.
    pub fn set_field(&self, name: impl Into<String>, value: Value) -> bool {
        match self.as_object() {
            Some(r) => {
                r.borrow_mut().fields.insert(name, value);
                true
            }
            None => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Rational(a), Value::Rational(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) | (Value::Object(a), Value::Object(b)) => {
                self.same_object(other) || *a.borrow() == *b.borrow()
            }
            (Value::Special(a), Value::Special(b)) => {
                self.same_object(other) || a.borrow().eq_special(&*b.borrow())
            }
            _ => false,
        }
    }
}

thread_local! {
    // Records currently being formatted, so cyclic graphs print a marker instead of recursing.
    static FORMATTING: RefCell<HashSet<Identity>> = RefCell::new(HashSet::new());
}

fn fmt_record(
    f: &mut fmt::Formatter<'_>,
    identity: Identity,
    class_name: &str,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let entered = FORMATTING.with(|set| set.borrow_mut().insert(identity));
    if !entered {
        return write!(f, "#<{} ...>", class_name);
    }
    let result = body(f);
    FORMATTING.with(|set| set.borrow_mut().remove(&identity));
    result
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({:?})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::BigInt(b) => write!(f, "BigInt({})", b),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Symbol(s) => write!(f, "Symbol({:?})", s),
            Value::Array(arr) => f.debug_list().entries(arr).finish(),
            Value::Map(map) => f
                .debug_map()
                .entries(map.iter().map(|(k, v)| (k, v)))
                .finish(),
            Value::Range(range) => fmt::Debug::fmt(range, f),
            Value::Rational(r) => write!(f, "Rational({})", r),
            Value::Complex(c) => fmt::Debug::fmt(c, f),
            Value::Time(t) => write!(f, "Time({})", t.to_rfc3339()),
            Value::Struct(r) | Value::Object(r) => match r.try_borrow() {
                Ok(object) => fmt_record(f, Identity::of(r), &object.class_name, |f| {
                    let mut out = f.debug_struct(&object.class_name);
                    for (name, value) in object.fields.iter() {
                        out.field(name, value);
                    }
                    out.finish()
                }),
                Err(_) => write!(f, "#<object (borrowed)>"),
            },
            Value::Special(r) => match r.try_borrow() {
                Ok(special) => fmt_record(f, Identity::of(r), special.class_name(), |f| {
                    fmt::Debug::fmt(&*special, f)
                }),
                Err(_) => write!(f, "#<special (borrowed)>"),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::BigInt(b) => write!(f, "{}", b),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::Array(arr) => {
                write!(
                    f,
                    "[{}]",
                    arr.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Map(map) => {
                write!(
                    f,
                    "{{{}}}",
                    map.iter()
                        .map(|(k, v)| format!("{} => {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Range(range) => {
                let dots = if range.exclude_end { "..." } else { ".." };
                write!(f, "{}{}{}", range.begin, dots, range.end)
            }
            Value::Rational(r) => write!(f, "({}/{})", r.numer(), r.denom()),
            Value::Complex(c) => write!(f, "({}+{}i)", c.re, c.im),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Struct(_) | Value::Object(_) | Value::Special(_) => {
                write!(f, "#<{}>", self.type_name())
            }
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for BigInt {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .to_bigint()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::custom(format!("expected number, found {:?}", value)))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Str(s) | Value::Symbol(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_small_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

from_small_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::BigInt(BigInt::from(value)),
        }
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl From<BigRational> for Value {
    fn from(value: BigRational) -> Self {
        Value::Rational(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::Time(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Time(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_compare_by_identity_first() {
        let a = Value::object("Actor", FieldMap::new());
        let b = Value::object("Actor", FieldMap::new());
        assert_eq!(a, b);
        assert!(a.same_object(&a.clone()));
        assert!(!a.same_object(&b));
    }

    #[test]
    fn test_integer_kinds_are_distinct() {
        assert_ne!(Value::Integer(1), Value::BigInt(BigInt::from(1)));
        assert_ne!(Value::from("a"), Value::symbol("a"));
    }

    #[test]
    fn test_wide_integers_promote_to_bigint() {
        assert_eq!(Value::from(5u64), Value::Integer(5));
        assert!(matches!(Value::from(u64::MAX), Value::BigInt(_)));
        assert!(matches!(Value::from(i128::MIN), Value::BigInt(_)));
    }

    #[test]
    fn test_rational_is_reduced() {
        let r = Value::rational(6, 8);
        let r = r.as_rational().unwrap();
        assert_eq!(*r.numer(), BigInt::from(3));
        assert_eq!(*r.denom(), BigInt::from(4));
    }

    #[test]
    fn test_field_access() {
        let actor = Value::object("Actor", FieldMap::new());
        assert!(actor.set_field("name", Value::from("Ralph")));
        assert_eq!(actor.field("name"), Some(Value::from("Ralph")));
        assert!(!Value::from(1).set_field("name", Value::Nil));
    }

    #[test]
    fn test_debug_of_cyclic_record_terminates() {
        let node = Value::object("Node", FieldMap::new());
        node.set_field("next", node.clone());
        let text = format!("{:?}", node);
        assert!(text.contains("#<Node ...>"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::symbol("hp").to_string(), ":hp");
        assert_eq!(
            Value::range(Value::from(1), Value::from(5), true).to_string(),
            "1...5"
        );
        assert_eq!(Value::rational(3, 4).to_string(), "(3/4)");
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(Value::from(42)).unwrap(), 42);
        assert!(i64::try_from(Value::from("x")).is_err());
        assert_eq!(f64::try_from(Value::from(2)).unwrap(), 2.0);
        assert!(bool::try_from(Value::from(true)).unwrap());
        assert_eq!(String::try_from(Value::symbol("a")).unwrap(), "a");
    }
}
