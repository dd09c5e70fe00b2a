//! The tag taxonomy shared by the generator and the parser.
//!
//! Built-in tags form a closed set; every registered special type adds one
//! extension tag of its own through [`Tag::Special`].

use std::fmt;

/// Attribute carrying a record's class name.
pub const ATTR_CLASS_NAME: &str = "class-name";
/// Attribute carrying a record's identity id.
pub const ATTR_ID: &str = "id";
/// Attribute naming the field a child node was read from.
pub const ATTR_FIELD: &str = "attribute-name";
/// Attribute naming the part of a range a child node encodes.
pub const ATTR_RANGE_PART: &str = "a";

/// Range part holding the first value.
pub const RANGE_BEGIN: &str = "begin";
/// Range part holding the last value.
pub const RANGE_END: &str = "end";
/// Range part whose tag (`true`/`false`) says whether the end is excluded.
pub const RANGE_EXCLUDE_END: &str = "exclude_end";

/// Discriminator telling the parser how to read a node's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Nil,
    True,
    False,
    /// Fixed-width (`i64`) integer
    Integer,
    /// Arbitrary precision integer
    BigInt,
    Float,
    Str,
    Symbol,
    Array,
    Map,
    Range,
    Rational,
    Complex,
    Time,
    Struct,
    Object,
    /// Back-pointer to a record encoded earlier in the same tree
    Reference,
    /// Extension tag owned by a registered special type
    Special(&'static str),
}

impl Tag {
    const BUILTIN: [Tag; 17] = [
        Tag::Nil,
        Tag::True,
        Tag::False,
        Tag::Integer,
        Tag::BigInt,
        Tag::Float,
        Tag::Str,
        Tag::Symbol,
        Tag::Array,
        Tag::Map,
        Tag::Range,
        Tag::Rational,
        Tag::Complex,
        Tag::Time,
        Tag::Struct,
        Tag::Object,
        Tag::Reference,
    ];

    /// The node name written on the wire.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rmxml::Tag;
    ///
    /// assert_eq!(Tag::BigInt.name(), "bigint");
    /// assert_eq!(Tag::Special("table").name(), "table");
    /// ```
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Tag::Nil => "nil",
            Tag::True => "true",
            Tag::False => "false",
            Tag::Integer => "int",
            Tag::BigInt => "bigint",
            Tag::Float => "float",
            Tag::Str => "str",
            Tag::Symbol => "sym",
            Tag::Array => "array",
            Tag::Map => "map",
            Tag::Range => "range",
            Tag::Rational => "rational",
            Tag::Complex => "complex",
            Tag::Time => "time",
            Tag::Struct => "struct",
            Tag::Object => "object",
            Tag::Reference => "ref",
            Tag::Special(name) => *name,
        }
    }

    /// Looks up a built-in tag by wire name. Extension tags are resolved by
    /// the [`TypeRegistry`](crate::TypeRegistry).
    #[must_use]
    pub fn builtin(name: &str) -> Option<Tag> {
        Self::BUILTIN.iter().copied().find(|tag| tag.name() == name)
    }

    /// The tag encoding a boolean.
    #[inline]
    #[must_use]
    pub const fn from_bool(value: bool) -> Tag {
        if value {
            Tag::True
        } else {
            Tag::False
        }
    }

    /// Returns `true` for tags whose decoder registers an identity id.
    #[inline]
    #[must_use]
    pub const fn carries_identity(&self) -> bool {
        matches!(self, Tag::Struct | Tag::Object | Tag::Special(_))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
