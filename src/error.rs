//! Error types for tree generation and parsing.
//!
//! Every failure aborts the whole [`generate`](crate::generate) or
//! [`parse`](crate::parse) call; there is no partial-result mode.
//!
//! ## Error Categories
//!
//! - **Unsupported types**: the generator met a value it has no tag for
//! - **Unknown tags**: the parser met a tag nobody registered (strict mode only)
//! - **Unresolved references**: a `ref` node points at an id that was never registered
//! - **Malformed nodes**: a node is missing children, attributes or text its decoder needs
//! - **Depth limit**: the graph or tree nests deeper than [`CodecOptions::max_depth`](crate::CodecOptions)
//!
//! ## Error Context
//!
//! Errors raised while walking a graph or tree carry the path of the node that
//! failed, written as `/`-separated tag segments (`object@actors/array/range`).
//!
//! ## Examples
//!
//! ```rust
//! use rmxml::{parse, Error, TreeNode};
//!
//! let node = TreeNode::new("ref").with_text("7");
//! match parse(&node) {
//!     Err(Error::UnresolvedReference { id, .. }) => assert_eq!(id, 7),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the codec.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A value has no tag mapping and no field listing
    #[error("Unsupported type {type_name} at {path}")]
    UnsupportedType { type_name: String, path: String },

    /// A tag with no registered decoder (strict parsing only)
    #[error("Unknown tag <{tag}> at {path}")]
    UnknownTag { tag: String, path: String },

    /// A reference to an id that is not (yet) in the reference table
    #[error("Unresolved reference to id {id} at {path}")]
    UnresolvedReference { id: u32, path: String },

    /// A node lacks the children, attributes or text its decoder requires
    #[error("Malformed <{tag}> node at {path}: {msg}")]
    MalformedNode {
        tag: String,
        path: String,
        msg: String,
    },

    /// Nesting exceeded the configured limit
    #[error("Nesting deeper than {limit} levels at {path}")]
    DepthLimitExceeded { limit: usize, path: String },

    /// A special type tried to claim a tag that is already taken
    #[error("Tag <{0}> is already registered")]
    DuplicateTag(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an unsupported type error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rmxml::Error;
    ///
    /// let err = Error::unsupported_type("Window", "object@scene");
    /// assert!(err.to_string().contains("Window"));
    /// ```
    pub fn unsupported_type(type_name: &str, path: &str) -> Self {
        Error::UnsupportedType {
            type_name: type_name.to_string(),
            path: path.to_string(),
        }
    }

    /// Creates an unknown tag error.
    pub fn unknown_tag(tag: &str, path: &str) -> Self {
        Error::UnknownTag {
            tag: tag.to_string(),
            path: path.to_string(),
        }
    }

    /// Creates an unresolved reference error.
    pub fn unresolved_reference(id: u32, path: &str) -> Self {
        Error::UnresolvedReference {
            id,
            path: path.to_string(),
        }
    }

    /// Creates a malformed node error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rmxml::Error;
    ///
    /// let err = Error::malformed("range", "array/range", "expected 3 children, found 2");
    /// assert!(err.to_string().contains("expected 3 children"));
    /// ```
    pub fn malformed(tag: &str, path: &str, msg: &str) -> Self {
        Error::MalformedNode {
            tag: tag.to_string(),
            path: path.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a depth limit error.
    pub fn depth_limit(limit: usize, path: &str) -> Self {
        Error::DepthLimitExceeded {
            limit,
            path: path.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
