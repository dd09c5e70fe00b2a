//! Configuration options for the generator and the parser.
//!
//! ## Examples
//!
//! ```rust
//! use rmxml::{parse_with, CodecOptions, TreeNode, TypeRegistry};
//!
//! // Reject tags nobody registered instead of reading them as nil
//! let options = CodecOptions::strict();
//! let result = parse_with(&TreeNode::new("window"), TypeRegistry::global(), options);
//! assert!(result.is_err());
//! ```

/// Default limit on graph and tree nesting.
///
/// Low enough that both engines fit a 2 MiB thread stack in debug builds.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration shared by [`Generator`](crate::Generator) and [`Parser`](crate::Parser).
///
/// # Examples
///
/// ```rust
/// use rmxml::CodecOptions;
///
/// let options = CodecOptions::new().with_max_depth(64).with_strict_tags(true);
/// assert_eq!(options.max_depth, 64);
/// assert!(options.strict_tags);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Deepest nesting either engine walks before failing
    pub max_depth: usize,
    /// Fail on unknown tags instead of decoding them as nil
    pub strict_tags: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_tags: false,
        }
    }
}

impl CodecOptions {
    /// Creates default options (permissive tags, depth limit of 128).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that reject unknown tags.
    #[must_use]
    pub fn strict() -> Self {
        CodecOptions {
            strict_tags: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_strict_tags(mut self, strict_tags: bool) -> Self {
        self.strict_tags = strict_tags;
        self
    }
}
