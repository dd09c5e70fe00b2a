//! The tagged tree node exchanged between the codec and a markup writer.
//!
//! A [`TreeNode`] is the whole contract between the [`Generator`](crate::Generator)
//! and the [`Parser`](crate::Parser): a tag name, ordered string attributes,
//! ordered children and optional text. It derives serde traits so any serde
//! format can stand in as the document reader/writer.

use crate::tag::Tag;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One element of the tagged tree.
///
/// # Examples
///
/// ```rust
/// use rmxml::{Tag, TreeNode};
///
/// let node = TreeNode::tagged(Tag::Integer)
///     .with_attribute("attribute-name", "level")
///     .with_text("7");
///
/// assert_eq!(node.tag, "int");
/// assert_eq!(node.attribute("attribute-name"), Some("level"));
/// assert_eq!(node.text(), Some("7"));
/// ```
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TreeNode {
    /// Creates an empty node with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        TreeNode {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Creates an empty node named after `tag`.
    pub fn tagged(tag: Tag) -> Self {
        Self::new(tag.name())
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Sets an attribute, keeping the position of an existing one.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn push(&mut self, child: TreeNode) {
        self.children.push(child);
    }

    /// Counts this node and all of its descendants.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Iterates over this node and its descendants in depth-first order.
    pub fn descendants(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_order_is_kept() {
        let node = TreeNode::new("object")
            .with_attribute("class-name", "Actor")
            .with_attribute("id", "0");
        let names: Vec<_> = node.attributes.keys().cloned().collect();
        assert_eq!(names, vec!["class-name", "id"]);
    }

    #[test]
    fn test_descendants_depth_first() {
        let tree = TreeNode::new("array")
            .with_child(TreeNode::new("array").with_child(TreeNode::new("int")))
            .with_child(TreeNode::new("str"));
        let tags: Vec<_> = tree.descendants().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["array", "array", "int", "str"]);
        assert_eq!(tree.node_count(), 4);
    }
}
