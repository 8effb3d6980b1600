//! Ordered element trees for robot description documents
//!
//! A [`UrdfElement`] is a tag, an ordered attribute table, and an ordered
//! list of child elements. Text content and comments are not part of the
//! model; composition only ever inspects and rewrites tags and attributes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute that carries an element's own name.
pub(crate) const NAME_ATTR: &str = "name";
/// Attribute that carries a reference to a named link.
pub(crate) const LINK_ATTR: &str = "link";

/// A single element in a robot description tree.
///
/// Attribute order is preserved, so a parsed document serializes back with
/// its attributes in the original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrdfElement {
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<UrdfElement>,
}

impl UrdfElement {
    /// Create an element with no attributes and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child insertion.
    pub fn with_child(mut self, child: UrdfElement) -> Self {
        self.children.push(child);
        self
    }

    /// The element's tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set an attribute, preserving its position if it already exists.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Iterate attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[UrdfElement] {
        &self.children
    }

    /// Mutable access to the child list.
    pub fn children_mut(&mut self) -> &mut Vec<UrdfElement> {
        &mut self.children
    }

    /// Consume the element, yielding its children.
    pub fn into_children(self) -> Vec<UrdfElement> {
        self.children
    }

    /// The element's `name` attribute, if present.
    pub fn name(&self) -> Option<&str> {
        self.attribute(NAME_ATTR)
    }

    /// First direct child with the given tag.
    pub fn find_child(&self, tag: &str) -> Option<&UrdfElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Structural equality: same tag, same attributes, and structurally
    /// equal children in the same order.
    ///
    /// Attribute order is ignored; child order is not.
    pub fn structurally_equal(&self, other: &UrdfElement) -> bool {
        if self.tag != other.tag
            || self.attributes.len() != other.attributes.len()
            || self.children.len() != other.children.len()
        {
            return false;
        }
        if !self
            .attributes
            .iter()
            .all(|(k, v)| other.attributes.get(k) == Some(v))
        {
            return false;
        }
        self.children
            .iter()
            .zip(&other.children)
            .all(|(a, b)| a.structurally_equal(b))
    }

    /// Rewrite every `name` and `link` attribute in this subtree through
    /// the given rename table. Attributes whose value is not a key of the
    /// table are left alone.
    pub(crate) fn rename_references(&mut self, table: &IndexMap<String, String>) {
        for key in [NAME_ATTR, LINK_ATTR] {
            if let Some(value) = self.attributes.get(key) {
                if let Some(renamed) = table.get(value) {
                    let renamed = renamed.clone();
                    self.attributes.insert(key.to_string(), renamed);
                }
            }
        }
        for child in &mut self.children {
            child.rename_references(table);
        }
    }
}
