//! DOM Node - Compact representation
//!
//! Nodes link to each other through `NodeId` indices instead of pointers.

use std::collections::HashMap;

use crate::{DOMTokenList, NamedNodeMap, NodeId, Value};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(namespace: Option<&str>, name: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(namespace, name)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(content))
    }

    /// Create a comment node
    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_comment(&self) -> bool {
        matches!(self.data, NodeData::Comment(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Text content of a text or comment node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment (also used as a placeholder anchor)
    Comment(String),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    pub namespace: Option<String>,
    /// Local tag name
    pub name: String,
    pub attrs: NamedNodeMap,
    pub classes: DOMTokenList,
    /// Inline style declarations in insertion order
    pub styles: Vec<(String, String)>,
    /// DOM properties (not reflected to attributes)
    pub properties: HashMap<String, Value>,
}

impl ElementData {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            attrs: NamedNodeMap::new(),
            classes: DOMTokenList::new(),
            styles: Vec::new(),
            properties: HashMap::new(),
        }
    }

    /// Get an inline style value
    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style, replacing an existing declaration
    pub fn set_style(&mut self, name: &str, value: &str) {
        match self.styles.iter_mut().find(|(n, _)| n == name) {
            Some(decl) => decl.1 = value.to_string(),
            None => self.styles.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove an inline style. Returns true if it existed.
    pub fn remove_style(&mut self, name: &str) -> bool {
        let before = self.styles.len();
        self.styles.retain(|(n, _)| n != name);
        before != self.styles.len()
    }

    /// Serialized `style` attribute value
    pub fn style_text(&self) -> String {
        self.styles
            .iter()
            .map(|(n, v)| format!("{}: {};", n, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Get a DOM property
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles() {
        let mut el = ElementData::new(None, "div");
        el.set_style("width", "10px");
        el.set_style("color", "red");
        el.set_style("width", "20px");

        assert_eq!(el.style("width"), Some("20px"));
        assert_eq!(el.style_text(), "width: 20px; color: red;");
        assert!(el.remove_style("width"));
        assert!(!el.remove_style("width"));
    }

    #[test]
    fn test_node_kinds() {
        let comment = Node::comment("anchor".into());
        assert!(comment.is_comment());
        assert_eq!(comment.as_text(), Some("anchor"));
        assert!(Node::element(Some("svg"), "circle").is_element());
    }
}
