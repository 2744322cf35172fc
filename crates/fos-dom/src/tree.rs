//! DOM Tree (arena-based allocation)

use crate::{DomError, DomResult, ElementData, ListenerRegistry, Node, NodeData, NodeId};

/// Arena-based DOM tree. Index 0 is always the document node.
#[derive(Debug)]
pub struct DomTree {
    pub(crate) nodes: Vec<Node>,
    listeners: ListenerRegistry,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            listeners: ListenerRegistry::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Number of nodes in the tree (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(None, name))
    }

    /// Create a detached, namespaced element
    pub fn create_element_ns(&mut self, namespace: Option<&str>, name: &str) -> NodeId {
        self.push(Node::element(namespace, name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content.to_string()))
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.next_sibling).filter(|s| s.is_valid())
    }

    /// Iterate over the direct children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Child ids of a node
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> DomResult<&ElementData> {
        self.node(id)?.as_element().ok_or(DomError::NotAnElement(id))
    }

    /// Mutable element data of a node
    pub fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Whether `ancestor` is `node` or contains it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map_or(NodeId::NONE, |n| n.parent);
        }
        false
    }

    /// Find the first element matching a simple selector (`#id`, `.class`, or tag)
    pub fn select(&self, selector: &str) -> Option<NodeId> {
        self.query(self.root(), selector, false).into_iter().next()
    }

    /// Descendants of `root` (excluding `root`) matching a simple selector, in document order
    pub fn query(&self, root: NodeId, selector: &str, multi: bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        if selector.trim().is_empty() {
            return found;
        }
        let mut stack = self.child_ids(root);
        stack.reverse();
        while let Some(id) = stack.pop() {
            if self.matches(id, selector) {
                found.push(id);
                if !multi {
                    break;
                }
            }
            // Push in reverse so traversal stays in document order
            let mut kids = self.child_ids(id);
            kids.reverse();
            stack.extend(kids);
        }
        found
    }

    /// Whether an element matches a simple selector (`#id`, `.class`, or tag)
    pub fn matches(&self, id: NodeId, selector: &str) -> bool {
        let Some(el) = self.get(id).and_then(Node::as_element) else {
            return false;
        };
        let selector = selector.trim();
        if let Some(target) = selector.strip_prefix('#') {
            el.attrs.get(None, "id") == Some(target)
        } else if let Some(class) = selector.strip_prefix('.') {
            el.classes.contains(class)
        } else {
            !selector.is_empty() && (selector == "*" || el.name.eq_ignore_ascii_case(selector))
        }
    }

    /// Listener registry
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    /// Text content of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(Node { data: NodeData::Text(t), .. }) = self.get(id) {
            out.push_str(t);
        }
        for (child, _) in self.children(id) {
            out.push_str(&self.text_content(child));
        }
        out
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}
