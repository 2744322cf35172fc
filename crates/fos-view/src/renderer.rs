//! Renderer Abstraction
//!
//! Every structural and binding mutation issued by the view engine goes
//! through [`Renderer`]; the engine never touches render nodes directly.

use std::fmt;

use fos_dom::{EventTarget, HandlerId, NodeId};
use fos_security::{DomSanitizer, SecurityContext};

use crate::view::ViewId;
use crate::{Event, Value};

/// Style encapsulation of a component's renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encapsulation {
    /// Content and host attributes scope the component's styles
    #[default]
    Emulated,
    /// Component renders into its own root
    Native,
    None,
}

/// Identifies a component's rendering requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererType {
    pub id: String,
    pub encapsulation: Encapsulation,
}

impl RendererType {
    pub fn new(id: impl Into<String>, encapsulation: Encapsulation) -> Self {
        Self {
            id: id.into(),
            encapsulation,
        }
    }
}

/// Where the root view attaches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootHost {
    Selector(String),
    Node(NodeId),
}

impl fmt::Display for RootHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootHost::Selector(selector) => f.write_str(selector),
            RootHost::Node(node) => write!(f, "{:?}", node),
        }
    }
}

/// Plain-data listener record; dispatch goes back through an [`EventSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementListener {
    pub view: ViewId,
    pub node_index: usize,
    /// Full event name, `target:event` for global targets
    pub event_name: String,
}

/// Render backend
pub trait Renderer: fmt::Debug {
    fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId;
    fn create_comment(&mut self, text: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>);
    fn remove_child(&mut self, parent: NodeId, child: NodeId);
    fn parent_node(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;
    /// Find the existing element the root view renders into
    fn select_root_element(&mut self, host: &RootHost) -> Option<NodeId>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str, namespace: Option<&str>);
    fn remove_attribute(&mut self, node: NodeId, name: &str, namespace: Option<&str>);
    fn add_class(&mut self, node: NodeId, name: &str);
    fn remove_class(&mut self, node: NodeId, name: &str);
    fn set_style(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_style(&mut self, node: NodeId, name: &str);
    fn set_property(&mut self, node: NodeId, name: &str, value: &Value);

    /// Register a listener; `event_name` is the bare event type
    fn listen(&mut self, target: EventTarget, event_name: &str, listener: ElementListener) -> HandlerId;
    fn unlisten(&mut self, id: HandlerId);

    /// Called for every render node of a destroyed view
    fn destroy_node(&mut self, _node: NodeId) {}
}

/// Creates a renderer per view
pub trait RendererFactory: fmt::Debug {
    /// `host` is the component's host element, `None` for root and embedded views
    fn create_renderer(
        &mut self,
        host: Option<NodeId>,
        renderer_type: Option<&RendererType>,
    ) -> Box<dyn Renderer>;
}

/// Sanitizes bound values for their security context
pub trait Sanitizer: fmt::Debug {
    fn sanitize(&self, context: SecurityContext, value: &Value) -> Option<String>;
}

impl Sanitizer for DomSanitizer {
    fn sanitize(&self, context: SecurityContext, value: &Value) -> Option<String> {
        let text = value.to_render_string();
        match self.try_sanitize(context, text.as_deref()) {
            Ok(sanitized) => sanitized,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }
}

/// Receives events from a renderer's listeners
pub trait EventSink {
    /// Returns `false` when the default action should be prevented
    fn dispatch(&mut self, view: ViewId, node_index: usize, event_name: &str, event: &Event) -> bool;
}
