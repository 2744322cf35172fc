//! Node Definitions
//!
//! Immutable descriptors built once per template and shared by every view
//! instance created from them.

use std::fmt;
use std::rc::Rc;

use fos_security::SecurityContext;

use crate::renderer::RendererType;
use crate::view::{ViewId, ViewTree};
use crate::{CheckType, Event, ViewResult};

flag_set! {
    /// Node-level flags
    NodeFlags {
        TYPE_ELEMENT = 1,
        /// Anchor hosting embedded views
        EMBEDDED_VIEWS = 1 << 24,
        /// Element hosting a component view
        COMPONENT_VIEW = 1 << 25,
    }
}

flag_set! {
    /// Binding kind bits plus modifiers
    BindingFlags {
        ATTRIBUTE = 1,
        CLASS = 1 << 1,
        STYLE = 1 << 2,
        PROPERTY = 1 << 3,
        SYNTHETIC_PROPERTY = 1 << 4,
        SYNTHETIC_HOST_PROPERTY = 1 << 5,
        /// Mask of the kind bits
        TYPES = 0b1111,
    }
}

/// What a binding mutates on its render node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Attribute,
    ClassToggle,
    Style,
    Property,
    /// Property that a component host routes into the component's own view
    SyntheticHostProperty,
}

/// Third element of a raw binding: a security context or a unit suffix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BindingParam {
    #[default]
    None,
    Security(SecurityContext),
    Suffix(String),
}

/// Normalized binding descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDef {
    pub flags: BindingFlags,
    pub ns: Option<String>,
    pub name: String,
    pub non_minified_name: String,
    /// Only read for attribute and property bindings
    pub security_context: Option<SecurityContext>,
    /// Only read for style bindings
    pub suffix: Option<String>,
}

impl BindingDef {
    /// Kind selected by the type bits; `None` when no known kind bit is set
    pub fn kind(&self) -> Option<BindingKind> {
        match (self.flags & BindingFlags::TYPES).0 {
            1 => Some(BindingKind::Attribute),
            2 => Some(BindingKind::ClassToggle),
            4 => Some(BindingKind::Style),
            8 if self.flags.contains(BindingFlags::SYNTHETIC_HOST_PROPERTY) => {
                Some(BindingKind::SyntheticHostProperty)
            }
            8 => Some(BindingKind::Property),
            _ => None,
        }
    }
}

/// Where an output listens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    Window,
    Document,
    Body,
    /// The component hosted on the element
    Component,
    /// The element itself
    ElementLocal,
}

impl OutputTarget {
    /// Prefix used in full event names
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            OutputTarget::Window => Some("window"),
            OutputTarget::Document => Some("document"),
            OutputTarget::Body => Some("body"),
            OutputTarget::Component => Some("component"),
            OutputTarget::ElementLocal => None,
        }
    }
}

/// `target:event`, or the bare event name for element-local outputs
pub fn element_event_full_name(target: OutputTarget, event_name: &str) -> String {
    match target.prefix() {
        Some(prefix) => format!("{}:{}", prefix, event_name),
        None => event_name.to_string(),
    }
}

/// Output (event) descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDef {
    pub target: OutputTarget,
    pub event_name: String,
    pub prop_name: Option<String>,
}

/// Event delivered to a node's handler
#[derive(Debug)]
pub struct ElementEvent<'a> {
    pub view: ViewId,
    pub node_index: usize,
    /// Full event name, see [`element_event_full_name`]
    pub event_name: &'a str,
    pub event: &'a Event,
}

/// Node event handler; returning `false` prevents the default action
pub type EventHandler = Rc<dyn Fn(&ElementEvent<'_>) -> bool>;

/// Per-view update function run by change detection
pub type UpdateRenderer = Rc<dyn Fn(&mut ViewTree, ViewId, CheckType) -> ViewResult<()>>;

/// Element-specific part of a node definition
#[derive(Clone, Default)]
pub struct ElementDef {
    pub ns: Option<String>,
    /// `None` for anchors and headless containers, rendered as comments
    pub name: Option<String>,
    /// Fixed attributes: (namespace, name, value)
    pub attrs: Vec<(Option<String>, String, String)>,
    pub template: Option<Rc<ViewDefinition>>,
    pub component_view: Option<Rc<ViewDefinition>>,
    pub component_renderer_type: Option<Rc<RendererType>>,
    pub handle_event: Option<EventHandler>,
}

impl fmt::Debug for ElementDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDef")
            .field("ns", &self.ns)
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .field("template", &self.template.is_some())
            .field("component_view", &self.component_view.is_some())
            .field("component_renderer_type", &self.component_renderer_type)
            .field("handle_event", &self.handle_event.is_some())
            .finish()
    }
}

/// Node descriptor
#[derive(Debug, Clone)]
pub struct NodeDef {
    // Assigned by ViewDefinition::new
    pub node_index: usize,
    pub parent: Option<usize>,
    pub render_parent: Option<usize>,
    pub binding_index: usize,
    pub output_index: usize,

    pub check_index: Option<usize>,
    pub flags: NodeFlags,
    pub matched_queries: Vec<u32>,
    /// Bit set of matched query ids
    pub matched_query_ids: u32,
    pub ng_content_index: Option<usize>,
    /// Number of descendants (not only direct children)
    pub child_count: usize,
    pub bindings: Vec<BindingDef>,
    /// OR of all binding flags
    pub binding_flags: BindingFlags,
    pub outputs: Vec<OutputDef>,
    pub element: ElementDef,
}

impl NodeDef {
    #[inline]
    pub fn is_element(&self) -> bool {
        self.flags.contains(NodeFlags::TYPE_ELEMENT)
    }

    /// Nameless elements render as comments and have no render children
    #[inline]
    pub fn is_headless(&self) -> bool {
        self.is_element() && self.element.name.is_none()
    }

    #[inline]
    pub fn is_component_host(&self) -> bool {
        self.flags.contains(NodeFlags::COMPONENT_VIEW)
    }
}

/// Split `":ns:name"` into namespace and local name
pub fn split_namespace(name: &str) -> (Option<String>, String) {
    if let Some(rest) = name.strip_prefix(':') {
        if let Some((ns, local)) = rest.split_once(':') {
            return (Some(ns.to_string()), local.to_string());
        }
    }
    (None, name.to_string())
}

pub fn calc_binding_flags(bindings: &[BindingDef]) -> BindingFlags {
    bindings
        .iter()
        .fold(BindingFlags::NONE, |acc, b| acc | b.flags)
}

fn split_matched_queries(matched_queries: &[u32]) -> (Vec<u32>, u32) {
    let ids = matched_queries
        .iter()
        .fold(0u32, |acc, id| acc | 1u32.checked_shl(*id).unwrap_or(0));
    (matched_queries.to_vec(), ids)
}

/// Raw binding: kind flags, `":ns:name"`, and suffix or security context
pub type RawBinding<'a> = (BindingFlags, &'a str, BindingParam);

/// Define an element node.
///
/// Omitted tables default to empty. Binding order is preserved and is the
/// order of the positional values passed to inline checks.
#[allow(clippy::too_many_arguments)]
pub fn element_def(
    check_index: usize,
    flags: NodeFlags,
    matched_queries: &[u32],
    ng_content_index: Option<usize>,
    child_count: usize,
    namespace_and_name: Option<&str>,
    fixed_attrs: &[(&str, &str)],
    bindings: &[RawBinding<'_>],
    outputs: &[(OutputTarget, &str)],
    handle_event: Option<EventHandler>,
    component_view: Option<Rc<ViewDefinition>>,
    component_renderer_type: Option<Rc<RendererType>>,
) -> NodeDef {
    let (ns, name) = match namespace_and_name {
        Some(full) => {
            let (ns, name) = split_namespace(full);
            (ns, Some(name))
        }
        None => (None, None),
    };

    let binding_defs: Vec<BindingDef> = bindings
        .iter()
        .map(|(binding_flags, full_name, param)| {
            let (ns, name) = split_namespace(full_name);
            let mut security_context = None;
            let mut suffix = None;
            match ((*binding_flags & BindingFlags::TYPES).0, param) {
                (4, BindingParam::Suffix(s)) => suffix = Some(s.clone()),
                (1 | 8, BindingParam::Security(ctx)) => security_context = Some(*ctx),
                _ => {}
            }
            BindingDef {
                flags: *binding_flags,
                ns,
                non_minified_name: name.clone(),
                name,
                security_context,
                suffix,
            }
        })
        .collect();

    let output_defs = outputs
        .iter()
        .map(|(target, event_name)| OutputDef {
            target: *target,
            event_name: event_name.to_string(),
            prop_name: None,
        })
        .collect();

    let attrs = fixed_attrs
        .iter()
        .map(|(full_name, value)| {
            let (ns, name) = split_namespace(full_name);
            (ns, name, value.to_string())
        })
        .collect();

    let mut flags = flags | NodeFlags::TYPE_ELEMENT;
    if component_view.is_some() {
        flags |= NodeFlags::COMPONENT_VIEW;
    }
    let (matched_queries, matched_query_ids) = split_matched_queries(matched_queries);

    NodeDef {
        node_index: 0,
        parent: None,
        render_parent: None,
        binding_index: 0,
        output_index: 0,
        check_index: Some(check_index),
        flags,
        matched_queries,
        matched_query_ids,
        ng_content_index,
        child_count,
        binding_flags: calc_binding_flags(&binding_defs),
        bindings: binding_defs,
        outputs: output_defs,
        element: ElementDef {
            ns,
            name,
            attrs,
            template: None,
            component_view,
            component_renderer_type,
            handle_event,
        },
    }
}

/// Define an anchor: a comment placeholder, optionally hosting embedded views
pub fn anchor_def(
    flags: NodeFlags,
    matched_queries: &[u32],
    ng_content_index: Option<usize>,
    child_count: usize,
    handle_event: Option<EventHandler>,
    template: Option<Rc<ViewDefinition>>,
) -> NodeDef {
    let mut flags = flags | NodeFlags::TYPE_ELEMENT;
    if template.is_some() {
        flags |= NodeFlags::EMBEDDED_VIEWS;
    }
    let (matched_queries, matched_query_ids) = split_matched_queries(matched_queries);
    NodeDef {
        node_index: 0,
        parent: None,
        render_parent: None,
        binding_index: 0,
        output_index: 0,
        check_index: None,
        flags,
        matched_queries,
        matched_query_ids,
        ng_content_index,
        child_count,
        bindings: Vec::new(),
        binding_flags: BindingFlags::NONE,
        outputs: Vec::new(),
        element: ElementDef {
            template,
            handle_event,
            ..ElementDef::default()
        },
    }
}

/// Builder over [`element_def`] for the common cases
#[derive(Default)]
pub struct ElementDefBuilder<'a> {
    check_index: usize,
    flags: NodeFlags,
    child_count: usize,
    name: Option<&'a str>,
    attrs: Vec<(&'a str, &'a str)>,
    bindings: Vec<RawBinding<'a>>,
    outputs: Vec<(OutputTarget, &'a str)>,
    handle_event: Option<EventHandler>,
    component_view: Option<Rc<ViewDefinition>>,
    component_renderer_type: Option<Rc<RendererType>>,
}

impl<'a> ElementDefBuilder<'a> {
    /// `name` may carry a namespace as `":ns:name"`
    pub fn new(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    /// Nameless element (renders as a comment)
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn check_index(mut self, index: usize) -> Self {
        self.check_index = index;
        self
    }

    pub fn flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn child_count(mut self, count: usize) -> Self {
        self.child_count = count;
        self
    }

    pub fn attr(mut self, name: &'a str, value: &'a str) -> Self {
        self.attrs.push((name, value));
        self
    }

    pub fn binding(mut self, flags: BindingFlags, name: &'a str, param: BindingParam) -> Self {
        self.bindings.push((flags, name, param));
        self
    }

    pub fn output(mut self, target: OutputTarget, event_name: &'a str) -> Self {
        self.outputs.push((target, event_name));
        self
    }

    pub fn on_event(mut self, handler: impl Fn(&ElementEvent<'_>) -> bool + 'static) -> Self {
        self.handle_event = Some(Rc::new(handler));
        self
    }

    pub fn component(mut self, view: Rc<ViewDefinition>, renderer_type: Option<RendererType>) -> Self {
        self.component_view = Some(view);
        self.component_renderer_type = renderer_type.map(Rc::new);
        self
    }

    pub fn build(self) -> NodeDef {
        element_def(
            self.check_index,
            self.flags,
            &[],
            None,
            self.child_count,
            self.name,
            &self.attrs,
            &self.bindings,
            &self.outputs,
            self.handle_event,
            self.component_view,
            self.component_renderer_type,
        )
    }
}

/// Ordered node definitions of one template
pub struct ViewDefinition {
    pub nodes: Vec<NodeDef>,
    pub binding_count: usize,
    pub output_count: usize,
    /// Aggregate of every node's flags
    pub node_flags: NodeFlags,
    /// Index of the last root node, used to find insertion points after a view
    pub last_render_root_node: Option<usize>,
    pub update_renderer: Option<UpdateRenderer>,
}

impl ViewDefinition {
    /// Resolve parent links, render parents, and binding/output offsets
    pub fn new(mut nodes: Vec<NodeDef>, update_renderer: Option<UpdateRenderer>) -> Self {
        let mut current_parent: Option<usize> = None;
        let mut binding_count = 0;
        let mut output_count = 0;
        let mut node_flags = NodeFlags::NONE;
        let mut last_render_root_node = None;

        for i in 0..nodes.len() {
            let render_parent = Self::nearest_render_parent(&nodes, current_parent);
            let node = &mut nodes[i];
            node.node_index = i;
            node.parent = current_parent;
            node.render_parent = render_parent;
            node.binding_index = binding_count;
            node.output_index = output_count;
            binding_count += node.bindings.len();
            output_count += node.outputs.len();
            node_flags |= node.flags;
            if node.parent.is_none() {
                last_render_root_node = Some(i);
            }

            if node.child_count > 0 {
                current_parent = Some(i);
            } else {
                // Close every parent whose last descendant this was
                while let Some(p) = current_parent {
                    if i == p + nodes[p].child_count {
                        current_parent = nodes[p].parent;
                    } else {
                        break;
                    }
                }
            }
        }

        Self {
            nodes,
            binding_count,
            output_count,
            node_flags,
            last_render_root_node,
            update_renderer,
        }
    }

    /// Nearest ancestor that renders as a real element; headless ancestors are skipped
    fn nearest_render_parent(nodes: &[NodeDef], mut parent: Option<usize>) -> Option<usize> {
        while let Some(p) = parent {
            if !nodes[p].is_headless() {
                return Some(p);
            }
            parent = nodes[p].parent;
        }
        None
    }

    /// Indices of nodes without a parent
    pub fn root_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.node_index)
    }
}

impl fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("nodes", &self.nodes)
            .field("binding_count", &self.binding_count)
            .field("output_count", &self.output_count)
            .field("node_flags", &self.node_flags)
            .field("update_renderer", &self.update_renderer.is_some())
            .finish()
    }
}
