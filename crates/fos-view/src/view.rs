//! View Tree
//!
//! Arena of views and containers addressed by [`EntryId`]. Every entry
//! carries the same header (parent, next, queries) so traversal can follow
//! `next` without knowing which kind of entry it is standing on.

use std::rc::Rc;

use fos_dom::{HandlerId, NodeId};
use fos_security::DomSanitizer;

use crate::container::Container;
use crate::defs::{ElementEvent, NodeFlags, ViewDefinition};
use crate::renderer::{EventSink, Renderer, RendererFactory, RendererType, RootHost, Sanitizer};
use crate::{Event, Value, ViewConfig, ViewError, ViewResult};

/// Handle of an arena entry (view or container)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

impl EntryId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Entry known to hold a view
pub type ViewId = EntryId;
/// Entry known to hold a container
pub type ContainerId = EntryId;

flag_set! {
    /// Per-view lifecycle state
    ViewState {
        /// An event was delivered since the last pass
        DIRTY = 1,
        DESTROYED = 1 << 1,
    }
}

/// Which pass change detection is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckType {
    CheckAndUpdate,
    CheckNoChanges,
}

/// Query ids tracked along a branch of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QuerySet(pub u32);

impl QuerySet {
    pub fn contains(self, query_id: u32) -> bool {
        query_id < 32 && self.0 & (1 << query_id) != 0
    }
}

/// Fields shared by views and containers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub parent: Option<EntryId>,
    pub next: Option<EntryId>,
    pub queries: Option<QuerySet>,
}

/// How a view came to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    Root { host: Option<RootHost> },
    Component { host_view: ViewId, host_node: usize },
    Embedded { declaration_view: ViewId, anchor_node: usize },
}

/// Per-node instance data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    pub render_element: NodeId,
    pub component_view: Option<ViewId>,
    pub container: Option<ContainerId>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            render_element: NodeId::NONE,
            component_view: None,
            container: None,
        }
    }
}

/// Listener registration owned by a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Disposable {
    /// View whose renderer issued the handler
    pub(crate) renderer_view: ViewId,
    pub(crate) handler: HandlerId,
}

/// View instance
#[derive(Debug)]
pub struct View {
    pub(crate) def: Rc<ViewDefinition>,
    pub(crate) kind: ViewKind,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) renderer_type: Option<Rc<RendererType>>,
    /// Element root nodes are appended to
    pub(crate) render_host: Option<NodeId>,
    pub(crate) state: ViewState,
    pub(crate) nodes: Vec<NodeData>,
    /// Last applied value per binding slot, `None` until first checked
    pub(crate) old_values: Vec<Option<Value>>,
    pub(crate) disposables: Vec<Option<Disposable>>,
    /// Containers and component views declared in this view, linked by `next`
    pub(crate) child_head: Option<EntryId>,
    pub(crate) child_tail: Option<EntryId>,
}

impl View {
    pub fn def(&self) -> &Rc<ViewDefinition> {
        &self.def
    }

    pub fn kind(&self) -> &ViewKind {
        &self.kind
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.contains(ViewState::DESTROYED)
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn node(&self, index: usize) -> Option<&NodeData> {
        self.nodes.get(index)
    }

    pub fn old_value(&self, slot: usize) -> Option<&Value> {
        self.old_values.get(slot).and_then(Option::as_ref)
    }
}

/// Variant payload of an entry
#[derive(Debug)]
pub enum EntryKind {
    View(View),
    Container(Container),
}

/// Arena slot
#[derive(Debug)]
pub struct Entry {
    pub header: Header,
    pub kind: EntryKind,
}

impl Entry {
    pub fn as_view(&self) -> Option<&View> {
        match &self.kind {
            EntryKind::View(view) => Some(view),
            EntryKind::Container(_) => None,
        }
    }

    pub fn as_view_mut(&mut self) -> Option<&mut View> {
        match &mut self.kind {
            EntryKind::View(view) => Some(view),
            EntryKind::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match &self.kind {
            EntryKind::Container(container) => Some(container),
            EntryKind::View(_) => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match &mut self.kind {
            EntryKind::Container(container) => Some(container),
            EntryKind::View(_) => None,
        }
    }
}

/// Owner of every view and container of an application
#[derive(Debug)]
pub struct ViewTree {
    pub(crate) entries: Vec<Entry>,
    pub(crate) renderer_factory: Box<dyn RendererFactory>,
    pub(crate) sanitizer: Box<dyn Sanitizer>,
    pub(crate) config: ViewConfig,
}

impl ViewTree {
    /// Create a tree sanitizing with a [`DomSanitizer`] built from `config`
    pub fn new(config: ViewConfig, renderer_factory: impl RendererFactory + 'static) -> Self {
        let sanitizer = DomSanitizer::new(config.sanitizer.clone());
        Self {
            entries: Vec::new(),
            renderer_factory: Box::new(renderer_factory),
            sanitizer: Box::new(sanitizer),
            config,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    // ---- arena access ----

    pub fn entry(&self, id: EntryId) -> ViewResult<&Entry> {
        self.entries.get(id.index()).ok_or(ViewError::UnknownEntry(id))
    }

    pub(crate) fn entry_mut(&mut self, id: EntryId) -> ViewResult<&mut Entry> {
        self.entries.get_mut(id.index()).ok_or(ViewError::UnknownEntry(id))
    }

    pub fn header(&self, id: EntryId) -> ViewResult<&Header> {
        Ok(&self.entry(id)?.header)
    }

    pub(crate) fn header_mut(&mut self, id: EntryId) -> ViewResult<&mut Header> {
        Ok(&mut self.entry_mut(id)?.header)
    }

    pub fn view(&self, id: ViewId) -> ViewResult<&View> {
        self.entry(id)?.as_view().ok_or(ViewError::NotAView(id))
    }

    pub(crate) fn view_mut(&mut self, id: ViewId) -> ViewResult<&mut View> {
        self.entry_mut(id)?
            .as_view_mut()
            .ok_or(ViewError::NotAView(id))
    }

    /// View that has not been destroyed
    pub(crate) fn live_view(&self, id: ViewId) -> ViewResult<&View> {
        let view = self.view(id)?;
        if view.is_destroyed() {
            return Err(ViewError::ViewDestroyed(id));
        }
        Ok(view)
    }

    pub fn container(&self, id: ContainerId) -> ViewResult<&Container> {
        self.entry(id)?
            .as_container()
            .ok_or(ViewError::NotAContainer(id))
    }

    pub(crate) fn container_mut(&mut self, id: ContainerId) -> ViewResult<&mut Container> {
        self.entry_mut(id)?
            .as_container_mut()
            .ok_or(ViewError::NotAContainer(id))
    }

    pub fn queries(&self, id: EntryId) -> ViewResult<Option<QuerySet>> {
        Ok(self.header(id)?.queries)
    }

    pub(crate) fn alloc(&mut self, header: Header, kind: EntryKind) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(Entry { header, kind });
        id
    }

    fn alloc_view(
        &mut self,
        def: Rc<ViewDefinition>,
        kind: ViewKind,
        renderer_type: Option<Rc<RendererType>>,
        render_host: Option<NodeId>,
        parent: Option<EntryId>,
    ) -> ViewId {
        let renderer = self
            .renderer_factory
            .create_renderer(render_host, renderer_type.as_deref());
        let view = View {
            nodes: vec![NodeData::default(); def.nodes.len()],
            old_values: vec![None; def.binding_count],
            disposables: vec![None; def.output_count],
            def,
            kind,
            renderer,
            renderer_type,
            render_host,
            state: ViewState::NONE,
            child_head: None,
            child_tail: None,
        };
        let header = Header {
            parent,
            ..Header::default()
        };
        self.alloc(header, EntryKind::View(view))
    }

    /// Append a container or component view to `view`'s child list
    pub(crate) fn push_child(&mut self, view: ViewId, child: EntryId) -> ViewResult<()> {
        let tail = self.view(view)?.child_tail;
        match tail {
            Some(tail) => self.header_mut(tail)?.next = Some(child),
            None => self.view_mut(view)?.child_head = Some(child),
        }
        self.view_mut(view)?.child_tail = Some(child);
        Ok(())
    }

    /// Remove `child` from `view`'s child list, joining its neighbours
    fn unlink_child(&mut self, view: ViewId, child: EntryId) -> ViewResult<()> {
        let mut prev = None;
        let mut found = false;
        for entry in self.siblings(self.view(view)?.child_head) {
            if entry == child {
                found = true;
                break;
            }
            prev = Some(entry);
        }
        if !found {
            return Ok(());
        }
        let next = self.header(child)?.next;
        match prev {
            Some(prev) => self.header_mut(prev)?.next = next,
            None => self.view_mut(view)?.child_head = next,
        }
        let host = self.view_mut(view)?;
        if host.child_tail == Some(child) {
            host.child_tail = prev;
        }
        let header = self.header_mut(child)?;
        header.next = None;
        header.parent = None;
        Ok(())
    }

    /// Walk `next` links starting at `first`
    pub fn siblings(&self, first: Option<EntryId>) -> Siblings<'_> {
        Siblings {
            tree: self,
            current: first,
        }
    }

    /// Containers and component views declared by `view`
    pub fn child_entries(&self, view: ViewId) -> ViewResult<Vec<EntryId>> {
        Ok(self.siblings(self.view(view)?.child_head).collect())
    }

    // ---- view lifecycle ----

    /// Create the root view, rendering into `host` when given
    pub fn create_root_view(
        &mut self,
        def: Rc<ViewDefinition>,
        host: Option<RootHost>,
    ) -> ViewResult<ViewId> {
        let id = self.alloc_view(def, ViewKind::Root { host }, None, None, None);
        tracing::debug!("created root view {:?}", id);
        self.create_view_nodes(id)?;
        Ok(id)
    }

    /// Instantiate the template of `container`'s anchor as a detached view
    pub fn create_embedded_view(&mut self, container: ContainerId) -> ViewResult<ViewId> {
        let (anchor_view, anchor_node) = {
            let c = self.live_container(container)?;
            (c.anchor_view, c.anchor_node)
        };
        let (template, renderer_type) = {
            let view = self.live_view(anchor_view)?;
            let template = view
                .def
                .nodes
                .get(anchor_node)
                .and_then(|n| n.element.template.clone())
                .ok_or(ViewError::NoTemplate {
                    view: anchor_view,
                    node_index: anchor_node,
                })?;
            (template, view.renderer_type.clone())
        };
        let kind = ViewKind::Embedded {
            declaration_view: anchor_view,
            anchor_node,
        };
        let id = self.alloc_view(template, kind, renderer_type, None, None);
        tracing::debug!("created embedded view {:?} for {:?}", id, container);
        self.create_view_nodes(id)?;
        Ok(id)
    }

    /// Create render nodes, component views, listeners and containers
    fn create_view_nodes(&mut self, id: ViewId) -> ViewResult<()> {
        let (def, render_host) = {
            let view = self.view(id)?;
            (view.def.clone(), view.render_host)
        };
        let mut component_views = Vec::new();

        for node_def in def.nodes.iter().filter(|n| n.is_element()) {
            let el = self.create_element(id, render_host, node_def)?;

            let component_view = match &node_def.element.component_view {
                Some(comp_def) => {
                    let renderer_type = node_def.element.component_renderer_type.clone();
                    let kind = ViewKind::Component {
                        host_view: id,
                        host_node: node_def.node_index,
                    };
                    let comp = self.alloc_view(comp_def.clone(), kind, renderer_type, Some(el), Some(id));
                    self.push_child(id, comp)?;
                    component_views.push(comp);
                    Some(comp)
                }
                None => None,
            };
            if let Some(data) = self.view_mut(id)?.nodes.get_mut(node_def.node_index) {
                data.component_view = component_view;
            }

            self.listen_to_element_outputs(id, component_view, node_def, el)?;

            if node_def.flags.contains(NodeFlags::EMBEDDED_VIEWS) {
                let container = self.create_container(id, node_def.node_index)?;
                if let Some(data) = self.view_mut(id)?.nodes.get_mut(node_def.node_index) {
                    data.container = Some(container);
                }
            }
        }

        for comp in component_views {
            tracing::debug!("created component view {:?} in {:?}", comp, id);
            self.create_view_nodes(comp)?;
        }
        Ok(())
    }

    /// Destroy a view and everything declared in it. Listeners are released
    /// exactly once; destroying a destroyed view does nothing.
    pub fn destroy_view(&mut self, id: ViewId) -> ViewResult<()> {
        if self.view(id)?.is_destroyed() {
            return Ok(());
        }
        if let Some(parent) = self.header(id)?.parent {
            if let Ok(container) = self.container(parent) {
                if let Some(index) = container.index_of(id) {
                    self.detach_view(parent, index)?;
                }
            }
        }
        let host = match self.view(id)?.kind {
            ViewKind::Component { host_view, host_node } => Some((host_view, host_node)),
            _ => None,
        };
        if let Some((host_view, host_node)) = host {
            if !self.view(host_view)?.is_destroyed() {
                self.unlink_child(host_view, id)?;
                if let Some(data) = self.view_mut(host_view)?.nodes.get_mut(host_node) {
                    data.component_view = None;
                }
            }
        }
        self.destroy_view_tree(id)
    }

    fn destroy_view_tree(&mut self, id: ViewId) -> ViewResult<()> {
        for child in self.child_entries(id)? {
            if self.view(child).is_ok() {
                self.destroy_view_tree(child)?;
                continue;
            }
            let views = std::mem::take(&mut self.container_mut(child)?.views);
            for view in views {
                self.destroy_view_tree(view)?;
            }
        }

        let disposables: Vec<Disposable> = self
            .view_mut(id)?
            .disposables
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        for disposable in disposables {
            tracing::debug!("disposing listener {:?} of {:?}", disposable.handler, id);
            self.view_mut(disposable.renderer_view)?
                .renderer
                .unlisten(disposable.handler);
        }

        let view = self.view_mut(id)?;
        let elements: Vec<NodeId> = view
            .nodes
            .iter()
            .map(|n| n.render_element)
            .filter(|el| el.is_valid())
            .collect();
        for el in elements {
            view.renderer.destroy_node(el);
        }
        view.state |= ViewState::DESTROYED;
        tracing::debug!("destroyed view {:?}", id);
        Ok(())
    }

    // ---- change detection ----

    /// Run the update pass over `view` and its descendants, followed in
    /// development mode by the verification pass.
    pub fn detect_changes(&mut self, view: ViewId) -> ViewResult<()> {
        self.check_view(view, CheckType::CheckAndUpdate)?;
        if self.config.dev_mode {
            self.check_view(view, CheckType::CheckNoChanges)?;
        }
        Ok(())
    }

    fn check_view(&mut self, id: ViewId, check_type: CheckType) -> ViewResult<()> {
        let update = self.live_view(id)?.def.update_renderer.clone();
        if let Some(update) = update {
            update(self, id, check_type)?;
        }

        let children = self.child_entries(id)?;
        // Embedded views before component views
        for child in &children {
            if let Ok(container) = self.container(*child) {
                for view in container.views.clone() {
                    self.check_view(view, check_type)?;
                }
            }
        }
        for child in &children {
            if self.view(*child).is_ok() {
                self.check_view(*child, check_type)?;
            }
        }

        if check_type == CheckType::CheckAndUpdate {
            self.view_mut(id)?
                .state
                .remove(ViewState::DIRTY);
        }
        Ok(())
    }

    /// Flag `view` and its ancestors as needing a check
    pub fn mark_for_check(&mut self, view: ViewId) {
        let mut current = Some(view);
        while let Some(id) = current {
            let Ok(entry) = self.entry_mut(id) else {
                break;
            };
            if let Some(v) = entry.as_view_mut() {
                v.state |= ViewState::DIRTY;
            }
            current = entry.header.parent;
        }
    }

    /// Render element of a node
    pub fn render_element(&self, view: ViewId, node_index: usize) -> ViewResult<NodeId> {
        self.view(view)?
            .node(node_index)
            .map(|n| n.render_element)
            .ok_or(ViewError::UnknownNode { view, node_index })
    }

    /// Container created for an anchor node
    pub fn container_at(&self, view: ViewId, node_index: usize) -> ViewResult<ContainerId> {
        self.view(view)?
            .node(node_index)
            .and_then(|n| n.container)
            .ok_or(ViewError::NoTemplate { view, node_index })
    }

    /// Component view hosted on a node, if any
    pub fn component_view(&self, view: ViewId, node_index: usize) -> ViewResult<Option<ViewId>> {
        self.view(view)?
            .node(node_index)
            .map(|n| n.component_view)
            .ok_or(ViewError::UnknownNode { view, node_index })
    }
}

impl EventSink for ViewTree {
    fn dispatch(&mut self, view: ViewId, node_index: usize, event_name: &str, event: &Event) -> bool {
        let handler = match self.live_view(view) {
            Ok(v) => v
                .def
                .nodes
                .get(node_index)
                .and_then(|n| n.element.handle_event.clone()),
            Err(_) => {
                tracing::trace!("ignoring {} for {:?}", event_name, view);
                return true;
            }
        };
        self.mark_for_check(view);
        match handler {
            Some(handler) => handler(&ElementEvent {
                view,
                node_index,
                event_name,
                event,
            }),
            None => true,
        }
    }
}

/// Iterator over `next` links
pub struct Siblings<'a> {
    tree: &'a ViewTree,
    current: Option<EntryId>,
}

impl Iterator for Siblings<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let id = self.current?;
        self.current = self.tree.header(id).ok().and_then(|h| h.next);
        Some(id)
    }
}
