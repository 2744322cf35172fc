//! View Containers
//!
//! A container holds the embedded views stamped out of an anchor's template.
//! Its fields keep the fixed offsets of the flat container layout so code
//! that addresses them by position keeps working; `PARENT`, `NEXT` and
//! `QUERIES` share their offsets with views.

use std::rc::Rc;

use fos_dom::NodeId;

use crate::defs::ViewDefinition;
use crate::view::{ContainerId, EntryId, EntryKind, Header, QuerySet, ViewId, ViewKind, ViewTree};
use crate::{ViewError, ViewResult};

/// Container field offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContainerField {
    ActiveIndex = 0,
    Parent = 1,
    Next = 2,
    Queries = 3,
    Views = 4,
    RenderParent = 5,
}

/// View field offsets; the header fields line up with [`ContainerField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ViewField {
    Definition = 0,
    Parent = 1,
    Next = 2,
    Queries = 3,
}

/// Value read through a field offset
#[derive(Debug, Clone)]
pub enum FieldRef<'a> {
    ActiveIndex(Option<usize>),
    Parent(Option<EntryId>),
    Next(Option<EntryId>),
    Queries(Option<QuerySet>),
    Views(&'a [ViewId]),
    RenderParent(Option<NodeId>),
    Definition(&'a Rc<ViewDefinition>),
}

/// Embedded view container
#[derive(Debug)]
pub struct Container {
    /// Next view a managed pass writes to; `None` once the container is
    /// indexed manually
    pub(crate) active_index: Option<usize>,
    pub(crate) views: Vec<ViewId>,
    /// Element the views render into; `None` when headless
    pub(crate) render_parent: Option<NodeId>,
    pub(crate) anchor_view: ViewId,
    pub(crate) anchor_node: usize,
    /// Comment node the views are inserted after
    pub(crate) anchor: NodeId,
}

impl Container {
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn is_manual(&self) -> bool {
        self.active_index.is_none()
    }

    pub fn views(&self) -> &[ViewId] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn render_parent(&self) -> Option<NodeId> {
        self.render_parent
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn index_of(&self, view: ViewId) -> Option<usize> {
        self.views.iter().position(|v| *v == view)
    }
}

impl ViewTree {
    /// Read a container field by offset
    pub fn container_field(&self, id: ContainerId, field: ContainerField) -> ViewResult<FieldRef<'_>> {
        let entry = self.entry(id)?;
        let container = entry.as_container().ok_or(ViewError::NotAContainer(id))?;
        Ok(match field {
            ContainerField::ActiveIndex => FieldRef::ActiveIndex(container.active_index),
            ContainerField::Parent => FieldRef::Parent(entry.header.parent),
            ContainerField::Next => FieldRef::Next(entry.header.next),
            ContainerField::Queries => FieldRef::Queries(entry.header.queries),
            ContainerField::Views => FieldRef::Views(&container.views),
            ContainerField::RenderParent => FieldRef::RenderParent(container.render_parent),
        })
    }

    /// Read a view field by offset
    pub fn view_field(&self, id: ViewId, field: ViewField) -> ViewResult<FieldRef<'_>> {
        let entry = self.entry(id)?;
        let view = entry.as_view().ok_or(ViewError::NotAView(id))?;
        Ok(match field {
            ViewField::Definition => FieldRef::Definition(&view.def),
            ViewField::Parent => FieldRef::Parent(entry.header.parent),
            ViewField::Next => FieldRef::Next(entry.header.next),
            ViewField::Queries => FieldRef::Queries(entry.header.queries),
        })
    }

    /// Container whose declaring view is still alive
    pub(crate) fn live_container(&self, id: ContainerId) -> ViewResult<&Container> {
        let container = self.container(id)?;
        self.live_view(container.anchor_view)?;
        Ok(container)
    }

    /// Create the container for an anchor node of `view`
    pub(crate) fn create_container(&mut self, view: ViewId, node_index: usize) -> ViewResult<ContainerId> {
        let (anchor, render_parent, queries) = {
            let v = self.view(view)?;
            let node_def = v
                .def
                .nodes
                .get(node_index)
                .ok_or(ViewError::UnknownNode { view, node_index })?;
            let anchor = self.render_element(view, node_index)?;
            let render_parent = self.parent_render_element(view, v.render_host, node_def)?;
            let inherited = self.header(view)?.queries.unwrap_or_default();
            let queries = QuerySet(inherited.0 | node_def.matched_query_ids);
            (anchor, render_parent, (queries.0 != 0).then_some(queries))
        };

        let header = Header {
            parent: Some(view),
            next: None,
            queries,
        };
        let container = Container {
            active_index: Some(0),
            views: Vec::new(),
            render_parent,
            anchor_view: view,
            anchor_node: node_index,
            anchor,
        };
        let id = self.alloc(header, EntryKind::Container(container));
        self.push_child(view, id)?;
        tracing::debug!("created container {:?} at node {} of {:?}", id, node_index, view);
        Ok(id)
    }

    /// Hand indexing of `container` over to the caller; the active index is
    /// cleared and never maintained again
    pub fn make_manual(&mut self, container: ContainerId) -> ViewResult<()> {
        self.container_mut(container)?.active_index = None;
        Ok(())
    }

    /// Render nodes at the top level of a view, followed by the views of any
    /// container anchored there
    pub fn root_render_nodes(&self, view: ViewId) -> ViewResult<Vec<NodeId>> {
        let mut nodes = Vec::new();
        self.collect_root_render_nodes(view, &mut nodes)?;
        Ok(nodes)
    }

    fn collect_root_render_nodes(&self, view: ViewId, out: &mut Vec<NodeId>) -> ViewResult<()> {
        let v = self.view(view)?;
        for node_def in v.def.nodes.iter().filter(|n| n.render_parent.is_none()) {
            let Some(data) = v.node(node_def.node_index) else {
                continue;
            };
            if data.render_element.is_valid() {
                out.push(data.render_element);
            }
            if let Some(container) = data.container {
                for child in &self.container(container)?.views {
                    self.collect_root_render_nodes(*child, out)?;
                }
            }
        }
        Ok(())
    }

    /// Insert a detached embedded view at `index`, threading `next` links and
    /// attaching its root render nodes after the anchor or previous view
    pub fn insert_view(&mut self, container: ContainerId, view: ViewId, index: usize) -> ViewResult<()> {
        {
            let v = self.live_view(view)?;
            if !matches!(v.kind, ViewKind::Embedded { .. }) {
                return Err(ViewError::NotEmbedded(view));
            }
            if self.header(view)?.parent.is_some() {
                return Err(ViewError::ViewAlreadyAttached(view));
            }
        }
        let (len, anchor) = {
            let c = self.live_container(container)?;
            (c.views.len(), c.anchor)
        };
        if index > len {
            return Err(ViewError::IndexOutOfBounds { index, len });
        }

        // Last render node before the insertion point
        let mut prev_render_node = anchor;
        for prev in self.container(container)?.views[..index].iter().rev() {
            if let Some(last) = self.root_render_nodes(*prev)?.last() {
                prev_render_node = *last;
                break;
            }
        }

        let (prev, next) = {
            let c = self.container_mut(container)?;
            c.views.insert(index, view);
            if c.active_index.is_some() {
                c.active_index = Some(index + 1);
            }
            let prev = index.checked_sub(1).map(|i| c.views[i]);
            (prev, c.views.get(index + 1).copied())
        };
        if let Some(prev) = prev {
            self.header_mut(prev)?.next = Some(view);
        }
        let queries = self.header(container)?.queries;
        *self.header_mut(view)? = Header {
            parent: Some(container),
            next,
            queries,
        };

        let nodes = self.root_render_nodes(view)?;
        let renderer = &mut self.view_mut(view)?.renderer;
        if let Some(parent) = renderer.parent_node(prev_render_node) {
            let before = renderer.next_sibling(prev_render_node);
            for node in nodes {
                renderer.insert_before(parent, node, before);
            }
        }
        tracing::debug!("inserted {:?} into {:?} at {}", view, container, index);
        Ok(())
    }

    /// Remove the view at `index`, re-threading `next` links and removing its
    /// render nodes. The view stays alive and can be inserted again.
    pub fn detach_view(&mut self, container: ContainerId, index: usize) -> ViewResult<ViewId> {
        self.live_container(container)?;
        let (view, prev) = {
            let c = self.container_mut(container)?;
            let len = c.views.len();
            if index >= len {
                return Err(ViewError::IndexOutOfBounds { index, len });
            }
            let view = c.views.remove(index);
            if let Some(active) = c.active_index {
                c.active_index = Some(active.min(c.views.len()));
            }
            (view, index.checked_sub(1).map(|i| c.views[i]))
        };

        let next = self.header(view)?.next;
        if let Some(prev) = prev {
            self.header_mut(prev)?.next = next;
        }
        *self.header_mut(view)? = Header::default();

        let nodes = self.root_render_nodes(view)?;
        let renderer = &mut self.view_mut(view)?.renderer;
        for node in nodes {
            if let Some(parent) = renderer.parent_node(node) {
                renderer.remove_child(parent, node);
            }
        }
        tracing::debug!("detached {:?} from {:?} at {}", view, container, index);
        Ok(view)
    }

    /// Move the view at `from` to `to`
    pub fn move_view(&mut self, container: ContainerId, from: usize, to: usize) -> ViewResult<ViewId> {
        let len = self.live_container(container)?.views.len();
        if to >= len {
            return Err(ViewError::IndexOutOfBounds { index: to, len });
        }
        let view = self.detach_view(container, from)?;
        self.insert_view(container, view, to)?;
        Ok(view)
    }

    /// Views currently attached to `container`
    pub fn child_views(&self, container: ContainerId) -> ViewResult<&[ViewId]> {
        Ok(&self.container(container)?.views)
    }
}
