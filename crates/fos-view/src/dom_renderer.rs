//! DOM Renderer
//!
//! [`Renderer`] backed by a shared [`DomTree`]. All renderers created by one
//! factory mutate the same tree and share one listener table.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use fos_dom::{DomResult, DomTree, EventTarget, HandlerId, NodeId};

use crate::renderer::{
    ElementListener, Encapsulation, EventSink, Renderer, RendererFactory, RendererType, RootHost,
};
use crate::{Event, Value};

#[derive(Debug)]
struct DomState {
    tree: DomTree,
    listeners: HashMap<HandlerId, ElementListener>,
}

/// Factory handing out [`DomRenderer`]s over one tree
#[derive(Debug, Clone)]
pub struct DomRendererFactory {
    state: Rc<RefCell<DomState>>,
}

impl DomRendererFactory {
    pub fn new(tree: DomTree) -> Self {
        Self {
            state: Rc::new(RefCell::new(DomState {
                tree,
                listeners: HashMap::new(),
            })),
        }
    }

    pub fn tree(&self) -> Ref<'_, DomTree> {
        Ref::map(self.state.borrow(), |s| &s.tree)
    }

    pub fn tree_mut(&self) -> RefMut<'_, DomTree> {
        RefMut::map(self.state.borrow_mut(), |s| &mut s.tree)
    }

    /// Number of live listeners across all renderers
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Deliver `event` to every matching listener, bubbling through ancestors
    /// of a node target. Returns `false` if the default action was prevented.
    pub fn dispatch_event(&self, event: &mut Event, sink: &mut dyn EventSink) -> bool {
        let listeners: Vec<ElementListener> = {
            let state = self.state.borrow();
            let mut targets = vec![event.target];
            if let EventTarget::Node(node) = event.target {
                if event.bubbles {
                    let mut current = state.tree.parent(node);
                    while let Some(parent) = current {
                        targets.push(EventTarget::Node(parent));
                        current = state.tree.parent(parent);
                    }
                }
            }
            targets
                .into_iter()
                .flat_map(|target| state.tree.listeners().listeners(target, &event.event_type))
                .filter_map(|id| state.listeners.get(&id).cloned())
                .collect()
        };

        tracing::trace!(
            "dispatching {} to {} listeners",
            event.event_type,
            listeners.len()
        );
        for listener in listeners {
            if !sink.dispatch(listener.view, listener.node_index, &listener.event_name, event) {
                event.prevent_default();
            }
        }
        !event.is_default_prevented()
    }
}

impl Default for DomRendererFactory {
    fn default() -> Self {
        Self::new(DomTree::new())
    }
}

impl RendererFactory for DomRendererFactory {
    fn create_renderer(
        &mut self,
        host: Option<NodeId>,
        renderer_type: Option<&RendererType>,
    ) -> Box<dyn Renderer> {
        let mut content_attr = None;
        if let Some(rt) = renderer_type.filter(|rt| rt.encapsulation == Encapsulation::Emulated) {
            content_attr = Some(format!("_fos-content-{}", rt.id));
            if let Some(host) = host {
                let host_attr = format!("_fos-host-{}", rt.id);
                let mut state = self.state.borrow_mut();
                if let Ok(el) = state.tree.element_mut(host) {
                    el.attrs.set(None, &host_attr, "");
                }
            }
        }
        Box::new(DomRenderer {
            state: self.state.clone(),
            content_attr,
        })
    }
}

/// Renderer mutating the shared tree
#[derive(Debug)]
pub struct DomRenderer {
    state: Rc<RefCell<DomState>>,
    /// Stamped on every created element under emulated encapsulation
    content_attr: Option<String>,
}

impl DomRenderer {
    fn with_tree<T>(&self, op: &str, f: impl FnOnce(&mut DomTree) -> DomResult<T>) -> Option<T> {
        let mut state = self.state.borrow_mut();
        match f(&mut state.tree) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("renderer {} failed: {}", op, e);
                None
            }
        }
    }
}

impl Renderer for DomRenderer {
    fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId {
        let mut state = self.state.borrow_mut();
        let el = state.tree.create_element_ns(namespace, name);
        if let Some(attr) = &self.content_attr {
            if let Ok(data) = state.tree.element_mut(el) {
                data.attrs.set(None, attr, "");
            }
        }
        el
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.state.borrow_mut().tree.create_comment(text)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.with_tree("append_child", |tree| tree.append_child(parent, child));
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.with_tree("insert_before", |tree| tree.insert_before(parent, child, reference));
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.with_tree("remove_child", |tree| tree.remove_child(parent, child));
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().tree.parent(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().tree.next_sibling(node)
    }

    fn select_root_element(&mut self, host: &RootHost) -> Option<NodeId> {
        let mut state = self.state.borrow_mut();
        let el = match host {
            RootHost::Selector(selector) => state.tree.select(selector)?,
            RootHost::Node(node) => state.tree.element(*node).ok().map(|_| *node)?,
        };
        // The root element's previous content is replaced by the view
        for child in state.tree.child_ids(el) {
            let _ = state.tree.remove_child(el, child);
        }
        Some(el)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str, namespace: Option<&str>) {
        self.with_tree("set_attribute", |tree| {
            tree.element_mut(node)?.attrs.set(namespace, name, value);
            Ok(())
        });
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str, namespace: Option<&str>) {
        self.with_tree("remove_attribute", |tree| {
            tree.element_mut(node)?.attrs.remove(namespace, name);
            Ok(())
        });
    }

    fn add_class(&mut self, node: NodeId, name: &str) {
        self.with_tree("add_class", |tree| {
            tree.element_mut(node)?.classes.add(name);
            Ok(())
        });
    }

    fn remove_class(&mut self, node: NodeId, name: &str) {
        self.with_tree("remove_class", |tree| {
            tree.element_mut(node)?.classes.remove(name);
            Ok(())
        });
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        self.with_tree("set_style", |tree| {
            tree.element_mut(node)?.set_style(name, value);
            Ok(())
        });
    }

    fn remove_style(&mut self, node: NodeId, name: &str) {
        self.with_tree("remove_style", |tree| {
            tree.element_mut(node)?.remove_style(name);
            Ok(())
        });
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: &Value) {
        self.with_tree("set_property", |tree| {
            tree.element_mut(node)?
                .properties
                .insert(name.to_string(), value.clone());
            Ok(())
        });
    }

    fn listen(&mut self, target: EventTarget, event_name: &str, listener: ElementListener) -> HandlerId {
        let mut state = self.state.borrow_mut();
        let id = state.tree.listeners_mut().add_listener(target, event_name);
        state.listeners.insert(id, listener);
        id
    }

    fn unlisten(&mut self, id: HandlerId) {
        let mut state = self.state.borrow_mut();
        state.tree.listeners_mut().remove_listener(id);
        state.listeners.remove(&id);
    }
}
