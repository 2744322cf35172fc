//! Recording renderer shared by the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fos_view::{
    DomRendererFactory, ElementListener, EventTarget, HandlerId, NodeId, Renderer,
    RendererFactory, RendererType, RootHost, Value, ViewConfig, ViewTree,
};

/// Route engine logs to the test output; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub type Log = Rc<RefCell<Vec<String>>>;

/// Wraps DOM renderers and logs every binding mutation as `r<n> <call>`,
/// `n` being the creation order of the renderer
#[derive(Debug)]
pub struct RecordingFactory {
    inner: DomRendererFactory,
    log: Log,
    created: usize,
}

impl RendererFactory for RecordingFactory {
    fn create_renderer(
        &mut self,
        host: Option<NodeId>,
        renderer_type: Option<&RendererType>,
    ) -> Box<dyn Renderer> {
        let id = self.created;
        self.created += 1;
        Box::new(RecordingRenderer {
            id,
            inner: self.inner.create_renderer(host, renderer_type),
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct RecordingRenderer {
    id: usize,
    inner: Box<dyn Renderer>,
    log: Log,
}

impl RecordingRenderer {
    fn record(&self, call: String) {
        self.log.borrow_mut().push(format!("r{} {}", self.id, call));
    }
}

impl Renderer for RecordingRenderer {
    fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId {
        self.inner.create_element(name, namespace)
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.inner.create_comment(text)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.inner.append_child(parent, child)
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.inner.insert_before(parent, child, reference)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.inner.remove_child(parent, child)
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent_node(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.inner.next_sibling(node)
    }

    fn select_root_element(&mut self, host: &RootHost) -> Option<NodeId> {
        self.inner.select_root_element(host)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str, namespace: Option<&str>) {
        match namespace {
            Some(ns) => self.record(format!("setAttribute {}:{}={}", ns, name, value)),
            None => self.record(format!("setAttribute {}={}", name, value)),
        }
        self.inner.set_attribute(node, name, value, namespace)
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str, namespace: Option<&str>) {
        self.record(format!("removeAttribute {}", name));
        self.inner.remove_attribute(node, name, namespace)
    }

    fn add_class(&mut self, node: NodeId, name: &str) {
        self.record(format!("addClass {}", name));
        self.inner.add_class(node, name)
    }

    fn remove_class(&mut self, node: NodeId, name: &str) {
        self.record(format!("removeClass {}", name));
        self.inner.remove_class(node, name)
    }

    fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        self.record(format!("setStyle {}={}", name, value));
        self.inner.set_style(node, name, value)
    }

    fn remove_style(&mut self, node: NodeId, name: &str) {
        self.record(format!("removeStyle {}", name));
        self.inner.remove_style(node, name)
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: &Value) {
        self.record(format!("setProperty {}={}", name, value));
        self.inner.set_property(node, name, value)
    }

    fn listen(&mut self, target: EventTarget, event_name: &str, listener: ElementListener) -> HandlerId {
        self.record(format!("listen {}", event_name));
        self.inner.listen(target, event_name, listener)
    }

    fn unlisten(&mut self, id: HandlerId) {
        self.record("unlisten".to_string());
        self.inner.unlisten(id)
    }
}

pub struct Fixture {
    pub tree: ViewTree,
    pub dom: DomRendererFactory,
    pub log: Log,
}

impl Fixture {
    pub fn new(dev_mode: bool) -> Self {
        init_tracing();
        let dom = DomRendererFactory::default();
        let log = Log::default();
        let factory = RecordingFactory {
            inner: dom.clone(),
            log: log.clone(),
            created: 0,
        };
        let tree = ViewTree::new(ViewConfig::default().with_dev_mode(dev_mode), factory);
        Self { tree, dom, log }
    }

    /// Take the calls recorded so far
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}
