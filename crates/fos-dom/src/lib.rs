//! fOS DOM - Document Object Model
//!
//! Arena-backed render-node tree used as the rendering target of the view engine.

mod attributes;
mod classlist;
mod events;
mod node;
mod operations;
mod tree;
mod value;

pub use attributes::{Attr, NamedNodeMap};
pub use classlist::DOMTokenList;
pub use events::{Event, EventTarget, HandlerId, ListenerRegistry};
pub use node::{ElementData, Node, NodeData};
pub use operations::{DomError, DomResult};
pub use tree::{Children, DomTree};
pub use value::{loose_identical, Value};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
