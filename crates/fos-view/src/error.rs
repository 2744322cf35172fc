//! View engine errors

use crate::view::EntryId;
use crate::Value;

/// View engine error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    /// A bound value changed after it was checked in the same cycle
    #[error(
        "expression has changed after it was checked: binding '{binding}' of node {node_index} in {view:?}, previous value: '{}', current value: '{new}'",
        describe(.old)
    )]
    ExpressionChanged {
        view: EntryId,
        node_index: usize,
        binding: String,
        old: Option<Value>,
        new: Value,
    },

    #[error("unknown entry {0:?}")]
    UnknownEntry(EntryId),

    #[error("{0:?} is not a view")]
    NotAView(EntryId),

    #[error("{0:?} is not a container")]
    NotAContainer(EntryId),

    #[error("view {view:?} has no node {node_index}")]
    UnknownNode { view: EntryId, node_index: usize },

    #[error("node {node_index} of {view:?} is not an element")]
    NotAnElement { view: EntryId, node_index: usize },

    #[error("node {node_index} of {view:?} has no embedded template")]
    NoTemplate { view: EntryId, node_index: usize },

    #[error("view {0:?} has been destroyed")]
    ViewDestroyed(EntryId),

    #[error("index {index} out of bounds for container of {len} views")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("view {0:?} is already attached to a container")]
    ViewAlreadyAttached(EntryId),

    #[error("view {0:?} is not an embedded view")]
    NotEmbedded(EntryId),

    #[error("the selector \"{0}\" did not match any elements")]
    RootNotFound(String),
}

pub type ViewResult<T> = Result<T, ViewError>;

fn describe(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "undefined".to_string(),
    }
}
