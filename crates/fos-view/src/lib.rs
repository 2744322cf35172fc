//! fOS View Engine
//!
//! Binds template data to render nodes. Node definitions describe a
//! template once; each view instance keeps the last value applied to every
//! binding and only touches the renderer when a value changes.
//!
//! Views and the containers holding embedded views live in one arena,
//! [`ViewTree`], and reach render nodes exclusively through a [`Renderer`].

#[macro_use]
mod flags;

mod config;
mod container;
mod defs;
mod dom_renderer;
mod element;
mod error;
mod renderer;
mod view;

pub use config::{ViewConfig, MAX_INLINE_BINDINGS};
pub use container::{Container, ContainerField, FieldRef, ViewField};
pub use defs::{
    anchor_def, calc_binding_flags, element_def, element_event_full_name, split_namespace,
    BindingDef, BindingFlags, BindingKind, BindingParam, ElementDef, ElementDefBuilder,
    ElementEvent, EventHandler, NodeDef, NodeFlags, OutputDef, OutputTarget, RawBinding,
    UpdateRenderer, ViewDefinition,
};
pub use dom_renderer::{DomRenderer, DomRendererFactory};
pub use error::{ViewError, ViewResult};
pub use renderer::{
    ElementListener, Encapsulation, EventSink, Renderer, RendererFactory, RendererType, RootHost,
    Sanitizer,
};
pub use view::{
    CheckType, ContainerId, Entry, EntryId, EntryKind, Header, NodeData, QuerySet, Siblings,
    View, ViewId, ViewKind, ViewState, ViewTree,
};

pub use fos_dom::{Event, EventTarget, HandlerId, NodeId, Value};
pub use fos_security::SecurityContext;
