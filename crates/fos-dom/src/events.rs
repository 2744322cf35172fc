//! DOM Events
//!
//! Raw events and the listener registry.

use std::collections::HashMap;

use crate::NodeId;

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Node(NodeId),
    Window,
    Document,
    Body,
}

/// Listener handle returned by [`ListenerRegistry::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

/// Raw event as delivered to listeners
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub target: EventTarget,
    pub bubbles: bool,
    pub cancelable: bool,
    default_prevented: bool,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: EventTarget) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            bubbles: true,
            cancelable: true,
            default_prevented: false,
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone)]
struct Registration {
    target: EventTarget,
    event_type: String,
}

/// Listener registry keyed by (target, event type)
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    registrations: HashMap<HandlerId, Registration>,
    by_target: HashMap<(EventTarget, String), Vec<HandlerId>>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add_listener(&mut self, target: EventTarget, event_type: &str) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.registrations.insert(id, Registration {
            target,
            event_type: event_type.to_string(),
        });
        self.by_target
            .entry((target, event_type.to_string()))
            .or_default()
            .push(id);
        id
    }

    /// Remove a listener. Returns false if it was already removed.
    pub fn remove_listener(&mut self, id: HandlerId) -> bool {
        let Some(reg) = self.registrations.remove(&id) else {
            tracing::trace!("listener {:?} already removed", id);
            return false;
        };
        let key = (reg.target, reg.event_type);
        if let Some(ids) = self.by_target.get_mut(&key) {
            ids.retain(|h| *h != id);
            if ids.is_empty() {
                self.by_target.remove(&key);
            }
        }
        true
    }

    /// Listeners for a target and event type, in registration order
    pub fn listeners(&self, target: EventTarget, event_type: &str) -> Vec<HandlerId> {
        self.by_target
            .get(&(target, event_type.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live listeners
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
