//! Animation Drivers
//!
//! A driver turns keyframes into a player for an element.

use fos_dom::{DomTree, NodeId};

use crate::{AnimationError, AnimationPlayer, MicrotaskQueue, NoopAnimationPlayer, StyleMap};

/// A single keyframe: an offset in `[0, 1]` and the styles at that offset
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub offset: f64,
    pub styles: StyleMap,
}

impl Keyframe {
    pub fn new(offset: f64, styles: &[(&str, &str)]) -> Self {
        Self {
            offset,
            styles: styles
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Timing of an animation, in milliseconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timing {
    pub duration: f64,
    pub delay: f64,
    pub easing: Option<String>,
}

impl Timing {
    pub fn new(duration: f64, delay: f64) -> Self {
        Self {
            duration,
            delay,
            easing: None,
        }
    }

    pub fn with_easing(mut self, easing: &str) -> Self {
        self.easing = Some(easing.to_string());
        self
    }
}

/// Style property names are restricted to ASCII identifiers (kebab or camel case)
pub fn validate_style_property(prop: &str) -> bool {
    let mut chars = prop.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '-' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Environment-specific animation backend
pub trait AnimationDriver {
    fn validate_style_property(&self, prop: &str) -> bool {
        validate_style_property(prop)
    }

    fn matches_element(&self, tree: &DomTree, element: NodeId, selector: &str) -> bool {
        tree.matches(element, selector)
    }

    fn contains_element(&self, tree: &DomTree, ancestor: NodeId, element: NodeId) -> bool {
        tree.contains(ancestor, element)
    }

    fn query(&self, tree: &DomTree, element: NodeId, selector: &str, multi: bool) -> Vec<NodeId> {
        tree.query(element, selector, multi)
    }

    /// Inline style of an element, or `default` when unset
    fn compute_style(&self, tree: &DomTree, element: NodeId, prop: &str, default: &str) -> String {
        tree.element(element)
            .ok()
            .and_then(|el| el.style(prop))
            .unwrap_or(default)
            .to_string()
    }

    /// Build a player for `element`. The tree is read for styles the
    /// keyframes leave unspecified.
    fn animate(
        &self,
        tree: &DomTree,
        element: NodeId,
        keyframes: Vec<Keyframe>,
        timing: Timing,
        previous_players: &[&dyn AnimationPlayer],
        scrubber_access_requested: bool,
    ) -> Result<Box<dyn AnimationPlayer>, AnimationError>;
}

/// Driver used when animations are disabled
#[derive(Debug, Clone, Default)]
pub struct NoopAnimationDriver {
    queue: MicrotaskQueue,
}

impl NoopAnimationDriver {
    pub fn new(queue: MicrotaskQueue) -> Self {
        Self { queue }
    }
}

impl AnimationDriver for NoopAnimationDriver {
    fn animate(
        &self,
        _tree: &DomTree,
        element: NodeId,
        _keyframes: Vec<Keyframe>,
        timing: Timing,
        _previous_players: &[&dyn AnimationPlayer],
        _scrubber_access_requested: bool,
    ) -> Result<Box<dyn AnimationPlayer>, AnimationError> {
        tracing::debug!("noop animation for {:?}", element);
        Ok(Box::new(NoopAnimationPlayer::new(
            self.queue.clone(),
            timing.duration,
            timing.delay,
        )))
    }
}
