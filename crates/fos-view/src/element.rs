//! Element Nodes
//!
//! Render-node construction, output wiring and the per-binding change
//! detection that applies bound values to render nodes.

use fos_dom::{loose_identical, EventTarget, NodeId};
use fos_security::SecurityContext;

use crate::config::MAX_INLINE_BINDINGS;
use crate::defs::{element_event_full_name, BindingDef, BindingFlags, BindingKind, NodeDef, OutputTarget};
use crate::renderer::{ElementListener, Encapsulation, Renderer, Sanitizer};
use crate::view::{CheckType, Disposable, ViewId, ViewKind, ViewTree};
use crate::{Value, ViewError, ViewResult};

impl ViewTree {
    /// Element a node's render element is appended to, or `None` when it is
    /// not appended (content of a component host, or no host at all)
    pub(crate) fn parent_render_element(
        &self,
        view: ViewId,
        render_host: Option<NodeId>,
        def: &NodeDef,
    ) -> ViewResult<Option<NodeId>> {
        let Some(render_parent) = def.render_parent else {
            return Ok(render_host);
        };
        let v = self.view(view)?;
        let parent_def = v.def.nodes.get(render_parent).ok_or(ViewError::UnknownNode {
            view,
            node_index: render_parent,
        })?;
        let native = parent_def
            .element
            .component_renderer_type
            .as_ref()
            .is_some_and(|rt| rt.encapsulation == Encapsulation::Native);
        if !parent_def.is_component_host() || native {
            self.render_element(view, render_parent).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Create the render node for `def`, append it to its render parent and
    /// apply the fixed attributes
    pub fn create_element(
        &mut self,
        view: ViewId,
        render_host: Option<NodeId>,
        def: &NodeDef,
    ) -> ViewResult<NodeId> {
        let parent_el = self.parent_render_element(view, render_host, def)?;
        let v = self.view_mut(view)?;

        let root_host = match &v.kind {
            ViewKind::Root { host: Some(host) } if def.parent.is_none() && def.element.name.is_some() => {
                Some(host.clone())
            }
            _ => None,
        };

        let el = match root_host {
            Some(host) => v
                .renderer
                .select_root_element(&host)
                .ok_or_else(|| ViewError::RootNotFound(host.to_string()))?,
            None => {
                let el = match &def.element.name {
                    Some(name) => v.renderer.create_element(name, def.element.ns.as_deref()),
                    None => v.renderer.create_comment(""),
                };
                if let Some(parent) = parent_el {
                    v.renderer.append_child(parent, el);
                }
                el
            }
        };

        for (ns, name, value) in &def.element.attrs {
            v.renderer.set_attribute(el, name, value, ns.as_deref());
        }
        let data = v
            .nodes
            .get_mut(def.node_index)
            .ok_or(ViewError::UnknownNode {
                view,
                node_index: def.node_index,
            })?;
        data.render_element = el;
        Ok(el)
    }

    /// Register a listener for every output of `def`. Component outputs listen
    /// through the component view's renderer; all events are delivered back
    /// to `view` under their full name.
    pub fn listen_to_element_outputs(
        &mut self,
        view: ViewId,
        component_view: Option<ViewId>,
        def: &NodeDef,
        el: NodeId,
    ) -> ViewResult<()> {
        for (i, output) in def.outputs.iter().enumerate() {
            let listener = ElementListener {
                view,
                node_index: def.node_index,
                event_name: element_event_full_name(output.target, &output.event_name),
            };
            let (target, renderer_view) = match output.target {
                OutputTarget::Window => (EventTarget::Window, view),
                OutputTarget::Document => (EventTarget::Document, view),
                OutputTarget::Body => (EventTarget::Body, view),
                OutputTarget::Component => (EventTarget::Node(el), component_view.unwrap_or(view)),
                OutputTarget::ElementLocal => (EventTarget::Node(el), view),
            };
            tracing::debug!("listening to {} on {:?}", listener.event_name, target);
            let handler = self
                .view_mut(renderer_view)?
                .renderer
                .listen(target, &output.event_name, listener);

            let slot = def.output_index + i;
            let v = self.view_mut(view)?;
            if let Some(disposable) = v.disposables.get_mut(slot) {
                *disposable = Some(Disposable {
                    renderer_view,
                    handler,
                });
            }
        }
        Ok(())
    }

    // ---- change detection ----

    /// Check up to ten positional values against the node's bindings
    pub fn check_and_update_element_inline<const N: usize>(
        &mut self,
        view: ViewId,
        node_index: usize,
        values: [Value; N],
    ) -> ViewResult<bool> {
        self.check_element_inline(view, node_index, CheckType::CheckAndUpdate, values)
    }

    /// Check any number of values against the node's bindings
    pub fn check_and_update_element_dynamic(
        &mut self,
        view: ViewId,
        node_index: usize,
        values: &[Value],
    ) -> ViewResult<bool> {
        self.check_element_dynamic(view, node_index, CheckType::CheckAndUpdate, values)
    }

    /// Verify that no positional value differs from the last applied one
    pub fn check_no_changes_element_inline<const N: usize>(
        &mut self,
        view: ViewId,
        node_index: usize,
        values: [Value; N],
    ) -> ViewResult<bool> {
        self.check_element_inline(view, node_index, CheckType::CheckNoChanges, values)
    }

    pub fn check_no_changes_element_dynamic(
        &mut self,
        view: ViewId,
        node_index: usize,
        values: &[Value],
    ) -> ViewResult<bool> {
        self.check_element_dynamic(view, node_index, CheckType::CheckNoChanges, values)
    }

    /// Values beyond the node's binding count are ignored
    pub fn check_element_inline<const N: usize>(
        &mut self,
        view: ViewId,
        node_index: usize,
        check_type: CheckType,
        values: [Value; N],
    ) -> ViewResult<bool> {
        const { assert!(N <= MAX_INLINE_BINDINGS, "too many inline binding values") };
        let bind_len = self.element_binding_count(view, node_index)?;
        let mut changed = false;
        for (i, value) in values.into_iter().take(bind_len).enumerate() {
            changed |= self.check_element_value(view, node_index, i, value, check_type)?;
        }
        Ok(changed)
    }

    pub fn check_element_dynamic(
        &mut self,
        view: ViewId,
        node_index: usize,
        check_type: CheckType,
        values: &[Value],
    ) -> ViewResult<bool> {
        let bind_len = self.element_binding_count(view, node_index)?;
        let mut changed = false;
        for (i, value) in values.iter().take(bind_len).enumerate() {
            changed |= self.check_element_value(view, node_index, i, value.clone(), check_type)?;
        }
        Ok(changed)
    }

    fn element_binding_count(&self, view: ViewId, node_index: usize) -> ViewResult<usize> {
        let def = self
            .live_view(view)?
            .def
            .nodes
            .get(node_index)
            .ok_or(ViewError::UnknownNode { view, node_index })?;
        if !def.is_element() {
            return Err(ViewError::NotAnElement { view, node_index });
        }
        Ok(def.bindings.len())
    }

    /// Compare one value with its slot and apply it when it changed
    fn check_element_value(
        &mut self,
        view: ViewId,
        node_index: usize,
        binding_index: usize,
        value: Value,
        check_type: CheckType,
    ) -> ViewResult<bool> {
        let dev_mode = self.config.dev_mode;
        let def = self.live_view(view)?.def.clone();
        let node_def = def
            .nodes
            .get(node_index)
            .ok_or(ViewError::UnknownNode { view, node_index })?;
        let binding = node_def
            .bindings
            .get(binding_index)
            .ok_or(ViewError::IndexOutOfBounds {
                index: binding_index,
                len: node_def.bindings.len(),
            })?;
        let slot = node_def.binding_index + binding_index;

        let v = self.view_mut(view)?;
        let old = v.old_values.get_mut(slot).ok_or(ViewError::IndexOutOfBounds {
            index: slot,
            len: def.binding_count,
        })?;

        match check_type {
            CheckType::CheckNoChanges => {
                if !dev_mode {
                    return Ok(false);
                }
                match old.as_ref() {
                    Some(previous) if loose_identical(previous, &value) => Ok(false),
                    _ => Err(ViewError::ExpressionChanged {
                        view,
                        node_index,
                        binding: binding.non_minified_name.clone(),
                        old: old.clone(),
                        new: value,
                    }),
                }
            }
            CheckType::CheckAndUpdate => {
                if old.as_ref().is_some_and(|old| loose_identical(old, &value)) {
                    return Ok(false);
                }
                *old = Some(value.clone());
                self.apply_binding(view, node_def, binding, &value)?;
                Ok(true)
            }
        }
    }

    fn apply_binding(
        &mut self,
        view: ViewId,
        node_def: &NodeDef,
        binding: &BindingDef,
        value: &Value,
    ) -> ViewResult<()> {
        let (el, component_view) = {
            let data = self
                .view(view)?
                .node(node_def.node_index)
                .ok_or(ViewError::UnknownNode {
                    view,
                    node_index: node_def.node_index,
                })?;
            (data.render_element, data.component_view)
        };

        match binding.kind() {
            Some(BindingKind::Attribute) => {
                let (renderer, sanitizer) = self.renderer_and_sanitizer(view)?;
                set_element_attribute(renderer, sanitizer, binding, el, value);
            }
            Some(BindingKind::ClassToggle) => {
                let (renderer, _) = self.renderer_and_sanitizer(view)?;
                set_element_class(renderer, binding, el, value);
            }
            Some(BindingKind::Style) => {
                let (renderer, sanitizer) = self.renderer_and_sanitizer(view)?;
                set_element_style(renderer, sanitizer, binding, el, value);
            }
            Some(BindingKind::Property | BindingKind::SyntheticHostProperty) => {
                let target_view = if node_def.is_component_host()
                    && binding.flags.contains(BindingFlags::SYNTHETIC_HOST_PROPERTY)
                {
                    component_view.unwrap_or(view)
                } else {
                    view
                };
                let (renderer, sanitizer) = self.renderer_and_sanitizer(target_view)?;
                set_element_property(renderer, sanitizer, binding, el, value);
            }
            None => tracing::trace!("binding {} has no applicable kind", binding.name),
        }
        Ok(())
    }

    fn renderer_and_sanitizer(&mut self, view: ViewId) -> ViewResult<(&mut dyn Renderer, &dyn Sanitizer)> {
        let ViewTree {
            entries, sanitizer, ..
        } = self;
        let v = entries
            .get_mut(view.index())
            .ok_or(ViewError::UnknownEntry(view))?
            .as_view_mut()
            .ok_or(ViewError::NotAView(view))?;
        Ok((&mut *v.renderer, &**sanitizer))
    }
}

/// Set-vs-remove follows the nullity of the value before sanitization
fn set_element_attribute(
    renderer: &mut dyn Renderer,
    sanitizer: &dyn Sanitizer,
    binding: &BindingDef,
    el: NodeId,
    value: &Value,
) {
    let ns = binding.ns.as_deref();
    if value.is_null() {
        tracing::trace!("remove attribute {} on {:?}", binding.name, el);
        renderer.remove_attribute(el, &binding.name, ns);
        return;
    }
    let render_value = match binding.security_context {
        Some(ctx) if ctx != SecurityContext::None => sanitizer.sanitize(ctx, value),
        _ => value.to_render_string(),
    };
    let render_value = render_value.unwrap_or_default();
    tracing::trace!("set attribute {}={} on {:?}", binding.name, render_value, el);
    renderer.set_attribute(el, &binding.name, &render_value, ns);
}

fn set_element_class(renderer: &mut dyn Renderer, binding: &BindingDef, el: NodeId, value: &Value) {
    if value.is_truthy() {
        tracing::trace!("add class {} on {:?}", binding.name, el);
        renderer.add_class(el, &binding.name);
    } else {
        tracing::trace!("remove class {} on {:?}", binding.name, el);
        renderer.remove_class(el, &binding.name);
    }
}

/// Sanitized before the null check; the suffix only applies to present values
fn set_element_style(
    renderer: &mut dyn Renderer,
    sanitizer: &dyn Sanitizer,
    binding: &BindingDef,
    el: NodeId,
    value: &Value,
) {
    match sanitizer.sanitize(SecurityContext::Style, value) {
        Some(mut render_value) => {
            if let Some(suffix) = &binding.suffix {
                render_value.push_str(suffix);
            }
            tracing::trace!("set style {}={} on {:?}", binding.name, render_value, el);
            renderer.set_style(el, &binding.name, &render_value);
        }
        None => {
            tracing::trace!("remove style {} on {:?}", binding.name, el);
            renderer.remove_style(el, &binding.name);
        }
    }
}

/// Properties keep their value type unless a security context applies
fn set_element_property(
    renderer: &mut dyn Renderer,
    sanitizer: &dyn Sanitizer,
    binding: &BindingDef,
    el: NodeId,
    value: &Value,
) {
    let render_value = match binding.security_context {
        Some(ctx) if ctx != SecurityContext::None => {
            sanitizer.sanitize(ctx, value).map(Value::Str).unwrap_or_default()
        }
        _ => value.clone(),
    };
    tracing::trace!("set property {} on {:?}", binding.name, el);
    renderer.set_property(el, &binding.name, &render_value);
}
