//! Output listeners, dispatch and listener disposal

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::Fixture;
use fos_view::{
    Encapsulation, Event, EventTarget, ElementDefBuilder, OutputTarget, RendererType,
    ViewDefinition, ViewId, ViewState,
};

type Seen = Rc<RefCell<Vec<(usize, String)>>>;

/// Root view with a button listening to `click` and `window:resize`.
/// The handler prevents the default action of clicks only.
fn button_view(fx: &mut Fixture) -> (ViewId, Seen) {
    let seen = Seen::default();
    let sink = seen.clone();
    let def = Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("div").build(),
            ElementDefBuilder::new("button")
                .output(OutputTarget::ElementLocal, "click")
                .output(OutputTarget::Window, "resize")
                .on_event(move |e| {
                    sink.borrow_mut().push((e.node_index, e.event_name.to_string()));
                    e.event_name != "click"
                })
                .build(),
        ],
        None,
    ));
    let view = fx.tree.create_root_view(def, None).unwrap();
    (view, seen)
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[test]
fn test_outputs_register_listeners() {
    let mut fx = Fixture::new(false);
    let (view, _) = button_view(&mut fx);

    assert_eq!(fx.drain(), vec!["r0 listen click", "r0 listen resize"]);
    assert_eq!(fx.dom.listener_count(), 2);
    assert_eq!(fx.tree.view(view).unwrap().state(), ViewState::NONE);
}

// ============================================================================
// DISPATCH
// ============================================================================

#[test]
fn test_dispatch_reaches_node_handler() {
    let mut fx = Fixture::new(false);
    let (view, seen) = button_view(&mut fx);
    let button = fx.tree.render_element(view, 1).unwrap();

    let mut click = Event::new("click", EventTarget::Node(button));
    assert!(!fx.dom.dispatch_event(&mut click, &mut fx.tree));
    assert!(click.is_default_prevented());

    let mut resize = Event::new("resize", EventTarget::Window);
    assert!(fx.dom.dispatch_event(&mut resize, &mut fx.tree));

    assert_eq!(
        *seen.borrow(),
        vec![(1, "click".to_string()), (1, "window:resize".to_string())]
    );
}

#[test]
fn test_dispatch_marks_view_dirty() {
    let mut fx = Fixture::new(false);
    let (view, _) = button_view(&mut fx);
    fx.tree.detect_changes(view).unwrap();
    assert!(!fx.tree.view(view).unwrap().state().contains(ViewState::DIRTY));

    let mut resize = Event::new("resize", EventTarget::Window);
    fx.dom.dispatch_event(&mut resize, &mut fx.tree);
    assert!(fx.tree.view(view).unwrap().state().contains(ViewState::DIRTY));

    fx.tree.detect_changes(view).unwrap();
    assert!(!fx.tree.view(view).unwrap().state().contains(ViewState::DIRTY));
}

#[test]
fn test_unrelated_events_are_not_delivered() {
    let mut fx = Fixture::new(false);
    let (view, seen) = button_view(&mut fx);
    let other = fx.tree.render_element(view, 0).unwrap();

    let mut click = Event::new("click", EventTarget::Node(other));
    assert!(fx.dom.dispatch_event(&mut click, &mut fx.tree));
    let mut scroll = Event::new("scroll", EventTarget::Window);
    assert!(fx.dom.dispatch_event(&mut scroll, &mut fx.tree));
    assert!(seen.borrow().is_empty());
}

// ============================================================================
// DISPOSAL
// ============================================================================

#[test]
fn test_destroy_unlistens_exactly_once() {
    let mut fx = Fixture::new(false);
    let (view, seen) = button_view(&mut fx);
    let button = fx.tree.render_element(view, 1).unwrap();
    fx.drain();

    fx.tree.destroy_view(view).unwrap();
    assert_eq!(fx.drain(), vec!["r0 unlisten", "r0 unlisten"]);
    assert_eq!(fx.dom.listener_count(), 0);
    assert!(fx.tree.view(view).unwrap().is_destroyed());

    fx.tree.destroy_view(view).unwrap();
    assert!(fx.drain().is_empty());

    let mut click = Event::new("click", EventTarget::Node(button));
    assert!(fx.dom.dispatch_event(&mut click, &mut fx.tree));
    assert!(seen.borrow().is_empty());
}

// ============================================================================
// COMPONENT OUTPUTS
// ============================================================================

#[test]
fn test_component_output_listens_through_component_renderer() {
    let mut fx = Fixture::new(false);
    let seen = Seen::default();
    let sink = seen.clone();
    let comp = Rc::new(ViewDefinition::new(vec![ElementDefBuilder::new("span").build()], None));
    let def = Rc::new(ViewDefinition::new(
        vec![ElementDefBuilder::new("my-cmp")
            .component(comp, Some(RendererType::new("c1", Encapsulation::None)))
            .output(OutputTarget::Component, "changed")
            .output(OutputTarget::ElementLocal, "click")
            .on_event(move |e| {
                sink.borrow_mut().push((e.node_index, e.event_name.to_string()));
                true
            })
            .build()],
        None,
    ));
    let view = fx.tree.create_root_view(def, None).unwrap();
    assert_eq!(fx.drain(), vec!["r1 listen changed", "r0 listen click"]);

    let host = fx.tree.render_element(view, 0).unwrap();
    let mut changed = Event::new("changed", EventTarget::Node(host));
    assert!(fx.dom.dispatch_event(&mut changed, &mut fx.tree));
    assert_eq!(*seen.borrow(), vec![(0, "component:changed".to_string())]);

    // Each handler goes back to the renderer that issued it
    fx.tree.destroy_view(view).unwrap();
    assert_eq!(fx.drain(), vec!["r1 unlisten", "r0 unlisten"]);
    let comp_view = fx.tree.component_view(view, 0).unwrap().unwrap();
    assert!(fx.tree.view(comp_view).unwrap().is_destroyed());
}
