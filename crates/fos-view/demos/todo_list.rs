//! Example: a todo list rendered through the view engine
//!
//! Run with `RUST_LOG=fos_view=debug` to see view and container events.

use std::cell::RefCell;
use std::rc::Rc;

use fos_animations::{
    AnimationDriver, AnimationPlayer, Keyframe, MicrotaskQueue, NoopAnimationDriver, Timing,
};
use fos_dom::{DomTree, NodeData};
use fos_view::{
    anchor_def, BindingFlags, BindingParam, CheckType, DomRendererFactory, ElementDefBuilder,
    Event, EventTarget, NodeFlags, NodeId, OutputTarget, RootHost, UpdateRenderer, Value,
    ViewConfig, ViewDefinition, ViewId, ViewResult, ViewTree,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Todo {
    title: String,
    done: bool,
}

type Model = Rc<RefCell<Vec<Todo>>>;

/// `<li [class.done] [textContent]>`
fn item_template(model: Model) -> Rc<ViewDefinition> {
    let update: UpdateRenderer = Rc::new(
        move |tree: &mut ViewTree, view: ViewId, check: CheckType| -> ViewResult<()> {
            let Some(container) = tree.header(view)?.parent else {
                return Ok(());
            };
            let Some(index) = tree.container(container)?.index_of(view) else {
                return Ok(());
            };
            let todo = model.borrow().get(index).cloned();
            if let Some(todo) = todo {
                tree.check_element_inline(
                    view,
                    0,
                    check,
                    [Value::from(todo.done), Value::from(todo.title)],
                )?;
            }
            Ok(())
        },
    );
    Rc::new(ViewDefinition::new(
        vec![ElementDefBuilder::new("li")
            .binding(BindingFlags::CLASS, "done", BindingParam::None)
            .binding(BindingFlags::PROPERTY, "textContent", BindingParam::None)
            .build()],
        Some(update),
    ))
}

/// `<app-root><h1 [title]/><ul><ng-template/></ul><button (click)/></app-root>`
fn app(model: Model) -> Rc<ViewDefinition> {
    let header_model = model.clone();
    let update: UpdateRenderer = Rc::new(
        move |tree: &mut ViewTree, view: ViewId, check: CheckType| -> ViewResult<()> {
            let open = header_model.borrow().iter().filter(|t| !t.done).count();
            tree.check_element_inline(view, 1, check, [Value::from(format!("{} open", open))])?;
            Ok(())
        },
    );
    let click_model = model.clone();
    Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("app-root").child_count(4).build(),
            ElementDefBuilder::new("h1")
                .binding(BindingFlags::ATTRIBUTE, "title", BindingParam::None)
                .build(),
            ElementDefBuilder::new("ul").child_count(1).build(),
            anchor_def(NodeFlags::NONE, &[], None, 0, None, Some(item_template(model))),
            ElementDefBuilder::new("button")
                .output(OutputTarget::ElementLocal, "click")
                .on_event(move |_| {
                    for todo in click_model.borrow_mut().iter_mut() {
                        todo.done = true;
                    }
                    true
                })
                .build(),
        ],
        Some(update),
    ))
}

fn dump(tree: &DomTree, node: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    match tree.get(node).map(|n| &n.data) {
        Some(NodeData::Element(el)) => {
            let attrs: Vec<String> = el
                .attrs
                .iter()
                .map(|a| format!(" {}=\"{}\"", a.qualified_name(), a.value))
                .collect();
            let classes = el.classes.value();
            let text = el
                .property("textContent")
                .map(|v| v.to_string())
                .unwrap_or_default();
            println!("{}<{}{} class=\"{}\">{}", indent, el.name, attrs.concat(), classes, text);
        }
        Some(NodeData::Comment(_)) => println!("{}<!---->", indent),
        Some(NodeData::Text(text)) => println!("{}{}", indent, text),
        _ => {}
    }
    for child in tree.child_ids(node) {
        dump(tree, child, depth + 1);
    }
}

fn main() -> ViewResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dom = DomRendererFactory::default();
    let host = {
        let mut tree = dom.tree_mut();
        let root = tree.root();
        let host = tree.create_element("app");
        if let Err(e) = tree.append_child(root, host) {
            tracing::error!("cannot attach host: {}", e);
        }
        host
    };

    let model: Model = Rc::new(RefCell::new(
        ["write the view engine", "bind some values", "ship it"]
            .into_iter()
            .map(|title| Todo {
                title: title.to_string(),
                done: false,
            })
            .collect(),
    ));

    let mut views = ViewTree::new(ViewConfig::default(), dom.clone());
    let root = views.create_root_view(app(model.clone()), Some(RootHost::Node(host)))?;
    let container = views.container_at(root, 3)?;
    for index in 0..model.borrow().len() {
        let item = views.create_embedded_view(container)?;
        views.insert_view(container, item, index)?;
    }
    views.detect_changes(root)?;
    dump(&dom.tree(), host, 0);

    // Clicking the button completes everything
    let button = views.render_element(root, 4)?;
    let mut click = Event::new("click", EventTarget::Node(button));
    dom.dispatch_event(&mut click, &mut views);
    views.detect_changes(root)?;
    dump(&dom.tree(), host, 0);

    // Remove the first item once its leave animation is done
    let queue = MicrotaskQueue::new();
    let driver = NoopAnimationDriver::new(queue.clone());
    let first = views.child_views(container)?[0];
    let li = views.render_element(first, 0)?;
    let fade_out = vec![
        Keyframe::new(0.0, &[("opacity", "1")]),
        Keyframe::new(1.0, &[("opacity", "0")]),
    ];
    let animated = driver.animate(&dom.tree(), li, fade_out, Timing::new(150.0, 0.0), &[], false);
    let mut player = match animated {
        Ok(player) => player,
        Err(e) => {
            tracing::error!("leave animation failed: {}", e);
            return Ok(());
        }
    };
    let done = player.completion();
    player.play();
    queue.run_microtasks();
    if smol::block_on(done) {
        model.borrow_mut().remove(0);
        views.destroy_view(first)?;
    }
    views.detect_changes(root)?;
    dump(&dom.tree(), host, 0);

    println!("{} listeners live", dom.listener_count());
    views.destroy_view(root)?;
    println!("{} listeners live after teardown", dom.listener_count());
    Ok(())
}
