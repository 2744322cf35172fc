//! Embedded view containers and render-node placement

mod common;

use std::rc::Rc;

use common::Fixture;
use fos_view::{
    anchor_def, BindingFlags, BindingParam, CheckType, ContainerField, ContainerId,
    ElementDefBuilder, Encapsulation, EntryId, FieldRef, NodeFlags, NodeId, QuerySet,
    RendererType, RootHost, UpdateRenderer, Value, ViewDefinition, ViewError, ViewField, ViewId,
    ViewResult, ViewTree,
};

fn li_template() -> Rc<ViewDefinition> {
    Rc::new(ViewDefinition::new(vec![ElementDefBuilder::new("li").build()], None))
}

/// `<ul><ng-template/></ul>` with the anchor matching query 2
fn list_def(template: Rc<ViewDefinition>) -> Rc<ViewDefinition> {
    Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("ul").child_count(1).build(),
            anchor_def(NodeFlags::NONE, &[2], None, 0, None, Some(template)),
        ],
        None,
    ))
}

struct List {
    fx: Fixture,
    root: ViewId,
    container: ContainerId,
    ul: NodeId,
    anchor: NodeId,
}

impl List {
    fn new() -> Self {
        Self::with_template(li_template())
    }

    fn with_template(template: Rc<ViewDefinition>) -> Self {
        let mut fx = Fixture::new(false);
        let root = fx.tree.create_root_view(list_def(template), None).unwrap();
        let container = fx.tree.container_at(root, 1).unwrap();
        let ul = fx.tree.render_element(root, 0).unwrap();
        let anchor = fx.tree.render_element(root, 1).unwrap();
        Self {
            fx,
            root,
            container,
            ul,
            anchor,
        }
    }

    fn stamp(&mut self, index: usize) -> ViewId {
        let view = self.fx.tree.create_embedded_view(self.container).unwrap();
        self.fx.tree.insert_view(self.container, view, index).unwrap();
        view
    }

    fn li(&self, view: ViewId) -> NodeId {
        self.fx.tree.render_element(view, 0).unwrap()
    }

    fn dom_children(&self) -> Vec<NodeId> {
        self.fx.dom.tree().child_ids(self.ul)
    }

    fn next(&self, view: ViewId) -> Option<EntryId> {
        self.fx.tree.header(view).unwrap().next
    }
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_container_is_created_for_anchor() {
    let list = List::new();
    let tree = &list.fx.tree;

    assert_eq!(tree.child_entries(list.root).unwrap(), vec![list.container]);
    let container = tree.container(list.container).unwrap();
    assert!(container.is_empty());
    assert_eq!(container.anchor(), list.anchor);
    assert_eq!(container.render_parent(), Some(list.ul));
    assert_eq!(list.dom_children(), vec![list.anchor]);

    assert!(matches!(
        tree.container_field(list.container, ContainerField::ActiveIndex),
        Ok(FieldRef::ActiveIndex(Some(0)))
    ));
    assert!(matches!(
        tree.container_field(list.container, ContainerField::Parent),
        Ok(FieldRef::Parent(Some(p))) if p == list.root
    ));
    assert!(matches!(
        tree.container_field(list.container, ContainerField::RenderParent),
        Ok(FieldRef::RenderParent(Some(el))) if el == list.ul
    ));
    assert_eq!(tree.queries(list.container).unwrap(), Some(QuerySet(4)));
}

#[test]
fn test_embedded_view_starts_detached() {
    let mut list = List::new();
    let view = list.fx.tree.create_embedded_view(list.container).unwrap();

    assert_eq!(list.fx.tree.header(view).unwrap().parent, None);
    assert!(list.fx.dom.tree().parent(list.li(view)).is_none());
    assert!(list.fx.tree.container(list.container).unwrap().is_empty());
}

#[test]
fn test_plain_element_has_no_container() {
    let list = List::new();
    assert_eq!(
        list.fx.tree.container_at(list.root, 0),
        Err(ViewError::NoTemplate {
            view: list.root,
            node_index: 0
        })
    );
}

// ============================================================================
// INSERT / DETACH / MOVE
// ============================================================================

#[test]
fn test_insert_orders_views_and_nodes() {
    let mut list = List::new();
    let a = list.stamp(0);
    let b = list.stamp(1);
    let c = list.stamp(0);

    assert_eq!(list.fx.tree.child_views(list.container).unwrap(), &[c, a, b]);
    assert_eq!(
        list.dom_children(),
        vec![list.anchor, list.li(c), list.li(a), list.li(b)]
    );
    assert_eq!(list.next(c), Some(a));
    assert_eq!(list.next(a), Some(b));
    assert_eq!(list.next(b), None);
    for view in [a, b, c] {
        assert_eq!(list.fx.tree.header(view).unwrap().parent, Some(list.container));
    }
    assert!(matches!(
        list.fx.tree.container_field(list.container, ContainerField::ActiveIndex),
        Ok(FieldRef::ActiveIndex(Some(1)))
    ));
}

#[test]
fn test_views_field_and_view_fields() {
    let mut list = List::new();
    let a = list.stamp(0);
    let b = list.stamp(1);
    let tree = &list.fx.tree;

    let Ok(FieldRef::Views(views)) = tree.container_field(list.container, ContainerField::Views)
    else {
        panic!("expected the views field");
    };
    assert_eq!(views, &[a, b]);
    assert!(matches!(
        tree.view_field(a, ViewField::Next),
        Ok(FieldRef::Next(Some(n))) if n == b
    ));
    assert!(matches!(
        tree.view_field(a, ViewField::Definition),
        Ok(FieldRef::Definition(def)) if def.nodes.len() == 1
    ));
    assert_eq!(
        tree.view_field(list.container, ViewField::Parent).unwrap_err(),
        ViewError::NotAView(list.container)
    );
    assert_eq!(
        tree.container_field(a, ContainerField::Views).unwrap_err(),
        ViewError::NotAContainer(a)
    );
}

#[test]
fn test_detach_and_reinsert() {
    let mut list = List::new();
    let a = list.stamp(0);
    let b = list.stamp(1);
    let c = list.stamp(2);

    assert_eq!(list.fx.tree.detach_view(list.container, 1), Ok(b));
    assert_eq!(list.fx.tree.child_views(list.container).unwrap(), &[a, c]);
    assert_eq!(list.dom_children(), vec![list.anchor, list.li(a), list.li(c)]);
    assert_eq!(list.next(a), Some(c));
    assert_eq!(list.fx.tree.header(b).unwrap().parent, None);
    assert_eq!(list.next(b), None);
    assert!(list.fx.dom.tree().parent(list.li(b)).is_none());
    assert!(matches!(
        list.fx.tree.container_field(list.container, ContainerField::ActiveIndex),
        Ok(FieldRef::ActiveIndex(Some(2)))
    ));

    list.fx.tree.insert_view(list.container, b, 0).unwrap();
    assert_eq!(
        list.dom_children(),
        vec![list.anchor, list.li(b), list.li(a), list.li(c)]
    );
    assert_eq!(list.next(b), Some(a));
}

#[test]
fn test_move_view() {
    let mut list = List::new();
    let a = list.stamp(0);
    let b = list.stamp(1);
    let c = list.stamp(2);

    assert_eq!(list.fx.tree.move_view(list.container, 0, 2), Ok(a));
    assert_eq!(list.fx.tree.child_views(list.container).unwrap(), &[b, c, a]);
    assert_eq!(
        list.dom_children(),
        vec![list.anchor, list.li(b), list.li(c), list.li(a)]
    );
    assert_eq!(list.next(c), Some(a));
    assert_eq!(list.next(a), None);

    assert_eq!(
        list.fx.tree.move_view(list.container, 0, 3),
        Err(ViewError::IndexOutOfBounds { index: 3, len: 3 })
    );
    assert_eq!(list.fx.tree.child_views(list.container).unwrap(), &[b, c, a]);
}

#[test]
fn test_insert_errors() {
    let mut list = List::new();
    let a = list.stamp(0);
    let loose = list.fx.tree.create_embedded_view(list.container).unwrap();

    assert_eq!(
        list.fx.tree.insert_view(list.container, a, 0),
        Err(ViewError::ViewAlreadyAttached(a))
    );
    assert_eq!(
        list.fx.tree.insert_view(list.container, list.root, 0),
        Err(ViewError::NotEmbedded(list.root))
    );
    assert_eq!(
        list.fx.tree.insert_view(list.container, loose, 5),
        Err(ViewError::IndexOutOfBounds { index: 5, len: 1 })
    );
    assert_eq!(
        list.fx.tree.detach_view(list.container, 1),
        Err(ViewError::IndexOutOfBounds { index: 1, len: 1 })
    );
    assert_eq!(
        list.fx.tree.insert_view(list.root, loose, 0),
        Err(ViewError::NotAContainer(list.root))
    );
}

#[test]
fn test_manual_container_keeps_no_active_index() {
    let mut list = List::new();
    list.fx.tree.make_manual(list.container).unwrap();
    list.stamp(0);
    list.stamp(0);

    let container = list.fx.tree.container(list.container).unwrap();
    assert!(container.is_manual());
    assert_eq!(container.active_index(), None);
    assert_eq!(container.len(), 2);
}

#[test]
fn test_inserted_view_inherits_queries() {
    let mut list = List::new();
    let a = list.stamp(0);
    let queries = list.fx.tree.queries(a).unwrap();
    assert_eq!(queries, Some(QuerySet(4)));
    assert!(queries.is_some_and(|q| q.contains(2)));

    let b = list.fx.tree.detach_view(list.container, 0).unwrap();
    assert_eq!(list.fx.tree.queries(b).unwrap(), None);
}

// ============================================================================
// DESTRUCTION
// ============================================================================

#[test]
fn test_destroy_attached_view() {
    let mut list = List::new();
    let a = list.stamp(0);
    let b = list.stamp(1);

    list.fx.tree.destroy_view(a).unwrap();
    assert_eq!(list.fx.tree.child_views(list.container).unwrap(), &[b]);
    assert_eq!(list.dom_children(), vec![list.anchor, list.li(b)]);
    assert!(list.fx.tree.view(a).unwrap().is_destroyed());

    // Destroyed views cannot come back
    assert_eq!(
        list.fx.tree.insert_view(list.container, a, 0),
        Err(ViewError::ViewDestroyed(a))
    );
}

#[test]
fn test_destroying_root_destroys_embedded_views() {
    let mut list = List::new();
    let a = list.stamp(0);
    let loose = list.fx.tree.create_embedded_view(list.container).unwrap();

    list.fx.tree.destroy_view(list.root).unwrap();
    assert!(list.fx.tree.view(list.root).unwrap().is_destroyed());
    assert!(list.fx.tree.view(a).unwrap().is_destroyed());
    // Never inserted, so never owned by the container
    assert!(!list.fx.tree.view(loose).unwrap().is_destroyed());
}

#[test]
fn test_container_of_destroyed_view_rejects_changes() {
    let mut list = List::new();
    let a = list.stamp(0);
    let loose = list.fx.tree.create_embedded_view(list.container).unwrap();

    list.fx.tree.destroy_view(list.root).unwrap();
    let dead = ViewError::ViewDestroyed(list.root);
    assert_eq!(list.fx.tree.insert_view(list.container, loose, 0), Err(dead.clone()));
    assert_eq!(list.fx.tree.detach_view(list.container, 0), Err(dead.clone()));
    assert_eq!(list.fx.tree.move_view(list.container, 0, 0), Err(dead.clone()));
    assert_eq!(list.fx.tree.create_embedded_view(list.container), Err(dead));
    assert!(list.fx.tree.child_views(list.container).unwrap().is_empty());
    assert!(list.fx.tree.view(a).unwrap().is_destroyed());
    assert_eq!(list.fx.tree.header(loose).unwrap().parent, None);
}

/// `<my-cmp/><ul><ng-template/></ul>` with an update pass stamping the
/// container's views
fn component_and_list() -> (Fixture, ViewId, ViewId, ContainerId) {
    let mut fx = Fixture::new(false);
    let update: UpdateRenderer = Rc::new(|tree: &mut ViewTree, view: ViewId, check: CheckType| -> ViewResult<()> {
        tree.check_element_inline(view, 0, check, [Value::from(view.0 as i32)])?;
        Ok(())
    });
    let template = Rc::new(ViewDefinition::new(
        vec![ElementDefBuilder::new("li")
            .binding(BindingFlags::ATTRIBUTE, "data-id", BindingParam::None)
            .build()],
        Some(update),
    ));
    let comp = Rc::new(ViewDefinition::new(vec![ElementDefBuilder::new("span").build()], None));
    let def = Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("my-cmp")
                .component(comp, Some(RendererType::new("c2", Encapsulation::None)))
                .build(),
            ElementDefBuilder::new("ul").child_count(1).build(),
            anchor_def(NodeFlags::NONE, &[], None, 0, None, Some(template)),
        ],
        None,
    ));
    let root = fx.tree.create_root_view(def, None).unwrap();
    let comp_view = fx.tree.component_view(root, 0).unwrap().unwrap();
    let container = fx.tree.container_at(root, 2).unwrap();
    (fx, root, comp_view, container)
}

#[test]
fn test_destroying_component_view_unlinks_it_from_host() {
    let (mut fx, root, comp_view, container) = component_and_list();
    assert_eq!(fx.tree.child_entries(root).unwrap(), vec![comp_view, container]);
    let item = fx.tree.create_embedded_view(container).unwrap();
    fx.tree.insert_view(container, item, 0).unwrap();

    fx.tree.destroy_view(comp_view).unwrap();
    assert!(fx.tree.view(comp_view).unwrap().is_destroyed());
    assert_eq!(fx.tree.component_view(root, 0).unwrap(), None);
    assert_eq!(fx.tree.child_entries(root).unwrap(), vec![container]);
    assert_eq!(fx.tree.header(comp_view).unwrap().next, None);

    // The rest of the tree is still checked
    fx.drain();
    fx.tree.detect_changes(root).unwrap();
    assert_eq!(fx.drain(), vec![format!("r2 setAttribute data-id={}", item.0)]);

    fx.tree.destroy_view(root).unwrap();
    assert!(fx.tree.view(item).unwrap().is_destroyed());
}

#[test]
fn test_destroying_trailing_component_view() {
    let mut fx = Fixture::new(false);
    let comp = Rc::new(ViewDefinition::new(vec![ElementDefBuilder::new("span").build()], None));
    let def = Rc::new(ViewDefinition::new(
        vec![
            anchor_def(NodeFlags::NONE, &[], None, 0, None, Some(li_template())),
            ElementDefBuilder::new("my-cmp").component(comp, None).build(),
        ],
        None,
    ));
    let root = fx.tree.create_root_view(def, None).unwrap();
    let container = fx.tree.container_at(root, 0).unwrap();
    let comp_view = fx.tree.component_view(root, 1).unwrap().unwrap();
    assert_eq!(fx.tree.header(container).unwrap().next, Some(comp_view));

    fx.tree.destroy_view(comp_view).unwrap();
    assert_eq!(fx.tree.header(container).unwrap().next, None);
    assert_eq!(fx.tree.child_entries(root).unwrap(), vec![container]);
    fx.tree.detect_changes(root).unwrap();
    // Destroying again does nothing
    fx.tree.destroy_view(comp_view).unwrap();
}

// ============================================================================
// CHANGE DETECTION
// ============================================================================

#[test]
fn test_detect_changes_visits_attached_views() {
    let update: UpdateRenderer = Rc::new(|tree: &mut ViewTree, view: ViewId, check: CheckType| -> ViewResult<()> {
        tree.check_element_inline(view, 0, check, [Value::from(view.0 as i32)])?;
        Ok(())
    });
    let template = Rc::new(ViewDefinition::new(
        vec![ElementDefBuilder::new("li")
            .binding(BindingFlags::ATTRIBUTE, "data-id", BindingParam::None)
            .build()],
        Some(update),
    ));
    let mut list = List::with_template(template);
    let a = list.stamp(0);
    let b = list.stamp(0);
    let _detached = list.fx.tree.create_embedded_view(list.container).unwrap();
    list.fx.drain();

    list.fx.tree.detect_changes(list.root).unwrap();
    // Renderers are numbered in creation order: root, a, b
    assert_eq!(
        list.fx.drain(),
        vec![
            format!("r2 setAttribute data-id={}", b.0),
            format!("r1 setAttribute data-id={}", a.0),
        ]
    );
}

// ============================================================================
// RENDER PLACEMENT
// ============================================================================

#[test]
fn test_root_render_nodes_follow_containers() {
    let mut fx = Fixture::new(false);
    let def = Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("header").build(),
            anchor_def(NodeFlags::NONE, &[], None, 0, None, Some(li_template())),
            ElementDefBuilder::new("footer").build(),
        ],
        None,
    ));
    let root = fx.tree.create_root_view(def, None).unwrap();
    let container = fx.tree.container_at(root, 1).unwrap();
    let a = fx.tree.create_embedded_view(container).unwrap();
    fx.tree.insert_view(container, a, 0).unwrap();

    let el = |view, index| fx.tree.render_element(view, index).unwrap();
    assert_eq!(
        fx.tree.root_render_nodes(root).unwrap(),
        vec![el(root, 0), el(root, 1), el(a, 0), el(root, 2)]
    );
    assert_eq!(fx.tree.container(container).unwrap().render_parent(), None);
}

#[test]
fn test_root_host_selection() {
    let mut fx = Fixture::new(false);
    let (app, stale) = {
        let mut dom = fx.dom.tree_mut();
        let doc = dom.root();
        let app = dom.create_element("app");
        let stale = dom.create_text("loading");
        dom.append_child(doc, app).unwrap();
        dom.append_child(app, stale).unwrap();
        (app, stale)
    };
    let def = Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("app-root").child_count(1).attr("ng-version", "5").build(),
            ElementDefBuilder::new("span").build(),
        ],
        None,
    ));
    let root = fx
        .tree
        .create_root_view(def, Some(RootHost::Selector("app".into())))
        .unwrap();

    assert_eq!(fx.tree.render_element(root, 0), Ok(app));
    let span = fx.tree.render_element(root, 1).unwrap();
    let dom = fx.dom.tree();
    assert_eq!(dom.child_ids(app), vec![span]);
    assert!(dom.parent(stale).is_none());
    assert!(dom.element(app).unwrap().attrs.contains(None, "ng-version"));
}

#[test]
fn test_root_host_not_found() {
    let mut fx = Fixture::new(false);
    let def = Rc::new(ViewDefinition::new(vec![ElementDefBuilder::new("div").build()], None));
    let err = fx
        .tree
        .create_root_view(def, Some(RootHost::Selector("#missing".into())))
        .unwrap_err();
    assert_eq!(err, ViewError::RootNotFound("#missing".into()));
    assert!(err.to_string().contains("\"#missing\" did not match"));
}

fn host_with_content(encapsulation: Encapsulation) -> (Fixture, NodeId, NodeId, NodeId) {
    let mut fx = Fixture::new(false);
    let comp = Rc::new(ViewDefinition::new(vec![ElementDefBuilder::new("span").build()], None));
    let def = Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("my-cmp")
                .child_count(1)
                .component(comp, Some(RendererType::new("c7", encapsulation)))
                .build(),
            ElementDefBuilder::new("p").build(),
        ],
        None,
    ));
    let root = fx.tree.create_root_view(def, None).unwrap();
    let host = fx.tree.render_element(root, 0).unwrap();
    let content = fx.tree.render_element(root, 1).unwrap();
    let comp_view = fx.tree.component_view(root, 0).unwrap().unwrap();
    let span = fx.tree.render_element(comp_view, 0).unwrap();
    (fx, host, content, span)
}

#[test]
fn test_component_content_is_not_appended() {
    let (fx, host, content, span) = host_with_content(Encapsulation::Emulated);
    let dom = fx.dom.tree();
    assert!(dom.parent(content).is_none());
    assert_eq!(dom.child_ids(host), vec![span]);
}

#[test]
fn test_native_host_content_is_appended() {
    let (fx, host, content, span) = host_with_content(Encapsulation::Native);
    let dom = fx.dom.tree();
    assert_eq!(dom.parent(content), Some(host));
    assert_eq!(dom.child_ids(host), vec![content, span]);
}

#[test]
fn test_emulated_encapsulation_attributes() {
    let (fx, host, content, span) = host_with_content(Encapsulation::Emulated);
    let dom = fx.dom.tree();
    assert!(dom.element(host).unwrap().attrs.contains(None, "_fos-host-c7"));
    assert!(dom.element(span).unwrap().attrs.contains(None, "_fos-content-c7"));
    assert!(!dom.element(content).unwrap().attrs.contains(None, "_fos-content-c7"));
}

#[test]
fn test_headless_parent_is_skipped() {
    let mut fx = Fixture::new(false);
    let def = Rc::new(ViewDefinition::new(
        vec![
            ElementDefBuilder::new("div").child_count(2).build(),
            ElementDefBuilder::headless().child_count(1).build(),
            ElementDefBuilder::new("span").build(),
        ],
        None,
    ));
    let root = fx.tree.create_root_view(def, None).unwrap();
    let el = |index| fx.tree.render_element(root, index).unwrap();

    let dom = fx.dom.tree();
    assert_eq!(dom.child_ids(el(0)), vec![el(1), el(2)]);
}
