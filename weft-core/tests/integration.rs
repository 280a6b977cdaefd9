//! Integration Tests for the Reactive Core
//!
//! These tests drive signals, memos, effects, bindings and renderers together
//! through the public API only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use weft_core::binding::{bind_attribute, bind_child, element, Binding, Child};
use weft_core::dom::{Event, Node};
use weft_core::lifecycle::{mount, unmount};
use weft_core::reactive::{
    batch, computed, create_signal, effect, register_cleanup, run_cleanup, Effect, Memo, Scope,
    Signal,
};
use weft_core::render::{if_else_render, match_render, reconcile_keyed_list, reconcile_list, Cases};

#[derive(Clone, Debug)]
struct Item {
    id: u32,
    name: &'static str,
}

fn item(id: u32, name: &'static str) -> Item {
    Item { id, name }
}

fn render_item(item: &Item, _: usize) -> Node {
    let li = Node::element("li");
    li.set_attribute("data-id", item.id.to_string()).unwrap();
    li.set_text(item.name).unwrap();
    li
}

/// A computed always equals its function applied to the current inputs.
#[test]
fn computed_is_consistent_across_writes() {
    let (a, set_a) = create_signal(1);
    let (b, set_b) = create_signal(10);

    let (a2, b2) = (a.clone(), b.clone());
    let sum = computed(move || a2.get() + b2.get());

    for (x, y) in [(2, 3), (7, 7), (0, -4), (100, 1)] {
        set_a.set(x);
        assert_eq!(sum.get(), x + b.get());
        set_b.set(y);
        assert_eq!(sum.get(), a.get() + y);
    }
}

/// A memo chain recomputes only what a write invalidated.
#[test]
fn memo_chain_recomputes_lazily() {
    let base = Signal::new(2);
    let squares = Arc::new(AtomicUsize::new(0));

    let (b, s) = (base.clone(), squares.clone());
    let square = Memo::new(move || {
        s.fetch_add(1, Ordering::SeqCst);
        b.get() * b.get()
    });
    let sq = square.clone();
    let plus_one = Memo::new(move || sq.get() + 1);

    assert_eq!(plus_one.get(), 5);
    assert_eq!(plus_one.get(), 5);
    assert_eq!(squares.load(Ordering::SeqCst), 1);

    base.set(3);
    assert_eq!(squares.load(Ordering::SeqCst), 1);
    assert_eq!(plus_one.get(), 10);
    assert_eq!(squares.load(Ordering::SeqCst), 2);
}

/// An effect reading two signals written in one batch runs once and sees
/// both values.
#[test]
fn batch_runs_dependent_effect_once() {
    let a = Signal::new(0);
    let b = Signal::new(0);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let (a2, b2, s) = (a.clone(), b.clone(), seen.clone());
    let _effect = effect(move || {
        s.lock().unwrap().push((a2.get(), b2.get()));
    });

    batch(|| {
        a.set(1);
        b.set(2);
    });

    assert_eq!(*seen.lock().unwrap(), [(0, 0), (1, 2)]);
}

/// Disposing an effect stops it from re-running.
#[test]
fn disposed_effect_never_reruns() {
    let signal = Signal::new(0);
    let runs = Arc::new(AtomicUsize::new(0));

    let (s, r) = (signal.clone(), runs.clone());
    let effect = Effect::new(move || {
        s.get();
        r.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    effect.dispose();
    signal.set(1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(effect.is_disposed());
}

/// Disposing an effect inside a batch cancels its pending run.
#[test]
fn dispose_inside_batch_cancels_pending_run() {
    let signal = Signal::new(0);
    let runs = Arc::new(AtomicUsize::new(0));

    let (s, r) = (signal.clone(), runs.clone());
    let effect = Effect::new(move || {
        s.get();
        r.fetch_add(1, Ordering::SeqCst);
    });

    batch(|| {
        signal.set(1);
        assert!(effect.is_pending());
        effect.dispose();
    });
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// A panicking effect does not stop the rest of the propagation pass.
#[test]
fn panicking_rerun_does_not_block_siblings() {
    let signal = Signal::new(0);
    let healthy = Arc::new(AtomicUsize::new(0));

    let s = signal.clone();
    let _faulty = Effect::new(move || {
        if s.get() > 0 {
            panic!("faulty effect");
        }
    });
    let (s, h) = (signal.clone(), healthy.clone());
    let _healthy = Effect::new(move || {
        s.get();
        h.fetch_add(1, Ordering::SeqCst);
    });

    signal.set(1);
    assert_eq!(healthy.load(Ordering::SeqCst), 2);
}

/// The scope disposal list runs in registration order, and a failing
/// disposer does not stop the rest.
#[test]
fn scope_cleanup_is_ordered_and_isolated() {
    let scope = Scope::root();
    let log = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let log = log.clone();
        register_cleanup(&scope, move || log.lock().unwrap().push(name));
    }
    register_cleanup(&scope, || panic!("broken disposer"));
    let l = log.clone();
    register_cleanup(&scope, move || l.lock().unwrap().push("last"));

    run_cleanup(&scope);
    assert_eq!(*log.lock().unwrap(), ["first", "second", "last"]);

    // disposal is idempotent
    run_cleanup(&scope);
    assert_eq!(log.lock().unwrap().len(), 3);
}

/// A node rendered for a key survives any pass in which the key stays.
#[test]
fn keyed_list_preserves_node_identity() {
    let items = Signal::new(vec![item(1, "A"), item(2, "B"), item(3, "C")]);
    let i = items.clone();
    let list = reconcile_keyed_list(move || i.get(), render_item, |item, _| item.id).unwrap();
    let before = list.children();

    items.set(vec![item(2, "B"), item(5, "E"), item(3, "C"), item(1, "A")]);
    let after = list.children();

    assert!(after[0].ptr_eq(&before[1]));
    assert!(after[2].ptr_eq(&before[2]));
    assert!(after[3].ptr_eq(&before[0]));
    assert_eq!(after[1].get_attribute("data-id").as_deref(), Some("5"));
}

/// Drop one item and reorder the rest.
#[test]
fn keyed_list_drop_and_reorder() {
    let (items, set_items) = create_signal(vec![item(1, "A"), item(2, "B"), item(3, "C")]);
    let list = reconcile_keyed_list(move || items.get(), render_item, |item, _| item.id).unwrap();
    let node1 = list.child(0).unwrap();
    let node3 = list.child(2).unwrap();

    set_items.set(vec![item(3, "C"), item(1, "A")]);

    assert_eq!(list.child_count(), 2);
    assert!(list.child(0).unwrap().ptr_eq(&node3));
    assert!(list.child(1).unwrap().ptr_eq(&node1));
}

/// Duplicate or null keys degrade to a full rebuild, never an error.
#[test]
fn keyed_list_with_bad_keys_rebuilds() {
    let items = Signal::new(vec![item(1, "A")]);
    let i = items.clone();
    let list = reconcile_keyed_list(
        move || i.get(),
        render_item,
        |item, _| if item.id == 0 { None } else { Some(item.id) },
    )
    .unwrap();

    items.set(vec![item(1, "A"), item(1, "A"), item(2, "B")]);
    assert_eq!(list.child_count(), 3);

    items.set(vec![item(0, "null"), item(2, "B")]);
    assert_eq!(list.child_count(), 2);
    assert_eq!(list.text_content(), "nullB");
}

/// An unkeyed list goes to zero children and back to N fresh ones.
#[test]
fn unkeyed_list_empties_and_refills() {
    let items = Signal::new(vec![item(1, "A"), item(2, "B")]);
    let i = items.clone();
    let list = reconcile_list(move || i.get(), render_item).unwrap();
    let old_first = list.child(0).unwrap();

    items.set(Vec::new());
    assert_eq!(list.child_count(), 0);

    items.set(vec![item(1, "A"), item(2, "B"), item(3, "C")]);
    assert_eq!(list.child_count(), 3);
    assert!(!list.child(0).unwrap().ptr_eq(&old_first));
}

/// The previous branch leaves the container before the next one arrives.
#[test]
fn if_toggle_detaches_before_attaching() {
    let flag = Signal::new(true);
    let f = flag.clone();
    let container = if_else_render(
        move || f.get(),
        || Node::text("on"),
        || Node::text("off"),
    )
    .unwrap();
    let on = container.first_child().unwrap();

    flag.set(false);
    assert_eq!(container.child_count(), 1);
    assert!(on.parent().is_none());
    assert_eq!(container.text_content(), "off");

    flag.set(true);
    assert_eq!(container.child_count(), 1);
    assert_eq!(container.text_content(), "on");
}

/// A value with no case renders the fallback until a case matches.
#[test]
fn match_fallback_then_success() {
    let status = Signal::new("pending");
    let s = status.clone();
    let ok = Node::text("ok");
    let fb = Node::text("waiting");
    let (ok2, fb2) = (ok.clone(), fb.clone());
    let container = match_render(
        move || s.get(),
        Cases::new()
            .case("success", move || ok2.clone())
            .fallback(move || fb2.clone()),
    )
    .unwrap();

    assert_eq!(container.child_count(), 1);
    assert!(container.first_child().unwrap().ptr_eq(&fb));

    status.set("success");
    assert_eq!(container.child_count(), 1);
    assert!(container.first_child().unwrap().ptr_eq(&ok));
    assert!(fb.parent().is_none());
}

/// A failing case shows a visible marker; later values render normally.
#[test]
fn match_failure_shows_marker_then_recovers() {
    let route = Signal::new("crash");
    let r = route.clone();
    let container = match_render(
        move || r.get(),
        Cases::new()
            .case("crash", || -> Node { panic!("render failed") })
            .case("home", || Node::text("home page")),
    )
    .unwrap();

    let marker = container.first_child().unwrap();
    assert!(marker.is_element());
    assert!(!marker.text_content().is_empty());

    route.set("home");
    assert_eq!(container.child_count(), 1);
    assert_eq!(container.text_content(), "home page");
}

/// A component built from bindings, mounted and unmounted.
#[test]
fn component_lifecycle_end_to_end() {
    let host = Node::element("main");
    let count = Signal::new(0);
    let clicks = Arc::new(AtomicUsize::new(0));

    let (c, k) = (count.clone(), clicks.clone());
    mount(&host, move || {
        let c_click = c.clone();
        let k = k.clone();
        let c_class = c.clone();
        element(
            "button",
            [
                (
                    "@click",
                    Binding::handler(move |_: &Event| {
                        k.fetch_add(1, Ordering::SeqCst);
                        c_click.update(|n| *n += 1);
                    }),
                ),
                ("class", Binding::value(move || if c_class.get() % 2 == 0 { "even" } else { "odd" })),
            ],
            [Child::from("Clicked "), Child::from(c.clone()), Child::from(" times")],
        )
        .unwrap()
    })
    .unwrap();

    let button = host.first_child().unwrap();
    assert_eq!(button.text_content(), "Clicked 0 times");
    assert_eq!(button.get_attribute("class").as_deref(), Some("even"));

    button.dispatch_event(&Event::new("click"));
    assert_eq!(button.text_content(), "Clicked 1 times");
    assert_eq!(button.get_attribute("class").as_deref(), Some("odd"));

    unmount(&host);
    button.dispatch_event(&Event::new("click"));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
    count.set(10);
    assert_eq!(button.text_content(), "Clicked 1 times");
}

/// Bindings made directly on nodes, outside any template.
#[test]
fn direct_bindings_follow_signals() {
    let node = Node::element("div");
    let hidden = Signal::new(false);
    let label = Signal::new(String::from("x"));

    bind_attribute(&node, "hidden", hidden.clone()).unwrap();
    bind_child(&node, label.clone()).unwrap();
    assert!(!node.has_attribute("hidden"));
    assert_eq!(node.text_content(), "x");

    batch(|| {
        hidden.set(true);
        label.set("y".into());
    });
    assert_eq!(node.get_attribute("hidden").as_deref(), Some(""));
    assert_eq!(node.text_content(), "y");
}
