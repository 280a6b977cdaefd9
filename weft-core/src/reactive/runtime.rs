//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, computeds,
//! effects and scopes. It owns the dependency graph, the registry of live
//! effects, and the flush loop.
//!
//! # How It Works
//!
//! 1. Signals, computeds, effects and scopes each register a node with the
//!    graph when they are created.
//!
//! 2. When a computed or effect reads a node, the runtime records the edge.
//!
//! 3. When a signal is written, the runtime:
//!    a. Marks downstream computeds dirty (they recompute on next read)
//!    b. Queues downstream effects
//!    c. Drains the queue, unless a batch is open
//!
//! # Error Policy
//!
//! An effect that panics while re-running during a flush is logged and
//! skipped; the remaining queued effects still run. The first run of an
//! effect happens inside its constructor and is not caught.
//!
//! # Threading
//!
//! Everything lives in thread-local storage. Reactive handles are not meant
//! to cross threads; each thread gets an independent graph.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use super::context::ReactiveContext;
use crate::config::with_config;
use crate::error::panic_message;
use crate::graph::{Disposable, NodeId, UpdateScheduler};

/// A node the flush loop can re-run.
///
/// Effects implement this; the registry keeps them alive until they are
/// disposed.
pub(crate) trait Reactive {
    /// Get the graph node for this reactive value.
    fn node_id(&self) -> NodeId;

    /// Re-run after a dependency changed.
    fn run(&self);

    /// Stop future runs and release whatever the last run returned.
    fn teardown(&self);
}

/// The per-thread runtime state.
struct Runtime {
    graph: RefCell<UpdateScheduler>,
    registry: RefCell<HashMap<NodeId, Rc<dyn Reactive>>>,
    flushing: Cell<bool>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            graph: RefCell::new(UpdateScheduler::new()),
            registry: RefCell::new(HashMap::new()),
            flushing: Cell::new(false),
        }
    }
}

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// Run a closure with mutable access to the graph.
///
/// The borrow is released before the closure's result is returned, so user
/// code must never run inside `f`.
pub(crate) fn with_graph<R>(f: impl FnOnce(&mut UpdateScheduler) -> R) -> R {
    RUNTIME.with(|rt| f(&mut rt.graph.borrow_mut()))
}

/// Like [`with_graph`], but returns `None` when the runtime is already torn
/// down (handles dropped during thread exit).
pub(crate) fn try_with_graph<R>(f: impl FnOnce(&mut UpdateScheduler) -> R) -> Option<R> {
    RUNTIME
        .try_with(|rt| rt.graph.try_borrow_mut().ok().map(|mut g| f(&mut g)))
        .ok()
        .flatten()
}

/// Register an effect so the flush loop can find it.
pub(crate) fn register(reactive: Rc<dyn Reactive>) {
    let id = reactive.node_id();
    RUNTIME.with(|rt| rt.registry.borrow_mut().insert(id, reactive));
}

fn lookup(id: NodeId) -> Option<Rc<dyn Reactive>> {
    RUNTIME.with(|rt| rt.registry.borrow().get(&id).cloned())
}

fn unregister(id: NodeId) -> Option<Rc<dyn Reactive>> {
    RUNTIME
        .try_with(|rt| rt.registry.borrow_mut().remove(&id))
        .ok()
        .flatten()
}

/// Record that the current observer (if any) read `source`.
pub(crate) fn track(source: NodeId) {
    if let Some(observer) = ReactiveContext::current_subscriber() {
        with_graph(|g| g.add_edge(source, observer));
    }
}

/// Propagate a write to `source` and run whatever became pending.
pub(crate) fn notify(source: NodeId) {
    let (queued, batching) = with_graph(|g| (g.mark_changed(source), g.is_batching()));
    trace!(source = %source, queued, batching, "signal changed");
    if !batching {
        flush();
    }
}

/// Drain the pending queue.
///
/// Re-entrant calls return immediately; effects queued by a running effect
/// are picked up by the outer loop.
pub(crate) fn flush() {
    let entered = RUNTIME.with(|rt| !rt.flushing.replace(true));
    if !entered {
        return;
    }

    struct FlushGuard;

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            let _ = RUNTIME.try_with(|rt| rt.flushing.set(false));
        }
    }

    let _guard = FlushGuard;
    let limit = with_config(|c| c.max_flush_iterations);
    let mut runs = 0usize;

    while let Some(id) = with_graph(|g| if g.is_batching() { None } else { g.pop_pending() }) {
        runs += 1;
        if runs > limit {
            let dropped = with_graph(|g| g.clear_pending()) + 1;
            error!(
                limit,
                dropped,
                "flush exceeded its iteration limit; an effect is probably writing its own dependency"
            );
            break;
        }

        let Some(reactive) = lookup(id) else {
            continue;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| reactive.run())) {
            error!(
                effect = %id,
                message = %panic_message(payload.as_ref()),
                "effect panicked while re-running; continuing with remaining effects"
            );
        }
    }

    if runs > 0 {
        debug!(runs, "flush complete");
    }
}

/// Batch multiple signal updates into a single propagation pass.
///
/// Effects that depend on several signals written inside the batch run once,
/// after the outermost batch returns, and observe only the final values.
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    with_graph(|g| g.enter_batch());

    // Use a guard so the depth is restored even if `f` panics
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let depth = try_with_graph(|g| g.exit_batch()).unwrap_or(0);
            if depth == 0 && !std::thread::panicking() {
                flush();
            }
        }
    }

    let _guard = BatchGuard;
    f()
}

/// Check if currently inside a batch.
pub fn is_batching() -> bool {
    with_graph(|g| g.is_batching())
}

/// Run `f` without tracking any reads.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::untracked();
    f()
}

/// Dispose a node and everything it owns.
///
/// Effects are torn down first, then the disposal list is walked in
/// registration order, then the node leaves the graph.
pub(crate) fn dispose_node(id: NodeId) {
    if let Some(reactive) = unregister(id) {
        reactive.teardown();
    }
    dispose_owned(id);
    try_with_graph(|g| g.remove_node(id));
}

/// Dispose everything an owner holds, leaving the owner itself in place.
pub(crate) fn dispose_owned(owner: NodeId) {
    loop {
        let items = try_with_graph(|g| g.take_owned(owner)).unwrap_or_default();
        if items.is_empty() {
            break;
        }
        for item in items {
            match item {
                Disposable::Node(child) => dispose_node(child),
                Disposable::Callback(callback) => run_disposer(owner, callback),
            }
        }
    }
}

/// Invoke one cleanup callback, logging instead of propagating a panic.
pub(crate) fn run_disposer(owner: NodeId, callback: Box<dyn FnOnce()>) {
    let _ctx = ReactiveContext::untracked();
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        error!(
            owner = %owner,
            message = %panic_message(payload.as_ref()),
            "cleanup callback panicked"
        );
    }
}

/// Register a cleanup callback with the current owner.
///
/// Inside an effect the callback runs before the next re-run and when the
/// effect is disposed. Inside a scope it runs when the scope is disposed.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    let Some(owner) = ReactiveContext::current_owner() else {
        warn!("on_cleanup called outside any owner; the callback will never run");
        return;
    };
    if with_graph(|g| g.push_disposable(owner, Disposable::Callback(Box::new(f)))).is_err() {
        warn!(owner = %owner, "on_cleanup called for a disposed owner; the callback was dropped");
    }
}

/// Number of nodes in the current thread's graph.
pub fn node_count() -> usize {
    with_graph(|g| g.node_count())
}
