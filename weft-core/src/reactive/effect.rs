//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies. That first run happens inside a batch, so any
//!    writes it performs are flushed after it returns.
//!
//! 2. When any dependency changes, the effect is queued and re-run by the
//!    runtime's flush loop.
//!
//! 3. Before re-running, the effect releases the cleanup returned by its
//!    previous run, disposes everything it created during that run, and
//!    clears its old dependencies.
//!
//! # Cleanup
//!
//! The effect function may return a [`Cleanup`]. It is called before the
//! effect re-runs and when the effect is disposed. This is how bindings
//! release listeners or timers they set up.
//!
//! # Lifetime
//!
//! An effect belongs to the owner it was created under. It stays alive
//! until [`Effect::dispose`] is called or its owner is disposed; dropping
//! the handle does not stop it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::context::ReactiveContext;
use super::runtime::{
    batch, dispose_node, dispose_owned, register, run_disposer, with_graph, Reactive,
};
use crate::graph::{NodeId, ReactiveNode};

/// A teardown closure returned from an effect body.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup(..)")
    }
}

/// Values an effect body may return.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

type EffectFn = Box<dyn FnMut() -> Option<Cleanup>>;

struct EffectInner {
    id: NodeId,
    run: RefCell<EffectFn>,
    cleanup: RefCell<Option<Cleanup>>,
    disposed: Cell<bool>,
    run_count: Cell<usize>,
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.get() {
            return;
        }

        let Ok(mut run) = self.run.try_borrow_mut() else {
            warn!(effect = %self.id, "effect re-entered itself; skipping nested run");
            return;
        };

        self.release_cleanup();
        dispose_owned(self.id);
        with_graph(|g| {
            g.clear_dependencies(self.id);
            if let Some(node) = g.get_node_mut(self.id) {
                node.mark_clean();
            }
        });

        let cleanup = {
            let _ctx = ReactiveContext::tracking(self.id);
            (*run)()
        };
        *self.cleanup.borrow_mut() = cleanup;
        self.run_count.set(self.run_count.get() + 1);
    }

    fn release_cleanup(&self) {
        let previous = self.cleanup.borrow_mut().take();
        if let Some(Cleanup(f)) = previous {
            run_disposer(self.id, f);
        }
    }
}

impl Reactive for EffectInner {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn run(&self) {
        self.execute();
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        with_graph(|g| g.dequeue(self.id));
        self.release_cleanup();
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use weft_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let c = count.clone();
/// let effect = Effect::new(move || {
///     println!("Count is: {}", c.get());
/// });
///
/// count.set(5); // prints "Count is: 5"
/// effect.dispose();
/// count.set(6); // prints nothing
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create a new effect and run it once.
    ///
    /// A panic during this first run propagates to the caller; the
    /// half-built effect is disposed on the way out.
    pub fn new<F, R>(mut f: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: IntoCleanup,
    {
        let owner = ReactiveContext::current_owner();
        let id = with_graph(|g| g.add_node(ReactiveNode::effect().owned_by(owner)));
        let inner = Rc::new(EffectInner {
            id,
            run: RefCell::new(Box::new(move || f().into_cleanup())),
            cleanup: RefCell::new(None),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
        });
        register(inner.clone());

        struct FirstRunGuard(NodeId, bool);

        impl Drop for FirstRunGuard {
            fn drop(&mut self) {
                if !self.1 {
                    dispose_node(self.0);
                }
            }
        }

        let mut guard = FirstRunGuard(id, false);
        batch(|| inner.execute());
        guard.1 = true;

        Self { inner }
    }

    /// Get the effect's graph node ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Dispose of the effect.
    ///
    /// After disposal the effect never runs again, even if it was already
    /// queued by an open batch. Its last cleanup runs now.
    pub fn dispose(&self) {
        dispose_node(self.inner.id);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Check if the effect is queued to re-run at the end of the current batch.
    pub fn is_pending(&self) -> bool {
        with_graph(|g| g.is_pending(self.inner.id))
    }

    /// Get the number of nodes read during the last run.
    pub fn dependency_count(&self) -> usize {
        with_graph(|g| g.dependencies_of(self.inner.id).len())
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create an effect. Shorthand for [`Effect::new`].
pub fn effect<F, R>(f: F) -> Effect
where
    F: FnMut() -> R + 'static,
    R: IntoCleanup,
{
    Effect::new(f)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
