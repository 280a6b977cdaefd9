//! Scopes
//!
//! A scope is an owner with no behaviour of its own. Every computed, effect
//! and child scope created while a scope is running is recorded in the
//! scope's disposal list, together with any callbacks registered through
//! [`on_cleanup`](super::on_cleanup) or [`register_cleanup`].
//!
//! Disposing the scope walks that list in registration order. Each callback
//! is isolated: a panicking cleanup is logged and the walk continues.
//! Disposal is idempotent.
//!
//! Components create one scope per instance, run their construction inside
//! it, and dispose it when their host element leaves the document.

use std::fmt;

use tracing::{debug, warn};

use super::context::ReactiveContext;
use super::runtime::{dispose_node, with_graph};
use crate::graph::{Disposable, NodeId, ReactiveNode};

/// Handle to an ownership scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    id: NodeId,
}

impl Scope {
    /// Create a scope owned by the current owner, if there is one.
    pub fn new() -> Self {
        Self::create(ReactiveContext::current_owner())
    }

    /// Create a detached scope that only goes away when disposed directly.
    pub fn root() -> Self {
        Self::create(None)
    }

    fn create(owner: Option<NodeId>) -> Self {
        let id = with_graph(|g| g.add_node(ReactiveNode::scope().owned_by(owner)));
        Self { id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Run `f` with this scope as the owner. Reads inside `f` are not
    /// tracked by any enclosing computation.
    ///
    /// Returns `None` if the scope was already disposed.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        if self.is_disposed() {
            return None;
        }
        let _ctx = ReactiveContext::owned_by(self.id);
        Some(f())
    }

    /// Register a callback to run when this scope is disposed.
    pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
        register_cleanup(self, f);
    }

    /// Dispose everything created in this scope, then the scope itself.
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        debug!(scope = %self.id, "disposing scope");
        dispose_node(self.id);
    }

    pub fn is_disposed(&self) -> bool {
        !with_graph(|g| g.contains(self.id))
    }

    /// Number of entries in the disposal list.
    pub fn disposer_count(&self) -> usize {
        with_graph(|g| g.get_node(self.id).map_or(0, ReactiveNode::owned_len))
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Append a disposer to a scope's disposal list.
///
/// Registering on a disposed scope runs nothing and logs a warning.
pub fn register_cleanup(scope: &Scope, disposer: impl FnOnce() + 'static) {
    let item = Disposable::Callback(Box::new(disposer));
    if with_graph(|g| g.push_disposable(scope.id, item)).is_err() {
        warn!(scope = %scope.id, "cleanup registered on a disposed scope was dropped");
    }
}

/// Invoke every disposer recorded in `scope`, in registration order.
pub fn run_cleanup(scope: &Scope) {
    scope.dispose();
}
