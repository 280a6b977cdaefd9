//! Memo Implementation
//!
//! A Memo is a cached derived value (a "computed") that re-evaluates only
//! when one of its dependencies changed and it is read again.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation and caches the result.
//!
//! 2. When accessed again, if no dependency has changed, the cache is
//!    returned.
//!
//! 3. When a dependency changes, the graph marks the memo dirty. Nothing is
//!    recomputed until someone reads it.
//!
//! 4. Dependencies are re-collected on every evaluation, so a branch that
//!    stops reading a signal stops depending on it.
//!
//! # Cycles
//!
//! A memo that reads itself, directly or through other memos, is rejected:
//! the inner read sees the memo in the `Computing` state and fails with
//! [`ReactiveError::Cycle`] instead of looping.
//!
//! # Ownership
//!
//! A memo belongs to the owner it was created under and is disposed with
//! it. Reading a disposed memo fails with [`ReactiveError::Disposed`].

use std::fmt::{self, Debug};
use std::rc::Rc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::{dispose_owned, track, try_with_graph, with_graph};
use crate::error::{ReactiveError, Result};
use crate::graph::{DirtyState, NodeId, ReactiveNode};

struct MemoInner<T> {
    id: NodeId,
    compute: Box<dyn Fn() -> T>,
    value: RwLock<Option<T>>,
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        try_with_graph(|g| g.remove_node(self.id));
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Example
///
/// ```rust
/// use weft_core::reactive::{Memo, Signal};
///
/// let count = Signal::new(2);
/// let c = count.clone();
/// let doubled = Memo::new(move || c.get() * 2);
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Memo<T: 'static> {
    inner: Rc<MemoInner<T>>,
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        let owner = ReactiveContext::current_owner();
        let id = with_graph(|g| g.add_node(ReactiveNode::derived().owned_by(owner)));
        Self {
            inner: Rc::new(MemoInner {
                id,
                compute: Box::new(compute),
                value: RwLock::new(None),
            }),
        }
    }

    /// Get the memo's graph node ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// # Panics
    ///
    /// Panics on a cycle or when the memo was disposed. Use
    /// [`Memo::try_get`] to handle those cases.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn try_get(&self) -> Result<T> {
        let id = self.inner.id;
        let state = with_graph(|g| g.get_node(id).map(ReactiveNode::dirty_state));

        match state {
            None => return Err(ReactiveError::Disposed { id: id.raw() }),
            Some(DirtyState::Computing) => return Err(ReactiveError::Cycle { id: id.raw() }),
            Some(DirtyState::Dirty) => self.recompute(),
            Some(DirtyState::Clean) => {}
        }

        track(id);
        self.inner
            .value
            .read()
            .clone()
            .ok_or(ReactiveError::Disposed { id: id.raw() })
    }

    /// Recompute the memo's value.
    ///
    /// This runs the computation function within a tracking context to
    /// collect dependencies.
    fn recompute(&self) {
        let id = self.inner.id;

        // Restores the dirty flag if the computation panics
        struct ComputeGuard(NodeId);

        impl Drop for ComputeGuard {
            fn drop(&mut self) {
                try_with_graph(|g| {
                    if let Some(node) = g.get_node_mut(self.0) {
                        if node.dirty_state() == DirtyState::Computing {
                            node.mark_dirty();
                        }
                    }
                });
            }
        }

        dispose_owned(id);
        with_graph(|g| {
            g.clear_dependencies(id);
            if let Some(node) = g.get_node_mut(id) {
                node.mark_computing();
            }
        });

        let _guard = ComputeGuard(id);
        let new_value = {
            let _ctx = ReactiveContext::tracking(id);
            (self.inner.compute)()
        };

        *self.inner.value.write() = Some(new_value);

        // A write during the computation leaves the node dirty on purpose
        with_graph(|g| {
            if let Some(node) = g.get_node_mut(id) {
                if node.dirty_state() == DirtyState::Computing {
                    node.mark_clean();
                }
            }
        });
    }

    /// Get the current dirty state, or `None` once disposed.
    pub fn state(&self) -> Option<DirtyState> {
        with_graph(|g| g.get_node(self.inner.id).map(ReactiveNode::dirty_state))
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }

    /// Get the number of dependents.
    pub fn dependent_count(&self) -> usize {
        with_graph(|g| g.dependents_of(self.inner.id).len())
    }
}

impl<T: 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

/// Create a computed value.
pub fn computed<T: Clone + 'static>(compute: impl Fn() -> T + 'static) -> Memo<T> {
    Memo::new(compute)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
