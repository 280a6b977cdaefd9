//! Reactive Context
//!
//! The reactive context tracks which computation is currently running and
//! which owner newly created nodes belong to.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a computed or effect pushes an entry
//! whose observer and owner are that node; entering a scope pushes an entry
//! with no observer; `untrack` pushes an entry with no observer that keeps
//! the current owner. The entry is popped when the guard drops, so the stack
//! stays balanced even if the computation panics.

use std::cell::RefCell;

use crate::graph::NodeId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContextEntry {
    /// The node whose reads are being tracked, if any.
    observer: Option<NodeId>,
    /// The node that owns anything created in this context, if any.
    owner: Option<NodeId>,
}

/// Guard that pops the context when dropped.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ReactiveContext {
    entry: ContextEntry,
}

impl ReactiveContext {
    fn push(entry: ContextEntry) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(entry));
        Self { entry }
    }

    /// Enter a tracking context for a computed or effect. The node observes
    /// every read and owns everything created while the guard lives.
    pub fn tracking(node: NodeId) -> Self {
        Self::push(ContextEntry {
            observer: Some(node),
            owner: Some(node),
        })
    }

    /// Enter an untracked context that keeps the current owner.
    pub fn untracked() -> Self {
        Self::push(ContextEntry {
            observer: None,
            owner: Self::current_owner(),
        })
    }

    /// Enter an untracked context owned by the given scope.
    pub fn owned_by(owner: NodeId) -> Self {
        Self::push(ContextEntry {
            observer: None,
            owner: Some(owner),
        })
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the node whose reads are currently tracked, if any.
    pub fn current_subscriber() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.observer))
    }

    /// Get the current owner, if any.
    pub fn current_owner() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.owner))
    }

    /// Depth of the context stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // try_with: the guard may outlive the thread-local during teardown
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry, self.entry,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.entry, entry
                );
            }
        });
    }
}
