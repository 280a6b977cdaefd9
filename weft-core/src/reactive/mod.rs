//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos
//! (computeds), effects, batching and ownership scopes.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a memo or effect), the signal
//! automatically registers that context as a dependent. When the signal is
//! written, all dependents are notified.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only
//! when one of its dependencies changed and it is read again.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to synchronize reactive state with
//! the DOM.
//!
//! ## Scopes
//!
//! A Scope owns the memos and effects created while it runs, plus any
//! cleanup callbacks. Disposing a scope releases all of them.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically, and a thread-local arena (the dependency
//! graph) in which every node has exactly one owner. Nothing is collected
//! implicitly: memos, effects and scopes live until their owner is disposed.

mod context;
mod effect;
mod memo;
mod runtime;
mod scope;
mod signal;

pub use context::ReactiveContext;
pub use effect::{effect, Cleanup, Effect, IntoCleanup};
pub use memo::{computed, Memo};
pub use runtime::{batch, is_batching, node_count, on_cleanup, untrack};
pub use scope::{register_cleanup, run_cleanup, Scope};
pub use signal::{create_signal, ReadSignal, Signal, WriteSignal};
