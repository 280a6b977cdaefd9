//! Weft Core
//!
//! This crate provides the reactive core of the Weft UI runtime.
//! It implements:
//!
//! - Reactive primitives (signals, memos, effects, batching)
//! - Ownership scopes with ordered cleanup
//! - DOM bindings for attributes, properties, events and child content
//! - Keyed and unkeyed list reconciliation
//! - Conditional and match renderers
//!
//! Everything runs on one thread. Writes propagate synchronously, or at the
//! end of the outermost [`batch`](reactive::batch).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Dependency graph arena and update scheduler
//! - `reactive`: Reactive primitives and dependency tracking
//! - `dom`: The retained node tree the bindings mutate
//! - `binding`: Attribute, property, event and child bindings
//! - `render`: List reconciler and conditional renderers
//! - `lifecycle`: Host mount/unmount and child clearing
//!
//! # Example
//!
//! ```rust
//! use weft_core::reactive::{Effect, Memo, Signal};
//!
//! // Create a signal
//! let count = Signal::new(0);
//!
//! // Create a derived value
//! let c = count.clone();
//! let doubled = Memo::new(move || c.get() * 2);
//!
//! // Create an effect
//! let (c, d) = (count.clone(), doubled.clone());
//! Effect::new(move || {
//!     println!("Count: {}, Doubled: {}", c.get(), d.get());
//! });
//!
//! // Update the signal
//! count.set(5);
//! // Effect automatically runs, prints: "Count: 5, Doubled: 10"
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod binding;
pub mod config;
pub mod dom;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod reactive;
pub mod render;

pub use config::{configure, runtime_config, RuntimeConfig};
pub use error::{ReactiveError, Result};
