//! Dependency Graph
//!
//! This module implements the arena that stores every reactive node and the
//! edges between them.
//!
//! # Overview
//!
//! The graph holds four kinds of nodes:
//!
//! - Sources (signals), the roots of the graph
//! - Derived nodes (computeds), which cache a value
//! - Effects, the leaves that produce side effects
//! - Scopes, which own other nodes but never take part in propagation
//!
//! Edges point from a dependency to its dependents. Both directions are
//! stored in insertion-ordered sets so that notification order is the order
//! in which dependents first subscribed.
//!
//! Ownership is a second, separate tree: every derived node, effect and
//! scope records the owner it was created under, and every owner keeps an
//! ordered disposal list. Disposing an owner walks that list.

mod node;
mod scheduler;

pub use node::{DirtyState, Disposable, NodeId, NodeKind, ReactiveNode};
pub use scheduler::UpdateScheduler;
