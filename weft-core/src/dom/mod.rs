//! Retained DOM Tree
//!
//! The reactive core mutates a live tree in place. This module provides that
//! tree: elements, text and comment nodes with attributes, properties,
//! event listeners and parent/child links.
//!
//! Nodes are reference-counted handles. Two handles are the same node when
//! [`Node::ptr_eq`] says so, which is what the list reconciler relies on to
//! preserve node identity.

mod event;
mod node;
mod value;

pub use event::{Event, EventHandler, ListenerId};
pub use node::{Node, NodeKind};
pub use value::AttrValue;
