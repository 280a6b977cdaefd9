//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A source node (signal). These are the roots of the graph.
    /// They have no dependencies, only dependents.
    Source,

    /// A derived node (computed). These have dependencies and may have
    /// dependents. They cache their computed value.
    Derived,

    /// An effect node. These are leaves of the graph.
    /// They have dependencies but no dependents.
    Effect,

    /// An ownership scope. Scopes never read or get read; they only own
    /// other nodes and cleanup callbacks.
    Scope,
}

/// Dirty state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The node's value is up-to-date.
    Clean,

    /// A dependency changed since the last evaluation.
    Dirty,

    /// The node is being evaluated right now. Reading it in this state is a
    /// cycle.
    Computing,
}

/// An entry in an owner's disposal list.
pub enum Disposable {
    /// An owned graph node (derived, effect or child scope).
    Node(NodeId),

    /// A cleanup callback registered with `on_cleanup`.
    Callback(Box<dyn FnOnce()>),
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposable::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Disposable::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A node in the dependency graph.
#[derive(Debug)]
pub struct ReactiveNode {
    /// Unique identifier for this node.
    id: NodeId,

    /// What kind of node this is.
    kind: NodeKind,

    /// Current dirty state.
    dirty: DirtyState,

    /// Nodes that this node read during its last evaluation.
    dependencies: IndexSet<NodeId>,

    /// Nodes that read this node, in subscription order.
    dependents: IndexSet<NodeId>,

    /// The owner this node was created under, if any.
    owner: Option<NodeId>,

    /// Owned nodes and cleanup callbacks, in registration order.
    owned: Vec<Disposable>,
}

impl ReactiveNode {
    /// Create a new node with the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            dirty: match kind {
                NodeKind::Source | NodeKind::Scope => DirtyState::Clean,
                // Start dirty to ensure first computation
                NodeKind::Derived | NodeKind::Effect => DirtyState::Dirty,
            },
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
            owner: None,
            owned: Vec::new(),
        }
    }

    /// Create a new source (signal) node.
    pub fn source() -> Self {
        Self::new(NodeKind::Source)
    }

    /// Create a new derived (computed) node.
    pub fn derived() -> Self {
        Self::new(NodeKind::Derived)
    }

    /// Create a new effect node.
    pub fn effect() -> Self {
        Self::new(NodeKind::Effect)
    }

    /// Create a new scope node.
    pub fn scope() -> Self {
        Self::new(NodeKind::Scope)
    }

    /// Set the owner this node is created under.
    pub fn owned_by(mut self, owner: Option<NodeId>) -> Self {
        self.owner = owner;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn is_clean(&self) -> bool {
        self.dirty == DirtyState::Clean
    }

    pub fn mark_clean(&mut self) {
        self.dirty = DirtyState::Clean;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = DirtyState::Dirty;
    }

    pub fn mark_computing(&mut self) {
        self.dirty = DirtyState::Computing;
    }

    pub fn add_dependency(&mut self, node_id: NodeId) {
        self.dependencies.insert(node_id);
    }

    pub fn remove_dependency(&mut self, node_id: NodeId) {
        self.dependencies.shift_remove(&node_id);
    }

    pub fn add_dependent(&mut self, node_id: NodeId) {
        self.dependents.insert(node_id);
    }

    pub fn remove_dependent(&mut self, node_id: NodeId) {
        self.dependents.shift_remove(&node_id);
    }

    pub fn dependencies(&self) -> &IndexSet<NodeId> {
        &self.dependencies
    }

    pub fn dependents(&self) -> &IndexSet<NodeId> {
        &self.dependents
    }

    /// Take the dependency set, leaving it empty.
    pub(crate) fn take_dependencies(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.dependencies)
    }

    pub fn push_owned(&mut self, item: Disposable) {
        self.owned.push(item);
    }

    /// Forget an owned node without disposing it.
    pub fn release_owned(&mut self, node_id: NodeId) {
        self.owned
            .retain(|item| !matches!(item, Disposable::Node(id) if *id == node_id));
    }

    /// Take the disposal list, leaving it empty.
    pub fn take_owned(&mut self) -> Vec<Disposable> {
        std::mem::take(&mut self.owned)
    }

    pub fn owned_len(&self) -> usize {
        self.owned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn initial_dirty_state_depends_on_kind() {
        assert!(ReactiveNode::source().is_clean());
        assert!(ReactiveNode::scope().is_clean());
        assert_eq!(ReactiveNode::derived().dirty_state(), DirtyState::Dirty);
        assert_eq!(ReactiveNode::effect().dirty_state(), DirtyState::Dirty);
    }

    #[test]
    fn dependents_keep_insertion_order() {
        let mut node = ReactiveNode::source();
        let ids: Vec<NodeId> = (0..4).map(|_| NodeId::new()).collect();
        for id in ids.iter().rev() {
            node.add_dependent(*id);
        }
        node.add_dependent(ids[3]);

        let order: Vec<NodeId> = node.dependents().iter().copied().collect();
        assert_eq!(order, vec![ids[3], ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn release_owned_only_drops_matching_node() {
        let mut scope = ReactiveNode::scope();
        let a = NodeId::new();
        let b = NodeId::new();
        scope.push_owned(Disposable::Node(a));
        scope.push_owned(Disposable::Callback(Box::new(|| {})));
        scope.push_owned(Disposable::Node(b));

        scope.release_owned(a);
        assert_eq!(scope.owned_len(), 2);

        let rest = scope.take_owned();
        assert!(matches!(rest[0], Disposable::Callback(_)));
        assert!(matches!(rest[1], Disposable::Node(id) if id == b));
        assert_eq!(scope.owned_len(), 0);
    }
}
