//! Update Scheduler
//!
//! The scheduler owns every node of the graph and decides which effects
//! must run after a write.
//!
//! # Algorithm
//!
//! 1. When a source node changes, visit its dependents in subscription order.
//! 2. Derived dependents are marked dirty and their own dependents are
//!    visited in turn. They recompute lazily on their next read.
//! 3. Effect dependents are appended to the pending queue. The queue is a
//!    set, so an effect reached through several paths (or several writes
//!    inside one batch) is queued once.
//! 4. The runtime drains the queue once the outermost batch ends.
//!
//! Because every write goes through the queue, an effect that observes two
//! nodes updated together sees only the final state.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::node::{Disposable, NodeId, NodeKind, ReactiveNode};

/// The update scheduler manages the dependency graph and coordinates updates.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    /// All nodes in the graph, indexed by ID.
    nodes: HashMap<NodeId, ReactiveNode>,

    /// Effects waiting to run, in the order they were reached.
    pending: IndexSet<NodeId>,

    /// Nesting depth of `batch` calls.
    batch_depth: usize,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph, registering it with its owner.
    pub fn add_node(&mut self, node: ReactiveNode) -> NodeId {
        let id = node.id();
        if let Some(owner) = node.owner() {
            if let Some(owner_node) = self.nodes.get_mut(&owner) {
                owner_node.push_owned(Disposable::Node(id));
            }
        }
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph.
    ///
    /// Drops every edge involving the node, cancels it if it was pending and
    /// detaches it from its owner. The removed node is returned so the
    /// caller can dispose whatever it owned.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<ReactiveNode> {
        let node = self.nodes.remove(&node_id)?;

        for dep_id in node.dependencies() {
            if let Some(dep) = self.nodes.get_mut(dep_id) {
                dep.remove_dependent(node_id);
            }
        }
        for dependent_id in node.dependents() {
            if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                dependent.remove_dependency(node_id);
            }
        }
        if let Some(owner) = node.owner() {
            if let Some(owner_node) = self.nodes.get_mut(&owner) {
                owner_node.release_owned(node_id);
            }
        }
        self.pending.shift_remove(&node_id);

        Some(node)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&ReactiveNode> {
        self.nodes.get(&node_id)
    }

    pub fn get_node_mut(&mut self, node_id: NodeId) -> Option<&mut ReactiveNode> {
        self.nodes.get_mut(&node_id)
    }

    /// Add a dependency edge: `dependent` depends on `dependency`.
    pub fn add_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if !self.nodes.contains_key(&dependency) || !self.nodes.contains_key(&dependent) {
            return;
        }
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.add_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.add_dependency(dependency);
        }
    }

    /// Drop every edge from `dependent` to the nodes it read.
    ///
    /// Called before re-running a computation so that only the reads of the
    /// new run are tracked.
    pub fn clear_dependencies(&mut self, dependent: NodeId) {
        let deps = match self.nodes.get_mut(&dependent) {
            Some(node) => node.take_dependencies(),
            None => return,
        };
        for dep_id in deps {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_dependent(dependent);
            }
        }
    }

    /// Mark a source node as changed and propagate dirty flags.
    ///
    /// Derived nodes downstream are marked dirty, effects downstream are
    /// queued. Returns the number of effects newly queued.
    pub fn mark_changed(&mut self, source_id: NodeId) -> usize {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut queued = 0;

        if let Some(source) = self.nodes.get(&source_id) {
            queue.extend(source.dependents().iter().copied());
        }

        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(&node_id) else {
                continue;
            };
            match node.kind() {
                NodeKind::Derived => {
                    node.mark_dirty();
                    queue.extend(node.dependents().iter().copied());
                }
                NodeKind::Effect => {
                    node.mark_dirty();
                    if self.pending.insert(node_id) {
                        queued += 1;
                    }
                }
                NodeKind::Source | NodeKind::Scope => {}
            }
        }

        queued
    }

    /// Pop the next effect to run, in queue order.
    pub fn pop_pending(&mut self) -> Option<NodeId> {
        self.pending.shift_remove_index(0)
    }

    /// Remove an effect from the queue without running it.
    pub fn dequeue(&mut self, node_id: NodeId) {
        self.pending.shift_remove(&node_id);
    }

    /// Drop the whole queue.
    pub fn clear_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, node_id: NodeId) -> bool {
        self.pending.contains(&node_id)
    }

    pub fn enter_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Leave a batch, returning the remaining depth.
    pub fn exit_batch(&mut self) -> usize {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        self.batch_depth
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Register a disposable with an owner. Returns it back if the owner is
    /// gone so the caller can decide what to do with it.
    pub fn push_disposable(
        &mut self,
        owner: NodeId,
        item: Disposable,
    ) -> Result<(), Disposable> {
        match self.nodes.get_mut(&owner) {
            Some(node) => {
                node.push_owned(item);
                Ok(())
            }
            None => Err(item),
        }
    }

    /// Take an owner's disposal list, leaving the owner in place.
    pub fn take_owned(&mut self, owner: NodeId) -> Vec<Disposable> {
        self.nodes
            .get_mut(&owner)
            .map(ReactiveNode::take_owned)
            .unwrap_or_default()
    }

    /// Snapshot of a node's dependents, in notification order.
    pub fn dependents_of(&self, node_id: NodeId) -> SmallVec<[NodeId; 4]> {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependents().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the nodes read by a node during its last evaluation.
    pub fn dependencies_of(&self, node_id: NodeId) -> SmallVec<[NodeId; 4]> {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependencies().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
