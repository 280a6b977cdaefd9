//! List Reconciler
//!
//! Keeps a container's children in sync with a reactive sequence.
//!
//! # Modes
//!
//! - **Unkeyed** ([`reconcile_list`]): every pass clears the container and
//!   renders every item again. No identity is preserved.
//!
//! - **Keyed** ([`reconcile_keyed_list`]): a key→node map persists across
//!   passes. A node rendered for key `K` is reused for as long as `K` stays
//!   in the sequence; only its position changes. Its bindings and effects
//!   are never re-run by reconciliation itself.
//!
//! # Keyed pass
//!
//! 1. Read the items. Anything that is not a sequence counts as empty.
//! 2. Empty: forget every entry and clear the container.
//! 3. Compute every key. A null key or a repeated key invalidates the pass:
//!    the map is discarded and every item is rendered fresh.
//! 4. Look up each key, rendering the missing ones.
//! 5. Detach all children (without disposing them).
//! 6. Re-append the nodes in the new order.
//! 7. Evict entries whose key did not appear in this pass.
//!
//! Every item is rendered untracked inside its own scope, so per-item
//! effects live exactly as long as the item's node.

use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, error, trace, warn};

use super::managed_container;
use crate::dom::Node;
use crate::error::Result;
use crate::reactive::{on_cleanup, Effect, ReactiveContext, Scope};

/// What an items accessor may produce.
pub trait IntoItems<T> {
    fn into_items(self) -> Vec<T>;
}

impl<T> IntoItems<T> for Vec<T> {
    fn into_items(self) -> Vec<T> {
        self
    }
}

impl<T> IntoItems<T> for Option<Vec<T>> {
    fn into_items(self) -> Vec<T> {
        if self.is_none() {
            trace!("items accessor produced no sequence; treating as empty");
        }
        self.unwrap_or_default()
    }
}

impl<T: Clone> IntoItems<T> for Rc<[T]> {
    fn into_items(self) -> Vec<T> {
        self.to_vec()
    }
}

/// A key identifying a list item across passes.
pub trait ListKey: Eq + Hash + 'static {
    /// Null keys invalidate a keyed pass.
    fn is_null(&self) -> bool {
        false
    }
}

macro_rules! list_key {
    ($($ty:ty),*) => {
        $(impl ListKey for $ty {})*
    };
}

list_key!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, char, bool, String,
    &'static str
);

impl<K: ListKey> ListKey for Option<K> {
    fn is_null(&self) -> bool {
        self.as_ref().map_or(true, ListKey::is_null)
    }
}

impl<A: ListKey, B: ListKey> ListKey for (A, B) {
    fn is_null(&self) -> bool {
        self.0.is_null() || self.1.is_null()
    }
}

/// A rendered item and the scope holding its bindings.
struct Entry {
    node: Node,
    scope: Scope,
}

impl Entry {
    fn render<T>(render: &dyn Fn(&T, usize) -> Node, item: &T, index: usize) -> Self {
        // Disposes the scope if `render` unwinds.
        struct Pending(Option<Scope>);

        impl Drop for Pending {
            fn drop(&mut self) {
                if let Some(scope) = self.0.take() {
                    scope.dispose();
                }
            }
        }

        let scope = Scope::root();
        let mut pending = Pending(Some(scope));
        let node = {
            let _ctx = ReactiveContext::owned_by(scope.id());
            render(item, index)
        };
        pending.0 = None;
        Entry { node, scope }
    }

    fn dispose(self) {
        self.node.remove();
        self.scope.dispose();
    }
}

/// Render a sequence without keys.
///
/// ```rust
/// use weft_core::dom::Node;
/// use weft_core::reactive::Signal;
/// use weft_core::render::reconcile_list;
///
/// let names = Signal::new(vec!["a", "b"]);
/// let n = names.clone();
/// let list = reconcile_list(move || n.get(), |name: &&str, _| Node::text(*name)).unwrap();
/// assert_eq!(list.child_count(), 2);
///
/// names.set(vec![]);
/// assert_eq!(list.child_count(), 0);
/// ```
pub fn reconcile_list<T, I>(
    items: impl Fn() -> I + 'static,
    render: impl Fn(&T, usize) -> Node + 'static,
) -> Result<Node>
where
    T: 'static,
    I: IntoItems<T>,
{
    managed_container(|container| {
        let container = container.clone();
        Effect::new(move || {
            let items = items().into_items();
            container.detach_children();

            // Item scopes belong to this effect and go away before its next run.
            for (index, item) in items.iter().enumerate() {
                let scope = Scope::new();
                let Some(node) = scope.run(|| render(item, index)) else {
                    continue;
                };
                if let Err(err) = container.append_child(&node) {
                    error!(index, error = %err, "list item could not be attached");
                }
            }
            debug!(rendered = items.len(), "unkeyed list pass");
        });
    })
}

/// Render a sequence, reusing nodes by key.
///
/// ```rust
/// use weft_core::dom::Node;
/// use weft_core::reactive::Signal;
/// use weft_core::render::reconcile_keyed_list;
///
/// let ids = Signal::new(vec![1, 2, 3]);
/// let i = ids.clone();
/// let list = reconcile_keyed_list(
///     move || i.get(),
///     |id: &i32, _| Node::text(id.to_string()),
///     |id, _| *id,
/// )
/// .unwrap();
/// let third = list.child(2).unwrap();
///
/// ids.set(vec![3, 1]);
/// assert!(list.child(0).unwrap().ptr_eq(&third));
/// ```
pub fn reconcile_keyed_list<T, I, K>(
    items: impl Fn() -> I + 'static,
    render: impl Fn(&T, usize) -> Node + 'static,
    key: impl Fn(&T, usize) -> K + 'static,
) -> Result<Node>
where
    T: 'static,
    I: IntoItems<T>,
    K: ListKey,
{
    managed_container(|container| {
        let state = Rc::new(RefCell::new(KeyedState::<K>::default()));

        // Registered on the container scope, not the effect, so entries
        // survive effect re-runs.
        let on_drop = state.clone();
        on_cleanup(move || on_drop.borrow_mut().clear());

        let container = container.clone();
        Effect::new(move || {
            let items = items().into_items();
            state.borrow_mut().pass(&container, &items, &render, &key);
        });
    })
}

struct KeyedState<K> {
    entries: IndexMap<K, Entry>,
    /// Entries rendered by a fallback pass. They have no usable key.
    loose: Vec<Entry>,
}

impl<K> Default for KeyedState<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            loose: Vec::new(),
        }
    }
}

impl<K: ListKey> KeyedState<K> {
    fn pass<T>(
        &mut self,
        container: &Node,
        items: &[T],
        render: &dyn Fn(&T, usize) -> Node,
        key: &dyn Fn(&T, usize) -> K,
    ) {
        if items.is_empty() {
            let evicted = self.len();
            self.clear();
            container.detach_children();
            debug!(evicted, "keyed list emptied");
            return;
        }

        let keys: Vec<K> = items.iter().enumerate().map(|(i, item)| key(item, i)).collect();
        if !keys_are_valid(&keys) {
            warn!(items = items.len(), "list keys are null or repeated; rebuilding every item");
            self.rebuild(container, items, render);
            return;
        }

        let mut pass = PassGuard {
            entries: &mut self.entries,
            previous: IndexMap::new(),
            next: IndexMap::with_capacity(items.len()),
        };
        pass.previous = std::mem::take(&mut *pass.entries);
        let mut created = 0usize;
        for ((index, item), k) in items.iter().enumerate().zip(keys) {
            let entry = match pass.previous.swap_remove(&k) {
                Some(entry) => entry,
                None => {
                    created += 1;
                    Entry::render(render, item, index)
                }
            };
            pass.next.insert(k, entry);
        }
        let (previous, next) = pass.finish();

        container.detach_children();
        for entry in next.values() {
            attach(container, &entry.node);
        }

        let evicted = previous.len() + self.loose.len();
        for (_, entry) in previous {
            entry.dispose();
        }
        for entry in self.loose.drain(..) {
            entry.dispose();
        }
        self.entries = next;

        debug!(
            created,
            reused = items.len() - created,
            evicted,
            "keyed list pass"
        );
    }

    /// Discard the map and render every item fresh.
    fn rebuild<T>(&mut self, container: &Node, items: &[T], render: &dyn Fn(&T, usize) -> Node) {
        self.clear();
        container.detach_children();
        for (index, item) in items.iter().enumerate() {
            let entry = Entry::render(render, item, index);
            attach(container, &entry.node);
            self.loose.push(entry);
        }
    }

    fn len(&self) -> usize {
        self.entries.len() + self.loose.len()
    }

    fn clear(&mut self) {
        for (_, entry) in self.entries.drain(..) {
            entry.dispose();
        }
        for entry in self.loose.drain(..) {
            entry.dispose();
        }
    }
}

/// Holds the entries of a keyed pass while items render. If a render
/// panics, every entry goes back into the state so the container scope
/// still disposes it.
struct PassGuard<'a, K: ListKey> {
    entries: &'a mut IndexMap<K, Entry>,
    previous: IndexMap<K, Entry>,
    next: IndexMap<K, Entry>,
}

impl<K: ListKey> PassGuard<'_, K> {
    fn finish(mut self) -> (IndexMap<K, Entry>, IndexMap<K, Entry>) {
        (std::mem::take(&mut self.previous), std::mem::take(&mut self.next))
    }
}

impl<K: ListKey> Drop for PassGuard<'_, K> {
    fn drop(&mut self) {
        if self.next.is_empty() && self.previous.is_empty() {
            return;
        }
        trace!(
            restored = self.next.len() + self.previous.len(),
            "keyed pass unwound; keeping rendered entries"
        );
        self.entries.extend(self.next.drain(..));
        self.entries.extend(self.previous.drain(..));
    }
}

fn keys_are_valid<K: ListKey>(keys: &[K]) -> bool {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter().all(|k| !k.is_null() && seen.insert(k))
}

fn attach(container: &Node, node: &Node) {
    if let Err(err) = container.append_child(node) {
        error!(error = %err, "list item could not be attached");
    }
}
