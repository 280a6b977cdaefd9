//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a tracking context (computed/effect), the
//!    signal registers that context as a dependent.
//!
//! 2. When a signal is written, every dependent is notified. There is no
//!    equality check: writing the same value again still notifies.
//!
//! 3. Notifications trigger re-execution of dependent effects, either right
//!    away or at the end of the enclosing batch.

use std::fmt::{self, Debug};
use std::rc::Rc;

use parking_lot::RwLock;

use super::runtime::{notify, track, try_with_graph, with_graph};
use crate::graph::{NodeId, ReactiveNode};

struct SignalInner<T> {
    id: NodeId,
    value: RwLock<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        try_with_graph(|g| g.remove_node(self.id));
    }
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use weft_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        let id = with_graph(|g| g.add_node(ReactiveNode::source()));
        Self {
            inner: Rc::new(SignalInner {
                id,
                value: RwLock::new(value),
            }),
        }
    }

    /// Get the signal's graph node ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Borrow the current value, tracking the read.
    ///
    /// The signal must not be written from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track(self.inner.id);
        f(&self.inner.value.read())
    }

    /// Borrow the current value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Set a new value and notify dependents.
    pub fn set(&self, value: T) {
        *self.inner.value.write() = value;
        notify(self.inner.id);
    }

    /// Mutate the value in place and notify dependents.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.write());
        notify(self.inner.id);
    }

    /// Get the number of computations currently depending on this signal.
    pub fn subscriber_count(&self) -> usize {
        with_graph(|g| g.dependents_of(self.inner.id).len())
    }

    /// Split into read and write handles.
    pub fn split(&self) -> (ReadSignal<T>, WriteSignal<T>) {
        (
            ReadSignal {
                signal: self.clone(),
            },
            WriteSignal {
                signal: self.clone(),
            },
        )
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Get the current value.
    ///
    /// If called within a tracking context, this also registers the current
    /// computation as a dependent.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

/// Read half of a signal.
pub struct ReadSignal<T: 'static> {
    signal: Signal<T>,
}

impl<T: 'static> ReadSignal<T> {
    pub fn id(&self) -> NodeId {
        self.signal.id()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }
}

impl<T: Clone + 'static> ReadSignal<T> {
    /// Get the current value, tracking the read.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }
}

impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

/// Write half of a signal.
pub struct WriteSignal<T: 'static> {
    signal: Signal<T>,
}

impl<T: 'static> WriteSignal<T> {
    /// Set a new value and notify dependents.
    pub fn set(&self, value: T) {
        self.signal.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.signal.update(f);
    }
}

impl<T: 'static> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

/// Create a signal and return its `(get, set)` pair.
pub fn create_signal<T: 'static>(value: T) -> (ReadSignal<T>, WriteSignal<T>) {
    Signal::new(value).split()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{effect, runtime::node_count};
    use std::cell::Cell;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(vec![1, 2]);
        signal.update(|v| v.push(3));
        assert_eq!(signal.get(), vec![1, 2, 3]);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        assert_ne!(s1.id(), s2.id());
    }

    #[test]
    fn writing_the_same_value_still_notifies() {
        let signal = Signal::new(7);
        let runs = Rc::new(Cell::new(0));

        let s = signal.clone();
        let r = runs.clone();
        let _effect = effect(move || {
            s.get();
            r.set(r.get() + 1);
        });

        signal.set(7);
        signal.set(7);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let signal = Signal::new(1);

        let s = signal.clone();
        let _effect = effect(move || {
            s.get_untracked();
        });

        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn split_halves_share_the_cell() {
        let (get, set) = create_signal(String::from("a"));
        set.set("b".into());
        assert_eq!(get.get(), "b");
        set.update(|s| s.push('c'));
        assert_eq!(get.with(|s| s.len()), 2);
    }

    #[test]
    fn dropping_last_handle_removes_graph_node() {
        let before = node_count();
        let signal = Signal::new(0);
        assert_eq!(node_count(), before + 1);
        drop(signal);
        assert_eq!(node_count(), before);
    }
}
