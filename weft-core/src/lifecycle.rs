//! Host lifecycle.
//!
//! [`mount`] builds content under a fresh root scope and records that scope
//! on the host element. [`unmount`] is the matching teardown: it runs the
//! scope's disposal list, then clears the host.
//!
//! Generic clearing only disposes scopes attached to plain nodes.
//! Self-managed containers (lists, conditionals) are detached like any other
//! child, but their scope belongs to the owner that created them and is
//! disposed through that owner alone.

use tracing::{debug, trace};

use crate::binding::{bind_child, Child};
use crate::dom::Node;
use crate::error::{ReactiveError, Result};
use crate::reactive::{run_cleanup, Scope};

/// Build content into `host` inside a new root scope.
///
/// Mounting onto a host that is already mounted unmounts it first.
///
/// ```rust
/// use weft_core::dom::Node;
/// use weft_core::lifecycle::{mount, unmount};
/// use weft_core::reactive::Signal;
///
/// let host = Node::element("main");
/// let name = Signal::new(String::from("world"));
/// let n = name.clone();
/// mount(&host, move || n).unwrap();
/// assert_eq!(host.text_content(), "world");
///
/// unmount(&host);
/// name.set("again".into());
/// assert_eq!(host.child_count(), 0);
/// ```
pub fn mount<C: Into<Child>>(host: &Node, build: impl FnOnce() -> C) -> Result<Scope> {
    if !host.is_element() {
        return Err(ReactiveError::NotAnElement);
    }
    if host.scope().is_some() {
        debug!("host already mounted; unmounting first");
        unmount(host);
    }

    let scope = Scope::root();
    let built = scope.run(|| bind_child(host, build())).unwrap_or(Ok(()));
    if let Err(err) = built {
        scope.dispose();
        return Err(err);
    }

    host.attach_scope(scope);
    debug!(scope = %scope.id(), "mounted");
    Ok(scope)
}

/// Dispose the host's scope and clear its children.
pub fn unmount(host: &Node) {
    if let Some(scope) = host.take_scope() {
        run_cleanup(&scope);
        debug!(scope = %scope.id(), "unmounted");
    }
    clear_children(host);
}

/// Detach every child of `node`, disposing the scopes attached to plain
/// descendants. Returns the number of scopes disposed.
pub fn clear_children(node: &Node) -> usize {
    let mut disposed = 0;
    let mut stack = node.detach_children();
    while let Some(child) = stack.pop() {
        if child.is_self_managed() {
            trace!("skipping self-managed container");
            continue;
        }
        if let Some(scope) = child.take_scope() {
            if !scope.is_disposed() {
                scope.dispose();
                disposed += 1;
            }
        }
        stack.extend(child.children());
    }
    disposed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{on_cleanup, Effect, Signal};
    use crate::render::reconcile_list;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn unmount_stops_every_effect() {
        let host = Node::element("section");
        let count = Signal::new(0);
        let runs = Rc::new(Cell::new(0));

        let (c, r) = (count.clone(), runs.clone());
        mount(&host, move || {
            let r = r.clone();
            let c2 = c.clone();
            Effect::new(move || {
                c2.get();
                r.set(r.get() + 1);
            });
            c
        })
        .unwrap();
        assert_eq!(runs.get(), 1);
        assert_eq!(host.text_content(), "0");

        unmount(&host);
        count.set(1);
        assert_eq!(runs.get(), 1);
        assert!(host.scope().is_none());
    }

    #[test]
    fn cleanups_run_in_registration_order() {
        let host = Node::element("div");
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        mount(&host, move || {
            for i in 0..3 {
                let o = o.clone();
                on_cleanup(move || o.borrow_mut().push(i));
            }
            Child::Empty
        })
        .unwrap();

        unmount(&host);
        assert_eq!(*order.borrow(), [0, 1, 2]);
    }

    #[test]
    fn remount_replaces_previous_scope() {
        let host = Node::element("div");
        let first = mount(&host, || "one").unwrap();
        let second = mount(&host, || "two").unwrap();
        assert!(first.is_disposed());
        assert!(!second.is_disposed());
        assert_eq!(host.text_content(), "two");
    }

    #[test]
    fn clear_children_disposes_plain_scopes_only() {
        let parent = Node::element("div");

        let plain = Node::element("p");
        let plain_scope = Scope::root();
        plain.attach_scope(plain_scope);
        parent.append_child(&plain).unwrap();

        let items = Signal::new(vec![1, 2]);
        let owner = Scope::root();
        let i = items.clone();
        let list = owner
            .run(|| reconcile_list(move || i.get(), |n: &i32, _| Node::text(n.to_string())))
            .unwrap()
            .unwrap();
        parent.append_child(&list).unwrap();

        assert_eq!(clear_children(&parent), 1);
        assert!(plain_scope.is_disposed());
        assert_eq!(parent.child_count(), 0);

        // the list still belongs to its owner
        let list_scope = list.scope().unwrap();
        assert!(!list_scope.is_disposed());
        items.set(vec![1, 2, 3]);
        assert_eq!(list.child_count(), 3);

        owner.dispose();
        assert!(list_scope.is_disposed());
    }

    #[test]
    fn text_hosts_are_rejected() {
        assert_eq!(
            mount(&Node::text("x"), || "y").unwrap_err(),
            ReactiveError::NotAnElement
        );
    }
}
