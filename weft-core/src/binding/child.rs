//! Child content bindings.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::dom::Node;
use crate::error::{ReactiveError, Result};
use crate::reactive::{Effect, Memo, ReadSignal, Signal};
use crate::render::contents_container;

/// Content placed in a child position of a template.
///
/// Lists nest arbitrarily and are flattened before insertion.
#[derive(Clone, Default)]
pub enum Child {
    #[default]
    Empty,
    Text(String),
    Node(Node),
    List(Vec<Child>),
    Dynamic(Rc<dyn Fn() -> Child>),
}

impl Child {
    /// Content produced by a tracked accessor.
    pub fn dynamic<C: Into<Child>>(f: impl Fn() -> C + 'static) -> Self {
        Child::Dynamic(Rc::new(move || f().into()))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Child::Dynamic(_))
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Child::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Child::List(items) => f.debug_tuple("List").field(items).finish(),
            Child::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<&Node> for Child {
    fn from(node: &Node) -> Self {
        Child::Node(node.clone())
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

macro_rules! display_child {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

display_child!(bool, char, i32, i64, u32, u64, usize, f32, f64);

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child> + Clone + 'static> From<Signal<T>> for Child {
    fn from(signal: Signal<T>) -> Self {
        Child::dynamic(move || signal.get())
    }
}

impl<T: Into<Child> + Clone + 'static> From<ReadSignal<T>> for Child {
    fn from(signal: ReadSignal<T>) -> Self {
        Child::dynamic(move || signal.get())
    }
}

impl<T: Into<Child> + Clone + 'static> From<Memo<T>> for Child {
    fn from(memo: Memo<T>) -> Self {
        Child::dynamic(move || memo.get())
    }
}

/// Flatten nested lists into their leaves, in document order. `Empty`
/// leaves are dropped.
///
/// Uses an explicit stack, so nesting depth is bounded by memory rather
/// than by the call stack.
pub fn flatten(children: impl IntoIterator<Item = Child>) -> Vec<Child> {
    let mut out = Vec::new();
    let mut stack = vec![children.into_iter().collect::<Vec<_>>().into_iter()];
    while let Some(top) = stack.last_mut() {
        match top.next() {
            None => {
                stack.pop();
            }
            Some(Child::List(items)) => stack.push(items.into_iter()),
            Some(Child::Empty) => {}
            Some(leaf) => out.push(leaf),
        }
    }
    out
}

/// Append `child` to `parent`.
///
/// Static content is inserted once. Dynamic content is owned by an effect
/// that keeps exactly one node in the position: primitive values update a
/// managed text node in place, node values replace whatever was there.
pub fn bind_child(parent: &Node, child: impl Into<Child>) -> Result<()> {
    if !parent.is_element() {
        return Err(ReactiveError::NotAnElement);
    }
    for leaf in flatten([child.into()]) {
        match leaf {
            Child::Text(text) => parent.append_child(&Node::text(text))?,
            Child::Node(node) => parent.append_child(&node)?,
            Child::Dynamic(get) => bind_dynamic(parent, get)?,
            Child::Empty | Child::List(_) => {}
        }
    }
    Ok(())
}

/// The node currently standing in a dynamic child position.
struct Slot {
    node: Node,
    /// `true` when `node` is a text node created by the binding itself.
    managed_text: bool,
}

enum Resolved {
    Text(String),
    Node(Node),
}

fn bind_dynamic(parent: &Node, get: Rc<dyn Fn() -> Child>) -> Result<()> {
    let placeholder = Node::text("");
    parent.append_child(&placeholder)?;

    let slot = RefCell::new(Slot {
        node: placeholder,
        managed_text: true,
    });
    let parent = parent.clone();

    Effect::new(move || {
        let next = match resolve(get()) {
            Ok(next) => next,
            Err(err) => {
                warn!(error = %err, "child binding produced invalid content");
                return;
            }
        };
        let mut slot = slot.borrow_mut();
        if let Err(err) = apply(&parent, &mut slot, next) {
            warn!(error = %err, "child binding update failed");
        }
    });
    Ok(())
}

fn resolve(mut child: Child) -> Result<Resolved> {
    loop {
        match child {
            Child::Dynamic(get) => child = get(),
            Child::Empty => return Ok(Resolved::Text(String::new())),
            Child::Text(text) => return Ok(Resolved::Text(text)),
            Child::Node(node) => return Ok(Resolved::Node(node)),
            Child::List(items) => {
                let container = contents_container()?;
                bind_child(&container, Child::List(items))?;
                return Ok(Resolved::Node(container));
            }
        }
    }
}

fn apply(parent: &Node, slot: &mut Slot, next: Resolved) -> Result<()> {
    match next {
        Resolved::Text(text) if slot.managed_text => {
            trace!("updating managed text node");
            slot.node.set_text(text)
        }
        Resolved::Text(text) => {
            let node = Node::text(text);
            swap(parent, slot, node, true)
        }
        Resolved::Node(node) if node.ptr_eq(&slot.node) => Ok(()),
        Resolved::Node(node) => swap(parent, slot, node, false),
    }
}

fn swap(parent: &Node, slot: &mut Slot, node: Node, managed_text: bool) -> Result<()> {
    let in_place = slot.node.parent().is_some_and(|p| p.ptr_eq(parent));
    if in_place {
        parent.replace_child(&node, &slot.node)?;
    } else {
        warn!("child binding lost its position, appending");
        parent.append_child(&node)?;
    }
    slot.node = node;
    slot.managed_text = managed_text;
    Ok(())
}
