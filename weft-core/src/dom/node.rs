//! DOM nodes.

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::event::{Event, EventHandler, Listener, ListenerId};
use super::value::AttrValue;
use crate::error::{ReactiveError, Result};
use crate::reactive::Scope;

/// Elements that never have a closing tag when serialized.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text,
    Comment,
}

#[derive(Default)]
struct NodeData {
    parent: Weak<NodeInner>,
    children: Vec<Node>,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, AttrValue>,
    text: String,
    listeners: Vec<Listener>,
    self_managed: bool,
    scope: Option<Scope>,
}

struct NodeInner {
    kind: NodeKind,
    data: RefCell<NodeData>,
}

/// Handle to a live node. Cloning the handle does not clone the node.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    fn with_kind(kind: NodeKind, text: String) -> Self {
        Node(Rc::new(NodeInner {
            kind,
            data: RefCell::new(NodeData {
                text,
                ..NodeData::default()
            }),
        }))
    }

    /// Create an element. Tags are stored lowercase.
    pub fn element(tag: &str) -> Self {
        Self::with_kind(
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            String::new(),
        )
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text, content.into())
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Comment, content.into())
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// The element tag, or `None` for text and comment nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.kind, NodeKind::Text)
    }

    /// Check whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn require_element(&self) -> Result<()> {
        if self.is_element() {
            Ok(())
        } else {
            Err(ReactiveError::NotAnElement)
        }
    }

    // ------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.0.data.borrow().parent.upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.data.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.data.borrow().children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node> {
        self.0.data.borrow().children.get(index).cloned()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.child(0)
    }

    fn index_in_parent(&self) -> Option<(Node, usize)> {
        let parent = self.parent()?;
        let index = parent
            .0
            .data
            .borrow()
            .children
            .iter()
            .position(|c| c.ptr_eq(self))?;
        Some((parent, index))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let (parent, index) = self.index_in_parent()?;
        parent.child(index + 1)
    }

    /// Check whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Append `child`, moving it out of its current parent first.
    pub fn append_child(&self, child: &Node) -> Result<()> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None`.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<()> {
        self.require_element()?;
        if child.contains(self) {
            return Err(ReactiveError::InvalidHierarchy);
        }
        if let Some(reference) = reference {
            if reference.ptr_eq(child) {
                return Ok(());
            }
            if !reference.parent().is_some_and(|p| p.ptr_eq(self)) {
                return Err(ReactiveError::NotAChild);
            }
        }

        child.remove();

        let mut data = self.0.data.borrow_mut();
        let index = match reference {
            Some(reference) => data
                .children
                .iter()
                .position(|c| c.ptr_eq(reference))
                .ok_or(ReactiveError::NotAChild)?,
            None => data.children.len(),
        };
        data.children.insert(index, child.clone());
        drop(data);

        child.0.data.borrow_mut().parent = Rc::downgrade(&self.0);
        Ok(())
    }

    /// Remove `child` from this node. Returns `false` if it was not a child.
    pub fn remove_child(&self, child: &Node) -> bool {
        let mut data = self.0.data.borrow_mut();
        let Some(index) = data.children.iter().position(|c| c.ptr_eq(child)) else {
            return false;
        };
        data.children.remove(index);
        drop(data);

        child.0.data.borrow_mut().parent = Weak::new();
        true
    }

    /// Detach this node from its parent, if it has one.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Replace `old` with `new` at the same position.
    pub fn replace_child(&self, new: &Node, old: &Node) -> Result<()> {
        if new.ptr_eq(old) {
            return Ok(());
        }
        let mut next = old.next_sibling();
        if next.as_ref().is_some_and(|n| n.ptr_eq(new)) {
            next = new.next_sibling();
        }
        if !self.remove_child(old) {
            return Err(ReactiveError::NotAChild);
        }
        self.insert_before(new, next.as_ref())
    }

    /// Detach every child and return them, in order, without touching their
    /// bindings.
    pub fn detach_children(&self) -> Vec<Node> {
        let children = std::mem::take(&mut self.0.data.borrow_mut().children);
        for child in &children {
            child.0.data.borrow_mut().parent = Weak::new();
        }
        children
    }

    // ------------------------------------------------------------------
    // Attributes & properties
    // ------------------------------------------------------------------

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> Result<()> {
        self.require_element()?;
        self.0
            .data
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        self.0
            .data
            .borrow_mut()
            .attributes
            .shift_remove(name)
            .is_some()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.0.data.borrow().attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.data.borrow().attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.0.data.borrow().attributes.keys().cloned().collect()
    }

    /// Assign a property.
    ///
    /// `value` on a `<select>` selects the first `<option>` whose value
    /// matches. With no matching option nothing is selected, so assigning
    /// before the options exist has no lasting effect.
    pub fn set_property(&self, name: &str, value: AttrValue) -> Result<()> {
        self.require_element()?;
        if name == "value" && self.tag() == Some("select") {
            let wanted = value.as_text();
            let mut matched = false;
            for option in self.options() {
                let hit = !matched && option.option_value() == wanted;
                matched |= hit;
                option
                    .0
                    .data
                    .borrow_mut()
                    .properties
                    .insert("selected".to_string(), AttrValue::Bool(hit));
            }
            return Ok(());
        }
        self.0
            .data
            .borrow_mut()
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Read a property. Unset properties read as `Null`.
    pub fn get_property(&self, name: &str) -> AttrValue {
        if name == "value" && self.tag() == Some("select") {
            let options = self.options();
            let selected = options
                .iter()
                .find(|o| o.get_property("selected") == AttrValue::Bool(true))
                .or_else(|| options.first());
            return AttrValue::Text(selected.map(Node::option_value).unwrap_or_default());
        }
        self.0
            .data
            .borrow()
            .properties
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn options(&self) -> Vec<Node> {
        let mut found = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node.tag() {
                Some("option") => found.push(node),
                // optgroups and reactive containers can hold options
                Some(_) => stack.extend(node.children().into_iter().rev()),
                None => {}
            }
        }
        found
    }

    fn option_value(&self) -> String {
        self.get_attribute("value")
            .unwrap_or_else(|| self.text_content().trim().to_string())
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self.0.kind {
            NodeKind::Text | NodeKind::Comment => self.0.data.borrow().text.clone(),
            NodeKind::Element { .. } => {
                let mut out = String::new();
                let mut stack = vec![self.clone()];
                while let Some(node) = stack.pop() {
                    if node.is_text() {
                        out.push_str(&node.0.data.borrow().text);
                    } else {
                        stack.extend(node.children().into_iter().rev());
                    }
                }
                out
            }
        }
    }

    /// Replace the content of a text or comment node. On an element this
    /// replaces all children with a single text node.
    pub fn set_text(&self, content: impl Into<String>) -> Result<()> {
        if self.is_element() {
            self.detach_children();
            return self.append_child(&Node::text(content));
        }
        self.0.data.borrow_mut().text = content.into();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(&self, event: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId::next();
        self.0.data.borrow_mut().listeners.push(Listener {
            id,
            event: event.to_string(),
            handler,
        });
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut data = self.0.data.borrow_mut();
        let before = data.listeners.len();
        data.listeners.retain(|l| l.id != id);
        data.listeners.len() != before
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.0
            .data
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .count()
    }

    /// Dispatch `event` on this node and bubble it up through the ancestors.
    /// Returns `false` if a handler called `prevent_default`.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        event.set_target(self.clone());
        let mut current = Some(self.clone());
        while let Some(node) = current {
            let handlers: Vec<EventHandler> = node
                .0
                .data
                .borrow()
                .listeners
                .iter()
                .filter(|l| l.event == event.name())
                .map(|l| l.handler.clone())
                .collect();
            for handler in handlers {
                handler(event);
            }
            if event.is_propagation_stopped() {
                break;
            }
            current = node.parent();
        }
        !event.is_default_prevented()
    }

    // ------------------------------------------------------------------
    // Reactive bookkeeping
    // ------------------------------------------------------------------

    /// Mark this node as a reactive container that manages its own lifetime.
    pub fn mark_self_managed(&self) {
        self.0.data.borrow_mut().self_managed = true;
    }

    pub fn is_self_managed(&self) -> bool {
        self.0.data.borrow().self_managed
    }

    /// Attach the scope holding this node's bindings.
    pub fn attach_scope(&self, scope: Scope) {
        self.0.data.borrow_mut().scope = Some(scope);
    }

    pub fn scope(&self) -> Option<Scope> {
        self.0.data.borrow().scope
    }

    pub fn take_scope(&self) -> Option<Scope> {
        self.0.data.borrow_mut().scope.take()
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Serialize the node and its subtree as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let data = self.0.data.borrow();
        match &self.0.kind {
            NodeKind::Text => out.push_str(&escape(&data.text, false)),
            NodeKind::Comment => {
                let _ = write!(out, "<!--{}-->", data.text);
            }
            NodeKind::Element { tag } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in &data.attributes {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &data.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
