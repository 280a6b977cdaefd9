//! Attribute, property and event bindings.
//!
//! Template positions are classified by their key:
//!
//! | key       | kind      | accepts        |
//! |-----------|-----------|----------------|
//! | `@click`  | event     | a handler      |
//! | `.value`  | property  | a value        |
//! | `class`   | attribute | a value        |
//!
//! Handing a handler to a value position, or a value to an event position,
//! is a programmer error and fails immediately.

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::reactive::{IntoBindingValue, MaybeReactive};
use crate::dom::{AttrValue, Event, EventHandler, ListenerId, Node};
use crate::error::{ReactiveError, Result};
use crate::reactive::{on_cleanup, Effect};

/// What a template position binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind<'a> {
    Event(&'a str),
    Property(&'a str),
    Attribute(&'a str),
}

impl<'a> BindingKind<'a> {
    /// Classify a binding key by its prefix.
    pub fn classify(key: &'a str) -> Result<Self> {
        let kind = if let Some(name) = key.strip_prefix('@') {
            BindingKind::Event(name)
        } else if let Some(name) = key.strip_prefix('.') {
            BindingKind::Property(name)
        } else {
            BindingKind::Attribute(key)
        };
        if kind.name().is_empty() {
            return Err(ReactiveError::InvalidBindingKey {
                key: key.to_string(),
            });
        }
        Ok(kind)
    }

    pub fn name(&self) -> &'a str {
        match self {
            BindingKind::Event(name) | BindingKind::Property(name) | BindingKind::Attribute(name) => {
                name
            }
        }
    }
}

/// A value handed to a template position.
#[derive(Clone)]
pub enum Binding {
    Value(MaybeReactive<AttrValue>),
    Handler(EventHandler),
}

impl Binding {
    /// A value for an attribute or property position. Signals, memos and
    /// closures stay live.
    pub fn value(value: impl IntoBindingValue) -> Self {
        Binding::Value(value.into_binding_value())
    }

    /// An event handler.
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        Binding::Handler(Rc::new(f))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Binding::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Apply a binding to `node`, dispatching on the key's prefix.
pub fn bind(node: &Node, key: &str, binding: Binding) -> Result<()> {
    match (BindingKind::classify(key)?, binding) {
        (BindingKind::Event(name), Binding::Handler(handler)) => {
            attach_listener(node, name, handler)?;
            Ok(())
        }
        (BindingKind::Event(_), Binding::Value(_)) => Err(ReactiveError::ExpectedHandler {
            key: key.to_string(),
        }),
        (_, Binding::Handler(_)) => Err(ReactiveError::UnexpectedHandler {
            key: key.to_string(),
        }),
        (BindingKind::Property(name), Binding::Value(value)) => {
            apply_property_binding(node, name, value)
        }
        (BindingKind::Attribute(name), Binding::Value(value)) => {
            bind_attribute_value(node, name, value)
        }
    }
}

/// Bind an attribute. Keys starting with `.` bind a property instead.
///
/// ```rust
/// use weft_core::binding::bind_attribute;
/// use weft_core::dom::Node;
/// use weft_core::reactive::Signal;
///
/// let node = Node::element("button");
/// let disabled = Signal::new(true);
/// bind_attribute(&node, "disabled", disabled.clone()).unwrap();
/// assert!(node.has_attribute("disabled"));
///
/// disabled.set(false);
/// assert!(!node.has_attribute("disabled"));
/// ```
pub fn bind_attribute(node: &Node, key: &str, value: impl IntoBindingValue) -> Result<()> {
    let value = value.into_binding_value();
    match BindingKind::classify(key)? {
        BindingKind::Attribute(name) => bind_attribute_value(node, name, value),
        BindingKind::Property(name) => apply_property_binding(node, name, value),
        BindingKind::Event(_) => Err(ReactiveError::ExpectedHandler {
            key: key.to_string(),
        }),
    }
}

fn bind_attribute_value(node: &Node, name: &str, value: MaybeReactive<AttrValue>) -> Result<()> {
    if !node.is_element() {
        return Err(ReactiveError::NotAnElement);
    }
    match value {
        MaybeReactive::Static(value) => apply_attribute(node, name, &value),
        MaybeReactive::Dynamic(get) => {
            let node = node.clone();
            let name = name.to_string();
            Effect::new(move || {
                if let Err(err) = apply_attribute(&node, &name, &get()) {
                    warn!(attribute = %name, error = %err, "attribute binding failed");
                }
            });
            Ok(())
        }
    }
}

fn apply_attribute(node: &Node, name: &str, value: &AttrValue) -> Result<()> {
    match value.to_attribute() {
        Some(text) => node.set_attribute(name, text),
        None => {
            node.remove_attribute(name);
            Ok(())
        }
    }
}

/// Bind a DOM property.
pub fn bind_property(node: &Node, name: &str, value: impl IntoBindingValue) -> Result<()> {
    apply_property_binding(node, name, value.into_binding_value())
}

fn apply_property_binding(node: &Node, name: &str, value: MaybeReactive<AttrValue>) -> Result<()> {
    if !node.is_element() {
        return Err(ReactiveError::NotAnElement);
    }
    match value {
        MaybeReactive::Static(value) => node.set_property(name, value),
        MaybeReactive::Dynamic(get) => {
            let node = node.clone();
            let name = name.to_string();
            Effect::new(move || {
                if let Err(err) = node.set_property(&name, get()) {
                    warn!(property = %name, error = %err, "property binding failed");
                }
            });
            Ok(())
        }
    }
}

/// Attach an event listener. The listener is removed when the current owner
/// is disposed.
pub fn bind_event(node: &Node, event: &str, handler: impl Fn(&Event) + 'static) -> Result<ListenerId> {
    attach_listener(node, event, Rc::new(handler))
}

fn attach_listener(node: &Node, event: &str, handler: EventHandler) -> Result<ListenerId> {
    if event.is_empty() {
        return Err(ReactiveError::InvalidBindingKey {
            key: event.to_string(),
        });
    }
    let id = node.add_event_listener(event, handler);
    let node = node.clone();
    on_cleanup(move || {
        node.remove_event_listener(id);
    });
    Ok(id)
}
