//! Element construction from creation instructions.
//!
//! A template compiler hands over a tag, a list of keyed bindings and a list
//! of (possibly nested) children. [`element`] turns that into a live node:
//! bindings are applied through the key classifier, children are flattened
//! and appended, and a `<select>` value is applied last, once its options
//! exist.

use tracing::warn;

use super::attribute::{bind, Binding};
use super::child::{bind_child, flatten, Child};
use super::reactive::{IntoBindingValue, MaybeReactive};
use crate::dom::{AttrValue, Event, Node};
use crate::error::{ReactiveError, Result};
use crate::reactive::Effect;

/// Build an element from its tag, keyed bindings and children.
///
/// ```rust
/// use weft_core::binding::{element, Binding, Child};
///
/// let node = element(
///     "a",
///     [("href", Binding::value("/home"))],
///     [Child::from("Home")],
/// )
/// .unwrap();
/// assert_eq!(node.to_html(), r#"<a href="/home">Home</a>"#);
/// ```
pub fn element<'a>(
    tag: &str,
    props: impl IntoIterator<Item = (&'a str, Binding)>,
    children: impl IntoIterator<Item = Child>,
) -> Result<Node> {
    let node = Node::element(tag);
    let is_select = node.tag() == Some("select");
    let mut select_value = None;

    for (key, binding) in props {
        if is_select && matches!(key, "value" | ".value") {
            match binding {
                Binding::Value(value) => select_value = Some(value),
                Binding::Handler(_) => {
                    return Err(ReactiveError::UnexpectedHandler {
                        key: key.to_string(),
                    })
                }
            }
            continue;
        }
        bind(&node, key, binding)?;
    }

    for child in flatten(children) {
        bind_child(&node, child)?;
    }

    if let Some(value) = select_value {
        bind_select_value(&node, value);
    }
    Ok(node)
}

// Options have to be in place before the value can select one of them.
fn bind_select_value(select: &Node, value: MaybeReactive<AttrValue>) {
    let select = select.clone();
    Effect::new(move || {
        if let Err(err) = select.set_property("value", value.get()) {
            warn!(error = %err, "select value binding failed");
        }
    });
}

/// Incremental form of [`element`].
///
/// ```rust
/// use weft_core::binding::ElementBuilder;
/// use weft_core::reactive::Signal;
///
/// let label = Signal::new(String::from("Save"));
/// let button = ElementBuilder::new("button")
///     .attr("type", "submit")
///     .child(label.clone())
///     .build()
///     .unwrap();
///
/// label.set("Saved".into());
/// assert_eq!(button.text_content(), "Saved");
/// ```
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    props: Vec<(String, Binding)>,
    children: Vec<Child>,
}

impl ElementBuilder {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Bind an attribute, or a property when `key` starts with `.`.
    pub fn attr(mut self, key: impl Into<String>, value: impl IntoBindingValue) -> Self {
        self.props.push((key.into(), Binding::value(value)));
        self
    }

    pub fn prop(mut self, name: &str, value: impl IntoBindingValue) -> Self {
        self.props.push((format!(".{name}"), Binding::value(value)));
        self
    }

    pub fn on(mut self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.props.push((format!("@{event}"), Binding::handler(handler)));
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<C: Into<Child>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Node> {
        element(
            &self.tag,
            self.props.iter().map(|(key, binding)| (key.as_str(), binding.clone())),
            self.children,
        )
    }
}
