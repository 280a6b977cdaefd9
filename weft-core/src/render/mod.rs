//! Renderers
//!
//! Structural renderers own a `display: contents` container and keep its
//! children in sync with reactive state:
//!
//! - [`reconcile_list`] / [`reconcile_keyed_list`] render a sequence.
//! - [`if_render`] / [`if_else_render`] switch on truthiness.
//! - [`match_render`] switches on a stringified value.
//!
//! Each container is self-managed. Its renderer effect lives in a scope
//! attached to the container, owned by whatever owner was current when the
//! renderer was created. Generic child clearing leaves these containers to
//! that owner.

mod conditional;
mod list;

pub use conditional::{if_else_render, if_render, match_render, Cases};
pub use list::{reconcile_keyed_list, reconcile_list, IntoItems, ListKey};

use crate::config::with_config;
use crate::dom::Node;
use crate::error::Result;
use crate::reactive::Scope;

/// An element that takes part in no layout of its own.
pub(crate) fn contents_container() -> Result<Node> {
    let node = Node::element(&with_config(|c| c.container_tag.clone()));
    node.set_attribute("style", "display: contents")?;
    Ok(node)
}

/// Create a self-managed container and run `setup` inside the container's
/// scope.
pub(crate) fn managed_container(setup: impl FnOnce(&Node)) -> Result<Node> {
    let container = contents_container()?;
    container.mark_self_managed();

    let scope = Scope::new();
    container.attach_scope(scope);
    scope.run(|| setup(&container));
    Ok(container)
}
