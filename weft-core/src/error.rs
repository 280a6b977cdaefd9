//! Error types for the reactive core.
//!
//! Only contract violations surface as errors. Recoverable conditions
//! (bad list keys, a failing match case) are absorbed by the component
//! that hit them and show up as a degraded rendering instead.

use thiserror::Error;

/// Errors raised by the reactive core and the binding layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A computed value read itself, directly or through other computeds.
    #[error("cycle detected: computed {id} read itself while evaluating")]
    Cycle { id: u64 },

    /// A computed value was read after its owning scope was disposed.
    #[error("computed {id} was read after it was disposed")]
    Disposed { id: u64 },

    /// An event binding (`@name`) received something other than a handler.
    #[error("binding `{key}` expects an event handler")]
    ExpectedHandler { key: String },

    /// A handler was passed to an attribute or property position.
    #[error("binding `{key}` does not accept an event handler")]
    UnexpectedHandler { key: String },

    /// The binding key is empty or consists of a bare prefix.
    #[error("invalid binding key `{key}`")]
    InvalidBindingKey { key: String },

    /// An element-only operation was applied to a text or comment node.
    #[error("operation requires an element node")]
    NotAnElement,

    /// Inserting the node would make it its own ancestor.
    #[error("a node cannot be inserted into itself or its descendants")]
    InvalidHierarchy,

    /// The reference node passed to `insert_before` is not a child.
    #[error("reference node is not a child of the parent")]
    NotAChild,

    /// A render function panicked.
    #[error("render function panicked: {message}")]
    RenderPanicked { message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Extract a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(err) = payload.downcast_ref::<ReactiveError>() {
        err.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_str_and_string() {
        let a: Box<dyn std::any::Any + Send> = Box::new("boom");
        let b: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn std::any::Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(a.as_ref()), "boom");
        assert_eq!(panic_message(b.as_ref()), "bang");
        assert_eq!(panic_message(c.as_ref()), "unknown panic payload");
    }

    #[test]
    fn errors_render_their_key() {
        let err = ReactiveError::ExpectedHandler { key: "@click".into() };
        assert_eq!(err.to_string(), "binding `@click` expects an event handler");
    }
}
