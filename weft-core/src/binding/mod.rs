//! DOM Binding Layer
//!
//! Translates values into attribute, property, event and child bindings on
//! concrete nodes. Static values are applied once; dynamic values are
//! wrapped in an effect that re-applies them whenever a dependency changes.
//!
//! Every binding effect belongs to the owner active when the binding was
//! made, so disposing a component's scope releases all of its bindings.

mod attribute;
mod child;
mod reactive;
mod template;

pub use attribute::{bind, bind_attribute, bind_event, bind_property, Binding, BindingKind};
pub use child::{bind_child, flatten, Child};
pub use reactive::{IntoBindingValue, MaybeReactive};
pub use template::{element, ElementBuilder};
