//! Conditional and match renderers.

use std::fmt::{self, Display};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{trace, warn};

use super::managed_container;
use crate::binding::Child;
use crate::config::with_config;
use crate::dom::{AttrValue, Node};
use crate::error::{panic_message, ReactiveError, Result};
use crate::reactive::{Effect, Scope};

type Branch = Rc<dyn Fn() -> Node>;

/// Render `then` while `condition` is truthy. The container is empty
/// otherwise.
pub fn if_render<V>(
    condition: impl Fn() -> V + 'static,
    then: impl Fn() -> Node + 'static,
) -> Result<Node>
where
    V: Into<AttrValue>,
{
    conditional(condition, Rc::new(then), None)
}

/// Render `then` or `otherwise` depending on the truthiness of `condition`.
///
/// ```rust
/// use weft_core::dom::Node;
/// use weft_core::reactive::Signal;
/// use weft_core::render::if_else_render;
///
/// let logged_in = Signal::new(false);
/// let l = logged_in.clone();
/// let view = if_else_render(
///     move || l.get(),
///     || Node::text("Welcome back"),
///     || Node::text("Sign in"),
/// )
/// .unwrap();
/// assert_eq!(view.text_content(), "Sign in");
///
/// logged_in.set(true);
/// assert_eq!(view.text_content(), "Welcome back");
/// ```
pub fn if_else_render<V>(
    condition: impl Fn() -> V + 'static,
    then: impl Fn() -> Node + 'static,
    otherwise: impl Fn() -> Node + 'static,
) -> Result<Node>
where
    V: Into<AttrValue>,
{
    let otherwise: Branch = Rc::new(otherwise);
    conditional(condition, Rc::new(then), Some(otherwise))
}

fn conditional<V>(
    condition: impl Fn() -> V + 'static,
    then: Branch,
    otherwise: Option<Branch>,
) -> Result<Node>
where
    V: Into<AttrValue>,
{
    managed_container(|container| {
        let container = container.clone();
        // The previous branch scope is owned by the effect and disposed
        // before each run.
        Effect::new(move || {
            let truthy = condition().into().is_truthy();
            container.detach_children();

            let branch = if truthy { Some(&then) } else { otherwise.as_ref() };
            let Some(branch) = branch else {
                trace!("no branch for condition; leaving slot empty");
                return;
            };
            if let Some(node) = Scope::new().run(|| branch()) {
                if let Err(err) = container.append_child(&node) {
                    warn!(error = %err, "conditional branch could not be attached");
                }
            }
        });
    })
}

/// Render functions keyed by the string form of a value.
#[derive(Default, Clone)]
pub struct Cases {
    arms: IndexMap<String, Rc<dyn Fn() -> Child>>,
    fallback: Option<Rc<dyn Fn() -> Child>>,
}

impl Cases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `f` when the matched value stringifies to `key`.
    pub fn case<C: Into<Child>>(mut self, key: impl Display, f: impl Fn() -> C + 'static) -> Self {
        self.arms.insert(key.to_string(), Rc::new(move || f().into()));
        self
    }

    /// Render `f` when no case matches.
    pub fn fallback<C: Into<Child>>(mut self, f: impl Fn() -> C + 'static) -> Self {
        self.fallback = Some(Rc::new(move || f().into()));
        self
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    fn select(&self, key: &str) -> Option<&Rc<dyn Fn() -> Child>> {
        self.arms.get(key).or(self.fallback.as_ref())
    }
}

impl fmt::Debug for Cases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cases")
            .field("keys", &self.arms.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Render the case matching the string form of `value`.
///
/// A case that panics, or that produces something other than a single
/// node, is replaced by a visible marker element carrying the configured
/// fallback text. The renderer keeps reacting afterwards.
///
/// ```rust
/// use weft_core::dom::Node;
/// use weft_core::reactive::Signal;
/// use weft_core::render::{match_render, Cases};
///
/// let tab = Signal::new("home");
/// let t = tab.clone();
/// let view = match_render(
///     move || t.get(),
///     Cases::new()
///         .case("home", || Node::text("Home"))
///         .case("about", || Node::text("About"))
///         .fallback(|| Node::text("Not found")),
/// )
/// .unwrap();
/// assert_eq!(view.text_content(), "Home");
///
/// tab.set("missing");
/// assert_eq!(view.text_content(), "Not found");
/// ```
pub fn match_render<V>(value: impl Fn() -> V + 'static, cases: Cases) -> Result<Node>
where
    V: Display,
{
    managed_container(|container| {
        let container = container.clone();
        Effect::new(move || {
            let key = value().to_string();
            container.detach_children();

            let Some(render) = cases.select(&key) else {
                trace!(case = %key, "no case matched and no fallback; leaving slot empty");
                return;
            };

            let scope = Scope::new();
            let outcome = scope.run(|| panic::catch_unwind(AssertUnwindSafe(|| render())));
            let node = match outcome {
                None => return,
                Some(Ok(Child::Node(node))) => Ok(node),
                Some(Ok(other)) => {
                    warn!(case = %key, produced = ?other, "match case did not render a node");
                    scope.dispose();
                    fallback_marker(&key)
                }
                Some(Err(payload)) => {
                    let err = ReactiveError::RenderPanicked {
                        message: panic_message(payload.as_ref()),
                    };
                    warn!(case = %key, error = %err, "match case failed");
                    scope.dispose();
                    fallback_marker(&key)
                }
            };
            if let Err(err) = node.and_then(|node| container.append_child(&node)) {
                warn!(case = %key, error = %err, "match case could not be attached");
            }
        });
    })
}

fn fallback_marker(case: &str) -> Result<Node> {
    let marker = Node::element("span");
    marker.set_attribute("data-render-error", case)?;
    marker.set_text(with_config(|c| c.fallback_marker.clone()))?;
    Ok(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::reactive::{on_cleanup, Signal};
    use std::cell::{Cell, RefCell};

    #[test]
    fn toggling_swaps_the_single_child() {
        let on = Signal::new(true);
        let o = on.clone();
        let view = if_else_render(move || o.get(), || Node::text("yes"), || Node::text("no")).unwrap();
        let yes = view.first_child().unwrap();

        on.set(false);
        assert_eq!(view.child_count(), 1);
        assert_eq!(view.text_content(), "no");
        assert!(yes.parent().is_none());
    }

    #[test]
    fn missing_else_leaves_the_slot_empty() {
        let count = Signal::new(0);
        let c = count.clone();
        let view = if_render(move || c.get(), || Node::text("some")).unwrap();
        assert_eq!(view.child_count(), 0);

        count.set(3);
        assert_eq!(view.text_content(), "some");

        count.set(0);
        assert_eq!(view.child_count(), 0);
    }

    #[test]
    fn old_branch_is_disposed_before_the_new_one_renders() {
        let on = Signal::new(true);
        let log = Rc::new(RefCell::new(Vec::new()));

        let (o, l1, l2) = (on.clone(), log.clone(), log.clone());
        let _view = if_else_render(
            move || o.get(),
            move || {
                let l = l1.clone();
                l.borrow_mut().push("render then");
                on_cleanup(move || l.borrow_mut().push("dispose then"));
                Node::text("then")
            },
            move || {
                l2.borrow_mut().push("render else");
                Node::text("else")
            },
        )
        .unwrap();

        on.set(false);
        assert_eq!(*log.borrow(), ["render then", "dispose then", "render else"]);
    }

    #[test]
    fn branch_reads_are_untracked() {
        let on = Signal::new(true);
        let label = Signal::new("a");
        let renders = Rc::new(Cell::new(0));

        let (o, l, r) = (on.clone(), label.clone(), renders.clone());
        let view = if_render(move || o.get(), move || {
            r.set(r.get() + 1);
            Node::text(l.get())
        })
        .unwrap();

        label.set("b");
        assert_eq!(renders.get(), 1);
        assert_eq!(view.text_content(), "a");
    }

    #[test]
    fn match_selects_by_string_form() {
        let n = Signal::new(1);
        let v = n.clone();
        let view = match_render(
            move || v.get(),
            Cases::new().case(1, || Node::text("one")).case(2, || Node::text("two")),
        )
        .unwrap();
        assert_eq!(view.text_content(), "one");

        n.set(2);
        assert_eq!(view.text_content(), "two");

        n.set(3);
        assert_eq!(view.child_count(), 0);
    }

    #[test]
    fn failing_case_renders_a_marker_and_recovers() {
        let state = Signal::new("broken");
        let s = state.clone();
        let view = match_render(
            move || s.get(),
            Cases::new()
                .case("broken", || -> Node { panic!("boom") })
                .case("text", || "not a node")
                .case("ok", || Node::text("fine")),
        )
        .unwrap();
        assert_eq!(view.child_count(), 1);
        let marker = view.first_child().unwrap();
        assert_eq!(marker.get_attribute("data-render-error").as_deref(), Some("broken"));
        assert_eq!(marker.text_content(), "[render error]");

        state.set("text");
        assert_eq!(view.first_child().unwrap().text_content(), "[render error]");

        state.set("ok");
        assert_eq!(view.text_content(), "fine");
    }

    #[test]
    fn marker_text_comes_from_config() {
        crate::config::configure(RuntimeConfig::default().with_fallback_marker("oops"));
        let view = match_render(|| "x", Cases::new().case("x", || Child::Empty)).unwrap();

        let marker = view.first_child().unwrap();
        assert_eq!(marker.tag(), Some("span"));
        assert_eq!(marker.text_content(), "oops");
        crate::config::configure(RuntimeConfig::default());
    }

    #[test]
    fn unmatched_value_renders_fallback_until_a_case_matches() {
        let status = Signal::new("pending");
        let s = status.clone();
        let view = match_render(
            move || s.get(),
            Cases::new()
                .case("success", || Node::text("done"))
                .fallback(|| Node::text("waiting")),
        )
        .unwrap();
        assert_eq!(view.child_count(), 1);
        assert_eq!(view.text_content(), "waiting");

        status.set("success");
        assert_eq!(view.child_count(), 1);
        assert_eq!(view.text_content(), "done");
    }
}
