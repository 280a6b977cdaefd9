//! Static-or-dynamic values.

use std::fmt;
use std::rc::Rc;

use crate::dom::AttrValue;
use crate::reactive::{Memo, ReadSignal, Signal};

/// A value at the binding boundary: either fixed, or read through a tracked
/// accessor.
///
/// Binding code matches on the variant instead of probing the value.
pub enum MaybeReactive<T: 'static> {
    Static(T),
    Dynamic(Rc<dyn Fn() -> T>),
}

impl<T: 'static> MaybeReactive<T> {
    /// Wrap an accessor. Reads inside `f` are tracked by the binding effect.
    pub fn dynamic(f: impl Fn() -> T + 'static) -> Self {
        MaybeReactive::Dynamic(Rc::new(f))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, MaybeReactive::Dynamic(_))
    }

    /// Convert the produced value, keeping the variant.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> MaybeReactive<U>
    where
        T: Clone,
    {
        match self {
            MaybeReactive::Static(value) => MaybeReactive::Static(f(value)),
            MaybeReactive::Dynamic(get) => MaybeReactive::Dynamic(Rc::new(move || f(get()))),
        }
    }
}

impl<T: Clone + 'static> MaybeReactive<T> {
    /// Read the current value. Dynamic values are tracked.
    pub fn get(&self) -> T {
        match self {
            MaybeReactive::Static(value) => value.clone(),
            MaybeReactive::Dynamic(get) => get(),
        }
    }
}

impl<T: 'static> Clone for MaybeReactive<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            MaybeReactive::Static(value) => MaybeReactive::Static(value.clone()),
            MaybeReactive::Dynamic(get) => MaybeReactive::Dynamic(Rc::clone(get)),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for MaybeReactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeReactive::Static(value) => f.debug_tuple("Static").field(value).finish(),
            MaybeReactive::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<T: 'static> From<T> for MaybeReactive<T> {
    fn from(value: T) -> Self {
        MaybeReactive::Static(value)
    }
}

impl<T: Clone + 'static> From<Signal<T>> for MaybeReactive<T> {
    fn from(signal: Signal<T>) -> Self {
        MaybeReactive::dynamic(move || signal.get())
    }
}

impl<T: Clone + 'static> From<ReadSignal<T>> for MaybeReactive<T> {
    fn from(signal: ReadSignal<T>) -> Self {
        MaybeReactive::dynamic(move || signal.get())
    }
}

impl<T: Clone + 'static> From<Memo<T>> for MaybeReactive<T> {
    fn from(memo: Memo<T>) -> Self {
        MaybeReactive::dynamic(move || memo.get())
    }
}

/// Anything that can feed an attribute or property binding.
///
/// Plain values bind once. Signals, memos and closures bind through an
/// effect and re-apply whenever what they read changes.
pub trait IntoBindingValue {
    fn into_binding_value(self) -> MaybeReactive<AttrValue>;
}

macro_rules! static_binding_value {
    ($($ty:ty),*) => {
        $(
            impl IntoBindingValue for $ty {
                fn into_binding_value(self) -> MaybeReactive<AttrValue> {
                    MaybeReactive::Static(self.into())
                }
            }
        )*
    };
}

static_binding_value!(AttrValue, &str, String, bool, i32, i64, u32, u64, usize, f32, f64);

impl<T: Into<AttrValue>> IntoBindingValue for Option<T> {
    fn into_binding_value(self) -> MaybeReactive<AttrValue> {
        MaybeReactive::Static(self.into())
    }
}

impl<F, V> IntoBindingValue for F
where
    F: Fn() -> V + 'static,
    V: Into<AttrValue>,
{
    fn into_binding_value(self) -> MaybeReactive<AttrValue> {
        MaybeReactive::dynamic(move || self().into())
    }
}

impl<T: Into<AttrValue> + Clone + 'static> IntoBindingValue for Signal<T> {
    fn into_binding_value(self) -> MaybeReactive<AttrValue> {
        MaybeReactive::dynamic(move || self.get().into())
    }
}

impl<T: Into<AttrValue> + Clone + 'static> IntoBindingValue for ReadSignal<T> {
    fn into_binding_value(self) -> MaybeReactive<AttrValue> {
        MaybeReactive::dynamic(move || self.get().into())
    }
}

impl<T: Into<AttrValue> + Clone + 'static> IntoBindingValue for Memo<T> {
    fn into_binding_value(self) -> MaybeReactive<AttrValue> {
        MaybeReactive::dynamic(move || self.get().into())
    }
}

impl<T: Into<AttrValue> + Clone + 'static> IntoBindingValue for MaybeReactive<T> {
    fn into_binding_value(self) -> MaybeReactive<AttrValue> {
        self.map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_dynamic_read_the_same_way() {
        let fixed: MaybeReactive<i32> = 3.into();
        assert!(!fixed.is_dynamic());
        assert_eq!(fixed.get(), 3);

        let signal = Signal::new(4);
        let live: MaybeReactive<i32> = signal.clone().into();
        assert!(live.is_dynamic());
        signal.set(9);
        assert_eq!(live.get(), 9);
    }

    #[test]
    fn map_keeps_the_variant() {
        let signal = Signal::new(2);
        let doubled = MaybeReactive::<i32>::from(signal.clone()).map(|v| v * 2);
        signal.set(5);
        assert_eq!(doubled.get(), 10);

        let fixed = MaybeReactive::Static("a").map(str::len);
        assert!(!fixed.is_dynamic());
        assert_eq!(fixed.get(), 1);
    }
}
