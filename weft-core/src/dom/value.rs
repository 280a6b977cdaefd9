//! Attribute and property values.

use std::fmt;

/// A value assigned to an attribute or a property.
///
/// Attributes follow the boolean convention: `Null` and `Bool(false)`
/// remove the attribute, `Bool(true)` sets it present and empty, anything
/// else is stringified.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// The attribute text for this value, or `None` if the attribute should
    /// be absent.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            AttrValue::Null | AttrValue::Bool(false) => None,
            AttrValue::Bool(true) => Some(String::new()),
            AttrValue::Number(n) => Some(n.to_string()),
            AttrValue::Text(s) => Some(s.clone()),
        }
    }

    /// Stringify the value the way a DOM property setter would.
    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Null => String::new(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Number(n) => n.to_string(),
            AttrValue::Text(s) => s.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Truthiness in the DOM sense: null, false, zero, NaN and the empty
    /// string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Number(n) => *n != 0.0 && !n.is_nan(),
            AttrValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::Text(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

macro_rules! number_into_attr {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from(value: $ty) -> Self {
                    AttrValue::Number(value as f64)
                }
            }
        )*
    };
}

number_into_attr!(i32, i64, u32, u64, usize, f32, f64);

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_attribute_convention() {
        assert_eq!(AttrValue::Null.to_attribute(), None);
        assert_eq!(AttrValue::from(false).to_attribute(), None);
        assert_eq!(AttrValue::from(true).to_attribute(), Some(String::new()));
        assert_eq!(AttrValue::from("x").to_attribute(), Some("x".into()));
        assert_eq!(AttrValue::from(3).to_attribute(), Some("3".into()));
        assert_eq!(AttrValue::from(1.5).to_attribute(), Some("1.5".into()));
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(AttrValue::from(None::<&str>), AttrValue::Null);
        assert_eq!(AttrValue::from(Some("a")), AttrValue::Text("a".into()));
    }

    #[test]
    fn truthiness() {
        assert!(!AttrValue::Null.is_truthy());
        assert!(!AttrValue::from(0).is_truthy());
        assert!(!AttrValue::from("").is_truthy());
        assert!(AttrValue::from("0").is_truthy());
        assert!(AttrValue::from(true).is_truthy());
    }
}
