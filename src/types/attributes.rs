use std::collections::HashMap;

use super::Value;

/// Free-form extension attributes keyed by dot-separated paths.
///
/// Supports nested paths like `"promo.code"`. This is the escape hatch for
/// condition fields that are not one of the well-known product, customer or
/// quantity paths.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    data: HashMap<String, AttributeValue>,
}

#[derive(Debug, Clone)]
enum AttributeValue {
    Leaf(Value),
    Nested(HashMap<String, AttributeValue>),
}

impl Attributes {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dot-separated path. Creates intermediate nested maps as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a value at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::insert_recursive(&mut self.data, &segments, value);
    }

    /// Look up a value by dot-separated path.
    /// Returns `None` if the path does not exist or points to a nested map.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::get_recursive(&self.data, &segments)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn insert_recursive(map: &mut HashMap<String, AttributeValue>, segments: &[&str], value: Value) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_owned(), AttributeValue::Leaf(value));
            }
            [first, rest @ ..] => {
                let entry = map
                    .entry((*first).to_owned())
                    .or_insert_with(|| AttributeValue::Nested(HashMap::new()));
                match entry {
                    AttributeValue::Nested(nested) => {
                        Self::insert_recursive(nested, rest, value);
                    }
                    AttributeValue::Leaf(_) => {
                        let mut nested = HashMap::new();
                        Self::insert_recursive(&mut nested, rest, value);
                        *entry = AttributeValue::Nested(nested);
                    }
                }
            }
        }
    }

    fn get_recursive<'a>(
        map: &'a HashMap<String, AttributeValue>,
        segments: &[&str],
    ) -> Option<&'a Value> {
        match segments {
            [] => None,
            [last] => match map.get(*last)? {
                AttributeValue::Leaf(v) => Some(v),
                AttributeValue::Nested(_) => None,
            },
            [first, rest @ ..] => match map.get(*first)? {
                AttributeValue::Nested(nested) => Self::get_recursive(nested, rest),
                AttributeValue::Leaf(_) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_simple() {
        let attrs = Attributes::new().set("channel", "web");
        assert_eq!(attrs.get("channel"), Some(&Value::String("web".to_owned())));
    }

    #[test]
    fn set_and_get_nested() {
        let attrs = Attributes::new().set("promo.code", "SPRING");
        assert_eq!(attrs.get("promo.code"), Some(&Value::from("SPRING")));
    }

    #[test]
    fn get_missing_returns_none() {
        let attrs = Attributes::new().set("promo.code", "SPRING");
        assert_eq!(attrs.get("promo.name"), None);
        assert_eq!(attrs.get("nonexistent"), None);
    }

    #[test]
    fn get_intermediate_path_returns_none() {
        let attrs = Attributes::new().set("promo.code", "SPRING");
        assert_eq!(attrs.get("promo"), None);
    }

    #[test]
    fn overwrite_leaf_with_nested() {
        let attrs = Attributes::new()
            .set("promo", "legacy")
            .set("promo.code", "SPRING");
        assert_eq!(attrs.get("promo.code"), Some(&Value::from("SPRING")));
        assert_eq!(attrs.get("promo"), None);
    }

    #[test]
    fn overwrite_value() {
        let attrs = Attributes::new().set("store_id", 1_i64).set("store_id", 2_i64);
        assert_eq!(attrs.get("store_id"), Some(&Value::Int(2)));
    }

    #[test]
    fn insert_mutable_ref() {
        let mut attrs = Attributes::new();
        assert!(attrs.is_empty());
        attrs.insert("first_order", Value::Bool(true));
        assert_eq!(attrs.get("first_order"), Some(&Value::Bool(true)));
        assert!(!attrs.is_empty());
    }
}
