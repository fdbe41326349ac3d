//! Open-ended attribute bags (cell styles and change sets)
//!
//! An [`Attributes`] bag maps string keys to scalars or nested bags. Bags are
//! merged structurally: nested bags merge key by key, anything else is
//! overwritten by the incoming value.

use std::collections::BTreeMap;

/// A value inside an attribute bag
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(Attributes),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<Attributes> for AttrValue {
    fn from(m: Attributes) -> Self {
        AttrValue::Map(m)
    }
}

/// A recursively mergeable, key-ordered attribute map
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    ///
    /// ```
    /// use cellbook_core::Attributes;
    ///
    /// let style = Attributes::new()
    ///     .with("font", Attributes::new().with("bold", true));
    /// assert_eq!(style.get_path(&["font", "bold"]).and_then(|v| v.as_bool()), Some(true));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// Follow a chain of nested keys
    pub fn get_path(&self, path: &[&str]) -> Option<&AttrValue> {
        let (last, parents) = path.split_last()?;
        let mut bag = self;
        for key in parents {
            bag = bag.get(key)?.as_map()?;
        }
        bag.get(last)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deep-merge `other` into `self`
    ///
    /// Keys holding a bag on both sides are merged recursively; every other
    /// incoming value replaces what was there.
    pub fn merge(&mut self, other: &Attributes) {
        for (key, incoming) in &other.0 {
            match (self.0.get_mut(key), incoming) {
                (Some(AttrValue::Map(existing)), AttrValue::Map(nested)) => {
                    existing.merge(nested);
                }
                _ => {
                    self.0.insert(key.clone(), incoming.clone());
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn border(style: &str) -> Attributes {
        Attributes::new().with("style", style)
    }

    #[test]
    fn test_merge_recurses_into_shared_maps() {
        let mut style = Attributes::new()
            .with("font", Attributes::new().with("bold", true).with("sz", 11.0))
            .with("border", Attributes::new().with("top", border("thin")));

        let changes = Attributes::new()
            .with("font", Attributes::new().with("sz", 14.0))
            .with("border", Attributes::new().with("bottom", border("thick")));

        style.merge(&changes);

        let expected = Attributes::new()
            .with("font", Attributes::new().with("bold", true).with("sz", 14.0))
            .with(
                "border",
                Attributes::new()
                    .with("bottom", border("thick"))
                    .with("top", border("thin")),
            );
        assert_eq!(style, expected);
    }

    #[test]
    fn test_merge_overwrites_leaves_and_mismatched_kinds() {
        let mut style = Attributes::new()
            .with("fill", "none")
            .with("font", Attributes::new().with("bold", true));

        style.merge(
            &Attributes::new()
                .with("fill", Attributes::new().with("fgColor", "FF0000"))
                .with("font", false),
        );

        assert_eq!(style.get_path(&["fill", "fgColor"]).and_then(|v| v.as_str()), Some("FF0000"));
        assert_eq!(style.get("font"), Some(&AttrValue::Bool(false)));
    }

    #[test]
    fn test_merge_is_idempotent_for_same_changes() {
        let changes = Attributes::new().with("alignment", Attributes::new().with("horizontal", "center"));
        let mut once = Attributes::new();
        once.merge(&changes);
        let mut twice = once.clone();
        twice.merge(&changes);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_get_path_misses() {
        let style = Attributes::new().with("font", "Arial");
        assert!(style.get_path(&["font", "name"]).is_none());
        assert!(style.get_path(&[]).is_none());
    }
}
