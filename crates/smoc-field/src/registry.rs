//! Field Registry: the ordered set of editable order fields in the view.
//!
//! Order is document/visual order as supplied by the view. The controller
//! only ever reads it, to find "the field right after the one just updated";
//! membership changes come from the view when rows are added or removed.
//!
//! # Thread-safety
//! `FieldRegistry` is not internally synchronized. The controller shares it
//! with the view as `Arc<RwLock<FieldRegistry>>`.

use std::fmt;

/// Identifier of one rendered order control (e.g. `"smoc-42"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey(pub String);

impl FieldKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Raw attributes the view rendered for a field.
///
/// Kept unvalidated: the controller validates them on first interaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldAttrs {
    /// Record identifier exactly as rendered.
    pub record_id: Option<String>,
    /// Per-field anti-forgery token.
    pub auth_token: Option<String>,
    /// Initially displayed order value.
    pub value: String,
}

impl FieldAttrs {
    pub fn new(record_id: impl Into<String>, auth_token: impl Into<String>, value: i64) -> Self {
        Self {
            record_id: Some(record_id.into()),
            auth_token: Some(auth_token.into()),
            value: value.to_string(),
        }
    }
}

/// One registry entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredField {
    pub key: FieldKey,
    pub attrs: FieldAttrs,
}

/// Ordered sequence of the fields present in the current view.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<RegisteredField>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry in the given order.
    pub fn from_fields<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (FieldKey, FieldAttrs)>,
    {
        let mut reg = Self::new();
        for (key, attrs) in items {
            reg.register(key, attrs);
        }
        reg
    }

    /// Append a field at the end of the view order.
    ///
    /// Registering a key that is already present replaces its attributes in
    /// place; its position does not change.
    pub fn register(&mut self, key: FieldKey, attrs: FieldAttrs) {
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(existing) => existing.attrs = attrs,
            None => self.fields.push(RegisteredField { key, attrs }),
        }
    }

    /// Drop a field that left the view. Unknown keys are ignored.
    pub fn deregister(&mut self, key: &FieldKey) -> Option<RegisteredField> {
        let pos = self.index_of(key)?;
        Some(self.fields.remove(pos))
    }

    /// Position of `key` among all registered fields.
    pub fn index_of(&self, key: &FieldKey) -> Option<usize> {
        self.fields.iter().position(|f| &f.key == key)
    }

    /// Field at `position`, or `None` when out of range.
    pub fn field_at(&self, position: usize) -> Option<&RegisteredField> {
        self.fields.get(position)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&RegisteredField> {
        self.fields.iter().find(|f| &f.key == key)
    }

    /// The field immediately following `key`, if any.
    pub fn next_after(&self, key: &FieldKey) -> Option<&RegisteredField> {
        let pos = self.index_of(key)?;
        self.field_at(pos + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> FieldRegistry {
        FieldRegistry::from_fields([
            (FieldKey::new("smoc-10"), FieldAttrs::new("10", "n1", 1)),
            (FieldKey::new("smoc-11"), FieldAttrs::new("11", "n2", 2)),
            (FieldKey::new("smoc-12"), FieldAttrs::new("12", "n3", 3)),
        ])
    }

    #[test]
    fn index_and_position_lookup() {
        let reg = three();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.index_of(&"smoc-11".into()), Some(1));
        assert_eq!(reg.field_at(2).unwrap().key.as_str(), "smoc-12");
        assert!(reg.field_at(3).is_none());
        assert!(reg.index_of(&"smoc-99".into()).is_none());
    }

    #[test]
    fn next_after_last_is_none() {
        let reg = three();
        assert_eq!(
            reg.next_after(&"smoc-10".into()).unwrap().key.as_str(),
            "smoc-11"
        );
        assert!(reg.next_after(&"smoc-12".into()).is_none());
        assert!(reg.next_after(&"unknown".into()).is_none());
    }

    #[test]
    fn re_register_keeps_position() {
        let mut reg = three();
        reg.register(FieldKey::new("smoc-10"), FieldAttrs::new("10", "n1", 9));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.index_of(&"smoc-10".into()), Some(0));
        assert_eq!(reg.get(&"smoc-10".into()).unwrap().attrs.value, "9");
    }

    #[test]
    fn deregister_shifts_following_fields() {
        let mut reg = three();
        assert!(reg.deregister(&"smoc-11".into()).is_some());
        assert!(reg.deregister(&"smoc-11".into()).is_none());
        assert_eq!(
            reg.next_after(&"smoc-10".into()).unwrap().key.as_str(),
            "smoc-12"
        );
    }
}
