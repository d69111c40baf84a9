//! Tri-state payload field.
//!
//! Payload fields may be missing, explicitly `null`, or carry a value, and
//! each state means something different to update and filter operations.
//! `Field<T>` keeps the three states apart instead of folding them into
//! `Option<T>`.
//!
//! Deserialize with `#[serde(default)]` on the containing struct so missing
//! keys become `Field::Absent`.

use serde::{Deserialize, Deserializer};

/// A payload value that is absent, explicitly null, or present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Key not present in the payload.
    Absent,
    /// Key present with an explicit `null`.
    Null,
    /// Key present with a value.
    Value(T),
}

impl<T> Field<T> {
    /// Collapses absent and null into `None`.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }

    /// Returns `None` when absent, `Some(None)` for null and `Some(Some(v))`
    /// for a value.
    pub fn into_patch(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}

#[cfg(test)]
mod tests {
    use super::Field;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Probe {
        email: Field<String>,
    }

    #[test]
    fn missing_key_is_absent() {
        let probe: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(probe.email, Field::Absent);
    }

    #[test]
    fn explicit_null_is_null() {
        let probe: Probe = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert_eq!(probe.email, Field::Null);
    }

    #[test]
    fn value_is_value() {
        let probe: Probe = serde_json::from_str(r#"{"email": "a@b.co"}"#).unwrap();
        assert_eq!(probe.email, Field::Value("a@b.co".to_string()));
    }

    #[test]
    fn into_patch_distinguishes_all_states() {
        assert_eq!(Field::<i32>::Absent.into_patch(), None);
        assert_eq!(Field::<i32>::Null.into_patch(), Some(None));
        assert_eq!(Field::Value(3).into_patch(), Some(Some(3)));
    }
}
