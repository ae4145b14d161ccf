//! Runtime entity instances.
//!
//! `Record` is the dynamic representation of a mapped entity row: the entity
//! name plus current property values. It stands in for whatever concrete
//! object the host ORM tracks, and can carry a per-instance access level
//! that overrides the type-level policy row by row.

use std::collections::HashMap;

use crate::access::AccessLevel;
use crate::value::Value;

/// A dynamic entity instance.
///
/// # Example
///
/// ```
/// use sqlwarden_core::entity::Record;
/// use sqlwarden_core::value::Value;
///
/// let mut hero = Record::new("Hero");
/// hero.set("Name", Value::Text("Alice".to_string()));
///
/// assert_eq!(hero.get("Name").and_then(|v| v.as_str()), Some("Alice"));
/// assert!(hero.get("Age").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Record {
    /// The mapped entity type name.
    entity: String,
    /// Current values by property name.
    values: HashMap<String, Value>,
    /// Per-instance access override, when the instance reports its own level.
    instance_access: Option<AccessLevel>,
}

impl Record {
    /// Create an empty record for the given entity type.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: HashMap::new(),
            instance_access: None,
        }
    }

    /// Attach a per-instance access level.
    ///
    /// Instances carrying a level are evaluated dynamically and can vary
    /// per row, taking precedence over type-level annotations.
    pub fn with_access(mut self, level: AccessLevel) -> Self {
        self.instance_access = Some(level);
        self
    }

    /// Set a property value, builder style.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(property, value.into());
        self
    }

    /// The entity type name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The per-instance access level, if the instance reports one.
    pub fn instance_access(&self) -> Option<AccessLevel> {
        self.instance_access
    }

    /// Set a property value.
    pub fn set(&mut self, property: impl Into<String>, value: Value) {
        self.values.insert(property.into(), value);
    }

    /// Get a property value.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Get a property value, or NULL when absent.
    pub fn get_or_null(&self, property: &str) -> Value {
        self.values.get(property).cloned().unwrap_or(Value::Null)
    }

    /// Whether a value is present for the property.
    pub fn has(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }

    /// All current (property, value) pairs.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Replace all current values. Used when reverting to store values.
    pub fn replace_values(&mut self, values: HashMap<String, Value>) {
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_basic() {
        let rec = Record::new("Hero")
            .with("Id", Value::BigInt(1))
            .with("Name", "Alice");

        assert_eq!(rec.entity(), "Hero");
        assert_eq!(rec.get("Id"), Some(&Value::BigInt(1)));
        assert_eq!(rec.get_or_null("Missing"), Value::Null);
        assert!(rec.instance_access().is_none());
    }

    #[test]
    fn test_instance_access_override() {
        let rec = Record::new("Hero").with_access(AccessLevel::INSERT | AccessLevel::UPDATE);
        assert_eq!(
            rec.instance_access(),
            Some(AccessLevel::INSERT | AccessLevel::UPDATE)
        );
    }
}
