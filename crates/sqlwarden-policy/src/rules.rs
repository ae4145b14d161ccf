//! Declarative value-mutation rules.
//!
//! Three narrow behavior categories, each a strategy trait:
//!
//! - **Runtime default** — applied only to newly inserted entities, and only
//!   when the current value is the type's zero/default value. An explicitly
//!   set value is preserved.
//! - **Auto-update** — applied to every permitted added-or-modified entity
//!   on every save; unconditionally overwrites the property and marks it
//!   modified.
//! - **String format** — applied to every permitted entity whose string
//!   property is non-blank; normalizes case. No-op for null/empty.
//!
//! Within one save the categories run in this order: defaults →
//! auto-update → format. Format runs last so a property carrying both an
//! auto-update and a format rule always stores its formatted form.

use std::collections::HashMap;
use std::sync::Arc;

use sqlwarden_core::{ChangeEntry, Value};

use crate::session::SessionContext;

/// Supplies a value for an unset property of a newly inserted entity.
pub trait DefaultValueProvider: Send + Sync {
    /// Compute the default. Only called when the current value is unset.
    fn provide(&self, entry: &ChangeEntry, current: &Value, session: &SessionContext) -> Value;
}

/// Recomputes a property value on every save of an added or modified
/// entity.
pub trait AutoUpdateProvider: Send + Sync {
    /// Compute the fresh value.
    fn compute(&self, entry: &ChangeEntry, session: &SessionContext) -> Value;
}

/// Normalizes a non-empty string property.
pub trait StringFormat: Send + Sync {
    /// Produce the stored form.
    fn apply(&self, input: &str) -> String;
}

// ============================================================================
// Built-in strategies
// ============================================================================

/// Runtime default: today's date.
pub struct TodayDefault;

impl DefaultValueProvider for TodayDefault {
    fn provide(&self, _entry: &ChangeEntry, _current: &Value, session: &SessionContext) -> Value {
        Value::Date(session.today_days())
    }
}

/// Runtime default: the current timestamp.
pub struct NowDefault;

impl DefaultValueProvider for NowDefault {
    fn provide(&self, _entry: &ChangeEntry, _current: &Value, session: &SessionContext) -> Value {
        Value::Timestamp(session.now_micros())
    }
}

/// Runtime default: the current user identity.
pub struct CurrentUserDefault;

impl DefaultValueProvider for CurrentUserDefault {
    fn provide(&self, _entry: &ChangeEntry, _current: &Value, session: &SessionContext) -> Value {
        match &session.user {
            Some(user) => Value::Text(user.clone()),
            None => Value::Null,
        }
    }
}

/// Auto-update: the current timestamp, refreshed on every save.
pub struct NowOnSave;

impl AutoUpdateProvider for NowOnSave {
    fn compute(&self, _entry: &ChangeEntry, session: &SessionContext) -> Value {
        Value::Timestamp(session.now_micros())
    }
}

/// Auto-update: the current user identity, stamped on every save.
pub struct CurrentUserOnSave;

impl AutoUpdateProvider for CurrentUserOnSave {
    fn compute(&self, _entry: &ChangeEntry, session: &SessionContext) -> Value {
        match &session.user {
            Some(user) => Value::Text(user.clone()),
            None => Value::Null,
        }
    }
}

/// String format: upper case.
pub struct Uppercase;

impl StringFormat for Uppercase {
    fn apply(&self, input: &str) -> String {
        input.to_uppercase()
    }
}

/// String format: lower case.
pub struct Lowercase;

impl StringFormat for Lowercase {
    fn apply(&self, input: &str) -> String {
        input.to_lowercase()
    }
}

// ============================================================================
// Registry
// ============================================================================

type RuleKey = (String, String);

/// Typed registration table mapping (entity, property) to rule strategies.
#[derive(Default)]
pub struct RuleRegistry {
    defaults: HashMap<RuleKey, Arc<dyn DefaultValueProvider>>,
    auto_updates: HashMap<RuleKey, Arc<dyn AutoUpdateProvider>>,
    formats: HashMap<RuleKey, Arc<dyn StringFormat>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runtime-default rule.
    pub fn default_value(
        mut self,
        entity: impl Into<String>,
        property: impl Into<String>,
        provider: Arc<dyn DefaultValueProvider>,
    ) -> Self {
        self.defaults
            .insert((entity.into(), property.into()), provider);
        self
    }

    /// Register an auto-update rule.
    pub fn auto_update(
        mut self,
        entity: impl Into<String>,
        property: impl Into<String>,
        provider: Arc<dyn AutoUpdateProvider>,
    ) -> Self {
        self.auto_updates
            .insert((entity.into(), property.into()), provider);
        self
    }

    /// Register a string-format rule.
    pub fn string_format(
        mut self,
        entity: impl Into<String>,
        property: impl Into<String>,
        format: Arc<dyn StringFormat>,
    ) -> Self {
        self.formats
            .insert((entity.into(), property.into()), format);
        self
    }

    /// Apply runtime defaults to a newly inserted entry.
    pub fn apply_defaults(&self, entry: &mut ChangeEntry, session: &SessionContext) {
        for ((entity, property), provider) in &self.defaults {
            if entity != entry.record().entity() {
                continue;
            }
            let current = entry.current(property);
            if !current.is_unset() {
                continue;
            }
            let value = provider.provide(entry, &current, session);
            tracing::trace!(entity = %entity, property = %property, "Applying runtime default");
            entry.set_current(property.clone(), value);
        }
    }

    /// Apply auto-update rules to an added or modified entry, overwriting
    /// unconditionally and marking the property modified.
    pub fn apply_auto_updates(&self, entry: &mut ChangeEntry, session: &SessionContext) {
        for ((entity, property), provider) in &self.auto_updates {
            if entity != entry.record().entity() {
                continue;
            }
            let value = provider.compute(entry, session);
            tracing::trace!(entity = %entity, property = %property, "Applying auto-update value");
            entry.set_current(property.clone(), value);
        }
    }

    /// Apply string-format rules to any permitted entry. Null and blank
    /// strings are left untouched.
    pub fn apply_formats(&self, entry: &mut ChangeEntry) {
        for ((entity, property), format) in &self.formats {
            if entity != entry.record().entity() {
                continue;
            }
            let current = entry.current(property);
            let Some(text) = current.as_str() else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let formatted = format.apply(text);
            if formatted != text {
                entry.set_current(property.clone(), Value::Text(formatted));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlwarden_core::Record;

    fn fixed_session() -> SessionContext {
        SessionContext::new()
            .with_user("tester")
            .with_clock(|| 10 * 86_400_000_000 + 123)
    }

    #[test]
    fn test_default_applies_only_when_unset() {
        let registry = RuleRegistry::new().default_value("Hero", "Created", Arc::new(TodayDefault));
        let session = fixed_session();

        let mut unset = ChangeEntry::added(Record::new("Hero"));
        registry.apply_defaults(&mut unset, &session);
        assert_eq!(unset.current("Created"), Value::Date(10));

        let mut set = ChangeEntry::added(Record::new("Hero").with("Created", Value::Date(5)));
        registry.apply_defaults(&mut set, &session);
        assert_eq!(set.current("Created"), Value::Date(5));
    }

    #[test]
    fn test_auto_update_overwrites_unconditionally() {
        let registry = RuleRegistry::new().auto_update("Hero", "Touched", Arc::new(NowOnSave));
        let session = fixed_session();

        let rec = Record::new("Hero").with("Touched", Value::Timestamp(1));
        let mut entry = ChangeEntry::from_store(rec);
        registry.apply_auto_updates(&mut entry, &session);

        assert_eq!(
            entry.current("Touched"),
            Value::Timestamp(10 * 86_400_000_000 + 123)
        );
        assert!(entry.modified_properties().contains("Touched"));
    }

    #[test]
    fn test_current_user_stamp() {
        let registry =
            RuleRegistry::new().auto_update("Hero", "ChangedBy", Arc::new(CurrentUserOnSave));
        let mut entry = ChangeEntry::added(Record::new("Hero"));
        registry.apply_auto_updates(&mut entry, &fixed_session());
        assert_eq!(
            entry.current("ChangedBy"),
            Value::Text("tester".to_string())
        );
    }

    #[test]
    fn test_format_skips_null_and_empty() {
        let registry = RuleRegistry::new().string_format("Hero", "Code", Arc::new(Uppercase));

        let mut empty = ChangeEntry::added(Record::new("Hero").with("Code", ""));
        registry.apply_formats(&mut empty);
        assert_eq!(empty.current("Code"), Value::Text(String::new()));

        let mut null = ChangeEntry::added(Record::new("Hero"));
        registry.apply_formats(&mut null);
        assert_eq!(null.current("Code"), Value::Null);

        let mut set = ChangeEntry::added(Record::new("Hero").with("Code", "abc"));
        registry.apply_formats(&mut set);
        assert_eq!(set.current("Code"), Value::Text("ABC".to_string()));
    }

    #[test]
    fn test_lowercase_format() {
        let registry = RuleRegistry::new().string_format("Hero", "Email", Arc::new(Lowercase));
        let mut entry = ChangeEntry::added(Record::new("Hero").with("Email", "A@B.COM"));
        registry.apply_formats(&mut entry);
        assert_eq!(entry.current("Email"), Value::Text("a@b.com".to_string()));
    }
}
