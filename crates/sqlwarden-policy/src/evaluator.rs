//! Access policy evaluation.
//!
//! `AccessPolicy::access_for` computes the capability bitmask for an entity
//! type or instance:
//!
//! 1. Seed mode on the session grants Insert unconditionally.
//! 2. An instance reporting its own level wins (dynamic, can vary per row).
//! 3. Otherwise the per-type default applies: the OR of all access
//!    annotations on the type, or the session's configured default when the
//!    type carries none. Only annotation-derived results are cached; a
//!    session default is re-read on every lookup.

use std::collections::HashMap;
use std::sync::Mutex;

use sqlwarden_core::{
    AccessLevel, ChangeEntry, Error, ModelRegistry, Record, Result, SaveOperation,
};

use crate::session::SessionContext;

/// Whether a pending change may proceed, and what to do when it may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    /// The operation is covered by the granted level.
    Permitted,
    /// A disallowed insert: the entry is detached from the save.
    DropInsert,
    /// A disallowed update or delete: the entry is reverted to store
    /// values.
    RevertChange,
}

/// Computes access levels for entity types and instances.
pub struct AccessPolicy {
    /// Annotation-derived per-type levels, cached for the policy's
    /// lifetime.
    type_cache: Mutex<HashMap<String, AccessLevel>>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessPolicy {
    /// Create a policy evaluator with an empty type cache.
    pub fn new() -> Self {
        Self {
            type_cache: Mutex::new(HashMap::new()),
        }
    }

    /// The access level for an entity type.
    ///
    /// OR-combines every access annotation on the type; a type without
    /// annotations gets the session's configured default.
    pub fn access_for_type(
        &self,
        registry: &ModelRegistry,
        entity: &str,
        session: &SessionContext,
    ) -> Result<AccessLevel> {
        if session.seed_mode {
            return Ok(AccessLevel::INSERT);
        }

        if let Some(level) = self
            .type_cache
            .lock()
            .expect("access cache poisoned")
            .get(entity)
        {
            return Ok(*level);
        }

        let meta = registry.entity(entity)?;
        if meta.access_annotations.is_empty() {
            // The session default can differ between sessions sharing this
            // policy; it must never enter the per-type cache.
            return Ok(session.default_access);
        }
        let level = meta
            .access_annotations
            .iter()
            .fold(AccessLevel::READ_ONLY, |acc, a| acc | *a);

        tracing::debug!(entity, level = %level, "Computed type access level");
        self.type_cache
            .lock()
            .expect("access cache poisoned")
            .insert(entity.to_string(), level);
        Ok(level)
    }

    /// The access level for an entity instance.
    ///
    /// An instance reporting its own level bypasses the type-level
    /// computation entirely.
    pub fn access_for(
        &self,
        registry: &ModelRegistry,
        record: &Record,
        session: &SessionContext,
    ) -> Result<AccessLevel> {
        if session.seed_mode {
            return Ok(AccessLevel::INSERT);
        }
        if let Some(level) = record.instance_access() {
            return Ok(level);
        }
        self.access_for_type(registry, record.entity(), session)
    }

    /// Judge a pending change against the granted level.
    ///
    /// In strict mode a denied change raises `PermissionDenied` naming the
    /// operation and entity type, before any SQL executes.
    pub fn judge(
        &self,
        registry: &ModelRegistry,
        entry: &ChangeEntry,
        session: &SessionContext,
    ) -> Result<ChangeVerdict> {
        let Some(operation) = entry.operation() else {
            return Ok(ChangeVerdict::Permitted);
        };

        let level = self.access_for(registry, entry.record(), session)?;
        // FullAccess short-circuits.
        if level == AccessLevel::FULL || level.permits(operation) {
            return Ok(ChangeVerdict::Permitted);
        }

        if session.strict {
            return Err(Error::PermissionDenied {
                operation,
                entity: entry.record().entity().to_string(),
            });
        }

        tracing::info!(
            entity = entry.record().entity(),
            operation = %operation,
            "Change filtered by access policy"
        );
        Ok(match operation {
            SaveOperation::Insert => ChangeVerdict::DropInsert,
            SaveOperation::Update | SaveOperation::Delete => ChangeVerdict::RevertChange,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlwarden_core::{EntityMeta, PropertyMeta};

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(
            EntityMeta::new("Hero", "heroes")
                .property(PropertyMeta::new("Id", "id").primary_key())
                .access(AccessLevel::INSERT)
                .access(AccessLevel::UPDATE),
        );
        registry.register(
            EntityMeta::new("Relic", "relics")
                .property(PropertyMeta::new("Id", "id").primary_key()),
        );
        registry
    }

    #[test]
    fn test_annotations_are_or_combined() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new();
        let level = policy
            .access_for_type(&registry(), "Hero", &session)
            .unwrap();
        assert_eq!(level, AccessLevel::INSERT | AccessLevel::UPDATE);
    }

    #[test]
    fn test_absence_of_annotations_yields_session_default() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new();
        let level = policy
            .access_for_type(&registry(), "Relic", &session)
            .unwrap();
        assert_eq!(level, AccessLevel::READ_ONLY);

        let policy = AccessPolicy::new();
        let session = SessionContext::new().with_default_access(AccessLevel::FULL);
        let level = policy
            .access_for_type(&registry(), "Relic", &session)
            .unwrap();
        assert_eq!(level, AccessLevel::FULL);
    }

    #[test]
    fn test_instance_level_wins_over_type() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new();
        let record = Record::new("Relic").with_access(AccessLevel::DELETE);
        let level = policy.access_for(&registry(), &record, &session).unwrap();
        assert_eq!(level, AccessLevel::DELETE);
    }

    #[test]
    fn test_seed_mode_grants_insert_unconditionally() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new().with_seed_mode();
        let record = Record::new("Relic");
        let level = policy.access_for(&registry(), &record, &session).unwrap();
        assert_eq!(level, AccessLevel::INSERT);
    }

    #[test]
    fn test_strict_mode_raises_permission_denied() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new().with_strict();
        let mut entry = ChangeEntry::from_store(Record::new("Hero").with("Id", 1i64));
        entry.mark_deleted();

        let err = policy.judge(&registry(), &entry, &session).unwrap_err();
        assert!(matches!(
            err,
            Error::PermissionDenied {
                operation: SaveOperation::Delete,
                ..
            }
        ));
    }

    #[test]
    fn test_silent_verdicts() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new();

        let insert = ChangeEntry::added(Record::new("Relic"));
        assert_eq!(
            policy.judge(&registry(), &insert, &session).unwrap(),
            ChangeVerdict::DropInsert
        );

        let mut delete = ChangeEntry::from_store(Record::new("Hero").with("Id", 1i64));
        delete.mark_deleted();
        assert_eq!(
            policy.judge(&registry(), &delete, &session).unwrap(),
            ChangeVerdict::RevertChange
        );
    }

    #[test]
    fn test_type_cache_reuses_computed_level() {
        let policy = AccessPolicy::new();
        let session = SessionContext::new();
        let registry = registry();
        let first = policy.access_for_type(&registry, "Hero", &session).unwrap();
        // Second lookup must hit the cache and agree.
        let second = policy.access_for_type(&registry, "Hero", &session).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unannotated_type_follows_each_sessions_default() {
        // One long-lived policy serving sessions with different configured
        // defaults; the earlier lookup must not stick.
        let policy = AccessPolicy::new();
        let registry = registry();

        let read_only = SessionContext::new();
        assert_eq!(
            policy
                .access_for_type(&registry, "Relic", &read_only)
                .unwrap(),
            AccessLevel::READ_ONLY
        );

        let full = SessionContext::new().with_default_access(AccessLevel::FULL);
        assert_eq!(
            policy.access_for_type(&registry, "Relic", &full).unwrap(),
            AccessLevel::FULL
        );
    }
}
