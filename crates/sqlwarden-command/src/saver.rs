//! The stock `SaveDelegate` over direct commands.
//!
//! `DirectSaver` applies a change set with one cached `DirectCommandBuilder`
//! per entity type, in delete / insert / update phase order. Zero-affected
//! updates and removals on token-carrying entities surface as
//! `ConcurrencyConflict`.

use std::collections::HashMap;
use std::sync::Arc;

use sqlwarden_core::{
    ChangeEntry, ChangeSet, Connection, EntryState, Error, ModelRegistry, Result, SaveDelegate,
    SaveOperation, TxHandle,
};
use sqlwarden_dialect::DialectKnowledge;

use crate::builder::{CommandConfig, DirectCommandBuilder};

/// Applies pending changes through hand-built DML commands.
///
/// Builders are created lazily on the first change for an entity type and
/// cached for the saver's lifetime, so command text is synthesized once per
/// (entity, operation) pair no matter how many entities flow through.
pub struct DirectSaver {
    registry: Arc<ModelRegistry>,
    dialect: Arc<DialectKnowledge>,
    configs: HashMap<String, CommandConfig>,
    builders: HashMap<String, DirectCommandBuilder>,
}

impl DirectSaver {
    /// Create a saver over the registry with default per-entity command
    /// configuration.
    pub fn new(registry: Arc<ModelRegistry>, dialect: Arc<DialectKnowledge>) -> Self {
        Self {
            registry,
            dialect,
            configs: HashMap::new(),
            builders: HashMap::new(),
        }
    }

    /// Override the command configuration for one entity type (property
    /// subsets, soft delete). Must be set before the first save touching
    /// that entity; a cached builder is not rebuilt.
    pub fn configure(mut self, entity: impl Into<String>, config: CommandConfig) -> Self {
        self.configs.insert(entity.into(), config);
        self
    }

    fn builder_for(&mut self, entity: &str) -> Result<&mut DirectCommandBuilder> {
        if !self.builders.contains_key(entity) {
            let meta = self.registry.entity(entity)?;
            let config = self.configs.get(entity).cloned().unwrap_or_default();
            let builder = DirectCommandBuilder::new(meta, Arc::clone(&self.dialect), config)?;
            self.builders.insert(entity.to_string(), builder);
        }
        Ok(self
            .builders
            .get_mut(entity)
            .expect("builder inserted above"))
    }

    fn apply_removal(
        &mut self,
        entry: &ChangeEntry,
        conn: &mut dyn Connection,
        tx: Option<TxHandle>,
    ) -> Result<u64> {
        let entity = entry.record().entity().to_string();
        let builder = self.builder_for(&entity)?;
        let tokens = builder.has_concurrency_tokens();
        let any_affected = builder.remove(conn, entry, tx)?;
        if !any_affected && tokens {
            return Err(Error::ConcurrencyConflict {
                operation: SaveOperation::Delete,
                entity,
            });
        }
        Ok(u64::from(any_affected))
    }

    fn apply_update(
        &mut self,
        entry: &ChangeEntry,
        conn: &mut dyn Connection,
        tx: Option<TxHandle>,
    ) -> Result<u64> {
        let entity = entry.record().entity().to_string();
        let builder = self.builder_for(&entity)?;
        let tokens = builder.has_concurrency_tokens();
        let any_affected = builder.update(conn, entry, tx)?;
        if !any_affected && tokens {
            return Err(Error::ConcurrencyConflict {
                operation: SaveOperation::Update,
                entity,
            });
        }
        Ok(u64::from(any_affected))
    }

    fn apply_insert(
        &mut self,
        entry: &mut ChangeEntry,
        conn: &mut dyn Connection,
        tx: Option<TxHandle>,
    ) -> Result<u64> {
        let entity = entry.record().entity().to_string();
        let builder = self.builder_for(&entity)?;
        builder.insert(conn, entry.record_mut(), tx)
    }
}

impl SaveDelegate for DirectSaver {
    /// Apply the change set: removals first (freeing unique slots), then
    /// inserts (assigning generated keys), then updates.
    #[tracing::instrument(level = "debug", skip_all, fields(pending = changes.pending_count()))]
    fn save(&mut self, changes: &mut ChangeSet, conn: &mut dyn Connection) -> Result<u64> {
        let mut affected = 0;

        for entry in changes.entries() {
            if entry.state() == EntryState::Deleted {
                affected += self.apply_removal(entry, conn, None)?;
            }
        }
        for entry in changes.entries_mut() {
            if entry.state() == EntryState::Added {
                affected += self.apply_insert(entry, conn, None)?;
            }
        }
        for entry in changes.entries() {
            if entry.state() == EntryState::Modified {
                affected += self.apply_update(entry, conn, None)?;
            }
        }

        tracing::debug!(affected, "Applied change set");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RemoveStrategy;
    use sqlwarden_core::{
        ConnectionState, EntityMeta, Param, PropertyMeta, Record, Value,
    };
    use sqlwarden_dialect::knowledge;

    fn registry() -> Arc<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        registry.register(
            EntityMeta::new("Hero", "heroes")
                .property(
                    PropertyMeta::new("Id", "id")
                        .column_type("BIGINT")
                        .primary_key()
                        .auto_generated(),
                )
                .property(PropertyMeta::new("Name", "name").column_type("VARCHAR(100)"))
                .property(
                    PropertyMeta::new("Version", "version")
                        .column_type("BIGINT")
                        .concurrency_token(),
                ),
        );
        registry.register(
            EntityMeta::new("Sidekick", "sidekicks")
                .property(PropertyMeta::new("Id", "id").column_type("BIGINT").primary_key())
                .property(PropertyMeta::new("Name", "name").column_type("VARCHAR(100)"))
                .property(PropertyMeta::new("Retired", "retired").column_type("BIT")),
        );
        Arc::new(registry)
    }

    struct TraceConnection {
        affected: u64,
        executed: Vec<(String, Vec<Param>)>,
    }

    impl TraceConnection {
        fn new(affected: u64) -> Self {
            Self {
                affected,
                executed: Vec::new(),
            }
        }

        fn statements(&self) -> Vec<&str> {
            self.executed.iter().map(|(sql, _)| sql.as_str()).collect()
        }
    }

    impl Connection for TraceConnection {
        fn provider_name(&self) -> &str {
            "sqlserver"
        }

        fn state(&self) -> ConnectionState {
            ConnectionState::Open
        }

        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) {}

        fn begin_transaction(&mut self) -> Result<TxHandle> {
            Ok(TxHandle(1))
        }

        fn commit(&mut self, _tx: TxHandle) -> Result<()> {
            Ok(())
        }

        fn rollback(&mut self, _tx: TxHandle) -> Result<()> {
            Ok(())
        }

        fn execute(&mut self, sql: &str, params: &[Param], _tx: Option<TxHandle>) -> Result<u64> {
            self.executed.push((sql.to_string(), params.to_vec()));
            Ok(self.affected)
        }

        fn query_scalar(
            &mut self,
            sql: &str,
            params: &[Param],
            _tx: Option<TxHandle>,
        ) -> Result<Option<Value>> {
            self.executed.push((sql.to_string(), params.to_vec()));
            Ok(Some(Value::BigInt(99)))
        }
    }

    fn saver() -> DirectSaver {
        DirectSaver::new(registry(), Arc::new(knowledge::sqlserver()))
    }

    #[test]
    fn test_deletes_run_before_inserts_and_updates() {
        let mut changes = ChangeSet::new();

        let mut modified = ChangeEntry::from_store(
            Record::new("Hero")
                .with("Id", Value::BigInt(1))
                .with("Name", "Alice")
                .with("Version", Value::BigInt(3)),
        );
        modified.set_current("Name", Value::Text("Alicia".to_string()));
        changes.push(modified);

        changes.push(ChangeEntry::added(Record::new("Hero").with("Name", "Bob")));

        let mut deleted = ChangeEntry::from_store(
            Record::new("Hero")
                .with("Id", Value::BigInt(2))
                .with("Version", Value::BigInt(1)),
        );
        deleted.mark_deleted();
        changes.push(deleted);

        let mut conn = TraceConnection::new(1);
        saver().save(&mut changes, &mut conn).unwrap();

        let statements = conn.statements();
        assert!(statements[0].starts_with("DELETE FROM [heroes]"));
        assert!(statements[1].starts_with("INSERT INTO [heroes]"));
        // Generated-key fetch follows the insert.
        assert_eq!(statements[2], "SELECT SCOPE_IDENTITY()");
        assert!(statements[3].starts_with("UPDATE [heroes]"));
    }

    #[test]
    fn test_insert_writes_generated_key_back() {
        let mut changes = ChangeSet::new();
        changes.push(ChangeEntry::added(Record::new("Hero").with("Name", "Bob")));

        let mut conn = TraceConnection::new(1);
        saver().save(&mut changes, &mut conn).unwrap();

        assert_eq!(
            changes.entries()[0].record().get("Id"),
            Some(&Value::BigInt(99))
        );
    }

    #[test]
    fn test_zero_affected_update_with_token_is_conflict() {
        let mut changes = ChangeSet::new();
        let mut entry = ChangeEntry::from_store(
            Record::new("Hero")
                .with("Id", Value::BigInt(1))
                .with("Name", "Alice")
                .with("Version", Value::BigInt(3)),
        );
        entry.set_current("Name", Value::Text("Alicia".to_string()));
        changes.push(entry);

        let mut conn = TraceConnection::new(0);
        let err = saver().save(&mut changes, &mut conn).unwrap_err();
        assert!(matches!(
            err,
            Error::ConcurrencyConflict {
                operation: SaveOperation::Update,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_affected_delete_without_token_is_not_conflict() {
        let mut changes = ChangeSet::new();
        let mut entry =
            ChangeEntry::from_store(Record::new("Sidekick").with("Id", Value::BigInt(5)));
        entry.mark_deleted();
        changes.push(entry);

        let mut conn = TraceConnection::new(0);
        let affected = saver().save(&mut changes, &mut conn).unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn test_soft_delete_config_applies() {
        let mut s = saver().configure(
            "Sidekick",
            CommandConfig {
                remove: RemoveStrategy::SoftDelete(vec!["Retired".to_string()]),
                ..CommandConfig::default()
            },
        );

        let mut changes = ChangeSet::new();
        let mut entry = ChangeEntry::from_store(
            Record::new("Sidekick")
                .with("Id", Value::BigInt(5))
                .with("Retired", Value::Bool(false)),
        );
        entry.set_current("Retired", Value::Bool(true));
        entry.mark_deleted();
        changes.push(entry);

        let mut conn = TraceConnection::new(1);
        s.save(&mut changes, &mut conn).unwrap();

        assert_eq!(
            conn.statements()[0],
            "UPDATE [sidekicks] SET [retired] = @p0 WHERE [id] = @p1"
        );
    }

    #[test]
    fn test_unknown_entity_raises_not_mapped() {
        let mut changes = ChangeSet::new();
        changes.push(ChangeEntry::added(Record::new("Ghost")));

        let mut conn = TraceConnection::new(1);
        let err = saver().save(&mut changes, &mut conn).unwrap_err();
        assert!(matches!(err, Error::EntityNotMapped { .. }));
    }
}
