//! The direct command builder.

use std::sync::Arc;

use sqlwarden_core::{
    Accessor, ChangeEntry, Connection, EntityMeta, Error, Param, PropertySetViolation, Record,
    Result, ScopedOpen, SqlType, TxHandle, Value,
};
use sqlwarden_dialect::DialectKnowledge;

/// The operation kinds a builder generates commands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// INSERT of a new row.
    Insert,
    /// UPDATE of an existing row.
    Update,
    /// Removal — a hard DELETE or a soft-delete UPDATE per strategy.
    Remove,
}

/// How removal is carried out, chosen once per entity type at builder
/// construction.
#[derive(Debug, Clone, Default)]
pub enum RemoveStrategy {
    /// `DELETE FROM <table> WHERE <key-and-token-predicate>`.
    #[default]
    HardDelete,
    /// UPDATE the named properties instead of deleting (hide pattern).
    SoftDelete(Vec<String>),
}

/// Per-entity configuration for the builder.
#[derive(Debug, Clone, Default)]
pub struct CommandConfig {
    /// Property subset used for INSERT. Defaults to the update set.
    pub insert_properties: Option<Vec<String>>,
    /// Property subset used for UPDATE SET. Defaults to all non-key
    /// properties with an accessor.
    pub update_properties: Option<Vec<String>>,
    /// Removal strategy.
    pub remove: RemoveStrategy,
}

/// Where a bound parameter's value comes from at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamSource {
    /// The entity's current value, via the property accessor.
    Current,
    /// The tracked original value. Concurrency-token predicates always
    /// bind this, never the current value.
    Original,
}

struct BoundParam {
    name: String,
    property: String,
    native_type: Option<SqlType>,
    source: ParamSource,
    accessor: Option<Accessor>,
}

impl std::fmt::Debug for BoundParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundParam")
            .field("name", &self.name)
            .field("property", &self.property)
            .field("native_type", &self.native_type)
            .field("source", &self.source)
            .field("accessor", &self.accessor.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A generated command: SQL text plus the ordered value-extraction plan.
///
/// Once built for an operation kind the text is reused verbatim for every
/// subsequent entity of the type — schema-derived SQL must not depend on
/// instance data.
#[derive(Debug)]
pub struct GeneratedCommand {
    text: String,
    params: Vec<BoundParam>,
}

impl GeneratedCommand {
    /// The cached SQL text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The native parameter types in bind order (`None` = driver default).
    pub fn param_types(&self) -> Vec<Option<SqlType>> {
        self.params.iter().map(|p| p.native_type).collect()
    }

    /// Bind parameter values for a record (insert path: no originals).
    fn bind_record(&self, record: &Record) -> Vec<Param> {
        self.params
            .iter()
            .map(|p| {
                let value = match &p.accessor {
                    Some(accessor) => accessor(record),
                    None => Value::Null,
                };
                (p.name.clone(), value)
            })
            .collect()
    }

    /// Bind parameter values for a tracked entry (update/remove path).
    fn bind_entry(&self, entry: &ChangeEntry) -> Vec<Param> {
        self.params
            .iter()
            .map(|p| {
                let value = match p.source {
                    ParamSource::Current => match &p.accessor {
                        Some(accessor) => accessor(entry.record()),
                        None => Value::Null,
                    },
                    ParamSource::Original => entry.original(&p.property),
                };
                (p.name.clone(), value)
            })
            .collect()
    }
}

/// Builds and caches one parameterized command per operation kind for a
/// single entity type.
///
/// A builder instance is single-threaded per use; its cached commands live
/// until the builder is dropped.
pub struct DirectCommandBuilder {
    meta: Arc<EntityMeta>,
    dialect: Arc<DialectKnowledge>,
    config: CommandConfig,
    insert: Option<GeneratedCommand>,
    update: Option<GeneratedCommand>,
    remove: Option<GeneratedCommand>,
}

impl DirectCommandBuilder {
    /// Create a builder for the entity.
    ///
    /// Validates the metadata invariants (table name, primary key, column
    /// names) and any configured property subsets up front — these are
    /// fatal configuration errors, not runtime skips.
    pub fn new(
        meta: Arc<EntityMeta>,
        dialect: Arc<DialectKnowledge>,
        config: CommandConfig,
    ) -> Result<Self> {
        meta.validate()?;
        let builder = Self {
            meta,
            dialect,
            config,
            insert: None,
            update: None,
            remove: None,
        };
        if let Some(props) = &builder.config.insert_properties {
            let names: Vec<&str> = props.iter().map(String::as_str).collect();
            builder.validate_properties(&names, true)?;
        }
        if let Some(props) = &builder.config.update_properties {
            let names: Vec<&str> = props.iter().map(String::as_str).collect();
            builder.validate_properties(&names, false)?;
        }
        if let RemoveStrategy::SoftDelete(props) = &builder.config.remove {
            let names: Vec<&str> = props.iter().map(String::as_str).collect();
            builder.validate_properties(&names, false)?;
        }
        Ok(builder)
    }

    /// The entity this builder serves.
    pub fn entity(&self) -> &str {
        &self.meta.name
    }

    /// Whether the entity carries optimistic-concurrency tokens.
    pub fn has_concurrency_tokens(&self) -> bool {
        !self.meta.concurrency_tokens().is_empty()
    }

    /// Reject property sets that name unmapped members or (unless allowed)
    /// key members. Every offending member is named at once, not just the
    /// first.
    pub fn validate_properties(&self, members: &[&str], allow_key_props: bool) -> Result<()> {
        let unmapped: Vec<String> = members
            .iter()
            .filter(|m| self.meta.find_property(m).is_none())
            .map(|m| (*m).to_string())
            .collect();
        if !unmapped.is_empty() {
            return Err(Error::InvalidProperties {
                entity: self.meta.name.clone(),
                violation: PropertySetViolation::NotMapped,
                members: unmapped,
            });
        }

        if !allow_key_props {
            let keys: Vec<String> = members
                .iter()
                .filter(|m| {
                    self.meta
                        .find_property(m)
                        .is_some_and(|p| p.primary_key)
                })
                .map(|m| (*m).to_string())
                .collect();
            if !keys.is_empty() {
                return Err(Error::InvalidProperties {
                    entity: self.meta.name.clone(),
                    violation: PropertySetViolation::KeyNotAllowed,
                    members: keys,
                });
            }
        }

        Ok(())
    }

    // ========================================================================
    // Command synthesis
    // ========================================================================

    /// The default update set: all non-key properties with an accessor.
    fn default_update_set(&self) -> Vec<String> {
        self.meta
            .properties
            .iter()
            .filter(|p| !p.primary_key && p.has_accessor() && !p.auto_generated)
            .map(|p| p.name.clone())
            .collect()
    }

    fn update_set(&self) -> Vec<String> {
        self.config
            .update_properties
            .clone()
            .unwrap_or_else(|| self.default_update_set())
    }

    fn insert_set(&self) -> Vec<String> {
        self.config
            .insert_properties
            .clone()
            .unwrap_or_else(|| self.update_set())
    }

    fn bound_param(
        &self,
        index: usize,
        property: &str,
        source: ParamSource,
    ) -> Result<BoundParam> {
        let prop = self.meta.require_property(property)?;
        // A property lacking any accessor is a fatal configuration error.
        let accessor = prop.require_accessor(&self.meta.name)?.clone();
        Ok(BoundParam {
            name: format!("@p{index}"),
            property: property.to_string(),
            native_type: prop.native_type(),
            source,
            accessor: Some(accessor),
        })
    }

    /// Original-value parameter for key/token predicates. Originals come
    /// from the tracker, so no accessor is required.
    fn original_param(&self, index: usize, property: &str) -> Result<BoundParam> {
        let prop = self.meta.require_property(property)?;
        Ok(BoundParam {
            name: format!("@p{index}"),
            property: property.to_string(),
            native_type: prop.native_type(),
            source: ParamSource::Original,
            accessor: None,
        })
    }

    fn build_insert(&self) -> Result<GeneratedCommand> {
        let table = self.dialect.quote(self.meta.require_table()?);
        let mut columns = Vec::new();
        let mut params = Vec::new();

        // Non-auto-generated key properties come first.
        let mut properties: Vec<String> = self
            .meta
            .key_properties()
            .iter()
            .filter(|p| !p.auto_generated)
            .map(|p| p.name.clone())
            .collect();
        for p in self.insert_set() {
            if !properties.contains(&p) {
                properties.push(p);
            }
        }

        for property in &properties {
            let prop = self.meta.require_property(property)?;
            columns.push(self.dialect.quote(&prop.column_name));
            params.push(self.bound_param(params.len(), property, ParamSource::Current)?);
        }

        let placeholders: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        let text = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        tracing::debug!(entity = %self.meta.name, sql = %text, "Built insert command");
        Ok(GeneratedCommand { text, params })
    }

    /// WHERE predicate shared by update and remove: key equality AND
    /// concurrency-token equality against ORIGINAL tracked values.
    fn where_predicate(
        &self,
        params: &mut Vec<BoundParam>,
    ) -> Result<String> {
        let mut predicates = Vec::new();
        for key in self.meta.key_properties() {
            let param = self.bound_param(params.len(), &key.name, ParamSource::Current)?;
            predicates.push(format!(
                "{} = {}",
                self.dialect.quote(&key.column_name),
                param.name
            ));
            params.push(param);
        }
        for token in self.meta.concurrency_tokens() {
            let param = self.original_param(params.len(), &token.name)?;
            predicates.push(format!(
                "{} = {}",
                self.dialect.quote(&token.column_name),
                param.name
            ));
            params.push(param);
        }
        Ok(predicates.join(" AND "))
    }

    fn build_set_update(&self, set_properties: &[String]) -> Result<GeneratedCommand> {
        let table = self.dialect.quote(self.meta.require_table()?);
        let mut params = Vec::new();
        let mut assignments = Vec::new();

        for property in set_properties {
            let prop = self.meta.require_property(property)?;
            if prop.primary_key {
                // Keys never appear in the SET clause.
                continue;
            }
            let param = self.bound_param(params.len(), property, ParamSource::Current)?;
            assignments.push(format!(
                "{} = {}",
                self.dialect.quote(&prop.column_name),
                param.name
            ));
            params.push(param);
        }

        let predicate = self.where_predicate(&mut params)?;
        let text = format!(
            "UPDATE {table} SET {} WHERE {}",
            assignments.join(", "),
            predicate
        );
        tracing::debug!(entity = %self.meta.name, sql = %text, "Built update command");
        Ok(GeneratedCommand { text, params })
    }

    fn build_remove(&self) -> Result<GeneratedCommand> {
        match &self.config.remove {
            // Soft delete is the same SET/WHERE construction as update.
            RemoveStrategy::SoftDelete(props) => self.build_set_update(props),
            RemoveStrategy::HardDelete => {
                let table = self.dialect.quote(self.meta.require_table()?);
                let mut params = Vec::new();
                let predicate = self.where_predicate(&mut params)?;
                let text = format!("DELETE FROM {table} WHERE {predicate}");
                tracing::debug!(entity = %self.meta.name, sql = %text, "Built remove command");
                Ok(GeneratedCommand { text, params })
            }
        }
    }

    /// The cached command for an operation kind, building it on first use.
    pub fn command(&mut self, kind: CommandKind) -> Result<&GeneratedCommand> {
        let needs_build = match kind {
            CommandKind::Insert => self.insert.is_none(),
            CommandKind::Update => self.update.is_none(),
            CommandKind::Remove => self.remove.is_none(),
        };
        if needs_build {
            let built = match kind {
                CommandKind::Insert => self.build_insert()?,
                CommandKind::Update => {
                    let set = self.update_set();
                    self.build_set_update(&set)?
                }
                CommandKind::Remove => self.build_remove()?,
            };
            match kind {
                CommandKind::Insert => self.insert = Some(built),
                CommandKind::Update => self.update = Some(built),
                CommandKind::Remove => self.remove = Some(built),
            }
        }
        Ok(match kind {
            CommandKind::Insert => self.insert.as_ref().expect("insert command built above"),
            CommandKind::Update => self.update.as_ref().expect("update command built above"),
            CommandKind::Remove => self.remove.as_ref().expect("remove command built above"),
        })
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn run(
        conn: &mut dyn Connection,
        sql: &str,
        params: &[Param],
        tx: Option<TxHandle>,
    ) -> Result<u64> {
        let mut guard = ScopedOpen::acquire(conn)?;
        match guard.conn().execute(sql, params, tx) {
            Ok(affected) => Ok(affected),
            Err(e) => {
                // Log the failing SQL, then re-throw unchanged.
                tracing::error!(sql = %sql, error = %e, "Direct command failed");
                Err(e)
            }
        }
    }

    /// Execute the INSERT for a record.
    ///
    /// When the key is a single auto-generated integral column, the
    /// dialect's last-inserted-id query runs afterwards and the result is
    /// assigned back onto the record, widened to the declared key type. The
    /// id query is session-scoped on every supported engine, so both
    /// statements run under one connection scope. A missing or zero id is
    /// treated as insert failure.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = self.meta.name.as_str()))]
    pub fn insert(
        &mut self,
        conn: &mut dyn Connection,
        record: &mut Record,
        tx: Option<TxHandle>,
    ) -> Result<u64> {
        let (sql, params) = {
            let command = self.command(CommandKind::Insert)?;
            (command.text.clone(), command.bind_record(record))
        };
        let auto_key = {
            let keys = self.meta.key_properties();
            match keys.as_slice() {
                [key] if key.auto_generated => Some(((*key).name.clone(), key.native_type())),
                _ => None,
            }
        };

        let mut guard = ScopedOpen::acquire(conn)?;
        let affected = match guard.conn().execute(&sql, &params, tx) {
            Ok(affected) => affected,
            Err(e) => {
                // Log the failing SQL, then re-throw unchanged.
                tracing::error!(sql = %sql, error = %e, "Direct command failed");
                return Err(e);
            }
        };

        if let Some((key_name, key_type)) = auto_key {
            if let Some(id_sql) = self.dialect.last_insert_id_sql.clone() {
                // Must run in the session the INSERT ran in, hence the
                // shared guard.
                let returned = guard.conn().query_scalar(&id_sql, &[], tx)?;

                let id = returned.filter(|v| !v.is_unset()).ok_or_else(|| {
                    Error::InsertFailed {
                        entity: self.meta.name.clone(),
                    }
                })?;
                let assigned = match key_type {
                    Some(ty) => id.widen_to(ty).ok_or_else(|| Error::InvalidGeneratedKey {
                        entity: self.meta.name.clone(),
                        property: key_name.clone(),
                    })?,
                    None => id,
                };
                record.set(key_name, assigned);
            }
        }
        Ok(affected)
    }

    /// Execute the UPDATE for a tracked entry.
    ///
    /// Returns true iff the affected row count is greater than zero; a
    /// false result on a token-carrying entity means the row was updated or
    /// deleted by someone else first.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = self.meta.name.as_str()))]
    pub fn update(
        &mut self,
        conn: &mut dyn Connection,
        entry: &ChangeEntry,
        tx: Option<TxHandle>,
    ) -> Result<bool> {
        let (sql, params) = {
            let command = self.command(CommandKind::Update)?;
            (command.text.clone(), command.bind_entry(entry))
        };
        let affected = Self::run(conn, &sql, &params, tx)?;
        Ok(affected > 0)
    }

    /// Execute the removal (hard delete or soft-delete update) for a
    /// tracked entry. Returns true iff any row was affected.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = self.meta.name.as_str()))]
    pub fn remove(
        &mut self,
        conn: &mut dyn Connection,
        entry: &ChangeEntry,
        tx: Option<TxHandle>,
    ) -> Result<bool> {
        let (sql, params) = {
            let command = self.command(CommandKind::Remove)?;
            (command.text.clone(), command.bind_entry(entry))
        };
        let affected = Self::run(conn, &sql, &params, tx)?;
        Ok(affected > 0)
    }
}
