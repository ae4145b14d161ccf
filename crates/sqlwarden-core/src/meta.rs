//! Entity metadata snapshot.
//!
//! The host ORM owns the mapping model; SQLWarden consumes a read-only
//! snapshot of it. `EntityMeta`/`PropertyMeta` carry exactly what the
//! command builder and rewriter need: column names, declared column types,
//! key membership, auto-generation, concurrency-token flags, and an optional
//! per-property accessor function.
//!
//! Declarative annotations (access levels, indexes) are registered here as
//! typed metadata rather than discovered by attribute scanning.

use std::collections::HashMap;
use std::sync::Arc;

use crate::access::AccessLevel;
use crate::entity::Record;
use crate::error::{Error, Result};
use crate::types::SqlType;
use crate::value::Value;

/// A value-extraction function for one property of an entity instance.
pub type Accessor = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Metadata for one mapped property.
#[derive(Clone)]
pub struct PropertyMeta {
    /// Logical property name.
    pub name: String,
    /// Database column name.
    pub column_name: String,
    /// Declared SQL column type string (e.g. `VARCHAR(100)`), if known.
    pub column_type: Option<String>,
    /// Whether this property is part of the primary key.
    pub primary_key: bool,
    /// Whether the store generates the value (identity/auto-increment).
    pub auto_generated: bool,
    /// Whether this property is an optimistic-concurrency token.
    pub concurrency_token: bool,
    /// Value-extraction function. Absent for shadow properties.
    accessor: Option<Accessor>,
}

impl std::fmt::Debug for PropertyMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyMeta")
            .field("name", &self.name)
            .field("column_name", &self.column_name)
            .field("column_type", &self.column_type)
            .field("primary_key", &self.primary_key)
            .field("auto_generated", &self.auto_generated)
            .field("concurrency_token", &self.concurrency_token)
            .field("has_accessor", &self.accessor.is_some())
            .finish()
    }
}

impl PropertyMeta {
    /// Create a property with the default by-name accessor.
    pub fn new(name: impl Into<String>, column_name: impl Into<String>) -> Self {
        let name = name.into();
        let by_name = name.clone();
        Self {
            name,
            column_name: column_name.into(),
            column_type: None,
            primary_key: false,
            auto_generated: false,
            concurrency_token: false,
            accessor: Some(Arc::new(move |rec: &Record| rec.get_or_null(&by_name))),
        }
    }

    /// Set the declared column type string.
    pub fn column_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as store-generated.
    pub fn auto_generated(mut self) -> Self {
        self.auto_generated = true;
        self
    }

    /// Mark as an optimistic-concurrency token.
    pub fn concurrency_token(mut self) -> Self {
        self.concurrency_token = true;
        self
    }

    /// Replace the accessor with a custom extraction function.
    pub fn accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// Drop the accessor, making this a shadow property.
    pub fn shadow(mut self) -> Self {
        self.accessor = None;
        self
    }

    /// Whether an accessor function is available.
    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// The accessor function, or the fatal configuration error.
    pub fn require_accessor(&self, entity: &str) -> Result<&Accessor> {
        self.accessor
            .as_ref()
            .ok_or_else(|| Error::PropertyWithoutAccessor {
                entity: entity.to_string(),
                property: self.name.clone(),
            })
    }

    /// The native parameter type derived from the declared column type.
    ///
    /// `None` when the column type is missing or unrecognized; the driver
    /// default applies in that case.
    pub fn native_type(&self) -> Option<SqlType> {
        self.column_type
            .as_deref()
            .and_then(SqlType::from_column_type)
    }
}

/// A single or composite index annotation, used by uniqueness
/// pre-validation.
#[derive(Debug, Clone)]
pub struct IndexMeta {
    /// Index name.
    pub name: String,
    /// Properties covered, in order.
    pub properties: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// Read-only metadata for one mapped entity type.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    /// Entity type name.
    pub name: String,
    /// Table or view name. Empty means unmapped to a store object.
    pub table: String,
    /// Optional schema qualifier.
    pub schema: Option<String>,
    /// Mapped properties in declaration order.
    pub properties: Vec<PropertyMeta>,
    /// Index annotations.
    pub indexes: Vec<IndexMeta>,
    /// Class-level access annotations; OR-combined by the policy evaluator.
    pub access_annotations: Vec<AccessLevel>,
}

impl EntityMeta {
    /// Create metadata for an entity mapped to the given table.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            schema: None,
            properties: Vec::new(),
            indexes: Vec::new(),
            access_annotations: Vec::new(),
        }
    }

    /// Set the schema qualifier.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a property.
    pub fn property(mut self, property: PropertyMeta) -> Self {
        self.properties.push(property);
        self
    }

    /// Add an index annotation.
    pub fn index(mut self, index: IndexMeta) -> Self {
        self.indexes.push(index);
        self
    }

    /// Add a class-level access annotation.
    pub fn access(mut self, level: AccessLevel) -> Self {
        self.access_annotations.push(level);
        self
    }

    /// Look up a property by logical name.
    pub fn find_property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a property, raising `UnknownProperty` when absent.
    pub fn require_property(&self, name: &str) -> Result<&PropertyMeta> {
        self.find_property(name).ok_or_else(|| Error::UnknownProperty {
            entity: self.name.clone(),
            property: name.to_string(),
        })
    }

    /// Primary-key properties in declaration order.
    pub fn key_properties(&self) -> Vec<&PropertyMeta> {
        self.properties.iter().filter(|p| p.primary_key).collect()
    }

    /// Optimistic-concurrency token properties.
    pub fn concurrency_tokens(&self) -> Vec<&PropertyMeta> {
        self.properties
            .iter()
            .filter(|p| p.concurrency_token)
            .collect()
    }

    /// The table name, or the configuration error for an unmapped entity.
    pub fn require_table(&self) -> Result<&str> {
        if self.table.is_empty() {
            return Err(Error::MissingTableName {
                entity: self.name.clone(),
            });
        }
        Ok(&self.table)
    }

    /// Validate the invariants every command-generating component relies on:
    /// a table name, at least one key property, and a column name on every
    /// property. Fatal configuration errors, never retried.
    pub fn validate(&self) -> Result<()> {
        self.require_table()?;
        if self.key_properties().is_empty() {
            return Err(Error::MissingPrimaryKey {
                entity: self.name.clone(),
            });
        }
        for p in &self.properties {
            if p.column_name.is_empty() {
                return Err(Error::PropertyWithoutColumn {
                    entity: self.name.clone(),
                    property: p.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The model registry: entity name to metadata snapshot.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entities: HashMap<String, Arc<EntityMeta>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity's metadata.
    pub fn register(&mut self, meta: EntityMeta) {
        self.entities.insert(meta.name.clone(), Arc::new(meta));
    }

    /// Look up an entity, raising `EntityNotMapped` when absent.
    pub fn entity(&self, name: &str) -> Result<Arc<EntityMeta>> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| Error::EntityNotMapped {
                entity: name.to_string(),
            })
    }

    /// Whether an entity is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }
}
