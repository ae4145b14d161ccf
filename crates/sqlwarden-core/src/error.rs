//! Error taxonomy for SQLWarden.
//!
//! Errors fall into a few families with different lifecycles:
//!
//! - **Configuration errors** are fatal and thrown immediately: an entity
//!   missing from the model, a missing primary key or table name, a property
//!   without a column or accessor, an unknown dialect.
//! - **Policy violations** only surface as `PermissionDenied` in strict
//!   mode; in default mode disallowed changes silently vanish from the save.
//! - **Conversion-capability errors** (`ConversionError`) name exactly why a
//!   compiled query could not be rewritten; there is no partial rewrite.
//! - **Concurrency conflicts** are detected at execute time via
//!   affected-row-count and never retried here.
//! - **Driver failures** are logged with the failing SQL and re-thrown
//!   unchanged as `Driver`.

use std::fmt;

use crate::access::SaveOperation;

/// Convenience alias for results in this workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a property set passed to the command builder was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySetViolation {
    /// The member does not belong to the entity's mapped property set.
    NotMapped,
    /// The member is a key property and keys were not explicitly allowed.
    KeyNotAllowed,
}

impl fmt::Display for PropertySetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertySetViolation::NotMapped => "not part of the mapped property set",
            PropertySetViolation::KeyNotAllowed => "key properties are not allowed here",
        };
        write!(f, "{s}")
    }
}

/// Why a compiled read query could not be converted to UPDATE/DELETE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The statement is not a SELECT.
    NotSelect,
    /// The SELECT is grouped/aggregated (GROUP BY or HAVING present).
    Grouped,
    /// The SELECT carries a WITH clause.
    WithClause,
    /// No underlying table expression matches the resolved alias; the
    /// statement degraded to read-only.
    TableNotFound {
        /// The alias that could not be resolved.
        alias: String,
    },
    /// The update expression is not a plain set of simple member
    /// assignments.
    BadUpdateExpression(String),
    /// The value compiler met an expression node kind it does not support.
    UnsupportedExpression(String),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::NotSelect => {
                write!(f, "statement is not a SELECT and cannot be converted")
            }
            ConversionError::Grouped => {
                write!(f, "grouped/aggregated SELECT cannot be converted")
            }
            ConversionError::WithClause => {
                write!(f, "SELECT with a WITH clause cannot be converted")
            }
            ConversionError::TableNotFound { alias } => {
                write!(
                    f,
                    "no table expression found for alias '{alias}'; statement is read-only"
                )
            }
            ConversionError::BadUpdateExpression(detail) => {
                write!(f, "update expression is not a simple member assignment: {detail}")
            }
            ConversionError::UnsupportedExpression(detail) => {
                write!(f, "unsupported expression in update value: {detail}")
            }
        }
    }
}

/// The SQLWarden error type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The entity type is not present in the model registry.
    EntityNotMapped {
        /// Entity name looked up.
        entity: String,
    },
    /// The entity declares no primary key property.
    MissingPrimaryKey {
        /// Entity name.
        entity: String,
    },
    /// The entity has no table or view name.
    MissingTableName {
        /// Entity name.
        entity: String,
    },
    /// A mapped property has no column name.
    PropertyWithoutColumn {
        /// Entity name.
        entity: String,
        /// Property name.
        property: String,
    },
    /// A property selected for a command has no accessor function.
    PropertyWithoutAccessor {
        /// Entity name.
        entity: String,
        /// Property name.
        property: String,
    },
    /// A property name does not exist on the entity.
    UnknownProperty {
        /// Entity name.
        entity: String,
        /// Property name.
        property: String,
    },
    /// No registered dialect matches the provider identifier.
    UnknownDialect {
        /// Provider identifier that failed to match.
        provider: String,
    },
    /// A configured property set was rejected; names every offending
    /// member, not just the first.
    InvalidProperties {
        /// Entity name.
        entity: String,
        /// Why the members were rejected.
        violation: PropertySetViolation,
        /// All offending member names.
        members: Vec<String>,
    },
    /// A save operation was denied by the access policy (strict mode only).
    PermissionDenied {
        /// The denied operation.
        operation: SaveOperation,
        /// Entity name.
        entity: String,
    },
    /// An UPDATE/DELETE carrying a concurrency-token predicate affected
    /// zero rows: the row was updated or deleted by someone else first.
    ConcurrencyConflict {
        /// The conflicting operation.
        operation: SaveOperation,
        /// Entity name.
        entity: String,
    },
    /// The dialect's last-insert-id query returned a blank or zero id.
    InsertFailed {
        /// Entity name.
        entity: String,
    },
    /// The generated key value is not representable in the declared key
    /// type (non-integral, or out of range).
    InvalidGeneratedKey {
        /// Entity name.
        entity: String,
        /// Key property name.
        property: String,
    },
    /// The uniqueness pre-validation probe found an existing row.
    DuplicateValue {
        /// Entity name.
        entity: String,
        /// Properties of the violated index.
        properties: Vec<String>,
    },
    /// A compiled query could not be converted to UPDATE/DELETE.
    Conversion(ConversionError),
    /// A driver-level failure, re-thrown unchanged after logging.
    Driver(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EntityNotMapped { entity } => {
                write!(f, "entity '{entity}' is not part of the model")
            }
            Error::MissingPrimaryKey { entity } => {
                write!(f, "entity '{entity}' has no primary key")
            }
            Error::MissingTableName { entity } => {
                write!(f, "entity '{entity}' has no table or view name")
            }
            Error::PropertyWithoutColumn { entity, property } => {
                write!(f, "property '{entity}.{property}' has no column name")
            }
            Error::PropertyWithoutAccessor { entity, property } => {
                write!(f, "property '{entity}.{property}' has no accessor")
            }
            Error::UnknownProperty { entity, property } => {
                write!(f, "entity '{entity}' has no property '{property}'")
            }
            Error::UnknownDialect { provider } => {
                write!(f, "no SQL dialect registered for provider '{provider}'")
            }
            Error::InvalidProperties {
                entity,
                violation,
                members,
            } => {
                write!(
                    f,
                    "invalid properties for '{entity}' ({violation}): {}",
                    members.join(", ")
                )
            }
            Error::PermissionDenied { operation, entity } => {
                write!(f, "{operation} denied for entity '{entity}'")
            }
            Error::ConcurrencyConflict { operation, entity } => {
                write!(
                    f,
                    "{operation} on '{entity}' affected no rows: updated or deleted by other"
                )
            }
            Error::InsertFailed { entity } => {
                write!(f, "insert into '{entity}' returned no generated id")
            }
            Error::InvalidGeneratedKey { entity, property } => {
                write!(
                    f,
                    "generated key for '{entity}.{property}' does not fit the declared type"
                )
            }
            Error::DuplicateValue { entity, properties } => {
                write!(
                    f,
                    "duplicate value for '{entity}' on ({})",
                    properties.join(", ")
                )
            }
            Error::Conversion(e) => write!(f, "{e}"),
            Error::Driver(msg) => write!(f, "driver error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConversionError> for Error {
    fn from(e: ConversionError) -> Self {
        Error::Conversion(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_properties_names_all_members() {
        let err = Error::InvalidProperties {
            entity: "Hero".to_string(),
            violation: PropertySetViolation::NotMapped,
            members: vec!["Foo".to_string(), "Bar".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Foo"));
        assert!(msg.contains("Bar"));
    }

    #[test]
    fn test_permission_denied_names_operation_and_entity() {
        let err = Error::PermissionDenied {
            operation: SaveOperation::Delete,
            entity: "Hero".to_string(),
        };
        assert_eq!(err.to_string(), "Delete denied for entity 'Hero'");
    }

    #[test]
    fn test_conversion_errors_are_distinct() {
        assert_ne!(
            Error::from(ConversionError::Grouped),
            Error::from(ConversionError::WithClause)
        );
    }
}
