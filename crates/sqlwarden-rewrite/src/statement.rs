//! Parameterized statements and alias resolution.

use std::sync::Arc;

use sqlwarden_core::{Param, Result};
use sqlwarden_dialect::DialectKnowledge;

use crate::clause::{self, RippedClauses};
use crate::introspect::{QueryIntrospector, TableRef};

/// What a parameterized statement does when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// The original read query.
    Select,
    /// A bulk UPDATE derived from the read query.
    Update,
    /// A bulk DELETE derived from the read query.
    Delete,
}

/// An immutable SQL statement with its bound parameters.
///
/// Constructed from a compiled read query; `to_update`/`to_delete` derive
/// new statements that reuse the original's FROM/WHERE clauses and
/// parameters. Derivation never mutates the source statement.
#[derive(Debug)]
pub struct ParameterizedStatement {
    pub(crate) sql: String,
    pub(crate) kind: StatementKind,
    pub(crate) params: Vec<Param>,
    pub(crate) dialect: Arc<DialectKnowledge>,
    /// Resolved source alias, when the statement is convertible.
    pub(crate) alias: Option<String>,
    /// The table expression behind the alias; `None` means read-only.
    pub(crate) table: Option<TableRef>,
    /// The alias text that failed to resolve, for the read-only error.
    pub(crate) unresolved_alias: Option<String>,
    pub(crate) from: Option<String>,
    pub(crate) where_clause: Option<String>,
    pub(crate) grouped: bool,
    pub(crate) with_clause: bool,
    /// Whether the clause grammar recognized the text as a SELECT.
    pub(crate) ripped: bool,
}

/// Pull the leading identifier of the projection, when the first column
/// reference is prefixed (`alias.col`, `[alias].[col]`, `"alias"."col"`).
fn projection_alias(projection: &str) -> Option<String> {
    let trimmed = projection.trim_start();
    let mut chars = trimmed.chars();
    let first = chars.next()?;

    let (ident, rest) = match first {
        '[' => {
            let end = trimmed.find(']')?;
            (trimmed[1..end].to_string(), &trimmed[end + 1..])
        }
        '"' | '`' => {
            let end = trimmed[1..].find(first)? + 1;
            (trimmed[1..end].to_string(), &trimmed[end + 1..])
        }
        c if c.is_ascii_alphabetic() || c == '_' => {
            let end = trimmed
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
                .unwrap_or(trimmed.len());
            (trimmed[..end].to_string(), &trimmed[end..])
        }
        _ => return None,
    };

    rest.starts_with('.').then_some(ident)
}

impl ParameterizedStatement {
    /// Build a statement from a compiled read query.
    ///
    /// The clause grammar runs once, here. A text that is not a SELECT
    /// still constructs (the kind check happens at conversion time); its
    /// clause fields stay empty.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn from_query(
        query: &dyn QueryIntrospector,
        dialect: Arc<DialectKnowledge>,
    ) -> Result<Self> {
        let sql = query.sql_text().to_string();
        let params = query.parameters().to_vec();

        let Ok(clauses) = clause::rip(&sql) else {
            return Ok(Self {
                sql,
                kind: StatementKind::Select,
                params,
                dialect,
                alias: None,
                table: None,
                unresolved_alias: None,
                from: None,
                where_clause: None,
                grouped: false,
                with_clause: false,
                ripped: false,
            });
        };

        let alias = Self::resolve_alias(&clauses, query.tables());
        let (table, unresolved) = match &alias {
            Some(a) => match query.tables().iter().find(|t| t.answers_to(a)) {
                Some(t) => (Some(t.clone()), None),
                None => (None, Some(a.clone())),
            },
            None => (None, None),
        };
        tracing::debug!(
            alias = alias.as_deref().unwrap_or("<none>"),
            resolved = table.is_some(),
            "Ripped compiled query"
        );

        Ok(Self {
            sql,
            kind: StatementKind::Select,
            params,
            dialect,
            alias,
            table,
            unresolved_alias: unresolved,
            from: clauses.from.clone(),
            where_clause: clauses.where_clause.clone(),
            grouped: clauses.is_grouped(),
            with_clause: clauses.has_with(),
            ripped: true,
        })
    }

    /// The projection prefix wins; the first table reference is the
    /// fallback.
    fn resolve_alias(clauses: &RippedClauses, tables: &[TableRef]) -> Option<String> {
        projection_alias(&clauses.projection).or_else(|| {
            tables
                .first()
                .map(|t| t.alias.clone().unwrap_or_else(|| t.name.clone()))
        })
    }

    /// The statement's SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The statement kind.
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Ordered parameter name/value pairs.
    pub fn parameters(&self) -> &[Param] {
        &self.params
    }

    /// Whether this is the original read statement.
    pub fn is_select(&self) -> bool {
        self.kind == StatementKind::Select
    }

    /// Whether this is a derived UPDATE.
    pub fn is_update(&self) -> bool {
        self.kind == StatementKind::Update
    }

    /// Whether this is a derived DELETE.
    pub fn is_delete(&self) -> bool {
        self.kind == StatementKind::Delete
    }

    /// The resolved source alias, when any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The table expression behind the alias. `None` means the statement
    /// is read-only and refuses conversion.
    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }
}
