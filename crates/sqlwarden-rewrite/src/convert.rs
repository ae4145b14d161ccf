//! Deriving bulk UPDATE/DELETE statements from a ripped SELECT.
//!
//! Dialects disagree on what a rewritten statement may look like:
//!
//! - **alias + FROM** (SQL Server): `UPDATE [h] SET ... FROM [heroes] AS
//!   [h] WHERE ...` and `DELETE [h] FROM [heroes] AS [h] WHERE ...`;
//! - **alias, no FROM** (MySQL): the FROM clause's table list becomes the
//!   UPDATE target, `UPDATE `heroes` AS `h` SET ... WHERE ...`;
//! - **no alias** (PostgreSQL, SQLite): the original WHERE is folded into a
//!   correlated subquery over the primary key,
//!   `... WHERE "id" IN (SELECT "h"."id" FROM ... WHERE ...)`, with
//!   dialect concatenation for composite keys.
//!
//! A conversion either produces a complete statement or raises one named
//! `ConversionError`. Nothing executes here; the caller runs the derived
//! statement through its own connection.

use std::sync::Arc;

use sqlwarden_core::{ConversionError, EntityMeta, Error, Param, Result};
use sqlwarden_dialect::DialectKnowledge;

use crate::compile::ExprCompiler;
use crate::expr::UpdateSet;
use crate::introspect::TableRef;
use crate::statement::{ParameterizedStatement, StatementKind};

impl ParameterizedStatement {
    /// Why the statement cannot be converted, if it cannot; otherwise the
    /// resolved target table.
    fn ensure_convertible(&self) -> Result<&TableRef> {
        if !self.ripped || !self.is_select() {
            return Err(ConversionError::NotSelect.into());
        }
        if self.with_clause {
            return Err(ConversionError::WithClause.into());
        }
        if self.grouped {
            return Err(ConversionError::Grouped.into());
        }
        self.table.as_ref().ok_or_else(|| {
            ConversionError::TableNotFound {
                alias: self.unresolved_alias.clone().unwrap_or_default(),
            }
            .into()
        })
    }

    fn derive(&self, kind: StatementKind, sql: String, params: Vec<Param>) -> Self {
        Self {
            sql,
            kind,
            params,
            dialect: Arc::clone(&self.dialect),
            alias: self.alias.clone(),
            table: self.table.clone(),
            unresolved_alias: None,
            from: self.from.clone(),
            where_clause: self.where_clause.clone(),
            grouped: false,
            with_clause: false,
            ripped: false,
        }
    }

    fn dialect(&self) -> &DialectKnowledge {
        &self.dialect
    }

    /// The quoted, schema-qualified table the statement updates/deletes.
    fn render_table(&self, table: &TableRef) -> String {
        match &table.schema {
            Some(schema) => format!(
                "{}.{}",
                self.dialect.quote(schema),
                self.dialect.quote(&table.name)
            ),
            None => self.dialect.quote(&table.name),
        }
    }

    /// `IN`-predicate over the primary key against the original query: a
    /// correlated subquery that reuses the ripped FROM and WHERE verbatim.
    /// Composite keys concatenate per dialect on both sides.
    fn key_subquery_predicate(&self, meta: &EntityMeta, table: &TableRef) -> Result<String> {
        let alias = self
            .alias
            .as_deref()
            .map_or_else(|| self.render_table(table), |a| self.dialect.quote(a));

        let keys = meta.key_properties();
        if keys.is_empty() {
            return Err(Error::MissingPrimaryKey {
                entity: meta.name.clone(),
            });
        }

        let outer: Vec<String> = keys
            .iter()
            .map(|k| self.dialect.quote(&k.column_name))
            .collect();
        let inner: Vec<String> = keys
            .iter()
            .map(|k| format!("{alias}.{}", self.dialect.quote(&k.column_name)))
            .collect();
        let (lhs, projection) = if keys.len() == 1 {
            (outer[0].clone(), inner[0].clone())
        } else {
            (self.dialect.concat(&outer), self.dialect.concat(&inner))
        };

        let mut subquery = format!("SELECT {projection}");
        if let Some(from) = &self.from {
            subquery.push(' ');
            subquery.push_str(from);
        }
        if let Some(where_clause) = &self.where_clause {
            subquery.push(' ');
            subquery.push_str(where_clause);
        }
        Ok(format!("{lhs} IN ({subquery})"))
    }

    /// Derive a bulk DELETE from the read query.
    ///
    /// Alias-capable dialects reuse the FROM/WHERE clauses directly; the
    /// rest go through the correlated-subquery predicate.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = meta.name.as_str()))]
    pub fn to_delete(&self, meta: &EntityMeta) -> Result<ParameterizedStatement> {
        let table = self.ensure_convertible()?;

        let sql = if self.dialect().delete_supports_alias {
            let alias = self
                .alias
                .as_deref()
                .map_or_else(|| self.render_table(table), |a| self.dialect.quote(a));
            let mut sql = format!("DELETE {alias}");
            if let Some(from) = &self.from {
                sql.push(' ');
                sql.push_str(from);
            }
            if let Some(where_clause) = &self.where_clause {
                sql.push(' ');
                sql.push_str(where_clause);
            }
            sql
        } else {
            format!(
                "DELETE FROM {} WHERE {}",
                self.render_table(table),
                self.key_subquery_predicate(meta, table)?
            )
        };

        tracing::debug!(sql = %sql, "Derived delete");
        Ok(self.derive(StatementKind::Delete, sql, self.params.clone()))
    }

    /// Derive a bulk UPDATE applying the assignment set to every row the
    /// read query matches.
    ///
    /// Assignment targets resolve through entity metadata; right-hand
    /// sides compile via [`ExprCompiler`](crate::compile::ExprCompiler).
    /// Captured values extend the parameter list as `@v{i}`.
    #[tracing::instrument(level = "debug", skip_all, fields(entity = meta.name.as_str()))]
    pub fn to_update(&self, meta: &EntityMeta, set: &UpdateSet) -> Result<ParameterizedStatement> {
        let table = self.ensure_convertible()?;
        if set.is_empty() {
            return Err(
                ConversionError::BadUpdateExpression("no assignments".to_string()).into(),
            );
        }
        let mut seen: Vec<&str> = Vec::new();
        for (property, _) in set.assignments() {
            if meta.find_property(property).is_none() {
                return Err(ConversionError::BadUpdateExpression(format!(
                    "'{property}' is not a mapped property of '{}'",
                    meta.name
                ))
                .into());
            }
            if seen.contains(&property.as_str()) {
                return Err(ConversionError::BadUpdateExpression(format!(
                    "'{property}' is assigned more than once"
                ))
                .into());
            }
            seen.push(property);
        }

        let dialect = self.dialect();
        let use_alias = dialect.update_supports_alias;
        let quoted_alias = self.alias.as_deref().map(|a| self.dialect.quote(a));
        let column_prefix = if use_alias { quoted_alias.clone() } else { None };

        let mut compiler = ExprCompiler::new(dialect, meta, column_prefix);
        let mut assignments = Vec::with_capacity(set.assignments().len());
        for (property, expr) in set.assignments() {
            let prop = meta.require_property(property)?;
            let value_sql = compiler.compile(expr)?;
            assignments.push(format!(
                "{} = {value_sql}",
                self.dialect.quote(&prop.column_name)
            ));
        }
        let set_sql = assignments.join(", ");

        let sql = if use_alias && dialect.update_supports_from {
            // alias + FROM: target the alias, keep FROM/WHERE verbatim.
            let target = quoted_alias
                .clone()
                .unwrap_or_else(|| self.render_table(table));
            let mut sql = format!("UPDATE {target} SET {set_sql}");
            if let Some(from) = &self.from {
                sql.push(' ');
                sql.push_str(from);
            }
            if let Some(where_clause) = &self.where_clause {
                sql.push(' ');
                sql.push_str(where_clause);
            }
            sql
        } else if use_alias {
            // alias, no FROM: the FROM clause's table list becomes the
            // UPDATE target.
            let target = match &self.from {
                Some(from) => from
                    .strip_prefix("FROM ")
                    .unwrap_or(from.as_str())
                    .to_string(),
                None => self.render_table(table),
            };
            let mut sql = format!("UPDATE {target} SET {set_sql}");
            if let Some(where_clause) = &self.where_clause {
                sql.push(' ');
                sql.push_str(where_clause);
            }
            sql
        } else {
            // no alias: correlated-subquery fallback over the primary key.
            format!(
                "UPDATE {} SET {set_sql} WHERE {}",
                self.render_table(table),
                self.key_subquery_predicate(meta, table)?
            )
        };

        let mut params = self.params.clone();
        params.extend(compiler.into_params());
        tracing::debug!(sql = %sql, "Derived update");
        Ok(self.derive(StatementKind::Update, sql, params))
    }
}
