//! The extraction seam between the rewriter and the host query engine.
//!
//! The host ORM owns the compiled query and its command cache. All the
//! rewriter needs from it is the final SQL text, the ordered parameter
//! bindings, and the table list — `QueryIntrospector` is that contract.
//! `CompiledQuery` is a plain value implementation for hosts that hand the
//! three pieces over directly, and for tests.

use sqlwarden_core::{Param, Value};

/// One table reference in a compiled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Schema name, when qualified.
    pub schema: Option<String>,
    /// Table or view name.
    pub name: String,
    /// Alias assigned by the query compiler, when any.
    pub alias: Option<String>,
}

impl TableRef {
    /// An unqualified table reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Attach the compiler-assigned alias.
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach the schema.
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Whether this reference answers to the given alias: its assigned
    /// alias when it has one, its bare name otherwise.
    pub fn answers_to(&self, alias: &str) -> bool {
        match &self.alias {
            Some(a) => a == alias,
            None => self.name == alias,
        }
    }
}

/// What the rewriter extracts from a compiled read query.
///
/// The contract mirrors what the engine would execute: the dialect-specific
/// SQL text and the parameter map exactly as bound, in order.
pub trait QueryIntrospector {
    /// The final SQL text.
    fn sql_text(&self) -> &str;

    /// Ordered parameter name/value pairs.
    fn parameters(&self) -> &[Param];

    /// The tables the query reads from, in compilation order.
    fn tables(&self) -> &[TableRef];
}

/// A compiled query captured as a plain value.
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
    sql: String,
    params: Vec<Param>,
    tables: Vec<TableRef>,
}

impl CompiledQuery {
    /// Capture the SQL text.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Add a bound parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Add a table reference.
    pub fn table(mut self, table: TableRef) -> Self {
        self.tables.push(table);
        self
    }
}

impl QueryIntrospector for CompiledQuery {
    fn sql_text(&self) -> &str {
        &self.sql
    }

    fn parameters(&self) -> &[Param] {
        &self.params
    }

    fn tables(&self) -> &[TableRef] {
        &self.tables
    }
}
