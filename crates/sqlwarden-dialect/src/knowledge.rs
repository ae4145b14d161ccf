//! Per-engine syntax facts.

/// How an engine spells string concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcatMode {
    /// An infix operator, e.g. `||` or `+`.
    Operator(String),
    /// A variadic function, e.g. `CONCAT(a, b, c)`.
    Function(String),
}

/// Immutable syntax knowledge for one database engine.
///
/// Instances are registered once per engine name and looked up by matching
/// `provider_pattern` against a provider or connection identifier.
#[derive(Debug, Clone)]
pub struct DialectKnowledge {
    /// Engine name (e.g. `"sqlserver"`).
    pub name: String,
    /// Regex matched against provider identifiers; first match wins.
    pub provider_pattern: String,
    /// Opening identifier quote.
    pub opening_quote: char,
    /// Closing identifier quote.
    pub closing_quote: char,
    /// Query returning the last inserted id on this connection, when the
    /// engine has one.
    pub last_insert_id_sql: Option<String>,
    /// Concatenation syntax.
    pub concat: ConcatMode,
    /// Literal forms for TRUE and FALSE.
    pub bool_literals: (&'static str, &'static str),
    /// Whether DELETE accepts a table alias (`DELETE a FROM t AS a ...`).
    pub delete_supports_alias: bool,
    /// Whether UPDATE accepts an alias as its target.
    pub update_supports_alias: bool,
    /// Whether UPDATE accepts a FROM clause.
    pub update_supports_from: bool,
    /// Prefix for temporary table names.
    pub temp_table_prefix: String,
}

impl DialectKnowledge {
    /// Quote an identifier with this engine's quote pair.
    pub fn quote(&self, ident: &str) -> String {
        format!("{}{}{}", self.opening_quote, ident, self.closing_quote)
    }

    /// Render the concatenation of already-rendered SQL fragments.
    pub fn concat(&self, parts: &[String]) -> String {
        match &self.concat {
            ConcatMode::Operator(op) => parts.join(&format!(" {op} ")),
            ConcatMode::Function(name) => format!("{}({})", name, parts.join(", ")),
        }
    }

    /// Render a boolean literal.
    pub fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            self.bool_literals.0
        } else {
            self.bool_literals.1
        }
    }

    /// A temporary-table name for the given base name.
    pub fn temp_table_name(&self, base: &str) -> String {
        format!("{}{base}", self.temp_table_prefix)
    }
}

/// Built-in knowledge for SQL Server.
pub fn sqlserver() -> DialectKnowledge {
    DialectKnowledge {
        name: "sqlserver".to_string(),
        provider_pattern: r"(?i)sqlserver|sqlclient|mssql".to_string(),
        opening_quote: '[',
        closing_quote: ']',
        last_insert_id_sql: Some("SELECT SCOPE_IDENTITY()".to_string()),
        concat: ConcatMode::Operator("+".to_string()),
        bool_literals: ("1", "0"),
        delete_supports_alias: true,
        update_supports_alias: true,
        update_supports_from: true,
        temp_table_prefix: "#".to_string(),
    }
}

/// Built-in knowledge for PostgreSQL.
pub fn postgres() -> DialectKnowledge {
    DialectKnowledge {
        name: "postgres".to_string(),
        provider_pattern: r"(?i)postgres|npgsql|pgsql".to_string(),
        opening_quote: '"',
        closing_quote: '"',
        last_insert_id_sql: Some("SELECT lastval()".to_string()),
        concat: ConcatMode::Operator("||".to_string()),
        bool_literals: ("TRUE", "FALSE"),
        delete_supports_alias: false,
        update_supports_alias: false,
        update_supports_from: true,
        temp_table_prefix: "temp_".to_string(),
    }
}

/// Built-in knowledge for MySQL/MariaDB.
pub fn mysql() -> DialectKnowledge {
    DialectKnowledge {
        name: "mysql".to_string(),
        provider_pattern: r"(?i)mysql|maria".to_string(),
        opening_quote: '`',
        closing_quote: '`',
        last_insert_id_sql: Some("SELECT LAST_INSERT_ID()".to_string()),
        concat: ConcatMode::Function("CONCAT".to_string()),
        bool_literals: ("1", "0"),
        delete_supports_alias: true,
        update_supports_alias: true,
        update_supports_from: false,
        temp_table_prefix: "temp_".to_string(),
    }
}

/// Built-in knowledge for SQLite.
pub fn sqlite() -> DialectKnowledge {
    DialectKnowledge {
        name: "sqlite".to_string(),
        provider_pattern: r"(?i)sqlite".to_string(),
        opening_quote: '"',
        closing_quote: '"',
        last_insert_id_sql: Some("SELECT last_insert_rowid()".to_string()),
        concat: ConcatMode::Operator("||".to_string()),
        bool_literals: ("1", "0"),
        delete_supports_alias: false,
        update_supports_alias: false,
        update_supports_from: false,
        temp_table_prefix: "temp_".to_string(),
    }
}
