//! Native column type names and temporary-table DDL synthesis.

use sqlwarden_core::{SqlType, TypeHint};

use crate::knowledge::DialectKnowledge;

impl DialectKnowledge {
    /// Render the native column type name for a general value type with
    /// size/precision hints.
    ///
    /// Unknown combinations fall back to an engine-appropriate catch-all so
    /// synthesized DDL always names some storable type.
    pub fn native_type_name(&self, ty: SqlType, hint: TypeHint) -> String {
        match self.name.as_str() {
            "sqlserver" => sqlserver_type_name(ty, hint),
            "postgres" => postgres_type_name(ty, hint),
            "mysql" => mysql_type_name(ty, hint),
            _ => sqlite_type_name(ty),
        }
    }

    /// Synthesize `CREATE TABLE` DDL for a temporary table.
    ///
    /// The table name is prefixed per engine convention (`#` on SQL Server,
    /// a `temp_` prefix elsewhere).
    pub fn temp_table_ddl(&self, base_name: &str, columns: &[(&str, SqlType, TypeHint)]) -> String {
        let cols: Vec<String> = columns
            .iter()
            .map(|(name, ty, hint)| {
                format!("{} {}", self.quote(name), self.native_type_name(*ty, *hint))
            })
            .collect();
        format!(
            "CREATE TABLE {} ({})",
            self.quote(&self.temp_table_name(base_name)),
            cols.join(", ")
        )
    }
}

fn decimal(hint: TypeHint) -> String {
    match (hint.precision, hint.scale) {
        (Some(p), Some(s)) => format!("DECIMAL({p},{s})"),
        (Some(p), None) => format!("DECIMAL({p})"),
        _ => "DECIMAL(18,2)".to_string(),
    }
}

fn sqlserver_type_name(ty: SqlType, hint: TypeHint) -> String {
    match ty {
        SqlType::Bool => "BIT".to_string(),
        SqlType::TinyInt => "TINYINT".to_string(),
        SqlType::SmallInt => "SMALLINT".to_string(),
        SqlType::Int => "INT".to_string(),
        SqlType::BigInt => "BIGINT".to_string(),
        SqlType::Float => "REAL".to_string(),
        SqlType::Double => "FLOAT".to_string(),
        SqlType::Decimal => decimal(hint),
        SqlType::Text => match hint.size {
            Some(n) => format!("NVARCHAR({n})"),
            None => "NVARCHAR(MAX)".to_string(),
        },
        SqlType::Bytes => "VARBINARY(MAX)".to_string(),
        SqlType::Date => "DATE".to_string(),
        SqlType::Time => "TIME".to_string(),
        SqlType::Timestamp => "DATETIME2".to_string(),
        SqlType::Uuid => "UNIQUEIDENTIFIER".to_string(),
    }
}

fn postgres_type_name(ty: SqlType, hint: TypeHint) -> String {
    match ty {
        SqlType::Bool => "BOOLEAN".to_string(),
        SqlType::TinyInt | SqlType::SmallInt => "SMALLINT".to_string(),
        SqlType::Int => "INTEGER".to_string(),
        SqlType::BigInt => "BIGINT".to_string(),
        SqlType::Float => "REAL".to_string(),
        SqlType::Double => "DOUBLE PRECISION".to_string(),
        SqlType::Decimal => decimal(hint),
        SqlType::Text => match hint.size {
            Some(n) => format!("VARCHAR({n})"),
            None => "TEXT".to_string(),
        },
        SqlType::Bytes => "BYTEA".to_string(),
        SqlType::Date => "DATE".to_string(),
        SqlType::Time => "TIME".to_string(),
        SqlType::Timestamp => "TIMESTAMP".to_string(),
        SqlType::Uuid => "UUID".to_string(),
    }
}

fn mysql_type_name(ty: SqlType, hint: TypeHint) -> String {
    match ty {
        SqlType::Bool => "TINYINT(1)".to_string(),
        SqlType::TinyInt => "TINYINT".to_string(),
        SqlType::SmallInt => "SMALLINT".to_string(),
        SqlType::Int => "INT".to_string(),
        SqlType::BigInt => "BIGINT".to_string(),
        SqlType::Float => "FLOAT".to_string(),
        SqlType::Double => "DOUBLE".to_string(),
        SqlType::Decimal => decimal(hint),
        SqlType::Text => match hint.size {
            Some(n) => format!("VARCHAR({n})"),
            None => "TEXT".to_string(),
        },
        SqlType::Bytes => "BLOB".to_string(),
        SqlType::Date => "DATE".to_string(),
        SqlType::Time => "TIME".to_string(),
        SqlType::Timestamp => "DATETIME".to_string(),
        SqlType::Uuid => "CHAR(36)".to_string(),
    }
}

fn sqlite_type_name(ty: SqlType) -> String {
    // SQLite has type affinity, not strict types; sizes are advisory.
    match ty {
        SqlType::Bool | SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt => {
            "INTEGER".to_string()
        }
        SqlType::Float | SqlType::Double => "REAL".to_string(),
        SqlType::Decimal => "NUMERIC".to_string(),
        SqlType::Text | SqlType::Uuid => "TEXT".to_string(),
        SqlType::Bytes => "BLOB".to_string(),
        SqlType::Date | SqlType::Time | SqlType::Timestamp => "INTEGER".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge;

    #[test]
    fn test_sized_text_names() {
        let mssql = knowledge::sqlserver();
        assert_eq!(
            mssql.native_type_name(SqlType::Text, TypeHint::sized(100)),
            "NVARCHAR(100)"
        );
        let pg = knowledge::postgres();
        assert_eq!(
            pg.native_type_name(SqlType::Text, TypeHint::none()),
            "TEXT"
        );
    }

    #[test]
    fn test_decimal_hints() {
        let mysql = knowledge::mysql();
        assert_eq!(
            mysql.native_type_name(SqlType::Decimal, TypeHint::decimal(10, 2)),
            "DECIMAL(10,2)"
        );
    }

    #[test]
    fn test_temp_table_ddl() {
        let mssql = knowledge::sqlserver();
        let ddl = mssql.temp_table_ddl(
            "keys",
            &[
                ("id", SqlType::BigInt, TypeHint::none()),
                ("name", SqlType::Text, TypeHint::sized(50)),
            ],
        );
        assert_eq!(
            ddl,
            "CREATE TABLE [#keys] ([id] BIGINT, [name] NVARCHAR(50))"
        );
    }

    #[test]
    fn test_sqlite_affinity() {
        let sqlite = knowledge::sqlite();
        assert_eq!(
            sqlite.native_type_name(SqlType::Timestamp, TypeHint::none()),
            "INTEGER"
        );
        assert_eq!(
            sqlite.native_type_name(SqlType::Uuid, TypeHint::none()),
            "TEXT"
        );
    }
}
