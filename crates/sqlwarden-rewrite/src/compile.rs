//! The recursive value-expression compiler.

use sqlwarden_core::{ConversionError, EntityMeta, Param, Result, Value};
use sqlwarden_dialect::DialectKnowledge;

use crate::expr::{Expr, UnaryOp};

/// Compiles `Expr` trees to SQL fragments for one entity and dialect.
///
/// Captured values (and non-inlinable constants) accumulate as `@v{i}`
/// parameters; the caller appends them to the statement's parameter list
/// after compiling every assignment.
pub struct ExprCompiler<'a> {
    dialect: &'a DialectKnowledge,
    meta: &'a EntityMeta,
    /// Already-rendered prefix for column references (a quoted alias), or
    /// `None` to emit bare column names.
    column_prefix: Option<String>,
    params: Vec<Param>,
}

impl<'a> ExprCompiler<'a> {
    /// Create a compiler. `column_prefix` is the rendered alias to qualify
    /// column references with, when the statement shape uses one.
    pub fn new(
        dialect: &'a DialectKnowledge,
        meta: &'a EntityMeta,
        column_prefix: Option<String>,
    ) -> Self {
        Self {
            dialect,
            meta,
            column_prefix,
            params: Vec::new(),
        }
    }

    /// The parameters captured while compiling, in creation order.
    pub fn into_params(self) -> Vec<Param> {
        self.params
    }

    fn next_param(&mut self, value: Value) -> String {
        let name = format!("@v{}", self.params.len());
        self.params.push((name.clone(), value));
        name
    }

    fn column(&self, path: &[String]) -> Result<String> {
        let [property] = path else {
            return Err(ConversionError::UnsupportedExpression(format!(
                "nested member path '{}'",
                path.join(".")
            ))
            .into());
        };
        let prop = self.meta.require_property(property)?;
        let quoted = self.dialect.quote(&prop.column_name);
        Ok(match &self.column_prefix {
            Some(prefix) => format!("{prefix}.{quoted}"),
            None => quoted,
        })
    }

    fn constant(&mut self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.dialect.bool_literal(*b).to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::TinyInt(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            // Decimals, bytes, temporal and uuid values keep their driver
            // representation by going through a parameter.
            other => self.next_param(other.clone()),
        }
    }

    /// Compile one expression to a SQL fragment.
    pub fn compile(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Constant(value) => Ok(self.constant(value)),
            Expr::Captured(value) => Ok(self.next_param(value.clone())),
            Expr::Column(path) => self.column(path),
            Expr::Unary { op, operand } => {
                let inner = self.compile(operand)?;
                Ok(match op {
                    UnaryOp::Not => format!("NOT ({inner})"),
                    UnaryOp::Neg => format!("-({inner})"),
                })
            }
            Expr::Binary { op, left, right } => {
                let l = self.compile(left)?;
                let r = self.compile(right)?;
                Ok(format!("({l} {} {r})", op.sql()))
            }
            Expr::Concat(parts) => {
                if parts.is_empty() {
                    return Err(ConversionError::UnsupportedExpression(
                        "empty concatenation".to_string(),
                    )
                    .into());
                }
                let rendered = parts
                    .iter()
                    .map(|p| self.compile(p))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.dialect.concat(&rendered))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinaryOp;
    use sqlwarden_core::PropertyMeta;
    use sqlwarden_dialect::knowledge;

    fn meta() -> EntityMeta {
        EntityMeta::new("Hero", "heroes")
            .property(PropertyMeta::new("Id", "id").primary_key())
            .property(PropertyMeta::new("Name", "name"))
            .property(PropertyMeta::new("Age", "age"))
    }

    #[test]
    fn test_constants_inline() {
        let dialect = knowledge::postgres();
        let meta = meta();
        let mut c = ExprCompiler::new(&dialect, &meta, None);
        assert_eq!(c.compile(&Expr::constant(true)).unwrap(), "TRUE");
        assert_eq!(c.compile(&Expr::constant(42i32)).unwrap(), "42");
        assert_eq!(c.compile(&Expr::constant("O'Brien")).unwrap(), "'O''Brien'");
        assert_eq!(c.compile(&Expr::Constant(Value::Null)).unwrap(), "NULL");
        assert!(c.into_params().is_empty());
    }

    #[test]
    fn test_non_inlinable_constant_parameterizes() {
        let dialect = knowledge::postgres();
        let meta = meta();
        let mut c = ExprCompiler::new(&dialect, &meta, None);
        let sql = c
            .compile(&Expr::Constant(Value::Decimal("1.50".to_string())))
            .unwrap();
        assert_eq!(sql, "@v0");
        assert_eq!(c.into_params(), vec![("@v0".to_string(), Value::Decimal("1.50".to_string()))]);
    }

    #[test]
    fn test_captured_value_becomes_parameter() {
        let dialect = knowledge::sqlserver();
        let meta = meta();
        let mut c = ExprCompiler::new(&dialect, &meta, None);
        assert_eq!(c.compile(&Expr::captured("external")).unwrap(), "@v0");
        assert_eq!(c.compile(&Expr::captured(7i64)).unwrap(), "@v1");
    }

    #[test]
    fn test_column_with_and_without_prefix() {
        let dialect = knowledge::sqlserver();
        let meta = meta();
        let mut bare = ExprCompiler::new(&dialect, &meta, None);
        assert_eq!(bare.compile(&Expr::column("Name")).unwrap(), "[name]");

        let mut prefixed = ExprCompiler::new(&dialect, &meta, Some("[h]".to_string()));
        assert_eq!(prefixed.compile(&Expr::column("Name")).unwrap(), "[h].[name]");
    }

    #[test]
    fn test_arithmetic_parenthesizes() {
        let dialect = knowledge::sqlserver();
        let meta = meta();
        let mut c = ExprCompiler::new(&dialect, &meta, None);
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::column("Age"),
            Expr::constant(1i32),
        );
        assert_eq!(c.compile(&expr).unwrap(), "([age] + 1)");
    }

    #[test]
    fn test_concat_follows_dialect() {
        let meta = meta();
        let parts = Expr::Concat(vec![Expr::column("Name"), Expr::constant("!")]);

        let pg = knowledge::postgres();
        let mut c = ExprCompiler::new(&pg, &meta, None);
        assert_eq!(c.compile(&parts).unwrap(), "\"name\" || '!'");

        let my = knowledge::mysql();
        let mut c = ExprCompiler::new(&my, &meta, None);
        assert_eq!(c.compile(&parts).unwrap(), "CONCAT(`name`, '!')");
    }

    #[test]
    fn test_nested_member_path_is_unsupported() {
        let dialect = knowledge::sqlserver();
        let meta = meta();
        let mut c = ExprCompiler::new(&dialect, &meta, None);
        let err = c
            .compile(&Expr::Column(vec!["Address".to_string(), "City".to_string()]))
            .unwrap_err();
        assert!(matches!(
            err,
            sqlwarden_core::Error::Conversion(ConversionError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let dialect = knowledge::sqlserver();
        let meta = meta();
        let mut c = ExprCompiler::new(&dialect, &meta, None);
        assert!(c.compile(&Expr::column("Bogus")).is_err());
    }
}
