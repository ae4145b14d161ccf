//! SELECT-to-UPDATE/DELETE rewriting for SQLWarden.
//!
//! A compiled read query already carries everything a bulk write needs: the
//! FROM clause, the WHERE predicate, and the bound parameter values. This
//! crate rips those clauses out of the final SQL text and reassembles them
//! into a single UPDATE or DELETE statement, shaped per the dialect's
//! alias/FROM capabilities.
//!
//! This is **not** a general SQL parser. The clause grammar assumes text
//! produced by one known query-compilation engine and exploits its
//! structural regularities:
//!
//! - quoted strings and quoted identifiers are atomic at the top level;
//! - a parenthesized group is consumed by raw bracket counting and never
//!   re-parsed. A string literal containing an unbalanced parenthesis
//!   *inside* a parenthesized group can therefore break clause extraction.
//!   Known limitation, deliberately left as-is.
//!
//! Conversions fail whole or succeed whole: a grouped SELECT, a WITH-clause
//! SELECT, or an unresolvable table alias raises a named
//! [`ConversionError`](sqlwarden_core::ConversionError), never a partial
//! rewrite.

pub mod clause;
pub mod compile;
pub mod convert;
pub mod expr;
pub mod introspect;
pub mod statement;

pub use clause::RippedClauses;
pub use expr::{BinaryOp, Expr, UnaryOp, UpdateSet};
pub use introspect::{CompiledQuery, QueryIntrospector, TableRef};
pub use statement::{ParameterizedStatement, StatementKind};
