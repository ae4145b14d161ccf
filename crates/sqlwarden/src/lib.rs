//! SQLWarden: policy and code generation on top of a host relational-object
//! mapper.
//!
//! The workspace splits along concerns:
//!
//! - [`sqlwarden_core`]: values, entity metadata, change tracking, the
//!   connection trait, and the error taxonomy.
//! - [`sqlwarden_dialect`]: per-engine syntax knowledge and the pattern
//!   registry resolving a provider identifier to it.
//! - [`sqlwarden_policy`]: access-level evaluation, the declarative rule
//!   registry (runtime defaults, auto-update stamps, string formats), the
//!   save interceptor, and uniqueness pre-validation.
//! - [`sqlwarden_command`]: hand-built parameterized INSERT/UPDATE/DELETE
//!   commands with concurrency-token predicates, and the stock save
//!   delegate over them.
//! - [`sqlwarden_rewrite`]: the clause-ripping grammar and the
//!   SELECT-to-UPDATE/DELETE rewriter with its value-expression compiler.
//!
//! This facade re-exports each crate and bundles the common names in
//! [`prelude`].

pub use sqlwarden_command as command;
pub use sqlwarden_core as model;
pub use sqlwarden_dialect as dialect;
pub use sqlwarden_policy as policy;
pub use sqlwarden_rewrite as rewrite;

/// The names most integrations need.
pub mod prelude {
    pub use sqlwarden_core::{
        AccessLevel, ChangeEntry, ChangeSet, Connection, ConnectionState, ConversionError,
        EntityMeta, EntryState, Error, IndexMeta, ModelRegistry, Param, PropertyMeta, Record,
        Result, SaveDelegate, SaveOperation, ScopedOpen, SqlType, TxHandle, TypeHint, Value,
    };
    pub use sqlwarden_dialect::{ConcatMode, DialectKnowledge, DialectRegistry};
    pub use sqlwarden_policy::{
        AccessPolicy, RuleRegistry, SaveInterceptor, SessionContext, validate_unique_indexes,
    };
    pub use sqlwarden_command::{
        CommandConfig, CommandKind, DirectCommandBuilder, DirectSaver, GeneratedCommand,
        RemoveStrategy,
    };
    pub use sqlwarden_rewrite::{
        BinaryOp, CompiledQuery, Expr, ParameterizedStatement, QueryIntrospector, StatementKind,
        TableRef, UnaryOp, UpdateSet,
    };
}
