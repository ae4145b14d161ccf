//! SQL dialect knowledge for SQLWarden.
//!
//! Different engines disagree on the syntax details the command builder and
//! rewriter depend on: identifier quoting, string concatenation,
//! last-inserted-id retrieval, and whether UPDATE/DELETE statements accept
//! table aliases or FROM clauses. `DialectKnowledge` captures those facts as
//! immutable data; `DialectRegistry` resolves a provider identifier to the
//! right knowledge by pattern match.
//!
//! The registry is an explicit value threaded into the components that need
//! it — construct one at startup, register any custom dialects, and pass it
//! to the command builder and rewriter. There is no ambient process-wide
//! registry.

pub mod knowledge;
pub mod registry;
pub mod type_names;

pub use knowledge::{ConcatMode, DialectKnowledge};
pub use registry::DialectRegistry;
