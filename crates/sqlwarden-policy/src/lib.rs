//! Access policy and declarative save rules for SQLWarden.
//!
//! This crate wraps a host ORM's save operation with two concerns:
//!
//! - **Access policy**: a per-type or per-instance Insert/Update/Delete
//!   capability check. Disallowed changes are silently dropped (detached or
//!   reverted to store values) by default, or raised as `PermissionDenied`
//!   in strict mode — before any SQL executes.
//! - **Declarative rules**: runtime defaults for inserted entities,
//!   auto-update values recomputed on every save, and string case
//!   normalization. Rules are registered in a typed table keyed by
//!   (entity, property), not discovered by attribute scanning.
//!
//! Uniqueness pre-validation (a `COUNT(*)` existence probe driven by index
//! annotations) lives here too, but runs entirely outside the save
//! pipeline.

pub mod evaluator;
pub mod interceptor;
pub mod rules;
pub mod session;
pub mod validation;

pub use evaluator::{AccessPolicy, ChangeVerdict};
pub use interceptor::SaveInterceptor;
pub use rules::{
    AutoUpdateProvider, CurrentUserDefault, CurrentUserOnSave, DefaultValueProvider, Lowercase,
    NowDefault, NowOnSave, RuleRegistry, StringFormat, TodayDefault, Uppercase,
};
pub use session::SessionContext;
pub use validation::validate_unique_indexes;
