//! Core types and traits for SQLWarden.
//!
//! `sqlwarden-core` is the **foundation layer** for the entire workspace. It defines the
//! data model and contracts that all other crates build on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Connection` is the synchronous driver seam; `SaveDelegate` is
//!   the seam between the save interceptor and whatever applies changes.
//! - **Data model**: `Value`, `SqlType`, `EntityMeta`, and `Record` describe mapped
//!   entities and their runtime instances.
//! - **Change tracking snapshot**: `ChangeEntry`/`ChangeSet` mirror the host ORM's
//!   pending change set for the duration of one save call.
//! - **Access model**: `AccessLevel` is the Insert/Update/Delete capability bitmask
//!   consumed by the policy evaluator.
//!
//! # Who Uses This Crate
//!
//! - `sqlwarden-dialect` keys its type-name provider off `SqlType`.
//! - `sqlwarden-policy` evaluates `AccessLevel` and mutates `ChangeEntry` state.
//! - `sqlwarden-command` reads `EntityMeta` and executes through `Connection`.
//! - `sqlwarden-rewrite` compiles `Value` constants and resolves columns via `EntityMeta`.
//!
//! Most applications should use the `sqlwarden` facade; reach for `sqlwarden-core`
//! directly when embedding the layer into a host ORM.

pub mod access;
pub mod connection;
pub mod entity;
pub mod error;
pub mod meta;
pub mod tracker;
pub mod types;
pub mod value;

pub use access::{AccessLevel, SaveOperation};
pub use connection::{Connection, ConnectionState, Param, ScopedOpen, TxHandle};
pub use entity::Record;
pub use error::{ConversionError, Error, PropertySetViolation, Result};
pub use meta::{Accessor, EntityMeta, IndexMeta, ModelRegistry, PropertyMeta};
pub use tracker::{ChangeEntry, ChangeSet, EntryState, SaveDelegate};
pub use types::{SqlType, TypeHint};
pub use value::Value;
