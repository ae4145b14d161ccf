//! Direct DML command generation for SQLWarden.
//!
//! `DirectCommandBuilder` hand-builds parameterized INSERT/UPDATE/DELETE
//! commands from entity metadata, bypassing the host ORM's native
//! change-application path. Command text is built once per operation kind
//! and cached for the builder's lifetime — only parameter values vary
//! between entities, never the SQL.
//!
//! `DirectSaver` applies a whole change set through cached builders and is
//! the stock `SaveDelegate` implementation for the save interceptor.

pub mod builder;
pub mod saver;

pub use builder::{CommandConfig, CommandKind, DirectCommandBuilder, GeneratedCommand, RemoveStrategy};
pub use saver::DirectSaver;
