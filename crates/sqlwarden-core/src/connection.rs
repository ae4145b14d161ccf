//! Synchronous driver seam and connection-lifetime discipline.
//!
//! SQLWarden introduces no threading or async scheduling of its own: every
//! command executes on the caller's thread through this trait. Callers keep
//! ownership of connection lifetime; `ScopedOpen` opens a closed or broken
//! connection before a command and closes it again afterward **only if it
//! opened it** — a connection found already open is never closed here, so
//! nested calls sharing an externally-managed connection do not leak or lose
//! it.

use crate::error::Result;
use crate::value::Value;

/// Connection state as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not currently usable; must be opened.
    Closed,
    /// Ready for commands.
    Open,
    /// Faulted; must be reopened before use.
    Broken,
}

/// An opaque transaction handle.
///
/// Generated commands are transaction-aware: a handle obtained from
/// `begin_transaction` may be attached per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(pub u64);

/// A named command parameter.
pub type Param = (String, Value);

/// The synchronous database driver contract.
///
/// Timeouts are whatever the underlying driver's command default is; there
/// is no cancellation support in the core commands.
pub trait Connection {
    /// Provider identifier used for dialect lookup (e.g.
    /// `"Microsoft.Data.SqlClient"`, `"sqlite"`).
    fn provider_name(&self) -> &str;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Open the connection. Reopens a broken connection.
    fn open(&mut self) -> Result<()>;

    /// Close the connection.
    fn close(&mut self);

    /// Begin a transaction, returning an opaque handle.
    fn begin_transaction(&mut self) -> Result<TxHandle>;

    /// Commit a transaction.
    fn commit(&mut self, tx: TxHandle) -> Result<()>;

    /// Roll back a transaction.
    fn rollback(&mut self, tx: TxHandle) -> Result<()>;

    /// Execute a non-query command, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[Param], tx: Option<TxHandle>) -> Result<u64>;

    /// Execute a query returning a single scalar value, or `None` for an
    /// empty result.
    fn query_scalar(
        &mut self,
        sql: &str,
        params: &[Param],
        tx: Option<TxHandle>,
    ) -> Result<Option<Value>>;
}

/// Scoped open/close guard for one command execution.
///
/// Opens the connection if it was closed or broken and closes it on drop
/// only in that case.
pub struct ScopedOpen<'a> {
    conn: &'a mut dyn Connection,
    opened_here: bool,
}

impl<'a> ScopedOpen<'a> {
    /// Acquire the connection for one command, opening it when necessary.
    pub fn acquire(conn: &'a mut dyn Connection) -> Result<Self> {
        let opened_here = conn.state() != ConnectionState::Open;
        if opened_here {
            tracing::trace!(provider = conn.provider_name(), "Opening connection");
            conn.open()?;
        }
        Ok(Self { conn, opened_here })
    }

    /// The guarded connection.
    pub fn conn(&mut self) -> &mut dyn Connection {
        self.conn
    }

    /// Whether this guard opened the connection itself.
    pub fn opened_here(&self) -> bool {
        self.opened_here
    }
}

impl Drop for ScopedOpen<'_> {
    fn drop(&mut self) {
        if self.opened_here {
            tracing::trace!(provider = self.conn.provider_name(), "Closing connection");
            self.conn.close();
        }
    }
}
