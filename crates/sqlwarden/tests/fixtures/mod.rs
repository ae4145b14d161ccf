//! Scripted in-memory connection shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use sqlwarden::prelude::*;

/// Records every statement and serves scripted results.
///
/// `affected` and `scalars` are queues popped per call; when empty, execute
/// reports one affected row and scalar queries return `BigInt(1)`.
pub struct MemoryConnection {
    provider: &'static str,
    state: ConnectionState,
    affected: VecDeque<u64>,
    scalars: VecDeque<Option<Value>>,
    pub executed: Vec<(String, Vec<Param>)>,
    pub opened: usize,
    pub closed: usize,
}

impl MemoryConnection {
    /// A connection that is already open.
    pub fn open_on(provider: &'static str) -> Self {
        Self {
            provider,
            state: ConnectionState::Open,
            affected: VecDeque::new(),
            scalars: VecDeque::new(),
            executed: Vec::new(),
            opened: 0,
            closed: 0,
        }
    }

    /// A connection that starts closed.
    pub fn closed_on(provider: &'static str) -> Self {
        Self {
            state: ConnectionState::Closed,
            ..Self::open_on(provider)
        }
    }

    /// Script the affected-row count for the next execute call.
    pub fn push_affected(&mut self, n: u64) {
        self.affected.push_back(n);
    }

    /// Script the result of the next scalar query.
    pub fn push_scalar(&mut self, value: Option<Value>) {
        self.scalars.push_back(value);
    }

    /// Every executed statement text, in order.
    pub fn statements(&self) -> Vec<&str> {
        self.executed.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

impl Connection for MemoryConnection {
    fn provider_name(&self) -> &str {
        self.provider
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn open(&mut self) -> Result<()> {
        self.state = ConnectionState::Open;
        self.opened += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.state = ConnectionState::Closed;
        self.closed += 1;
    }

    fn begin_transaction(&mut self) -> Result<TxHandle> {
        Ok(TxHandle(1))
    }

    fn commit(&mut self, _tx: TxHandle) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self, _tx: TxHandle) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Param], _tx: Option<TxHandle>) -> Result<u64> {
        self.executed.push((sql.to_string(), params.to_vec()));
        Ok(self.affected.pop_front().unwrap_or(1))
    }

    fn query_scalar(
        &mut self,
        sql: &str,
        params: &[Param],
        _tx: Option<TxHandle>,
    ) -> Result<Option<Value>> {
        self.executed.push((sql.to_string(), params.to_vec()));
        Ok(self
            .scalars
            .pop_front()
            .unwrap_or(Some(Value::BigInt(1))))
    }
}

/// A registry with the entities the integration tests share.
pub fn hero_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register(
        EntityMeta::new("Hero", "heroes")
            .property(
                PropertyMeta::new("Id", "id")
                    .column_type("BIGINT")
                    .primary_key()
                    .auto_generated(),
            )
            .property(PropertyMeta::new("Name", "name").column_type("VARCHAR(100)"))
            .property(PropertyMeta::new("Touched", "touched").column_type("DATETIME2"))
            .property(
                PropertyMeta::new("Version", "version")
                    .column_type("BIGINT")
                    .concurrency_token(),
            )
            .access(AccessLevel::INSERT)
            .access(AccessLevel::UPDATE),
    );
    registry.register(
        EntityMeta::new("Relic", "relics")
            .property(
                PropertyMeta::new("Id", "id")
                    .column_type("BIGINT")
                    .primary_key()
                    .auto_generated(),
            )
            .property(PropertyMeta::new("Name", "name").column_type("VARCHAR(100)")),
    );
    registry
}
