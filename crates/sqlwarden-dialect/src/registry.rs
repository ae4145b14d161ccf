//! Provider-to-dialect resolution.

use std::sync::{Arc, Mutex};

use regex::Regex;
use sqlwarden_core::{Connection, Error, Result};

use crate::knowledge::{self, DialectKnowledge};

struct RegisteredDialect {
    pattern: Regex,
    knowledge: Arc<DialectKnowledge>,
}

/// Registry of dialect knowledge, looked up by provider identifier.
///
/// Registration is a startup-time configuration step; the resulting registry
/// is threaded through the constructors of the command builder and
/// rewriter. Lookup and registration share a lock — the list is read-mostly
/// and appended to rarely.
pub struct DialectRegistry {
    entries: Mutex<Vec<RegisteredDialect>>,
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl DialectRegistry {
    /// A registry with no built-in dialects.
    pub fn empty() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// A registry preloaded with the built-in engines: SQL Server,
    /// PostgreSQL, MySQL, and SQLite.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for dialect in [
            knowledge::sqlserver(),
            knowledge::postgres(),
            knowledge::mysql(),
            knowledge::sqlite(),
        ] {
            // Built-in patterns are static and known-valid.
            registry
                .register(dialect)
                .unwrap_or_else(|e| unreachable!("built-in dialect pattern invalid: {e}"));
        }
        registry
    }

    /// Register dialect knowledge.
    ///
    /// New registrations are inserted ahead of existing ones, so a custom
    /// dialect takes priority over the built-ins it shadows.
    pub fn register(&self, dialect: DialectKnowledge) -> Result<()> {
        if dialect.name.is_empty() {
            return Err(Error::UnknownDialect {
                provider: "<unnamed dialect>".to_string(),
            });
        }
        let pattern = Regex::new(&dialect.provider_pattern).map_err(|e| Error::UnknownDialect {
            provider: format!("{} (bad pattern: {e})", dialect.name),
        })?;
        tracing::debug!(dialect = %dialect.name, pattern = %dialect.provider_pattern, "Registering dialect");

        let mut entries = self.entries.lock().expect("dialect registry poisoned");
        entries.insert(
            0,
            RegisteredDialect {
                pattern,
                knowledge: Arc::new(dialect),
            },
        );
        Ok(())
    }

    /// Resolve dialect knowledge for a provider identifier. First match
    /// wins.
    pub fn for_provider(&self, provider: &str) -> Result<Arc<DialectKnowledge>> {
        let entries = self.entries.lock().expect("dialect registry poisoned");
        entries
            .iter()
            .find(|e| e.pattern.is_match(provider))
            .map(|e| Arc::clone(&e.knowledge))
            .ok_or_else(|| Error::UnknownDialect {
                provider: provider.to_string(),
            })
    }

    /// Resolve dialect knowledge for a live connection.
    pub fn for_connection(&self, conn: &dyn Connection) -> Result<Arc<DialectKnowledge>> {
        self.for_provider(conn.provider_name())
    }
}
