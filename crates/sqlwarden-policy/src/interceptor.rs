//! The save pipeline interceptor.
//!
//! Wraps the underlying save in two phases:
//!
//! 1. **Filter** every pending entry through the access policy. In strict
//!    mode the first violation raises before any SQL executes; otherwise a
//!    denied insert is detached and a denied update/delete is reverted to
//!    its last persisted values, so the change vanishes from the save with
//!    zero rows affected.
//! 2. **Rules** run on the surviving entries: runtime defaults (added
//!    only), auto-update values (added/modified), then string formats (any
//!    operation). The order is a guarantee — format last means formatted
//!    final stored form.
//!
//! The prepared change set is then handed to the `SaveDelegate`.

use sqlwarden_core::{
    ChangeSet, Connection, EntryState, ModelRegistry, Result, SaveDelegate,
};

use crate::evaluator::{AccessPolicy, ChangeVerdict};
use crate::rules::RuleRegistry;
use crate::session::SessionContext;

/// Filters and enriches a pending change set, then delegates the save.
pub struct SaveInterceptor {
    policy: AccessPolicy,
    rules: RuleRegistry,
}

impl SaveInterceptor {
    /// Create an interceptor from a policy evaluator and rule registry.
    pub fn new(policy: AccessPolicy, rules: RuleRegistry) -> Self {
        Self { policy, rules }
    }

    /// Run the filter and rule phases without saving.
    ///
    /// Exposed separately so hosts with their own change application can
    /// reuse the pipeline.
    #[tracing::instrument(level = "debug", skip_all, fields(pending = changes.pending_count()))]
    pub fn prepare(
        &self,
        registry: &ModelRegistry,
        session: &SessionContext,
        changes: &mut ChangeSet,
    ) -> Result<()> {
        // Phase 1: access filter. Judge everything first so strict mode
        // raises before any entry is mutated.
        let mut verdicts = Vec::with_capacity(changes.entries().len());
        for entry in changes.entries() {
            verdicts.push(self.policy.judge(registry, entry, session)?);
        }
        for (entry, verdict) in changes.entries_mut().iter_mut().zip(verdicts) {
            match verdict {
                ChangeVerdict::Permitted => {}
                ChangeVerdict::DropInsert => entry.detach(),
                ChangeVerdict::RevertChange => entry.revert_to_store(),
            }
        }

        // Phase 2: declarative rules on what survived.
        for entry in changes.entries_mut() {
            match entry.state() {
                EntryState::Added => {
                    self.rules.apply_defaults(entry, session);
                    self.rules.apply_auto_updates(entry, session);
                    self.rules.apply_formats(entry);
                }
                EntryState::Modified => {
                    self.rules.apply_auto_updates(entry, session);
                    self.rules.apply_formats(entry);
                }
                EntryState::Deleted => {
                    self.rules.apply_formats(entry);
                }
                EntryState::Unchanged | EntryState::Detached => {}
            }
        }

        Ok(())
    }

    /// Filter, apply rules, and delegate to the underlying save.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn save(
        &self,
        registry: &ModelRegistry,
        session: &SessionContext,
        changes: &mut ChangeSet,
        delegate: &mut dyn SaveDelegate,
        conn: &mut dyn Connection,
    ) -> Result<u64> {
        self.prepare(registry, session, changes)?;

        let pending = changes.pending_count();
        if pending == 0 {
            tracing::debug!("Nothing to save after policy filtering");
            return Ok(0);
        }

        tracing::info!(pending, "Delegating save");
        delegate.save(changes, conn)
    }
}
