//! Per-save session context.

use std::time::{SystemTime, UNIX_EPOCH};

use sqlwarden_core::AccessLevel;

/// Microseconds in one day.
const MICROS_PER_DAY: i64 = 86_400_000_000;

fn system_now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Ambient state for one save invocation.
///
/// Carries the identity stamped by current-user rules, the seed-mode and
/// strict-mode flags, the context-wide default access level used when an
/// entity has no access annotation, and an injectable clock so auto-now
/// rules are testable.
#[derive(Clone)]
pub struct SessionContext {
    /// Identity stamped by current-user rules.
    pub user: Option<String>,
    /// Bulk-load exemption: grants Insert unconditionally.
    pub seed_mode: bool,
    /// Raise `PermissionDenied` instead of silently filtering.
    pub strict: bool,
    /// Access level assumed for entities without access annotations.
    pub default_access: AccessLevel,
    clock: fn() -> i64,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user)
            .field("seed_mode", &self.seed_mode)
            .field("strict", &self.strict)
            .field("default_access", &self.default_access)
            .finish()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            user: None,
            seed_mode: false,
            strict: false,
            default_access: AccessLevel::READ_ONLY,
            clock: system_now_micros,
        }
    }
}

impl SessionContext {
    /// A context with defaults: no user, non-strict, read-only default
    /// access, system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current user identity.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Enable seed mode (unconditional Insert access).
    pub fn with_seed_mode(mut self) -> Self {
        self.seed_mode = true;
        self
    }

    /// Enable strict mode (policy violations raise instead of filtering).
    pub fn with_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Set the context-wide default access level.
    pub fn with_default_access(mut self, level: AccessLevel) -> Self {
        self.default_access = level;
        self
    }

    /// Replace the clock. Test hook for deterministic timestamps.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Current time in microseconds since the Unix epoch.
    pub fn now_micros(&self) -> i64 {
        (self.clock)()
    }

    /// Current date in days since the Unix epoch.
    pub fn today_days(&self) -> i32 {
        i32::try_from(self.now_micros() / MICROS_PER_DAY).unwrap_or(0)
    }
}
