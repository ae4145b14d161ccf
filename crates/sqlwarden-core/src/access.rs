//! Access-level bitmask and save operation kinds.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Capability bitmask governing which save operations are permitted for
    /// an entity type or instance.
    ///
    /// Insert, Update, and Delete are each independently grantable;
    /// `READ_ONLY` is the empty mask and `FULL` grants all three.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessLevel: u8 {
        /// New rows may be inserted.
        const INSERT = 0b0001;
        /// Existing rows may be updated.
        const UPDATE = 0b0010;
        /// Existing rows may be deleted.
        const DELETE = 0b0100;
    }
}

impl AccessLevel {
    /// No save operation is permitted.
    pub const READ_ONLY: AccessLevel = AccessLevel::empty();
    /// All save operations are permitted.
    pub const FULL: AccessLevel = AccessLevel::all();

    /// Whether the given operation is covered by this level.
    pub fn permits(self, operation: SaveOperation) -> bool {
        self.contains(operation.required_access())
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "ReadOnly");
        }
        if *self == AccessLevel::FULL {
            return write!(f, "FullAccess");
        }
        let mut parts = Vec::new();
        if self.contains(AccessLevel::INSERT) {
            parts.push("Insert");
        }
        if self.contains(AccessLevel::UPDATE) {
            parts.push("Update");
        }
        if self.contains(AccessLevel::DELETE) {
            parts.push("Delete");
        }
        write!(f, "{}", parts.join("|"))
    }
}

/// The kind of save operation requested for a pending change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveOperation {
    /// INSERT of a newly added entity.
    Insert,
    /// UPDATE of a modified entity.
    Update,
    /// DELETE (or soft-delete) of a removed entity.
    Delete,
}

impl SaveOperation {
    /// The access bit this operation requires.
    pub fn required_access(self) -> AccessLevel {
        match self {
            SaveOperation::Insert => AccessLevel::INSERT,
            SaveOperation::Update => AccessLevel::UPDATE,
            SaveOperation::Delete => AccessLevel::DELETE,
        }
    }
}

impl fmt::Display for SaveOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaveOperation::Insert => "Insert",
            SaveOperation::Update => "Update",
            SaveOperation::Delete => "Delete",
        };
        write!(f, "{s}")
    }
}
