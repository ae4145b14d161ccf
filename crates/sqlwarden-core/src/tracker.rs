//! Change-tracking snapshot for one save call.
//!
//! The host ORM owns the real change tracker. For the duration of a single
//! save invocation SQLWarden works on this snapshot: entries with a state,
//! original (last persisted) values, and current values. The save
//! interceptor may detach an added entry, revert a modified or deleted entry
//! to its store values, or mark a property modified before the changes are
//! applied.

use std::collections::{HashMap, HashSet};

use crate::access::SaveOperation;
use crate::connection::Connection;
use crate::entity::Record;
use crate::error::Result;
use crate::value::Value;

/// State of a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// New entity, pending INSERT.
    Added,
    /// Existing entity with modified properties, pending UPDATE.
    Modified,
    /// Existing entity marked for removal, pending DELETE.
    Deleted,
    /// Existing entity with no pending changes.
    Unchanged,
    /// Entity no longer tracked.
    Detached,
}

/// One tracked entity within a save call.
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    record: Record,
    state: EntryState,
    /// Last known persisted values. Empty for added entries.
    original: HashMap<String, Value>,
    /// Properties flagged as modified.
    modified: HashSet<String>,
}

impl ChangeEntry {
    /// Track a newly added entity.
    pub fn added(record: Record) -> Self {
        Self {
            record,
            state: EntryState::Added,
            original: HashMap::new(),
            modified: HashSet::new(),
        }
    }

    /// Track an entity loaded from the store; its current values become the
    /// original snapshot.
    pub fn from_store(record: Record) -> Self {
        let original = record.values().clone();
        Self {
            record,
            state: EntryState::Unchanged,
            original,
            modified: HashSet::new(),
        }
    }

    /// The tracked record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Mutable access to the tracked record. Does not flip the state;
    /// use `set_current` for tracked property writes.
    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    /// The entry state.
    pub fn state(&self) -> EntryState {
        self.state
    }

    /// The save operation this entry requests, if any.
    pub fn operation(&self) -> Option<SaveOperation> {
        match self.state {
            EntryState::Added => Some(SaveOperation::Insert),
            EntryState::Modified => Some(SaveOperation::Update),
            EntryState::Deleted => Some(SaveOperation::Delete),
            EntryState::Unchanged | EntryState::Detached => None,
        }
    }

    /// Current value of a property.
    pub fn current(&self, property: &str) -> Value {
        self.record.get_or_null(property)
    }

    /// Original (last persisted) value of a property.
    ///
    /// Concurrency-token predicates always compare against this, never the
    /// current value.
    pub fn original(&self, property: &str) -> Value {
        self.original.get(property).cloned().unwrap_or(Value::Null)
    }

    /// Write a current value and mark the property modified.
    pub fn set_current(&mut self, property: impl Into<String>, value: Value) {
        let property = property.into();
        self.record.set(property.clone(), value);
        self.mark_modified(property);
    }

    /// Flag a property as modified, flipping an unchanged entry to
    /// `Modified`.
    pub fn mark_modified(&mut self, property: impl Into<String>) {
        self.modified.insert(property.into());
        if self.state == EntryState::Unchanged {
            self.state = EntryState::Modified;
        }
    }

    /// Mark the entry for deletion.
    pub fn mark_deleted(&mut self) {
        if self.state != EntryState::Detached {
            self.state = EntryState::Deleted;
        }
    }

    /// Properties flagged as modified.
    pub fn modified_properties(&self) -> &HashSet<String> {
        &self.modified
    }

    /// Detach the entry from the save entirely. Used when a disallowed
    /// insert is silently dropped.
    pub fn detach(&mut self) {
        tracing::debug!(entity = self.record.entity(), "Detaching entry");
        self.state = EntryState::Detached;
        self.modified.clear();
    }

    /// Revert the entry to its last persisted values (reload-from-store
    /// semantics). Used when a disallowed update or delete is silently
    /// dropped: the change vanishes from the save.
    pub fn revert_to_store(&mut self) {
        tracing::debug!(entity = self.record.entity(), "Reverting entry to store values");
        self.record.replace_values(self.original.clone());
        self.modified.clear();
        self.state = EntryState::Unchanged;
    }
}

/// The pending change set for one save call.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an entry.
    pub fn push(&mut self, entry: ChangeEntry) {
        self.entries.push(entry);
    }

    /// All entries.
    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    /// Mutable access to all entries.
    pub fn entries_mut(&mut self) -> &mut [ChangeEntry] {
        &mut self.entries
    }

    /// Entries with a pending operation (Added/Modified/Deleted).
    pub fn pending(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter().filter(|e| e.operation().is_some())
    }

    /// Count of entries with a pending operation.
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }
}

/// The seam between the save interceptor and whatever applies changes.
///
/// `sqlwarden-command` provides a direct implementation; a host ORM can
/// provide its own native save instead.
pub trait SaveDelegate {
    /// Apply the pending changes, returning the total affected row count.
    fn save(&mut self, changes: &mut ChangeSet, conn: &mut dyn Connection) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_entry_operation() {
        let entry = ChangeEntry::added(Record::new("Hero"));
        assert_eq!(entry.state(), EntryState::Added);
        assert_eq!(entry.operation(), Some(SaveOperation::Insert));
    }

    #[test]
    fn test_set_current_flips_unchanged_to_modified() {
        let rec = Record::new("Hero").with("Name", "Alice");
        let mut entry = ChangeEntry::from_store(rec);
        assert_eq!(entry.operation(), None);

        entry.set_current("Name", Value::Text("Bob".to_string()));
        assert_eq!(entry.state(), EntryState::Modified);
        assert_eq!(entry.current("Name"), Value::Text("Bob".to_string()));
        assert_eq!(entry.original("Name"), Value::Text("Alice".to_string()));
    }

    #[test]
    fn test_revert_to_store_clears_the_change() {
        let rec = Record::new("Hero").with("Name", "Alice");
        let mut entry = ChangeEntry::from_store(rec);
        entry.set_current("Name", Value::Text("Bob".to_string()));

        entry.revert_to_store();
        assert_eq!(entry.state(), EntryState::Unchanged);
        assert_eq!(entry.current("Name"), Value::Text("Alice".to_string()));
        assert!(entry.modified_properties().is_empty());
    }

    #[test]
    fn test_detach_removes_from_pending() {
        let mut changes = ChangeSet::new();
        changes.push(ChangeEntry::added(Record::new("Hero")));
        assert_eq!(changes.pending_count(), 1);

        changes.entries_mut()[0].detach();
        assert_eq!(changes.pending_count(), 0);
    }

    #[test]
    fn test_delete_then_operation() {
        let mut entry = ChangeEntry::from_store(Record::new("Hero").with("Id", Value::BigInt(1)));
        entry.mark_deleted();
        assert_eq!(entry.operation(), Some(SaveOperation::Delete));
    }
}
