//! Move tracking for Move-category bindings.
//!
//! Only bindings whose type is Move-category carry a record; Copy bindings
//! are absent and may be re-read freely. Moves are advisory: reading a
//! moved binding produces a warning, never an error.

use crate::ty::{Category, Type};
use crate::undo::{Checkpoint, UndoMap};

/// Where a binding was moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSite {
    pub line: u32,
    /// The receiving name, `"function call"`, or `"return"`.
    pub destination: String,
}

/// Ownership state of a tracked binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarOwnership {
    Owned,
    Moved(MoveSite),
}

#[derive(Debug, Default)]
pub struct OwnershipTracker {
    records: UndoMap<VarOwnership>,
}

impl OwnershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)initialize `name` for a fresh binding of type `ty`. A new binding
    /// always starts Owned, whatever an earlier binding of the name did.
    pub fn track(&mut self, name: &str, ty: &Type) {
        match ty.category() {
            Category::Move => self.records.insert(name, VarOwnership::Owned),
            Category::Copy => self.records.remove(name),
        }
    }

    /// Owned → Moved. No-op for untracked or already moved bindings.
    /// Returns whether a transition happened.
    pub fn mark_moved(&mut self, name: &str, line: u32, destination: &str) -> bool {
        if self.records.get(name) != Some(&VarOwnership::Owned) {
            return false;
        }
        self.records.insert(
            name,
            VarOwnership::Moved(MoveSite {
                line,
                destination: destination.to_string(),
            }),
        );
        tracing::debug!(name, line, destination, "value moved");
        true
    }

    pub fn state(&self, name: &str) -> Option<&VarOwnership> {
        self.records.get(name)
    }

    /// Put back a record saved with [`state`](Self::state); `None` means
    /// the name was untracked.
    pub fn restore(&mut self, name: &str, record: Option<VarOwnership>) {
        match record {
            Some(record) => self.records.insert(name, record),
            None => self.records.remove(name),
        }
    }

    /// The move site if `name` is currently Moved.
    pub fn moved_at(&self, name: &str) -> Option<&MoveSite> {
        match self.records.get(name) {
            Some(VarOwnership::Moved(site)) => Some(site),
            _ => None,
        }
    }

    pub fn is_moved(&self, name: &str) -> bool {
        self.moved_at(name).is_some()
    }

    pub fn push(&mut self) -> Checkpoint {
        self.records.push()
    }

    pub fn pop(&mut self, checkpoint: Checkpoint) {
        self.records.pop(checkpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_types_are_not_tracked() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("n", &Type::Int);
        assert_eq!(tracker.state("n"), None);
        assert!(!tracker.mark_moved("n", 1, "m"));
    }

    #[test]
    fn test_move_records_site() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("s", &Type::String);
        assert!(tracker.mark_moved("s", 3, "t"));
        let site = tracker.moved_at("s").cloned();
        assert_eq!(
            site,
            Some(MoveSite {
                line: 3,
                destination: "t".into()
            })
        );
    }

    #[test]
    fn test_second_move_keeps_first_site() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("s", &Type::String);
        tracker.mark_moved("s", 3, "t");
        assert!(!tracker.mark_moved("s", 5, "return"));
        assert_eq!(tracker.moved_at("s").map(|s| s.line), Some(3));
    }

    #[test]
    fn test_track_resets_moved_binding() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("s", &Type::String);
        tracker.mark_moved("s", 1, "t");
        tracker.track("s", &Type::String);
        assert_eq!(tracker.state("s"), Some(&VarOwnership::Owned));
    }

    #[test]
    fn test_rebinding_as_copy_drops_record() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("v", &Type::String);
        tracker.track("v", &Type::Int);
        assert_eq!(tracker.state("v"), None);
    }

    #[test]
    fn test_restore_puts_back_shadowed_record() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("s", &Type::String);
        tracker.mark_moved("s", 1, "t");
        let saved = tracker.state("s").cloned();
        tracker.track("s", &Type::String);
        assert!(!tracker.is_moved("s"));
        tracker.restore("s", saved);
        assert_eq!(tracker.moved_at("s").map(|s| s.line), Some(1));

        tracker.track("n", &Type::String);
        tracker.restore("n", None);
        assert_eq!(tracker.state("n"), None);
    }

    #[test]
    fn test_moves_inside_frame_are_discarded() {
        let mut tracker = OwnershipTracker::new();
        tracker.track("s", &Type::String);
        let cp = tracker.push();
        tracker.mark_moved("s", 2, "function call");
        assert!(tracker.is_moved("s"));
        tracker.pop(cp);
        assert!(!tracker.is_moved("s"));
    }
}
