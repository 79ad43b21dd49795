//! Borrow bookkeeping per binding.
//!
//! Borrows never expire mid-block: counts accumulate until the enclosing
//! frame is popped, at which point everything registered inside it is
//! discarded.

use std::fmt;

use crate::undo::{Checkpoint, UndoMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowInfo {
    pub immutable_count: u32,
    pub mutable_active: bool,
}

impl BorrowInfo {
    pub fn is_active(&self) -> bool {
        self.immutable_count > 0 || self.mutable_active
    }
}

/// A conflicting borrow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowConflict {
    /// `&mut x` while `&x` is live.
    MutWhileShared,
    /// `&mut x` while another `&mut x` is live.
    MutWhileMut,
    /// `&x` while `&mut x` is live.
    SharedWhileMut,
}

impl fmt::Display for BorrowConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowConflict::MutWhileShared => {
                write!(f, "cannot mutably borrow: already immutably borrowed")
            }
            BorrowConflict::MutWhileMut => {
                write!(f, "cannot mutably borrow: already mutably borrowed")
            }
            BorrowConflict::SharedWhileMut => {
                write!(f, "cannot immutably borrow: already mutably borrowed")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct BorrowTracker {
    borrows: UndoMap<BorrowInfo>,
}

impl BorrowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a borrow of `name` and report every rule it breaks. The
    /// borrow is recorded even when it conflicts.
    pub fn borrow(&mut self, name: &str, mutable: bool) -> Vec<BorrowConflict> {
        if !self.borrows.contains_key(name) {
            self.borrows.insert(name, BorrowInfo::default());
        }
        let mut conflicts = Vec::new();
        self.borrows.update(name, |info| {
            if mutable {
                if info.immutable_count > 0 {
                    conflicts.push(BorrowConflict::MutWhileShared);
                }
                if info.mutable_active {
                    conflicts.push(BorrowConflict::MutWhileMut);
                }
                info.mutable_active = true;
            } else {
                if info.mutable_active {
                    conflicts.push(BorrowConflict::SharedWhileMut);
                }
                info.immutable_count += 1;
            }
        });
        tracing::debug!(name, mutable, conflicts = conflicts.len(), "borrow registered");
        conflicts
    }

    #[cfg(test)]
    fn info(&self, name: &str) -> Option<&BorrowInfo> {
        self.borrows.get(name)
    }

    pub fn is_borrowed(&self, name: &str) -> bool {
        self.borrows.get(name).is_some_and(BorrowInfo::is_active)
    }

    /// Names with a live borrow anywhere in the current frame stack, sorted.
    pub fn active(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .borrows
            .iter()
            .filter(|(_, info)| info.is_active())
            .map(|(name, _)| name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn push(&mut self) -> Checkpoint {
        self.borrows.push()
    }

    pub fn pop(&mut self, checkpoint: Checkpoint) {
        self.borrows.pop(checkpoint);
    }
}
