//! A name-keyed map with scoped rollback.
//!
//! Entering a construct takes a [`Checkpoint`]; leaving it rewinds every
//! insert, update and removal made since, so the enclosing construct sees
//! exactly the state it had before. Cost is proportional to the mutations
//! made inside the frame, not to the size of the map.

use std::collections::HashMap;

/// Position in the journal to rewind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a checkpoint must be handed back to `pop`"]
pub struct Checkpoint(usize);

#[derive(Debug, Clone)]
pub struct UndoMap<V> {
    entries: HashMap<String, V>,
    /// Previous value of each key touched while a frame is open.
    journal: Vec<(String, Option<V>)>,
    open_frames: usize,
}

impl<V: Clone> UndoMap<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            journal: Vec::new(),
            open_frames: 0,
        }
    }

    pub fn push(&mut self) -> Checkpoint {
        self.open_frames += 1;
        Checkpoint(self.journal.len())
    }

    /// Rewind to `checkpoint`. Frames must be popped in LIFO order.
    pub fn pop(&mut self, checkpoint: Checkpoint) {
        debug_assert!(self.open_frames > 0, "pop without matching push");
        debug_assert!(checkpoint.0 <= self.journal.len(), "checkpoint popped out of order");
        while self.journal.len() > checkpoint.0 {
            let Some((key, previous)) = self.journal.pop() else {
                break;
            };
            match previous {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
        self.open_frames = self.open_frames.saturating_sub(1);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: &str, value: V) {
        let previous = self.entries.insert(key.to_string(), value);
        self.record(key, previous);
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(previous) = self.entries.remove(key) {
            self.record(key, Some(previous));
        }
    }

    /// Mutate an existing entry in place. Returns false if `key` is absent.
    pub fn update(&mut self, key: &str, f: impl FnOnce(&mut V)) -> bool {
        let Some(value) = self.entries.get_mut(key) else {
            return false;
        };
        let previous = (self.open_frames > 0).then(|| value.clone());
        f(value);
        if let Some(previous) = previous {
            self.journal.push((key.to_string(), Some(previous)));
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn record(&mut self, key: &str, previous: Option<V>) {
        if self.open_frames > 0 {
            self.journal.push((key.to_string(), previous));
        }
    }
}

impl<V: Clone> Default for UndoMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
