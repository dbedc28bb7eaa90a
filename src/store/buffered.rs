//! Write coalescing in front of another store
//!
//! Under [`WritePolicy::Buffered`], scheduling writes are held per context
//! and handed to the wrapped store in batches. Reads see pending writes.
//! Anything that changes a word's shape (create, append, delete) flushes
//! first so context indices stay valid.
//!
//! The pending limits are only checked when a scheduling write arrives.
//! Reads and idle time never trigger a flush; call [`BufferedStore::flush`]
//! or drop the store to write out what is left.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use uuid::Uuid;

use super::config::WritePolicy;
use super::{Result, StoreError, UnitStore};
use crate::cards::models::{OwnerId, SchedulingState, Unit, Word};

#[derive(Debug, Default)]
struct PendingWrites {
    states: BTreeMap<(Uuid, usize), SchedulingState>,
    /// When the oldest unflushed write arrived
    since: Option<Instant>,
}

pub struct BufferedStore<S: UnitStore> {
    inner: S,
    policy: WritePolicy,
    pending: Mutex<PendingWrites>,
}

impl<S: UnitStore> BufferedStore<S> {
    pub fn new(inner: S, policy: WritePolicy) -> Self {
        Self {
            inner,
            policy,
            pending: Mutex::new(PendingWrites::default()),
        }
    }

    /// Number of contexts with writes not yet handed to the inner store
    pub fn pending_count(&self) -> usize {
        self.lock().states.len()
    }

    fn lock(&self) -> MutexGuard<'_, PendingWrites> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write every pending state to the inner store
    ///
    /// A write whose word or context no longer exists is dropped with a
    /// warning. On any other failure the unwritten states stay pending and
    /// the error is returned.
    pub fn flush(&self) -> Result<usize> {
        let mut pending = self.lock();
        if pending.states.is_empty() {
            return Ok(0);
        }

        let states = std::mem::take(&mut pending.states);
        let mut written = 0;
        let mut remaining = states.into_iter();

        while let Some(((word_id, unit_index), state)) = remaining.next() {
            match self.inner.upsert_unit(word_id, unit_index, &state) {
                Ok(()) => written += 1,
                Err(e) if e.is_not_found() => {
                    log::warn!("Dropping buffered write for context {} of word {}: {}", unit_index, word_id, e);
                }
                Err(e) => {
                    pending.states.insert((word_id, unit_index), state);
                    pending.states.extend(remaining);
                    return Err(e);
                }
            }
        }

        pending.since = None;
        log::info!("Flushed {} buffered context writes", written);
        Ok(written)
    }

    fn should_flush(&self, pending: &PendingWrites) -> bool {
        match &self.policy {
            WritePolicy::Immediate => true,
            WritePolicy::Buffered { max_pending, .. } => {
                let overdue = match (pending.since, self.policy.max_delay()) {
                    (Some(since), Some(max_delay)) => since.elapsed() >= max_delay,
                    _ => false,
                };
                pending.states.len() >= *max_pending || overdue
            }
        }
    }

    fn overlay(&self, word: &mut Word) {
        let pending = self.lock();
        for ((word_id, unit_index), state) in pending.states.iter() {
            if *word_id == word.id {
                if let Some(unit) = word.units.get_mut(*unit_index) {
                    unit.state = state.clone();
                }
            }
        }
    }
}

impl<S: UnitStore> UnitStore for BufferedStore<S> {
    fn words_for_owner(&self, owner: &OwnerId) -> Result<Vec<Word>> {
        let mut words = self.inner.words_for_owner(owner)?;
        for word in words.iter_mut() {
            self.overlay(word);
        }
        Ok(words)
    }

    fn get_word(&self, word_id: Uuid) -> Result<Word> {
        let mut word = self.inner.get_word(word_id)?;
        self.overlay(&mut word);
        Ok(word)
    }

    fn find_word(&self, owner: &OwnerId, text: &str) -> Result<Option<Word>> {
        let mut found = self.inner.find_word(owner, text)?;
        if let Some(word) = found.as_mut() {
            self.overlay(word);
        }
        Ok(found)
    }

    fn upsert_unit(&self, word_id: Uuid, unit_index: usize, state: &SchedulingState) -> Result<()> {
        if self.policy == WritePolicy::Immediate {
            return self.inner.upsert_unit(word_id, unit_index, state);
        }

        // Missing targets are reported now rather than at flush time
        let word = self.inner.get_word(word_id)?;
        if unit_index >= word.units.len() {
            return Err(StoreError::UnitNotFound {
                word_id,
                index: unit_index,
            });
        }

        let flush_now = {
            let mut pending = self.lock();
            pending.states.insert((word_id, unit_index), state.clone());
            pending.since.get_or_insert_with(Instant::now);
            self.should_flush(&pending)
        };

        if flush_now {
            self.flush()?;
        }
        Ok(())
    }

    fn append_unit(&self, word_id: Uuid, unit: Unit) -> Result<usize> {
        self.flush()?;
        self.inner.append_unit(word_id, unit)
    }

    fn create_word(&self, owner: &OwnerId, text: &str, first_unit: Unit) -> Result<Word> {
        self.flush()?;
        self.inner.create_word(owner, text, first_unit)
    }

    fn delete_word(&self, word_id: Uuid) -> Result<()> {
        self.flush()?;
        self.inner.delete_word(word_id)
    }

    fn delete_unit(&self, word_id: Uuid, unit_index: usize) -> Result<()> {
        self.flush()?;
        self.inner.delete_unit(word_id, unit_index)
    }
}

impl<S: UnitStore> Drop for BufferedStore<S> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Failed to flush buffered context writes: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::models::{ReviewStatus, UnitContent};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn buffered(max_pending: usize, max_delay_secs: u64) -> WritePolicy {
        WritePolicy::Buffered {
            max_pending,
            max_delay_secs,
        }
    }

    fn seed(store: &MemoryStore, contexts: usize) -> Word {
        let owner = OwnerId::from("u1");
        let first = Unit::new(UnitContent::new("s0", "m"), Utc::now());
        let word = store.create_word(&owner, "run", first).unwrap();
        for i in 1..contexts {
            let unit = Unit::new(UnitContent::new(format!("s{}", i), "m"), Utc::now());
            store.append_unit(word.id, unit).unwrap();
        }
        store.get_word(word.id).unwrap()
    }

    fn learning_state(word: &Word, index: usize, days: i64) -> SchedulingState {
        let mut state = word.units[index].state.clone();
        state.status = ReviewStatus::Learning;
        state.interval = Duration::days(days);
        state
    }

    #[test]
    fn test_immediate_writes_through() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 1);
        let store = BufferedStore::new(&inner, WritePolicy::Immediate);

        let state = learning_state(&word, 0, 1);
        store.upsert_unit(word.id, 0, &state).unwrap();

        assert_eq!(store.pending_count(), 0);
        assert_eq!(inner.get_word(word.id).unwrap().units[0].state, state);
    }

    #[test]
    fn test_buffered_writes_coalesce_and_flush_at_threshold() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 3);
        let store = BufferedStore::new(&inner, buffered(3, 3600));

        store.upsert_unit(word.id, 0, &learning_state(&word, 0, 1)).unwrap();
        store.upsert_unit(word.id, 0, &learning_state(&word, 0, 2)).unwrap();
        assert_eq!(store.pending_count(), 1);

        // Inner store untouched, but reads see the pending state
        assert_eq!(inner.get_word(word.id).unwrap().units[0].state.status, ReviewStatus::New);
        assert_eq!(store.get_word(word.id).unwrap().units[0].state.interval, Duration::days(2));

        store.upsert_unit(word.id, 1, &learning_state(&word, 1, 1)).unwrap();
        store.upsert_unit(word.id, 2, &learning_state(&word, 2, 1)).unwrap();

        assert_eq!(store.pending_count(), 0);
        let persisted = inner.get_word(word.id).unwrap();
        assert_eq!(persisted.units[0].state.interval, Duration::days(2));
        assert!(persisted.units.iter().all(|u| u.state.status == ReviewStatus::Learning));
    }

    #[test]
    fn test_zero_delay_flushes_every_write() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 1);
        let store = BufferedStore::new(&inner, buffered(100, 0));

        store.upsert_unit(word.id, 0, &learning_state(&word, 0, 1)).unwrap();
        assert_eq!(store.pending_count(), 0);
        assert_eq!(inner.get_word(word.id).unwrap().units[0].state.status, ReviewStatus::Learning);
    }

    #[test]
    fn test_structural_change_flushes_first() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 2);
        let store = BufferedStore::new(&inner, buffered(100, 3600));

        store.upsert_unit(word.id, 1, &learning_state(&word, 1, 5)).unwrap();
        store.delete_unit(word.id, 0).unwrap();

        let persisted = inner.get_word(word.id).unwrap();
        assert_eq!(persisted.units.len(), 1);
        assert_eq!(persisted.units[0].content.sentence, "s1");
        assert_eq!(persisted.units[0].state.interval, Duration::days(5));
    }

    #[test]
    fn test_missing_target_reported_immediately() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 1);
        let store = BufferedStore::new(&inner, buffered(100, 3600));

        let state = word.units[0].state.clone();
        assert!(store.upsert_unit(word.id, 3, &state).unwrap_err().is_not_found());
        assert!(store.upsert_unit(Uuid::new_v4(), 0, &state).unwrap_err().is_not_found());
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_drop_flushes_pending_writes() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 1);
        {
            let store = BufferedStore::new(&inner, buffered(100, 3600));
            store.upsert_unit(word.id, 0, &learning_state(&word, 0, 7)).unwrap();
            assert_eq!(store.pending_count(), 1);
        }
        assert_eq!(inner.get_word(word.id).unwrap().units[0].state.interval, Duration::days(7));
    }

    #[test]
    fn test_write_to_vanished_word_is_dropped_on_flush() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 1);
        let store = BufferedStore::new(&inner, buffered(100, 3600));

        store.upsert_unit(word.id, 0, &learning_state(&word, 0, 3)).unwrap();
        inner.delete_word(word.id).unwrap();

        // Unrelated words can still be created
        let first = Unit::new(UnitContent::new("Birds fly south.", "m"), Utc::now());
        let fly = store.create_word(&OwnerId::from("u1"), "fly", first).unwrap();

        assert_eq!(store.pending_count(), 0);
        assert_eq!(store.flush().unwrap(), 0);
        assert_eq!(inner.get_word(fly.id).unwrap().text, "fly");
        assert!(inner.get_word(word.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_flush_keeps_valid_writes_when_one_target_vanished() {
        let inner = MemoryStore::new();
        let keep = seed(&inner, 1);
        let first = Unit::new(UnitContent::new("Birds fly south.", "m"), Utc::now());
        let gone = inner.create_word(&OwnerId::from("u1"), "fly", first).unwrap();
        let store = BufferedStore::new(&inner, buffered(100, 3600));

        store.upsert_unit(keep.id, 0, &learning_state(&keep, 0, 4)).unwrap();
        store.upsert_unit(gone.id, 0, &learning_state(&gone, 0, 4)).unwrap();
        inner.delete_word(gone.id).unwrap();

        assert_eq!(store.flush().unwrap(), 1);
        assert_eq!(store.pending_count(), 0);
        assert_eq!(inner.get_word(keep.id).unwrap().units[0].state.interval, Duration::days(4));
    }

    #[test]
    fn test_reads_leave_pending_writes_buffered() {
        let inner = MemoryStore::new();
        let word = seed(&inner, 1);
        let store = BufferedStore::new(&inner, buffered(100, 3600));
        let owner = OwnerId::from("u1");

        store.upsert_unit(word.id, 0, &learning_state(&word, 0, 2)).unwrap();
        store.get_word(word.id).unwrap();
        store.words_for_owner(&owner).unwrap();
        store.find_word(&owner, "run").unwrap();

        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.flush().unwrap(), 1);
        assert_eq!(inner.get_word(word.id).unwrap().units[0].state.interval, Duration::days(2));
    }
}
