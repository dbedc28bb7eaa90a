//! In-process word store

use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::{remove_unit, set_unit_state, Result, StoreError, UnitStore};
use crate::cards::merge::same_word_text;
use crate::cards::models::{OwnerId, SchedulingState, Unit, Word};

/// Keeps every word in memory, in creation order
#[derive(Debug, Default)]
pub struct MemoryStore {
    words: Mutex<Vec<Word>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Word>> {
        self.words.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_word<T>(&self, word_id: Uuid, f: impl FnOnce(&mut Word) -> Result<T>) -> Result<T> {
        let mut words = self.lock();
        let word = words
            .iter_mut()
            .find(|w| w.id == word_id)
            .ok_or(StoreError::WordNotFound(word_id))?;
        f(word)
    }
}

impl UnitStore for MemoryStore {
    fn words_for_owner(&self, owner: &OwnerId) -> Result<Vec<Word>> {
        Ok(self
            .lock()
            .iter()
            .filter(|w| &w.owner_id == owner)
            .cloned()
            .collect())
    }

    fn get_word(&self, word_id: Uuid) -> Result<Word> {
        self.lock()
            .iter()
            .find(|w| w.id == word_id)
            .cloned()
            .ok_or(StoreError::WordNotFound(word_id))
    }

    fn upsert_unit(&self, word_id: Uuid, unit_index: usize, state: &SchedulingState) -> Result<()> {
        self.with_word(word_id, |word| set_unit_state(word, unit_index, state))
    }

    fn append_unit(&self, word_id: Uuid, unit: Unit) -> Result<usize> {
        self.with_word(word_id, |word| {
            word.units.push(unit);
            Ok(word.units.len() - 1)
        })
    }

    fn create_word(&self, owner: &OwnerId, text: &str, first_unit: Unit) -> Result<Word> {
        let mut words = self.lock();
        if words
            .iter()
            .any(|w| &w.owner_id == owner && same_word_text(&w.text, text))
        {
            return Err(StoreError::DuplicateWord(text.to_string()));
        }

        let word = Word::new(owner.clone(), text.to_string(), first_unit);
        words.push(word.clone());
        Ok(word)
    }

    fn delete_word(&self, word_id: Uuid) -> Result<()> {
        let mut words = self.lock();
        let before = words.len();
        words.retain(|w| w.id != word_id);
        if words.len() == before {
            return Err(StoreError::WordNotFound(word_id));
        }
        Ok(())
    }

    fn delete_unit(&self, word_id: Uuid, unit_index: usize) -> Result<()> {
        self.with_word(word_id, |word| remove_unit(word, unit_index).map(|_| ()))
    }
}
