//! Persistence boundary for words and their contexts
//!
//! The engine only talks to storage through [`UnitStore`]. Implementations
//! must make a single context's read-modify-write atomic; nothing is
//! required across contexts of the same word.

mod buffered;
pub mod config;
mod file_store;
mod memory;

use thiserror::Error;
use uuid::Uuid;

use crate::cards::merge::same_word_text;
use crate::cards::models::{OwnerId, SchedulingState, Unit, Word};

pub use buffered::BufferedStore;
pub use config::{SrsConfig, WritePolicy};
pub use file_store::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Word not found: {0}")]
    WordNotFound(Uuid),

    #[error("Context {index} not found in word {word_id}")]
    UnitNotFound { word_id: Uuid, index: usize },

    #[error("Cannot delete the last context of word {0}; delete the word instead")]
    InvalidDeletion(Uuid),

    #[error("Word already exists: {0}")]
    DuplicateWord(String),

    #[error("Data directory not found")]
    DataDirNotFound,
}

impl StoreError {
    /// Whether this error means the referenced word or context is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::WordNotFound(_) | Self::UnitNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Capabilities the scheduling engine needs from storage
pub trait UnitStore {
    /// All words of an owner, in creation order, with their contexts
    fn words_for_owner(&self, owner: &OwnerId) -> Result<Vec<Word>>;

    /// A single word by id
    fn get_word(&self, word_id: Uuid) -> Result<Word>;

    /// Case-insensitive lookup of a word by its text
    fn find_word(&self, owner: &OwnerId, text: &str) -> Result<Option<Word>> {
        Ok(self
            .words_for_owner(owner)?
            .into_iter()
            .find(|w| same_word_text(&w.text, text)))
    }

    /// Overwrite the scheduling state of one context
    fn upsert_unit(&self, word_id: Uuid, unit_index: usize, state: &SchedulingState) -> Result<()>;

    /// Add a context at the end of a word, returning its index
    fn append_unit(&self, word_id: Uuid, unit: Unit) -> Result<usize>;

    /// Create a word holding its first context
    fn create_word(&self, owner: &OwnerId, text: &str, first_unit: Unit) -> Result<Word>;

    /// Delete a word and all its contexts
    fn delete_word(&self, word_id: Uuid) -> Result<()>;

    /// Delete one context; the last context of a word cannot be deleted
    fn delete_unit(&self, word_id: Uuid, unit_index: usize) -> Result<()>;
}

impl<T: UnitStore + ?Sized> UnitStore for &T {
    fn words_for_owner(&self, owner: &OwnerId) -> Result<Vec<Word>> {
        (**self).words_for_owner(owner)
    }

    fn get_word(&self, word_id: Uuid) -> Result<Word> {
        (**self).get_word(word_id)
    }

    fn find_word(&self, owner: &OwnerId, text: &str) -> Result<Option<Word>> {
        (**self).find_word(owner, text)
    }

    fn upsert_unit(&self, word_id: Uuid, unit_index: usize, state: &SchedulingState) -> Result<()> {
        (**self).upsert_unit(word_id, unit_index, state)
    }

    fn append_unit(&self, word_id: Uuid, unit: Unit) -> Result<usize> {
        (**self).append_unit(word_id, unit)
    }

    fn create_word(&self, owner: &OwnerId, text: &str, first_unit: Unit) -> Result<Word> {
        (**self).create_word(owner, text, first_unit)
    }

    fn delete_word(&self, word_id: Uuid) -> Result<()> {
        (**self).delete_word(word_id)
    }

    fn delete_unit(&self, word_id: Uuid, unit_index: usize) -> Result<()> {
        (**self).delete_unit(word_id, unit_index)
    }
}

/// Apply a scheduling state to a context of `word`
pub(crate) fn set_unit_state(word: &mut Word, unit_index: usize, state: &SchedulingState) -> Result<()> {
    let word_id = word.id;
    let unit = word
        .units
        .get_mut(unit_index)
        .ok_or(StoreError::UnitNotFound {
            word_id,
            index: unit_index,
        })?;
    unit.state = state.clone();
    Ok(())
}

/// Remove a context from `word`, refusing to remove the last one
pub(crate) fn remove_unit(word: &mut Word, unit_index: usize) -> Result<Unit> {
    if unit_index >= word.units.len() {
        return Err(StoreError::UnitNotFound {
            word_id: word.id,
            index: unit_index,
        });
    }
    if word.units.len() < 2 {
        return Err(StoreError::InvalidDeletion(word.id));
    }
    Ok(word.units.remove(unit_index))
}
