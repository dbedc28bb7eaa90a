//! JSON file storage for words
//!
//! Directory structure:
//! ```text
//! {data_dir}/
//! ├── config.toml
//! └── words/
//!     └── {word-id}.json   # Word with all its contexts
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Duration;
use uuid::Uuid;

use super::{remove_unit, set_unit_state, Result, StoreError, UnitStore};
use crate::cards::merge::same_word_text;
use crate::cards::models::{OwnerId, SchedulingState, Unit, Word};

/// Storage manager keeping one JSON file per word
pub struct FileStore {
    data_dir: PathBuf,
    /// Serializes read-modify-write cycles on word files
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            write_lock: Mutex::new(()),
        }
    }

    /// Default data directory (e.g., ~/.local/share/contextvocab)
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("contextvocab"))
            .ok_or(StoreError::DataDirNotFound)
    }

    /// Initialize storage directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.words_dir())?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn words_dir(&self) -> PathBuf {
        self.data_dir.join("words")
    }

    fn word_path(&self, word_id: Uuid) -> PathBuf {
        self.words_dir().join(format!("{}.json", word_id))
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_word(&self, word_id: Uuid) -> Result<Word> {
        let path = self.word_path(word_id);
        if !path.exists() {
            return Err(StoreError::WordNotFound(word_id));
        }

        let content = fs::read_to_string(&path)?;
        let word: Word = serde_json::from_str(&content)?;
        Ok(word)
    }

    fn write_word(&self, word: &Word) -> Result<()> {
        self.init()?;
        fs::write(self.word_path(word.id), serde_json::to_string_pretty(word)?)?;
        Ok(())
    }

    /// Read, modify and write back a single word under the write lock
    fn update_word<T>(&self, word_id: Uuid, f: impl FnOnce(&mut Word) -> Result<T>) -> Result<T> {
        let _guard = self.lock();
        let mut word = self.read_word(word_id)?;
        let result = f(&mut word)?;
        self.write_word(&word)?;
        Ok(result)
    }

    /// All words on disk, across owners
    fn list_all_words(&self) -> Result<Vec<Word>> {
        let words_dir = self.words_dir();
        if !words_dir.exists() {
            return Ok(Vec::new());
        }

        let mut words = Vec::new();
        for entry in fs::read_dir(&words_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                match serde_json::from_str::<Word>(&content) {
                    Ok(word) => words.push(word),
                    Err(e) => log::warn!("Skipping unreadable word file {:?}: {}", path, e),
                }
            }
        }

        words.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(words)
    }
}

impl UnitStore for FileStore {
    fn words_for_owner(&self, owner: &OwnerId) -> Result<Vec<Word>> {
        Ok(self
            .list_all_words()?
            .into_iter()
            .filter(|w| &w.owner_id == owner)
            .collect())
    }

    fn get_word(&self, word_id: Uuid) -> Result<Word> {
        self.read_word(word_id)
    }

    fn upsert_unit(&self, word_id: Uuid, unit_index: usize, state: &SchedulingState) -> Result<()> {
        self.update_word(word_id, |word| set_unit_state(word, unit_index, state))
    }

    fn append_unit(&self, word_id: Uuid, unit: Unit) -> Result<usize> {
        self.update_word(word_id, |word| {
            word.units.push(unit);
            Ok(word.units.len() - 1)
        })
    }

    fn create_word(&self, owner: &OwnerId, text: &str, first_unit: Unit) -> Result<Word> {
        let _guard = self.lock();
        let existing = self.words_for_owner(owner)?;
        if existing.iter().any(|w| same_word_text(&w.text, text)) {
            return Err(StoreError::DuplicateWord(text.to_string()));
        }

        let mut word = Word::new(owner.clone(), text.to_string(), first_unit);
        // Files carry no order, so creation times must be unique per owner
        while existing.iter().any(|w| w.created_at == word.created_at) {
            word.created_at += Duration::nanoseconds(1);
        }
        self.write_word(&word)?;
        log::info!("Created word '{}' ({}) for {}", word.text, word.id, owner);
        Ok(word)
    }

    fn delete_word(&self, word_id: Uuid) -> Result<()> {
        let _guard = self.lock();
        let path = self.word_path(word_id);
        if !path.exists() {
            return Err(StoreError::WordNotFound(word_id));
        }
        fs::remove_file(&path)?;
        log::info!("Deleted word {}", word_id);
        Ok(())
    }

    fn delete_unit(&self, word_id: Uuid, unit_index: usize) -> Result<()> {
        self.update_word(word_id, |word| remove_unit(word, unit_index).map(|_| ()))
    }
}
