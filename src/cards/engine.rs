//! Operations exposed to the session/UI layer
//!
//! The engine owns a store handle and nothing else; every call takes the
//! owner and the current time explicitly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::due::{context_stats, due_units};
use super::merge::{decide, MergeDecision};
use super::models::{ContextStats, Grade, OwnerId, ReviewUnitRef, Unit, UnitContent, Word};
use super::session::{ReviewSession, SessionError};
use crate::store::{StoreError, UnitStore};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid capture: {0}")]
    InvalidCapture(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Result of capturing new content for a word
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum MergeOutcome {
    /// A new word was created with this content as its first context
    CreatedWord { word: Word },
    /// The content became a new context of an existing word
    AppendedUnit { word: Word, unit_index: usize },
    /// The word already had this context; nothing changed
    Duplicate { word: Word, unit_index: usize },
}

impl MergeOutcome {
    pub fn word(&self) -> &Word {
        match self {
            Self::CreatedWord { word }
            | Self::AppendedUnit { word, .. }
            | Self::Duplicate { word, .. } => word,
        }
    }

    pub fn unit_index(&self) -> usize {
        match self {
            Self::CreatedWord { .. } => 0,
            Self::AppendedUnit { unit_index, .. } | Self::Duplicate { unit_index, .. } => *unit_index,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

pub struct SrsEngine<S: UnitStore> {
    store: S,
    max_session_size: Option<usize>,
}

impl<S: UnitStore> SrsEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_session_size: None,
        }
    }

    /// Cap how many due contexts a session snapshots
    pub fn with_max_session_size(mut self, max_session_size: Option<usize>) -> Self {
        self.max_session_size = max_session_size;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Due contexts for an owner, oldest due first
    pub fn compute_due_set(&self, owner: &OwnerId, now: DateTime<Utc>) -> Result<Vec<ReviewUnitRef>> {
        let words = self.store.words_for_owner(owner)?;
        Ok(due_units(&words, now))
    }

    /// Start a review session over a due set
    pub fn start_session(&self, mut due_set: Vec<ReviewUnitRef>) -> Result<ReviewSession> {
        if let Some(max) = self.max_session_size {
            due_set.truncate(max);
        }
        Ok(ReviewSession::start(due_set)?)
    }

    /// Grade the session's current context against this engine's store
    pub fn grade(&self, session: &mut ReviewSession, grade: Grade, now: DateTime<Utc>) -> Result<Unit> {
        Ok(session.grade(&self.store, grade, now)?)
    }

    /// Capture content for a word: create the word, append a context, or
    /// report the existing duplicate
    pub fn resolve_capture(
        &self,
        owner: &OwnerId,
        text: &str,
        content: UnitContent,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::InvalidCapture("word is empty".to_string()));
        }
        if content.sentence.trim().is_empty() {
            return Err(EngineError::InvalidCapture("sentence is empty".to_string()));
        }
        if content.meaning.trim().is_empty() {
            return Err(EngineError::InvalidCapture("meaning is empty".to_string()));
        }

        let existing = self.store.find_word(owner, text)?;

        match (decide(existing.as_ref(), &content), existing) {
            (MergeDecision::Duplicate { unit_index }, Some(word)) => {
                log::debug!(
                    "Capture for '{}' duplicates context {}; ignoring",
                    word.text,
                    unit_index
                );
                Ok(MergeOutcome::Duplicate { word, unit_index })
            }
            (MergeDecision::Append, Some(mut word)) => {
                let unit = Unit::new(content, now);
                let unit_index = self.store.append_unit(word.id, unit.clone())?;
                log::debug!("Added context {} to '{}'", unit_index, word.text);
                word.units.push(unit);
                Ok(MergeOutcome::AppendedUnit { word, unit_index })
            }
            _ => {
                let word = self.store.create_word(owner, text, Unit::new(content, now))?;
                Ok(MergeOutcome::CreatedWord { word })
            }
        }
    }

    pub fn list_words(&self, owner: &OwnerId) -> Result<Vec<Word>> {
        Ok(self.store.words_for_owner(owner)?)
    }

    pub fn find_word(&self, owner: &OwnerId, text: &str) -> Result<Option<Word>> {
        Ok(self.store.find_word(owner, text)?)
    }

    pub fn stats(&self, owner: &OwnerId, now: DateTime<Utc>) -> Result<ContextStats> {
        let words = self.store.words_for_owner(owner)?;
        Ok(context_stats(&words, now))
    }

    pub fn delete_word(&self, word_id: Uuid) -> Result<()> {
        Ok(self.store.delete_word(word_id)?)
    }

    /// Delete one context; fails with `InvalidDeletion` for a word's last one
    pub fn delete_unit(&self, word_id: Uuid, unit_index: usize) -> Result<()> {
        Ok(self.store.delete_unit(word_id, unit_index)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::models::ReviewStatus;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn engine() -> SrsEngine<MemoryStore> {
        SrsEngine::new(MemoryStore::new())
    }

    fn owner() -> OwnerId {
        OwnerId::from("u1")
    }

    #[test]
    fn test_capture_creates_then_appends() {
        let engine = engine();

        let created = engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast.", "跑"), t(0))
            .unwrap();
        assert!(matches!(created, MergeOutcome::CreatedWord { .. }));
        assert_eq!(created.word().units[0].state.status, ReviewStatus::New);
        assert_eq!(created.word().units[0].state.next_due, t(0));

        let appended = engine
            .resolve_capture(&owner(), "Run", UnitContent::new("They run a shop.", "经营"), t(5))
            .unwrap();
        assert!(matches!(appended, MergeOutcome::AppendedUnit { unit_index: 1, .. }));
        assert_eq!(appended.word().id, created.word().id);
        assert_eq!(appended.word().text, "run");

        let stored = engine.store().get_word(created.word().id).unwrap();
        assert_eq!(stored.units.len(), 2);
        assert_eq!(stored.units[0], created.word().units[0]);
    }

    #[test]
    fn test_same_sentence_twice_is_duplicate() {
        let engine = engine();
        let content = UnitContent::new("I run fast.", "跑");
        let first = engine.resolve_capture(&owner(), "run", content.clone(), t(0)).unwrap();

        // Grade the first context so the check covers scheduling state too
        let due = engine.compute_due_set(&owner(), t(0)).unwrap();
        let mut session = engine.start_session(due).unwrap();
        engine.grade(&mut session, Grade::Good, t(1)).unwrap();
        let before = engine.store().get_word(first.word().id).unwrap();

        let second = engine.resolve_capture(&owner(), "run", content, t(10)).unwrap();
        assert!(second.is_duplicate());
        assert_eq!(second.unit_index(), 0);

        let after = engine.store().get_word(first.word().id).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_trailing_punctuation_is_duplicate() {
        let engine = engine();
        engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast.", "跑"), t(0))
            .unwrap();

        let outcome = engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast", "跑"), t(1))
            .unwrap();
        assert!(outcome.is_duplicate());
        assert_eq!(outcome.word().units.len(), 1);
    }

    #[test]
    fn test_capture_requires_fields() {
        let engine = engine();
        let err = engine
            .resolve_capture(&owner(), "  ", UnitContent::new("I run fast.", "跑"), t(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCapture(_)));

        let err = engine
            .resolve_capture(&owner(), "run", UnitContent::new("", "跑"), t(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCapture(_)));

        let err = engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast.", " "), t(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCapture(_)));
        assert!(engine.list_words(&owner()).unwrap().is_empty());
    }

    #[test]
    fn test_due_set_only_contains_due_contexts() {
        let engine = engine();
        engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast.", "跑"), t(0))
            .unwrap();
        engine
            .resolve_capture(&owner(), "fly", UnitContent::new("Birds fly.", "飞"), t(2))
            .unwrap();
        engine
            .resolve_capture(&owner(), "swim", UnitContent::new("Fish swim.", "游"), t(60))
            .unwrap();

        let due = engine.compute_due_set(&owner(), t(10)).unwrap();
        assert_eq!(due.len(), 2);

        let words = engine.list_words(&owner()).unwrap();
        let due_dates: Vec<_> = due
            .iter()
            .map(|r| {
                let word = words.iter().find(|w| w.id == r.word_id).unwrap();
                word.units[r.unit_index].state.next_due
            })
            .collect();
        assert!(due_dates.iter().all(|d| *d <= t(10)));
        assert!(due_dates.windows(2).all(|w| w[0] <= w[1]));

        assert!(engine.compute_due_set(&OwnerId::from("u2"), t(10)).unwrap().is_empty());
    }

    #[test]
    fn test_full_review_round() {
        let engine = engine();
        engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast.", "跑"), t(0))
            .unwrap();
        engine
            .resolve_capture(&owner(), "run", UnitContent::new("They run a shop.", "经营"), t(0))
            .unwrap();

        let due = engine.compute_due_set(&owner(), t(1)).unwrap();
        let mut session = engine.start_session(due).unwrap();
        while !session.is_complete() {
            engine.grade(&mut session, Grade::Good, t(1)).unwrap();
        }

        // Everything rescheduled a day out
        assert!(engine.compute_due_set(&owner(), t(2)).unwrap().is_empty());
        let stats = engine.stats(&owner(), t(2)).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.learning_count, 2);
        assert_eq!(stats.due_count, 0);

        let err = engine
            .start_session(engine.compute_due_set(&owner(), t(2)).unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::Session(SessionError::EmptyQueue)));
    }

    #[test]
    fn test_session_size_cap() {
        let engine = engine().with_max_session_size(Some(1));
        for (text, sentence) in [("run", "I run."), ("fly", "I fly.")] {
            engine
                .resolve_capture(&owner(), text, UnitContent::new(sentence, "m"), t(0))
                .unwrap();
        }

        let due = engine.compute_due_set(&owner(), t(0)).unwrap();
        assert_eq!(due.len(), 2);
        let session = engine.start_session(due).unwrap();
        assert_eq!(session.queue().len(), 1);
    }

    #[test]
    fn test_delete_last_context_rejected() {
        let engine = engine();
        let outcome = engine
            .resolve_capture(&owner(), "run", UnitContent::new("I run fast.", "跑"), t(0))
            .unwrap();
        let word_id = outcome.word().id;

        let err = engine.delete_unit(word_id, 0).unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::InvalidDeletion(_))));

        engine.delete_word(word_id).unwrap();
        assert!(engine.find_word(&owner(), "run").unwrap().is_none());
    }
}
