//! Review session over a fixed snapshot of due contexts
//!
//! A session never re-queries the store for due contexts. It walks the
//! snapshot it was started with; a context graded `again` is moved to the
//! back of the queue and seen again after everything else queued.
//!
//! A session is plain mutable state with no internal locking. Grading takes
//! `&mut self`, so one learner drives it sequentially; concurrent grading
//! of the same session is not supported.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::algorithm::advance;
use super::models::{Grade, ReviewUnitRef, Unit};
use crate::store::{StoreError, UnitStore};

#[derive(Error, Debug)]
pub enum SessionError {
    /// Nothing was due when the session was requested
    #[error("No contexts to review")]
    EmptyQueue,

    /// Every queued context has been graded
    #[error("Review session is complete")]
    SessionComplete,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone)]
pub struct ReviewSession {
    queue: Vec<ReviewUnitRef>,
    cursor: usize,
    reviewed_count: usize,
}

impl ReviewSession {
    /// Start a session over a snapshot of due contexts
    pub fn start(due_units: Vec<ReviewUnitRef>) -> Result<Self> {
        if due_units.is_empty() {
            return Err(SessionError::EmptyQueue);
        }

        Ok(Self {
            queue: due_units,
            cursor: 0,
            reviewed_count: 0,
        })
    }

    /// The context to present next
    pub fn current(&self) -> Result<ReviewUnitRef> {
        self.queue
            .get(self.cursor)
            .copied()
            .ok_or(SessionError::SessionComplete)
    }

    /// Grade the current context, persist its new state and move on
    ///
    /// The queue only changes once the store accepted the write, so a failed
    /// write leaves the session where it was.
    pub fn grade<S: UnitStore + ?Sized>(
        &mut self,
        store: &S,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<Unit> {
        let current = self.current()?;

        let word = store.get_word(current.word_id)?;
        let mut unit = word
            .unit(current.unit_index)
            .cloned()
            .ok_or(StoreError::UnitNotFound {
                word_id: current.word_id,
                index: current.unit_index,
            })?;

        unit.state = advance(&unit.state, grade, now);
        store.upsert_unit(current.word_id, current.unit_index, &unit.state)?;

        log::debug!(
            "Graded '{}' context {} as {}: {} until {}",
            word.text,
            current.unit_index,
            grade.label(),
            unit.state.status.label(),
            unit.state.next_due
        );

        self.record(grade);
        Ok(unit)
    }

    /// Queue movement after a grade has been persisted
    fn record(&mut self, grade: Grade) {
        self.reviewed_count += 1;
        if grade == Grade::Again {
            let failed = self.queue.remove(self.cursor);
            self.queue.push(failed);
        } else {
            self.cursor += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    /// Number of grades recorded so far, including repeated failures
    pub fn reviewed_count(&self) -> usize {
        self.reviewed_count
    }

    /// Contexts still waiting to be graded, including the current one
    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.cursor)
    }

    /// (reviewed so far, queue length)
    pub fn progress(&self) -> (usize, usize) {
        (self.reviewed_count, self.queue.len())
    }

    pub fn queue(&self) -> &[ReviewUnitRef] {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::models::{OwnerId, ReviewStatus, UnitContent, Word};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    /// Three single-context words A, B, C
    fn seeded_store() -> (MemoryStore, Vec<Word>) {
        let store = MemoryStore::new();
        let owner = OwnerId::from("u1");
        let words = ["A", "B", "C"]
            .iter()
            .map(|text| {
                let unit = Unit::new(UnitContent::new(format!("{} sentence", text), "m"), t0());
                store.create_word(&owner, text, unit).unwrap()
            })
            .collect();
        (store, words)
    }

    fn refs(words: &[Word]) -> Vec<ReviewUnitRef> {
        words.iter().map(|w| ReviewUnitRef::new(w.id, 0)).collect()
    }

    #[test]
    fn test_empty_session_rejected() {
        assert!(matches!(ReviewSession::start(Vec::new()), Err(SessionError::EmptyQueue)));
    }

    #[test]
    fn test_again_requeues_at_end() {
        let (store, words) = seeded_store();
        let (a, b, c) = (words[0].id, words[1].id, words[2].id);
        let mut session = ReviewSession::start(refs(&words)).unwrap();

        let graded = session.grade(&store, Grade::Again, t0()).unwrap();
        assert_eq!(graded.state.status, ReviewStatus::Learning);

        let order: Vec<Uuid> = session.queue().iter().map(|r| r.word_id).collect();
        assert_eq!(order, vec![b, c, a]);
        assert_eq!(session.current().unwrap().word_id, b);
        assert!(!session.is_complete());

        session.grade(&store, Grade::Good, t0()).unwrap();
        assert_eq!(session.current().unwrap().word_id, c);
        session.grade(&store, Grade::Good, t0()).unwrap();
        assert_eq!(session.current().unwrap().word_id, a);
        assert!(!session.is_complete());
        session.grade(&store, Grade::Good, t0()).unwrap();

        assert!(session.is_complete());
        assert_eq!(session.reviewed_count(), 4);
        assert!(matches!(session.current(), Err(SessionError::SessionComplete)));
        assert!(matches!(
            session.grade(&store, Grade::Good, t0()),
            Err(SessionError::SessionComplete)
        ));
    }

    #[test]
    fn test_grades_are_persisted() {
        let (store, words) = seeded_store();
        let mut session = ReviewSession::start(refs(&words[..1])).unwrap();

        session.grade(&store, Grade::Good, t0()).unwrap();

        let persisted = store.get_word(words[0].id).unwrap();
        assert_eq!(persisted.units[0].state.status, ReviewStatus::Learning);
        assert_eq!(persisted.units[0].state.next_due, t0() + Duration::days(1));
        assert!(session.is_complete());
    }

    #[test]
    fn test_repeated_failures_grow_the_session() {
        let (store, words) = seeded_store();
        let mut session = ReviewSession::start(refs(&words[..1])).unwrap();

        for _ in 0..3 {
            session.grade(&store, Grade::Again, t0()).unwrap();
            assert!(!session.is_complete());
        }
        session.grade(&store, Grade::Hard, t0()).unwrap();

        assert!(session.is_complete());
        assert_eq!(session.progress(), (4, 1));
    }

    #[test]
    fn test_graded_unit_not_rechecked_for_due() {
        let (store, words) = seeded_store();
        // Same context queued twice; the second pass is not skipped even
        // though the first rescheduled it into the future.
        let unit_ref = ReviewUnitRef::new(words[0].id, 0);
        let mut session = ReviewSession::start(vec![unit_ref, unit_ref]).unwrap();

        session.grade(&store, Grade::Good, t0()).unwrap();
        assert_eq!(session.current().unwrap(), unit_ref);
        let second = session.grade(&store, Grade::Good, t0()).unwrap();
        assert_eq!(second.state.status, ReviewStatus::Review);
    }

    #[test]
    fn test_missing_word_leaves_session_unchanged() {
        let (store, words) = seeded_store();
        let mut session = ReviewSession::start(refs(&words)).unwrap();
        store.delete_word(words[0].id).unwrap();

        let err = session.grade(&store, Grade::Good, t0()).unwrap_err();
        assert!(matches!(err, SessionError::Store(ref e) if e.is_not_found()));
        assert_eq!(session.current().unwrap().word_id, words[0].id);
        assert_eq!(session.reviewed_count(), 0);
    }
}
