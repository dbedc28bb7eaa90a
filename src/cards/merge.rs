//! Deciding whether captured content is a new context or a duplicate
//!
//! A sentence counts as a duplicate of an existing context when it is
//! identical, or when either sentence contains the other after lowercasing
//! and trimming. Containment catches re-captures cut at different
//! punctuation, at the cost of occasionally matching two unrelated short
//! sentences.

use super::models::{UnitContent, Word};

/// What to do with newly captured content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// No word with this text exists yet
    CreateWord,
    /// The word exists and the sentence is new to it
    Append,
    /// The word already has a matching context
    Duplicate { unit_index: usize },
}

/// Case-insensitive comparison used for word lookup
pub fn same_word_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Whether two sentences are the same capture
pub fn is_duplicate_sentence(existing: &str, candidate: &str) -> bool {
    if existing == candidate {
        return true;
    }

    let existing = existing.to_lowercase();
    let candidate = candidate.to_lowercase();
    let existing = existing.trim();
    let candidate = candidate.trim();

    existing.contains(candidate) || candidate.contains(existing)
}

/// Index of the first context of `word` that duplicates `sentence`
pub fn find_duplicate(word: &Word, sentence: &str) -> Option<usize> {
    word.units
        .iter()
        .position(|unit| is_duplicate_sentence(&unit.content.sentence, sentence))
}

pub fn decide(existing: Option<&Word>, content: &UnitContent) -> MergeDecision {
    match existing {
        None => MergeDecision::CreateWord,
        Some(word) => match find_duplicate(word, &content.sentence) {
            Some(unit_index) => MergeDecision::Duplicate { unit_index },
            None => MergeDecision::Append,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::models::{OwnerId, Unit};
    use chrono::Utc;

    fn word_with(sentences: &[&str]) -> Word {
        let mut units = sentences
            .iter()
            .map(|s| Unit::new(UnitContent::new(*s, "meaning"), Utc::now()));
        let mut word = Word::new(OwnerId::from("u1"), "run".to_string(), units.next().unwrap());
        word.units.extend(units);
        word
    }

    #[test]
    fn test_missing_period_is_duplicate() {
        let word = word_with(&["I run fast."]);
        let decision = decide(Some(&word), &UnitContent::new("I run fast", "跑"));
        assert_eq!(decision, MergeDecision::Duplicate { unit_index: 0 });
    }

    #[test]
    fn test_containment_works_both_ways() {
        assert!(is_duplicate_sentence("I run fast", "  Every day I RUN FAST.  "));
        assert!(is_duplicate_sentence("Every day I run fast.", "i run fast"));
        assert!(!is_duplicate_sentence("I run fast.", "They run a shop."));
    }

    #[test]
    fn test_first_match_wins() {
        let word = word_with(&["They run a shop.", "I run fast.", "I run fast every day."]);
        assert_eq!(find_duplicate(&word, "I run fast"), Some(1));
    }

    #[test]
    fn test_new_sentence_appends() {
        let word = word_with(&["I run fast."]);
        let decision = decide(Some(&word), &UnitContent::new("They run a shop.", "经营"));
        assert_eq!(decision, MergeDecision::Append);
    }

    #[test]
    fn test_unknown_word_is_created() {
        let decision = decide(None, &UnitContent::new("I run fast.", "跑"));
        assert_eq!(decision, MergeDecision::CreateWord);
    }

    #[test]
    fn test_same_word_text_ignores_case() {
        assert!(same_word_text("Run", "run"));
        assert!(same_word_text(" RUN ", "run"));
        assert!(!same_word_text("runs", "run"));
    }
}
