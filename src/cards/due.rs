//! Selecting due contexts and summarizing words for the dashboard

use chrono::{DateTime, Utc};

use super::models::{AggregateStatus, ContextStats, ReviewStatus, ReviewUnitRef, Word};

/// All contexts due at `now`, oldest due date first
///
/// Words are walked in creation order and contexts in insertion order;
/// the sort is stable so equal due dates keep that order.
pub fn due_units(words: &[Word], now: DateTime<Utc>) -> Vec<ReviewUnitRef> {
    let mut ordered: Vec<&Word> = words.iter().collect();
    ordered.sort_by_key(|w| w.created_at);

    let mut due: Vec<(DateTime<Utc>, ReviewUnitRef)> = ordered
        .into_iter()
        .flat_map(|word| {
            word.units
                .iter()
                .enumerate()
                .filter(move |(_, unit)| unit.state.is_due(now))
                .map(move |(index, unit)| (unit.state.next_due, ReviewUnitRef::new(word.id, index)))
        })
        .collect();

    due.sort_by_key(|(next_due, _)| *next_due);
    due.into_iter().map(|(_, unit_ref)| unit_ref).collect()
}

/// Overall status of a word
///
/// Fixed priority: any new context wins, then any learning one.
/// Graduated needs every context graduated.
pub fn aggregate_status(word: &Word) -> AggregateStatus {
    if word.units.is_empty() {
        return AggregateStatus::NoUnits;
    }

    let statuses = || word.units.iter().map(|u| u.state.status);

    if statuses().any(|s| s == ReviewStatus::New) {
        AggregateStatus::HasNew
    } else if statuses().any(|s| s == ReviewStatus::Learning) {
        AggregateStatus::Learning
    } else if statuses().all(|s| s == ReviewStatus::Graduated) {
        AggregateStatus::Graduated
    } else {
        AggregateStatus::ReviewMixed
    }
}

/// Earliest due date over a word's contexts, whether or not it has passed
pub fn earliest_due(word: &Word) -> Option<DateTime<Utc>> {
    word.units.iter().map(|u| u.state.next_due).min()
}

/// Count contexts by status across all words
pub fn context_stats(words: &[Word], now: DateTime<Utc>) -> ContextStats {
    let mut stats = ContextStats::default();

    for unit in words.iter().flat_map(|w| w.units.iter()) {
        stats.total += 1;
        match unit.state.status {
            ReviewStatus::New => stats.new_count += 1,
            ReviewStatus::Learning => stats.learning_count += 1,
            ReviewStatus::Review => stats.review_count += 1,
            ReviewStatus::Graduated => stats.graduated_count += 1,
        }
        if unit.state.is_due(now) {
            stats.due_count += 1;
        }
    }

    stats
}
