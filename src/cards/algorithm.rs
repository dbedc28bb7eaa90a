//! Context-level spaced repetition grading
//!
//! A simplified SM-2 variant. Each grade carries an interval multiplier,
//! a minimum interval and an ease adjustment:
//!
//! | grade | multiplier | minimum | ease delta |
//! |-------|-----------:|--------:|-----------:|
//! | again |          0 |   1 min |      -0.20 |
//! | hard  |        1.2 |  10 min |      -0.15 |
//! | good  |        2.5 |   1 day |       0.00 |
//! | easy  |        3.5 |  4 days |      +0.15 |
//!
//! New and learning contexts move to review after two consecutive
//! non-failing grades. Review contexts grow their interval by
//! `ease * multiplier / 2.5` and graduate once it reaches 21 days.
//! `again` always sends a context back to learning.

use chrono::{DateTime, Duration, Utc};

use super::models::{Grade, ReviewStatus, SchedulingState};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor of a fresh context
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Interval (in days) at which a review context counts as graduated
pub const GRADUATION_DAYS: f64 = 21.0;

/// Multiplier that leaves the interval unchanged at the initial ease
const NEUTRAL_MULTIPLIER: f64 = 2.5;

/// Intervals are capped so due dates stay representable
const MAX_INTERVAL_DAYS: i64 = 36_500;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Scheduling parameters for one grade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeConfig {
    pub interval_multiplier: f64,
    pub min_interval: Duration,
    pub ease_delta: f64,
}

pub fn grade_config(grade: Grade) -> GradeConfig {
    match grade {
        Grade::Again => GradeConfig {
            interval_multiplier: 0.0,
            min_interval: Duration::minutes(1),
            ease_delta: -0.2,
        },
        Grade::Hard => GradeConfig {
            interval_multiplier: 1.2,
            min_interval: Duration::minutes(10),
            ease_delta: -0.15,
        },
        Grade::Good => GradeConfig {
            interval_multiplier: 2.5,
            min_interval: Duration::days(1),
            ease_delta: 0.0,
        },
        Grade::Easy => GradeConfig {
            interval_multiplier: 3.5,
            min_interval: Duration::days(4),
            ease_delta: 0.15,
        },
    }
}

/// Calculate the next scheduling state for a context graded at `now`
///
/// Pure and total: any input state yields a valid next state.
pub fn advance(state: &SchedulingState, grade: Grade, now: DateTime<Utc>) -> SchedulingState {
    let config = grade_config(grade);
    let ease_factor = (state.ease_factor + config.ease_delta).max(MIN_EASE_FACTOR);

    let (status, interval, repetition) = if grade == Grade::Again {
        (ReviewStatus::Learning, config.min_interval, 0)
    } else {
        let repetition = state.repetition.saturating_add(1);
        match state.status {
            ReviewStatus::New | ReviewStatus::Learning => {
                if repetition >= 2 {
                    (ReviewStatus::Review, Duration::days(1), repetition)
                } else {
                    (ReviewStatus::Learning, config.min_interval, repetition)
                }
            }
            ReviewStatus::Review | ReviewStatus::Graduated => {
                let current_days = state.interval.num_milliseconds() as f64 / MS_PER_DAY;
                let new_days =
                    current_days * ease_factor * config.interval_multiplier / NEUTRAL_MULTIPLIER;
                let interval = days_to_duration(new_days).max(config.min_interval);
                let status = if new_days >= GRADUATION_DAYS {
                    ReviewStatus::Graduated
                } else {
                    ReviewStatus::Review
                };
                (status, interval, repetition)
            }
        }
    };

    let next_due = now
        .checked_add_signed(interval)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    SchedulingState {
        status,
        interval,
        repetition,
        ease_factor,
        next_due,
    }
}

/// Convert fractional days to a duration rounded to the millisecond
fn days_to_duration(days: f64) -> Duration {
    if !days.is_finite() || days <= 0.0 {
        return Duration::zero();
    }
    let max = Duration::days(MAX_INTERVAL_DAYS);
    let millis = (days * MS_PER_DAY).round();
    if millis >= max.num_milliseconds() as f64 {
        max
    } else {
        Duration::milliseconds(millis as i64)
    }
}

/// Calculate the interval each grade would produce, in button order
/// Used to show users what interval each rating would give
pub fn preview_intervals(state: &SchedulingState, now: DateTime<Utc>) -> [Duration; 4] {
    Grade::ALL.map(|grade| advance(state, grade, now).interval)
}

/// Format an interval to a short human-readable string
pub fn format_interval(interval: Duration) -> String {
    let minutes = interval.num_minutes();
    let days = interval.num_days();

    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else if days < 1 {
        format!("{}h", interval.num_hours())
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
