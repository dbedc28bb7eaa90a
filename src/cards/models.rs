//! Data models for words, their contexts and review scheduling state

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::algorithm::INITIAL_EASE_FACTOR;

/// Opaque identifier of the learner who owns a word.
///
/// Supplied by whatever identity layer sits in front of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OwnerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status of a context in the spaced repetition system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewStatus {
    /// Never reviewed
    New,
    /// In initial learning phase, or failed and re-learning
    Learning,
    /// Regular spaced review
    Review,
    /// Interval has passed the long-term retention threshold
    Graduated,
}

impl Default for ReviewStatus {
    fn default() -> Self {
        Self::New
    }
}

impl ReviewStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Graduated => "graduated",
        }
    }
}

/// Learner's self-reported recall quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    /// All grades in button order
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn label(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

/// Where a context was captured from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UnitSource {
    /// Typed in by hand
    Manual,
    /// Bulk import, labelled with the import's tag
    BatchImport { tag: String },
    /// Captured while watching a video
    #[serde(rename_all = "camelCase")]
    VideoTimestamp {
        session_id: String,
        video_id: String,
        /// Position in the video, in seconds
        offset_secs: u64,
    },
}

impl Default for UnitSource {
    fn default() -> Self {
        Self::Manual
    }
}

impl UnitSource {
    /// Link back to the moment in the video this context came from
    pub fn video_link(&self) -> Option<String> {
        match self {
            Self::VideoTimestamp {
                video_id,
                offset_secs,
                ..
            } => Some(format!(
                "https://www.youtube.com/watch?v={}&t={}s",
                video_id, offset_secs
            )),
            _ => None,
        }
    }
}

/// Optional grammar notes attached to a context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nuance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultural_background: Option<String>,
}

/// Immutable content of a context, fixed at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitContent {
    pub sentence: String,
    /// Meaning of the word in this sentence
    pub meaning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_translation: Option<String>,
    #[serde(default)]
    pub source: UnitSource,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_analysis: Option<GrammarAnalysis>,
}

impl UnitContent {
    pub fn new(sentence: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            meaning: meaning.into(),
            sentence_translation: None,
            source: UnitSource::default(),
            tags: Vec::new(),
            grammar_analysis: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.sentence_translation = Some(translation.into());
        self
    }

    pub fn with_source(mut self, source: UnitSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Mutable review state of a single context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    #[serde(default)]
    pub status: ReviewStatus,
    /// Current interval, stored as milliseconds
    #[serde(with = "duration_ms", default = "Duration::zero")]
    pub interval: Duration,
    /// Consecutive non-failing grades
    #[serde(default)]
    pub repetition: u32,
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    /// When the context is next due for review
    pub next_due: DateTime<Utc>,
}

fn default_ease_factor() -> f64 {
    INITIAL_EASE_FACTOR
}

impl SchedulingState {
    /// State of a freshly captured context: due immediately
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: ReviewStatus::New,
            interval: Duration::zero(),
            repetition: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            next_due: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due <= now
    }
}

/// One schedulable sentence-level instance of a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(flatten)]
    pub content: UnitContent,
    pub added_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: SchedulingState,
}

impl Unit {
    pub fn new(content: UnitContent, now: DateTime<Utc>) -> Self {
        Self {
            content,
            added_at: now,
            state: SchedulingState::new(now),
        }
    }
}

/// A vocabulary entry and the contexts it was captured in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    pub units: Vec<Unit>,
    pub created_at: DateTime<Utc>,
}

impl Word {
    pub fn new(owner_id: OwnerId, text: String, first_unit: Unit) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            text,
            mnemonic: None,
            created_at: first_unit.added_at,
            units: vec![first_unit],
        }
    }

    pub fn unit(&self, index: usize) -> Option<&Unit> {
        self.units.get(index)
    }
}

/// Address of one context during a review session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUnitRef {
    pub word_id: Uuid,
    pub unit_index: usize,
}

impl ReviewUnitRef {
    pub fn new(word_id: Uuid, unit_index: usize) -> Self {
        Self {
            word_id,
            unit_index,
        }
    }
}

/// Dashboard status of a word, derived from its contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateStatus {
    NoUnits,
    HasNew,
    Learning,
    ReviewMixed,
    Graduated,
}

impl AggregateStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoUnits => "no contexts",
            Self::HasNew => "new",
            Self::Learning => "learning",
            Self::ReviewMixed => "review",
            Self::Graduated => "graduated",
        }
    }
}

/// Context counts across a collection of words
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextStats {
    pub total: usize,
    pub new_count: usize,
    pub learning_count: usize,
    pub review_count: usize,
    pub graduated_count: usize,
    pub due_count: usize,
}

/// Serde helper storing a `Duration` as integer milliseconds
mod duration_ms {
    use chrono::Duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        Duration::try_milliseconds(ms)
            .ok_or_else(|| D::Error::custom(format!("interval out of range: {} ms", ms)))
    }
}
