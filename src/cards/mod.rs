//! Context-level spaced repetition for vocabulary
//!
//! This module provides:
//! - Word and context models with per-context review state
//! - The grading algorithm
//! - Due-set selection and dashboard summaries
//! - Review sessions with requeue of failed contexts
//! - Duplicate detection when new content is captured

pub mod algorithm;
pub mod due;
pub mod engine;
pub mod merge;
pub mod models;
pub mod query;
pub mod session;

pub use engine::{EngineError, MergeOutcome, SrsEngine};
pub use models::*;
pub use session::{ReviewSession, SessionError};
