//! Spaced repetition scheduling for vocabulary captured in context.
//!
//! Words own one or more contexts (sentences they were seen in); each
//! context is scheduled on its own. Storage sits behind
//! [`store::UnitStore`].

pub mod cards;
pub mod store;
