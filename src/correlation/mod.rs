// Semantic keyword correlation: maps an occupation title onto the skill
// keyword catalog by embedding similarity.

pub mod catalog;
pub mod correlator;
pub mod error;

pub use correlator::{select_matches, KeywordCorrelator, MatchPass, MatchSet, FALLBACK_THRESHOLD};
pub use error::CorrelationError;
