//! Resolution of missing model references against the local index.

mod engine;
mod types;

pub use engine::{MatchEngine, Resolution};
pub use types::{MatchRequest, MatchResult, MatchTier};
