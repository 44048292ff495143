//! Candidate scoring and ordering.
//!
//! A [`RankPolicy`] is a plain configuration struct plus a pure comparison
//! table; new sort keys extend the [`SortKey`] enum, not a type hierarchy.

pub mod ranker;
pub mod types;

pub use ranker::rank;
pub use types::{RankPolicy, RankedCandidate, SortDirection, SortKey};
