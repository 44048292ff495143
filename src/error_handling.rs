//! Error types shared across the crate.
//!
//! Each functional area gets its own enum; per-record and per-candidate
//! failures are separate from run-fatal ones so callers can absorb the
//! former and propagate the latter.

pub mod types;

pub use types::{ConnectError, ParseWarning, RankingError, TransportError};
