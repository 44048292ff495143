//! Ranking policy and candidate types.

use clap::ValueEnum;
use std::collections::HashSet;

use crate::server_list::types::ServerRecord;

/// Numeric field a policy orders candidates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Score,
    Speed,
    Ping,
    Uptime,
}

impl SortKey {
    /// Direction used when the policy does not pin one. Lower ping is
    /// better, so ping is the one key that defaults to ascending.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortKey::Ping => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Configurable candidate selection policy.
#[derive(Debug, Clone)]
pub struct RankPolicy {
    pub sort_key: SortKey,
    /// `None` means "use the sort key's default direction".
    pub direction: Option<SortDirection>,
    /// Case-insensitive ISO country codes; `None` admits every country.
    pub country_filter: Option<HashSet<String>>,
    /// Drop records whose score is 0 (typically freshly listed or broken
    /// relays the volunteer network has not vetted yet).
    pub exclude_zero_score: bool,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self {
            sort_key: SortKey::Score,
            direction: None,
            country_filter: None,
            exclude_zero_score: false,
        }
    }
}

impl RankPolicy {
    /// Effective direction after applying the per-key default.
    pub fn effective_direction(&self) -> SortDirection {
        self.direction.unwrap_or(self.sort_key.default_direction())
    }
}

/// A server record paired with its computed rank under the active policy.
///
/// Ordering over a batch is total: ties on `rank` break deterministically
/// on `host_name`, so ranking the same input twice yields the same order.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub record: ServerRecord,
    pub rank: f64,
}
