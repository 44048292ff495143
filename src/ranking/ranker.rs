use log::{debug, info};
use std::cmp::Ordering;

use crate::error_handling::types::RankingError;
use crate::ranking::types::{RankPolicy, RankedCandidate, SortDirection, SortKey};
use crate::server_list::types::ServerRecord;

/// Filters and orders parsed records under `policy`.
///
/// Stable sort with a deterministic `host_name` tie-break, so repeated
/// ranking of identical input is reproducible. Filtering everything away
/// is reported as [`RankingError::EmptyCandidateSet`] rather than an empty
/// list, since the supervisor must treat it as a terminal failure before
/// any connection attempt.
pub fn rank(
    records: Vec<ServerRecord>,
    policy: &RankPolicy,
) -> Result<Vec<RankedCandidate>, RankingError> {
    let total = records.len();
    let direction = policy.effective_direction();

    let mut candidates: Vec<RankedCandidate> = records
        .into_iter()
        .filter(|r| admits(r, policy))
        .map(|record| {
            let rank = sort_value(&record, policy.sort_key);
            RankedCandidate { record, rank }
        })
        .collect();

    if candidates.is_empty() {
        return Err(RankingError::EmptyCandidateSet);
    }

    candidates.sort_by(|a, b| compare(a, b, policy.sort_key, direction));

    debug!(
        "Ranked {} of {} records by {:?} ({:?})",
        candidates.len(),
        total,
        policy.sort_key,
        direction
    );
    info!(
        "Best candidate: {} (rank {})",
        candidates[0].record.endpoint_label(),
        candidates[0].rank
    );
    Ok(candidates)
}

fn admits(record: &ServerRecord, policy: &RankPolicy) -> bool {
    if policy.exclude_zero_score && record.score == 0 {
        return false;
    }
    if let Some(countries) = &policy.country_filter {
        if !countries.contains(&record.country_short.to_ascii_uppercase()) {
            return false;
        }
    }
    true
}

fn sort_value(record: &ServerRecord, key: SortKey) -> f64 {
    match key {
        SortKey::Score => record.score as f64,
        SortKey::Speed => record.speed as f64,
        SortKey::Ping => record.ping as f64,
        SortKey::Uptime => record.uptime as f64,
    }
}

fn compare(
    a: &RankedCandidate,
    b: &RankedCandidate,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    // Upstream reports unknown ping as "-", coerced to 0 at parse time.
    // Under the ping key those records sort after every measured one
    // regardless of direction.
    if key == SortKey::Ping {
        match (a.rank == 0.0, b.rank == 0.0) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
    }

    let primary = match direction {
        SortDirection::Ascending => a.rank.total_cmp(&b.rank),
        SortDirection::Descending => b.rank.total_cmp(&a.rank),
    };
    primary.then_with(|| a.record.host_name.cmp(&b.record.host_name))
}
