//! Session state machine and attempt bookkeeping types.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::server_list::types::ServerRecord;

/// Loggable identity of a candidate: hostname, IP and country code only.
/// Deliberately excludes the operator fields (PII) and the config blob.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub host_name: String,
    pub ip: String,
    pub country_short: String,
}

impl From<&ServerRecord> for CandidateSummary {
    fn from(record: &ServerRecord) -> Self {
        Self {
            host_name: record.host_name.clone(),
            ip: record.ip.clone(),
            country_short: record.country_short.clone(),
        }
    }
}

impl fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.host_name, self.ip, self.country_short)
    }
}

/// Result of a single connection attempt against one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttemptOutcome {
    Pending,
    Connected,
    TimedOut,
    ProcessFailed,
    Aborted,
}

/// Transient record of one attempt. The spawned process handle itself is
/// owned by the supervisor for the attempt's lifetime and released on
/// every exit path; this struct carries the audit trail.
#[derive(Debug, Clone)]
pub struct ConnectionAttempt {
    pub id: Uuid,
    pub candidate: CandidateSummary,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
}

impl ConnectionAttempt {
    pub fn new(candidate: CandidateSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            started_at: Utc::now(),
            outcome: AttemptOutcome::Pending,
        }
    }
}

/// Why a run ended without a working tunnel.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Ranking filtered every record away; no attempt was made.
    EmptyCandidateSet,
    /// Every ranked candidate failed or timed out.
    ExhaustedCandidates,
    /// The list could not be fetched at all.
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::EmptyCandidateSet => write!(f, "no usable candidates after filtering"),
            FailureReason::ExhaustedCandidates => write!(f, "all candidates exhausted"),
            FailureReason::Transport(e) => write!(f, "list download failed: {}", e),
        }
    }
}

/// Single-run session state. Owned and mutated exclusively by the
/// connection supervisor; every change is delivered to the session
/// reporter exactly once, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Fetching,
    Parsing,
    Selecting,
    Connecting(CandidateSummary),
    Connected(CandidateSummary),
    Failed(FailureReason),
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Fetching => write!(f, "fetching server list"),
            SessionState::Parsing => write!(f, "parsing server list"),
            SessionState::Selecting => write!(f, "selecting candidates"),
            SessionState::Connecting(c) => write!(f, "connecting to {}", c),
            SessionState::Connected(c) => write!(f, "connected to {}", c),
            SessionState::Failed(reason) => write!(f, "failed: {}", reason),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How a full run ended, as seen by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A tunnel was established (and, for the foreground binary, later
    /// closed by the process or the network, not by the user).
    Connected,
    Failed(FailureReason),
    /// User-initiated cancellation. Not an error.
    Aborted,
}

/// Supervisor policy knobs.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long one candidate gets to report an established connection.
    pub connect_timeout: Duration,
    /// Wait between the graceful termination signal and the forced kill.
    pub kill_grace_period: Duration,
    /// Cap on how many ranked candidates to try; `None` tries them all.
    pub max_candidates: Option<usize>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            kill_grace_period: Duration::from_secs(5),
            max_candidates: None,
        }
    }
}
