//! Connection supervision subsystem.
//!
//! Owns the session state machine: iterates ranked candidates, spawns and
//! monitors the external OpenVPN process for each, applies timeout and
//! failure detection, and fails over until a tunnel is established or the
//! list is exhausted.
//!
//! Re-exports:
//! - [`ConnectionSupervisor`]: the candidate loop and state machine.
//! - [`VpnLauncher`]/[`VpnProcess`]: the injectable process boundary.
//! - [`SessionReporter`]/[`LogReporter`]: transition sinks.
//! - State and outcome types from [`types`].

pub mod process;
pub mod reporter;
pub mod supervisor;
pub mod types;

pub use process::{OpenVpnLauncher, ProcessEvent, VpnLauncher, VpnProcess};
pub use reporter::{LogReporter, SessionReporter};
pub use supervisor::ConnectionSupervisor;
pub use types::{
    AttemptOutcome, CandidateSummary, ConnectionAttempt, FailureReason, RunOutcome, SessionState,
    SupervisorConfig,
};
