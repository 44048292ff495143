use log::{debug, info, warn};
use regex::Regex;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::connection::process::{ProcessEvent, VpnLauncher, VpnProcess, SUCCESS_MARKER};
use crate::connection::reporter::SessionReporter;
use crate::connection::types::{
    AttemptOutcome, CandidateSummary, ConnectionAttempt, FailureReason, RunOutcome, SessionState,
    SupervisorConfig,
};
use crate::error_handling::types::ConnectError;
use crate::ranking::types::RankedCandidate;

/// Drives an external VPN process through a sequence of ranked candidates.
///
/// The supervisor owns the run's [`SessionState`] and is its only mutator;
/// every change funnels through one transition point that notifies the
/// reporter exactly once, in order. At most one child process exists at
/// any time: the previous candidate's process is terminated and its temp
/// config dropped before the next launch.
pub struct ConnectionSupervisor<L: VpnLauncher, R: SessionReporter> {
    launcher: L,
    reporter: R,
    config: SupervisorConfig,
    state: SessionState,
    cancel: watch::Receiver<bool>,
    cancel_closed: bool,
    success_marker: Regex,
    active: Option<ActiveTunnel<L::Process>>,
    attempts: Vec<ConnectionAttempt>,
}

/// The one live tunnel after a successful attempt. Holding the temp file
/// keeps the rendered config on disk for the process's lifetime; dropping
/// the tunnel removes it.
struct ActiveTunnel<P> {
    process: P,
    attempt: ConnectionAttempt,
    _config_file: NamedTempFile,
}

impl<L: VpnLauncher, R: SessionReporter> ConnectionSupervisor<L, R> {
    pub fn new(
        launcher: L,
        reporter: R,
        config: SupervisorConfig,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            launcher,
            reporter,
            config,
            state: SessionState::Idle,
            cancel,
            cancel_closed: false,
            success_marker: Regex::new(SUCCESS_MARKER).expect("success marker regex"),
            active: None,
            attempts: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Audit trail of every concluded attempt this run, in order.
    pub fn attempts(&self) -> &[ConnectionAttempt] {
        &self.attempts
    }

    /// Marks a pipeline phase driven by the controller (fetching, parsing,
    /// selecting). Goes through the same transition funnel as everything
    /// else so the reporter sees the full ordered history.
    pub fn enter_phase(&mut self, state: SessionState) {
        self.transition(state);
    }

    /// Terminal failure; returns the outcome for the caller to propagate.
    pub fn fail(&mut self, reason: FailureReason) -> RunOutcome {
        self.transition(SessionState::Failed(reason.clone()));
        RunOutcome::Failed(reason)
    }

    /// Iterates ranked candidates until one connects, the list (or the
    /// configured cap) is exhausted, or the caller cancels.
    ///
    /// On `RunOutcome::Connected` the supervisor keeps the live process;
    /// follow up with [`monitor`](Self::monitor) to stay attached to it.
    pub async fn connect(&mut self, candidates: &[RankedCandidate]) -> RunOutcome {
        if candidates.is_empty() {
            return self.fail(FailureReason::EmptyCandidateSet);
        }

        let cap = self.config.max_candidates.unwrap_or(candidates.len());
        info!(
            "Trying up to {} of {} ranked candidates",
            cap.min(candidates.len()),
            candidates.len()
        );

        for candidate in candidates.iter().take(cap) {
            if self.cancelled() {
                self.transition(SessionState::Stopped);
                return RunOutcome::Aborted;
            }

            let summary = CandidateSummary::from(&candidate.record);
            self.transition(SessionState::Connecting(summary.clone()));

            match self.try_candidate(candidate, summary.clone()).await {
                AttemptOutcome::Connected => {
                    self.transition(SessionState::Connected(summary));
                    return RunOutcome::Connected;
                }
                AttemptOutcome::Aborted => {
                    self.transition(SessionState::Stopped);
                    return RunOutcome::Aborted;
                }
                outcome => {
                    warn!("Candidate {} failed ({:?}), failing over", summary, outcome);
                }
            }
        }

        self.fail(FailureReason::ExhaustedCandidates)
    }

    /// Stays attached to the established tunnel until the VPN process
    /// exits on its own or the caller cancels. The process is always
    /// terminated before a cancellation is acknowledged.
    pub async fn monitor(&mut self) -> RunOutcome {
        let mut tunnel = match self.active.take() {
            Some(t) => t,
            None => {
                debug!("monitor() called without an active tunnel");
                return RunOutcome::Connected;
            }
        };

        let grace = self.config.kill_grace_period;
        if self.cancelled() {
            tunnel.process.terminate(grace).await;
            self.transition(SessionState::Stopped);
            return RunOutcome::Aborted;
        }

        loop {
            tokio::select! {
                event = tunnel.process.next_event() => match event {
                    // Keep draining tunnel chatter while connected.
                    ProcessEvent::Line(_) => {}
                    ProcessEvent::Exited(code) => {
                        info!(
                            "Tunnel to {} closed (exit status {:?})",
                            tunnel.attempt.candidate, code
                        );
                        self.transition(SessionState::Stopped);
                        return RunOutcome::Connected;
                    }
                },
                changed = self.cancel.changed(), if !self.cancel_closed => {
                    match changed {
                        Ok(()) if *self.cancel.borrow() => {
                            info!("Cancellation requested, closing tunnel");
                            tunnel.process.terminate(grace).await;
                            self.transition(SessionState::Stopped);
                            return RunOutcome::Aborted;
                        }
                        Ok(()) => {}
                        Err(_) => self.cancel_closed = true,
                    }
                }
            }
        }
    }

    /// Runs one candidate attempt to completion.
    ///
    /// Materializes the config blob to a temp file, launches the process
    /// and races its output against the connect deadline and the
    /// cancellation channel. Every exit path leaves no live process behind
    /// except `Connected`, which parks the tunnel in `self.active`. The
    /// concluded attempt is appended to the run's audit trail.
    async fn try_candidate(
        &mut self,
        candidate: &RankedCandidate,
        summary: CandidateSummary,
    ) -> AttemptOutcome {
        let mut attempt = ConnectionAttempt::new(summary);
        info!(
            "Attempt {} against {} (rank {})",
            attempt.id, attempt.candidate, candidate.rank
        );

        let config_file = match materialize_config(&candidate.record.openvpn_config) {
            Ok(file) => file,
            Err(e) => {
                warn!("Attempt {}: {}", attempt.id, e);
                return self.conclude(attempt, AttemptOutcome::ProcessFailed);
            }
        };

        let mut process = match self.launcher.launch(config_file.path()).await {
            Ok(process) => process,
            Err(e) => {
                warn!("Attempt {}: {}", attempt.id, e);
                return self.conclude(attempt, AttemptOutcome::ProcessFailed);
            }
        };

        let deadline = Instant::now() + self.config.connect_timeout;
        let grace = self.config.kill_grace_period;

        loop {
            tokio::select! {
                event = process.next_event() => match event {
                    ProcessEvent::Line(line) => {
                        if self.success_marker.is_match(&line) {
                            attempt.outcome = AttemptOutcome::Connected;
                            info!("Attempt {} established a tunnel", attempt.id);
                            self.attempts.push(attempt.clone());
                            self.active = Some(ActiveTunnel {
                                process,
                                attempt,
                                _config_file: config_file,
                            });
                            return AttemptOutcome::Connected;
                        }
                    }
                    ProcessEvent::Exited(code) => {
                        debug!(
                            "Attempt {}: process exited ({:?}) before establishing",
                            attempt.id, code
                        );
                        return self.conclude(attempt, AttemptOutcome::ProcessFailed);
                    }
                },
                _ = tokio::time::sleep_until(deadline) => {
                    warn!(
                        "Attempt {} timed out after {:?}",
                        attempt.id, self.config.connect_timeout
                    );
                    process.terminate(grace).await;
                    return self.conclude(attempt, AttemptOutcome::TimedOut);
                }
                changed = self.cancel.changed(), if !self.cancel_closed => {
                    match changed {
                        Ok(()) if *self.cancel.borrow() => {
                            info!("Attempt {} aborted by caller", attempt.id);
                            process.terminate(grace).await;
                            return self.conclude(attempt, AttemptOutcome::Aborted);
                        }
                        Ok(()) => {}
                        Err(_) => self.cancel_closed = true,
                    }
                }
            }
        }
    }

    /// Records a finished attempt in the trail and hands its outcome back.
    fn conclude(
        &mut self,
        mut attempt: ConnectionAttempt,
        outcome: AttemptOutcome,
    ) -> AttemptOutcome {
        attempt.outcome = outcome;
        self.attempts.push(attempt);
        outcome
    }

    /// Single funnel for state changes. Equal-state calls are no-ops so
    /// the reporter never sees a duplicate transition.
    fn transition(&mut self, new: SessionState) {
        if self.state == new {
            return;
        }
        let old = std::mem::replace(&mut self.state, new);
        debug!("State transition: {} -> {}", old, self.state);
        self.reporter.on_transition(&old, &self.state);
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Writes a decoded OpenVPN config bundle to a scoped temp file. The file
/// lives as long as the returned handle and is removed on drop, which
/// covers success, failure and cancellation paths alike.
fn materialize_config(blob: &[u8]) -> Result<NamedTempFile, ConnectError> {
    let mut file = tempfile::Builder::new()
        .prefix("vpngate-")
        .suffix(".ovpn")
        .tempfile()?;
    file.write_all(blob)?;
    file.flush()?;
    Ok(file)
}
