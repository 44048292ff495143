use log::{error, info};
use tokio::sync::watch;

use crate::configuration::config::Config;
use crate::connection::process::OpenVpnLauncher;
use crate::connection::reporter::LogReporter;
use crate::connection::supervisor::ConnectionSupervisor;
use crate::connection::types::{FailureReason, RunOutcome, SessionState};
use crate::error_handling::types::RankingError;
use crate::ranking::ranker;
use crate::server_list::fetcher::ListFetcher;
use crate::server_list::parser;

/// Glues the pipeline together: fetch the list, parse it, rank the
/// records, then hand the ranked candidates to the connection supervisor.
/// The supervisor owns the session state throughout; the controller only
/// tells it which phase the pipeline is in.
pub struct Controller {
    config: Config,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            config,
            cancel_tx,
            cancel_rx,
        }
    }

    /// Cancellation handle for the caller's signal handler. Sending `true`
    /// aborts the run at the next suspension point, after terminating any
    /// in-flight VPN process.
    pub fn cancel_handle(&self) -> watch::Sender<bool> {
        self.cancel_tx.clone()
    }

    /// Runs one full session and returns how it ended. Per-record and
    /// per-candidate failures are absorbed along the way; only fetch
    /// failure, an empty candidate set, exhaustion or cancellation ends
    /// the run without a tunnel.
    pub async fn run(&mut self) -> RunOutcome {
        let mut supervisor = ConnectionSupervisor::new(
            OpenVpnLauncher::new(&self.config.openvpn_bin),
            LogReporter,
            self.config.supervisor_config(),
            self.cancel_rx.clone(),
        );

        supervisor.enter_phase(SessionState::Fetching);
        let fetcher = match ListFetcher::new(self.config.fetch_timeout()) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                error!("Could not build HTTP client: {}", e);
                return supervisor.fail(FailureReason::Transport(e.to_string()));
            }
        };
        let raw = match fetcher.fetch(&self.config.url).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Server list fetch failed: {}", e);
                return supervisor.fail(FailureReason::Transport(e.to_string()));
            }
        };

        supervisor.enter_phase(SessionState::Parsing);
        let (records, _warnings) = parser::parse(&raw);

        supervisor.enter_phase(SessionState::Selecting);
        let policy = self.config.rank_policy();
        let candidates = match ranker::rank(records, &policy) {
            Ok(candidates) => candidates,
            Err(RankingError::EmptyCandidateSet) => {
                return supervisor.fail(FailureReason::EmptyCandidateSet);
            }
        };

        match supervisor.connect(&candidates).await {
            RunOutcome::Connected => {
                info!("Tunnel up; supervising until it closes or Ctrl-C");
                supervisor.monitor().await
            }
            outcome => outcome,
        }
    }
}
