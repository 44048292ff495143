use log::{error, info};

use vpngate_client::configuration::config::Config;
use vpngate_client::connection::types::{FailureReason, RunOutcome};
use vpngate_client::controller::controller_handler::Controller;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let config = Config::from_args();
    info!(
        "vpngate-client starting (list source: {}, sort key: {:?})",
        config.url, config.sort_key
    );

    let mut controller = Controller::new(config);

    // First Ctrl-C requests a cooperative shutdown; the supervisor
    // terminates any in-flight VPN process before acknowledging it.
    let cancel = controller.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = cancel.send(true);
        }
    });

    let outcome = controller.run().await;
    let code = match &outcome {
        RunOutcome::Connected => {
            info!("Session finished");
            0
        }
        RunOutcome::Failed(FailureReason::ExhaustedCandidates) => {
            error!("No candidate could be connected to");
            2
        }
        RunOutcome::Failed(FailureReason::Transport(e)) => {
            error!("Could not download the server list: {}", e);
            3
        }
        RunOutcome::Failed(FailureReason::EmptyCandidateSet) => {
            error!("Filtering left no candidate servers to try");
            4
        }
        RunOutcome::Aborted => {
            info!("Aborted by user");
            130
        }
    };
    std::process::exit(code);
}
