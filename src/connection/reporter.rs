use log::{info, warn};

use crate::connection::types::SessionState;

/// Sink for session state transitions.
///
/// The supervisor delivers every transition exactly once, in order.
/// Implementations only deliver the event; actual rendering belongs to
/// the consumer (log output here, a UI elsewhere).
pub trait SessionReporter {
    fn on_transition(&mut self, old: &SessionState, new: &SessionState);
}

/// Default reporter: one log line per transition.
pub struct LogReporter;

impl SessionReporter for LogReporter {
    fn on_transition(&mut self, old: &SessionState, new: &SessionState) {
        match new {
            SessionState::Failed(reason) => warn!("Session failed: {}", reason),
            _ => info!("Session: {} -> {}", old, new),
        }
    }
}
