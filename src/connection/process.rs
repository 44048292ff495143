//! Process boundary for the external OpenVPN client.
//!
//! The supervisor never talks to `tokio::process` directly; it drives a
//! [`VpnProcess`] obtained from a [`VpnLauncher`]. Production uses
//! [`OpenVpnLauncher`]; tests inject scripted fakes so timeout, failover
//! and cancellation can be exercised without spawning anything.

use log::{debug, warn};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error_handling::types::ConnectError;

/// Stdout line emitted by OpenVPN once the tunnel is up.
pub const SUCCESS_MARKER: &str = "Initialization Sequence Completed";

/// One observable event from a running VPN process.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// A line of process output.
    Line(String),
    /// The process exited with the given status code, if any.
    Exited(Option<i32>),
}

/// A running (or scripted) VPN client process.
#[allow(async_fn_in_trait)]
pub trait VpnProcess {
    /// Resolves with the next output line or the process exit. Must be
    /// cancel safe: the supervisor races it against its timer and its
    /// cancellation channel.
    async fn next_event(&mut self) -> ProcessEvent;

    /// Terminates the process: graceful signal first, forced kill once
    /// `grace` elapses. Returns only after the process is gone.
    async fn terminate(&mut self, grace: Duration);
}

/// Spawns VPN client processes for candidate configurations.
#[allow(async_fn_in_trait)]
pub trait VpnLauncher {
    type Process: VpnProcess;

    async fn launch(&mut self, config_path: &Path) -> Result<Self::Process, ConnectError>;
}

/// Launches the real `openvpn` binary with `--config <path>`.
pub struct OpenVpnLauncher {
    binary: String,
}

impl OpenVpnLauncher {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl VpnLauncher for OpenVpnLauncher {
    type Process = OpenVpnProcess;

    async fn launch(&mut self, config_path: &Path) -> Result<OpenVpnProcess, ConnectError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--config")
            .arg(config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning {} --config {}", self.binary, config_path.display());
        let mut child = cmd
            .spawn()
            .map_err(|e| ConnectError::SpawnFailed(format!("{}: {}", self.binary, e)))?;

        // Pump both output streams into one line channel; OpenVPN logs its
        // status lines to stdout but errors land on stderr.
        let (tx, rx) = mpsc::channel(64);
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            let mut reader = BufReader::new(stdout).lines();
            tokio::spawn(async move {
                while let Ok(Some(line)) = reader.next_line().await {
                    debug!("[openvpn] {}", line);
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr).lines();
            tokio::spawn(async move {
                while let Ok(Some(line)) = reader.next_line().await {
                    debug!("[openvpn:stderr] {}", line);
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(OpenVpnProcess { child, lines: rx })
    }
}

/// Handle to a spawned OpenVPN child with its output line stream.
pub struct OpenVpnProcess {
    child: tokio::process::Child,
    lines: mpsc::Receiver<String>,
}

impl VpnProcess for OpenVpnProcess {
    async fn next_event(&mut self) -> ProcessEvent {
        tokio::select! {
            line = self.lines.recv() => match line {
                Some(line) => ProcessEvent::Line(line),
                // Output streams closed; nothing left but the exit status.
                None => {
                    let status = self.child.wait().await.ok();
                    ProcessEvent::Exited(status.and_then(|s| s.code()))
                }
            },
            status = self.child.wait() => {
                ProcessEvent::Exited(status.ok().and_then(|s| s.code()))
            }
        }
    }

    async fn terminate(&mut self, grace: Duration) {
        if let Some(pid) = self.child.id() {
            debug!("Sending SIGTERM to pid {}", pid);
            let signalled = Command::new("kill")
                .arg("-TERM")
                .arg(pid.to_string())
                .status()
                .await
                .map(|s| s.success())
                .unwrap_or(false);

            if signalled {
                match tokio::time::timeout(grace, self.child.wait()).await {
                    Ok(_) => {
                        debug!("Process {} exited within grace period", pid);
                        return;
                    }
                    Err(_) => warn!("Process {} ignored SIGTERM, killing", pid),
                }
            }
        }

        if let Err(e) = self.child.kill().await {
            // Usually means the process exited between the signal and here.
            debug!("Kill after grace period returned: {}", e);
        }
    }
}
