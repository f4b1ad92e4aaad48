// ngrok agent process lifecycle
//
// Owns the daemon child-process handle behind an internal async mutex, so
// one lifecycle operation is in flight at a time and callers need no
// locking discipline of their own. The handle is never shared.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::Region;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::process::log_stream;

/// Where the supervisor is in the daemon's lifecycle. `Starting` and
/// `Stopping` are only ever held across a transition inside the state
/// mutex; a poisoned transition falls back to `Idle`.
enum SupervisorState {
    Idle,
    Starting,
    Running { child: Child, region: Region },
    Stopping,
}

/// Supervises a single ngrok agent process. At most one live daemon per
/// supervisor: starting while a handle is held fails rather than
/// silently orphaning the previous process.
pub struct NgrokSupervisor {
    platform: Platform,
    binary: PathBuf,
    state: Mutex<SupervisorState>,
    addr_tx: watch::Sender<Option<String>>,
}

impl NgrokSupervisor {
    /// Builds a supervisor for the agent binary at `binary`. Nothing is
    /// spawned until [`start`](Self::start) is called.
    pub fn new(platform: Platform, binary: PathBuf) -> Self {
        let (addr_tx, _) = watch::channel(None);
        Self {
            platform,
            binary,
            state: Mutex::new(SupervisorState::Idle),
            addr_tx,
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary
    }

    /// Starts the daemon without tunnels in `region`, output discarded.
    /// Fails with [`Error::AlreadyRunning`] if a handle is already held,
    /// whether or not that process is still alive.
    pub async fn start(&self, region: Region) -> Result<()> {
        let args = self.platform.start_args(region);
        self.start_inner(region, args, false).await
    }

    /// Same as [`start`](Self::start), with structured logs on stdout and
    /// the log pumps attached before any line can be lost. Addresses the
    /// daemon advertises become visible via
    /// [`address_changes`](Self::address_changes).
    pub async fn start_with_logging(&self, region: Region) -> Result<()> {
        let args = self.platform.start_with_logging_args(region);
        self.start_inner(region, args, true).await
    }

    async fn start_inner(&self, region: Region, args: Vec<String>, logging: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if matches!(*state, SupervisorState::Running { .. }) {
            return Err(Error::AlreadyRunning);
        }
        *state = SupervisorState::Starting;

        let mut command = Command::new(&self.binary);
        command.args(&args).stdin(Stdio::null()).kill_on_drop(true);
        if logging {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            // Nobody reads these pipes; null stdio keeps the daemon from
            // stalling once a pipe buffer fills.
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                *state = SupervisorState::Idle;
                error!(binary = %self.binary.display(), error = %source, "Failed to launch ngrok");
                return Err(Error::Spawn {
                    path: self.binary.clone(),
                    source,
                });
            }
        };

        if logging {
            // Both pipes exist: the command was configured piped just above.
            match (child.stdout.take(), child.stderr.take()) {
                (Some(stdout), Some(stderr)) => {
                    log_stream::spawn_pumps(stdout, stderr, self.addr_tx.clone());
                }
                _ => warn!("Daemon pipes unavailable; log capture disabled"),
            }
        }

        info!(
            binary = %self.binary.display(),
            region = %region,
            pid = child.id(),
            logging,
            "Started ngrok daemon"
        );
        *state = SupervisorState::Running { child, region };
        Ok(())
    }

    /// Stops the daemon if one is running. A supervisor that was never
    /// started, or whose daemon already exited, is left Idle without
    /// error.
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, SupervisorState::Stopping);

        let result = match previous {
            SupervisorState::Running { mut child, region } => {
                match child.try_wait()? {
                    Some(status) => {
                        debug!(region = %region, %status, "Daemon already exited; releasing handle");
                        Ok(())
                    }
                    None => {
                        child.kill().await?;
                        info!(region = %region, "Stopped ngrok daemon");
                        Ok(())
                    }
                }
            }
            _ => Ok(()),
        };

        *state = SupervisorState::Idle;
        result
    }

    /// Whether a daemon handle is currently held. The handle is kept even
    /// if the process exited on its own; only [`stop`](Self::stop)
    /// releases it.
    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, SupervisorState::Running { .. })
    }

    /// Runs `ngrok config add-authtoken <token>` once and waits for it to
    /// exit. Only valid while no daemon is live: registration and a
    /// running daemon share the same config file and must not race. The
    /// state mutex stays held for the duration, so a concurrent `start`
    /// cannot slip in either.
    pub async fn register_authtoken(&self, token: &str) -> Result<()> {
        if token.trim().is_empty() {
            return Err(Error::InvalidArgument { field: "token" });
        }

        let state = self.state.lock().await;
        if matches!(*state, SupervisorState::Running { .. }) {
            return Err(Error::RegisterWhileRunning);
        }

        debug!(binary = %self.binary.display(), "Registering auth token");
        let status = Command::new(&self.binary)
            .args(self.platform.register_token_args(token))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| Error::Spawn {
                path: self.binary.clone(),
                source,
            })?;

        if !status.success() {
            error!(%status, "Auth token registration failed");
            return Err(Error::Registration { status });
        }

        info!("Auth token registered");
        Ok(())
    }

    /// Subscribes to public-address notifications extracted from the
    /// daemon's logs. Starts as `None`; latest-value semantics.
    pub fn address_changes(&self) -> watch::Receiver<Option<String>> {
        self.addr_tx.subscribe()
    }

    /// The most recently advertised public address, if any was seen.
    pub fn public_address(&self) -> Option<String> {
        self.addr_tx.borrow().clone()
    }
}
