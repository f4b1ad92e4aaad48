// Manager façade
//
// Wires platform detection, the process supervisor, the control-plane
// client, and binary provisioning behind one type. Pure delegation; the
// semantics live in the components.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Response;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{NgrokApiClient, TunnelRequest};
use crate::config::NgrokConfig;
use crate::error::Result;
use crate::platform::Platform;
use crate::process::NgrokSupervisor;
use crate::provision::{BinaryProvider, DirBinaryProvider};

/// Caller-facing entry point for supervising a local ngrok agent and
/// driving its tunnel API.
pub struct NgrokManager {
    config: NgrokConfig,
    platform: Platform,
    supervisor: NgrokSupervisor,
    api: NgrokApiClient,
    provider: Box<dyn BinaryProvider>,
}

impl NgrokManager {
    /// Builds a manager with the default provisioning strategy (binary
    /// already present in `config.binary_dir`). Fails on an unsupported
    /// host platform.
    pub fn new(config: NgrokConfig) -> Result<Self> {
        Self::with_provider(config, Box::new(DirBinaryProvider))
    }

    /// Same as [`new`](Self::new) with a custom binary provider, e.g. one
    /// that downloads and unpacks a release archive.
    pub fn with_provider(config: NgrokConfig, provider: Box<dyn BinaryProvider>) -> Result<Self> {
        let platform = Platform::detect()?;
        let binary = platform.binary_path(&config.binary_dir);
        let supervisor = NgrokSupervisor::new(platform, binary);
        let api = NgrokApiClient::new(&config)?;

        Ok(Self {
            config,
            platform,
            supervisor,
            api,
            provider,
        })
    }

    pub fn config(&self) -> &NgrokConfig {
        &self.config
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Where the agent binary is expected to live.
    pub fn binary_path(&self) -> &Path {
        self.supervisor.binary_path()
    }

    /// The daemon's own per-user config file, for diagnostics.
    pub fn config_file(&self) -> Result<PathBuf> {
        self.platform.config_file()
    }

    /// Ensures the agent binary exists and is executable. Idempotent.
    pub async fn provision(&self) -> Result<PathBuf> {
        self.provider.provision(self.platform, &self.config).await
    }

    /// Registers the account credential with the daemon's config file.
    /// Fails if a daemon is currently running.
    pub async fn register_authtoken(&self, token: &str) -> Result<()> {
        self.supervisor.register_authtoken(token).await
    }

    /// Starts the daemon in the configured region, output discarded.
    pub async fn start(&self) -> Result<()> {
        self.supervisor.start(self.config.region).await
    }

    /// Starts the daemon in the configured region with log capture and
    /// address extraction enabled.
    pub async fn start_with_logging(&self) -> Result<()> {
        self.supervisor.start_with_logging(self.config.region).await
    }

    /// Stops the daemon if one is running; a no-op otherwise.
    pub async fn stop(&self) -> Result<()> {
        self.supervisor.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.supervisor.is_running().await
    }

    /// Waits for the control plane to answer a basic query.
    pub async fn wait_until_ready(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.api.wait_until_ready(timeout, cancel).await
    }

    pub async fn create_tunnel(&self, request: &TunnelRequest) -> Result<Response> {
        self.api.create_tunnel(request).await
    }

    pub async fn delete_tunnel(&self, name: &str) -> Result<Response> {
        self.api.delete_tunnel(name).await
    }

    pub async fn list_tunnels(&self) -> Result<Response> {
        self.api.list_tunnels().await
    }

    pub async fn list_captured_requests(
        &self,
        limit: u32,
        tunnel: Option<&str>,
    ) -> Result<Response> {
        self.api.list_captured_requests(limit, tunnel).await
    }

    pub async fn captured_request_detail(&self, id: &str) -> Result<Response> {
        self.api.captured_request_detail(id).await
    }

    pub async fn delete_captured_requests(&self) -> Result<Response> {
        self.api.delete_captured_requests().await
    }

    /// Subscribes to public-address notifications parsed from the
    /// daemon's logs (requires [`start_with_logging`](Self::start_with_logging)).
    pub fn address_changes(&self) -> watch::Receiver<Option<String>> {
        self.supervisor.address_changes()
    }

    /// The most recently advertised public address, if any.
    pub fn public_address(&self) -> Option<String> {
        self.supervisor.public_address()
    }
}
