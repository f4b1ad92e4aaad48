// HTTP client for the agent's control plane
//
// Tunnel CRUD and captured-request inspection against the daemon's local
// API. Calls hand back the transport-level response; the only behavior
// layered on top is client-side field validation, the bounded 503 retry on
// tunnel creation, and the readiness poll.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::types::TunnelRequest;
use crate::config::NgrokConfig;
use crate::error::{Error, Result};

/// Additional attempts after the first 503 before tunnel creation gives up.
const CREATE_RETRIES: u32 = 5;
/// Attempts in total for one `create_tunnel` call.
const CREATE_ATTEMPTS: u32 = CREATE_RETRIES + 1;
/// Delay between tunnel-creation attempts.
const CREATE_RETRY_DELAY: Duration = Duration::from_millis(200);
/// Interval between readiness probes.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Per-probe timeout so a hung connect cannot stall the poll loop.
const READY_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound on entries returned by captured-request listings.
pub const DEFAULT_CAPTURE_LIMIT: u32 = 50;
/// Default budget for [`NgrokApiClient::wait_until_ready`].
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(4);

/// Client for the daemon's local HTTP API. Cheap to share: the underlying
/// `reqwest::Client` is pooled and safe for concurrent calls.
pub struct NgrokApiClient {
    base_url: String,
    http: Client,
}

impl NgrokApiClient {
    pub fn new(config: &NgrokConfig) -> Result<Self> {
        Self::with_base_url(config.api_base_url.clone())
    }

    /// Builds a client against an explicit base URL, e.g. a mock server in
    /// tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Creates a tunnel. Validates the request fields before any I/O, then
    /// POSTs it with unset optional fields omitted. A 503 answer means the
    /// daemon's session is still coming up, so the call retries up to
    /// [`CREATE_RETRIES`] more times at a fixed delay; every other
    /// non-success status fails immediately with the status and body.
    pub async fn create_tunnel(&self, request: &TunnelRequest) -> Result<Response> {
        require_filled("name", &request.name)?;
        require_filled("proto", &request.proto)?;
        require_filled("addr", &request.addr)?;

        let url = self.url("/tunnels");
        for attempt in 1..=CREATE_ATTEMPTS {
            debug!(url = %url, attempt, name = %request.name, "Creating tunnel");
            let response = self.http.post(&url).json(request).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::SERVICE_UNAVAILABLE {
                warn!(attempt, "Control plane not ready for tunnel creation yet");
                if attempt < CREATE_ATTEMPTS {
                    sleep(CREATE_RETRY_DELAY).await;
                }
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(Error::RequestFailed { status, body });
        }

        Err(Error::RetriesExhausted {
            attempts: CREATE_ATTEMPTS,
        })
    }

    /// Deletes a tunnel by name. Single call, no retry; the caller
    /// inspects the returned status (204 on success).
    pub async fn delete_tunnel(&self, name: &str) -> Result<Response> {
        require_filled("name", name)?;

        let url = self.url(&format!("/tunnels/{name}"));
        debug!(url = %url, "Deleting tunnel");
        Ok(self.http.delete(&url).send().await?)
    }

    pub async fn list_tunnels(&self) -> Result<Response> {
        let url = self.url("/tunnels");
        debug!(url = %url, "Listing tunnels");
        Ok(self.http.get(&url).send().await?)
    }

    /// Lists captured HTTP requests, at most `limit` entries, optionally
    /// restricted to one tunnel.
    pub async fn list_captured_requests(
        &self,
        limit: u32,
        tunnel: Option<&str>,
    ) -> Result<Response> {
        let url = match tunnel {
            Some(name) => {
                require_filled("tunnel_name", name)?;
                self.url(&format!("/requests/http?limit={limit}&tunnel_name={name}"))
            }
            None => self.url(&format!("/requests/http?limit={limit}")),
        };

        debug!(url = %url, "Listing captured requests");
        Ok(self.http.get(&url).send().await?)
    }

    pub async fn captured_request_detail(&self, id: &str) -> Result<Response> {
        require_filled("id", id)?;

        let url = self.url(&format!("/requests/http/{id}"));
        debug!(url = %url, "Fetching captured request detail");
        Ok(self.http.get(&url).send().await?)
    }

    /// Clears the daemon's inspection buffer.
    pub async fn delete_captured_requests(&self) -> Result<Response> {
        let url = self.url("/requests/http");
        debug!(url = %url, "Deleting captured requests");
        Ok(self.http.delete(&url).send().await?)
    }

    /// Polls the tunnel-listing endpoint until the control plane answers
    /// with a success status or `timeout` elapses. Connection refusals and
    /// other transport failures count as "not yet ready" while the budget
    /// lasts; once it is spent, the last observed failure is returned so
    /// the caller sees the true cause rather than a generic timeout. The
    /// token is checked on every iteration.
    pub async fn wait_until_ready(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = self.url("/tunnels");
        let deadline = Instant::now() + timeout;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let probe = self
                .http
                .get(&url)
                .timeout(READY_PROBE_TIMEOUT)
                .send()
                .await;

            let failure = match probe {
                Ok(response) if response.status().is_success() => {
                    debug!(url = %url, "Control plane is ready");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    debug!(url = %url, %status, "Control plane not ready yet");
                    let body = response.text().await.unwrap_or_default();
                    Error::RequestFailed { status, body }
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "Control plane probe failed");
                    Error::Http(e)
                }
            };

            if Instant::now() >= deadline {
                return Err(failure);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = sleep(READY_POLL_INTERVAL) => {}
            }
        }
    }
}

fn require_filled(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument { field });
    }
    Ok(())
}
