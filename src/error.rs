// Error types for ngrok supervision and control-plane calls
//
// Validation and state errors surface immediately; transient failures are
// retried up to their documented bound before they show up here.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias using the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a public operation of this crate can fail with.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was blank or whitespace-only. Raised before any
    /// network call is made.
    #[error("Value cannot be blank: {field}")]
    InvalidArgument { field: &'static str },

    /// `start` was called while a daemon handle is already held, whether or
    /// not that process is still alive.
    #[error("The ngrok daemon is already running; call stop() before starting it again")]
    AlreadyRunning,

    /// Registration shares the daemon's config file and must not race a
    /// live process.
    #[error("Cannot register an auth token while the ngrok daemon is running; call stop() first")]
    RegisterWhileRunning,

    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: &'static str },

    #[error("Unknown region code: {value}")]
    UnknownRegion { value: String },

    #[error("Failed to launch ngrok at {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Auth token registration failed with {status}")]
    Registration { status: std::process::ExitStatus },

    #[error("ngrok binary not found at {}; fetch it from {download_url}", .path.display())]
    BinaryMissing {
        path: PathBuf,
        download_url: &'static str,
    },

    #[error("Could not determine the user home directory")]
    HomeDirUnavailable,

    /// The control plane kept answering 503 for every attempt of the
    /// bounded tunnel-creation retry loop.
    #[error("Tunnel creation still unavailable after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// A non-success control-plane response outside the retry policy,
    /// with the body the daemon sent.
    #[error("Control plane returned {status}: {body}")]
    RequestFailed { status: StatusCode, body: String },

    /// The readiness wait observed its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Transport-level failure. During readiness polling the last of these
    /// is re-raised verbatim once the timeout elapses.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
