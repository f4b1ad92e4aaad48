// ngrokman - supervise a local ngrok agent and drive its tunnel API
//
// Library exports. The manager is the usual entry point; the supervisor
// and API client are usable on their own.

pub mod api; // Control-plane client and wire types
pub mod config; // Construction-time settings and regions
pub mod error;
pub mod manager; // Caller-facing façade
pub mod platform; // Per-OS paths, argv, and capabilities
pub mod process; // Daemon lifecycle and log consumption
pub mod provision; // Binary provisioning seam

pub use api::{NgrokApiClient, TunnelRequest};
pub use config::{NgrokConfig, Region};
pub use error::{Error, Result};
pub use manager::NgrokManager;
pub use platform::Platform;
pub use process::NgrokSupervisor;
pub use provision::{BinaryProvider, DirBinaryProvider};
