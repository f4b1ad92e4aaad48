// Control-plane API module
//
// Client and wire types for the daemon's local HTTP management API on
// port 4040: tunnel CRUD and captured-request inspection.

pub mod client;
pub mod types;

pub use client::{NgrokApiClient, DEFAULT_CAPTURE_LIMIT, DEFAULT_READY_TIMEOUT};
pub use types::{
    CapturedHttpRequest, CapturedHttpResponse, CapturedRequest, CapturedRequestList,
    TunnelDescriptor, TunnelList, TunnelRequest,
};
