// Construction-time configuration
//
// Everything that used to be a global default (download directory, region,
// control-plane address) is an explicit field here, set once when the
// manager is built.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Default base URL of the daemon's local control plane.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4040/api";

/// Region the daemon connects through, mapped to the agent's fixed
/// two-letter wire codes. The set is closed; there is no way to pass an
/// unmapped region to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    UnitedStates,
    Europe,
    AsiaPacific,
    Australia,
    SouthAmerica,
    Japan,
    India,
}

impl Region {
    /// All supported regions, in wire-code order.
    pub const ALL: [Region; 7] = [
        Region::UnitedStates,
        Region::Europe,
        Region::AsiaPacific,
        Region::Australia,
        Region::SouthAmerica,
        Region::Japan,
        Region::India,
    ];

    /// The two-letter code passed to the daemon via `--region`.
    pub fn code(self) -> &'static str {
        match self {
            Region::UnitedStates => "us",
            Region::Europe => "eu",
            Region::AsiaPacific => "ap",
            Region::Australia => "au",
            Region::SouthAmerica => "sa",
            Region::Japan => "jp",
            Region::India => "in",
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::UnitedStates
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = Error;

    /// Parses a two-letter wire code (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownRegion {
                value: s.to_string(),
            })
    }
}

/// Settings for an [`NgrokManager`](crate::manager::NgrokManager).
#[derive(Debug, Clone)]
pub struct NgrokConfig {
    /// Directory the ngrok binary lives in, or will be provisioned into.
    pub binary_dir: PathBuf,
    /// Region passed to the daemon on start.
    pub region: Region,
    /// Base URL of the daemon's control plane. Overridable so tests can
    /// point the client at a mock server.
    pub api_base_url: String,
}

impl NgrokConfig {
    /// Per-user default binary directory: the platform's local data dir
    /// (falling back to the current directory) plus an `ngrokman` segment.
    pub fn default_binary_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ngrokman")
    }
}

impl Default for NgrokConfig {
    fn default() -> Self {
        Self {
            binary_dir: Self::default_binary_dir(),
            region: Region::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}
