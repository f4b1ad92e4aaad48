// Per-OS knowledge about the ngrok agent
//
// Binary and config-file locations, release download URLs, the
// executable-bit capability, and the argv the daemon is invoked with.
// The variant is selected once at construction and never changes.

use std::path::{Path, PathBuf};

use crate::config::Region;
use crate::error::{Error, Result};

const LINUX_DOWNLOAD_URL: &str =
    "https://bin.equinox.io/c/4VmDzA7iaHb/ngrok-stable-linux-amd64.zip";
const MACOS_DOWNLOAD_URL: &str =
    "https://bin.equinox.io/c/bNyj1mQVY4c/ngrok-v3-stable-darwin-amd64.zip";
const WINDOWS_DOWNLOAD_URL: &str =
    "https://bin.equinox.io/c/4VmDzA7iaHb/ngrok-stable-windows-amd64.zip";

/// Closed set of supported host platforms. Anything else fails at
/// construction via [`Platform::detect`]; there is no fallback variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    /// Selects the variant for the current OS. Called once when a manager
    /// is built; the result is immutable for the manager's lifetime.
    pub fn detect() -> Result<Self> {
        if cfg!(windows) {
            Ok(Platform::Windows)
        } else if cfg!(unix) {
            Ok(Platform::Unix)
        } else {
            Err(Error::UnsupportedPlatform {
                os: std::env::consts::OS,
            })
        }
    }

    pub fn binary_name(self) -> &'static str {
        match self {
            Platform::Unix => "ngrok",
            Platform::Windows => "ngrok.exe",
        }
    }

    /// Where the agent binary lives inside `dir`.
    pub fn binary_path(self, dir: &Path) -> PathBuf {
        dir.join(self.binary_name())
    }

    /// The daemon's persistent per-user config file. Fixed location,
    /// independent of where the binary was placed; the daemon itself reads
    /// and writes it.
    pub fn config_file(self) -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
        Ok(home.join(".ngrok2").join("ngrok.yml"))
    }

    /// Stable release archive for this platform, for provisioning
    /// collaborators that fetch the binary themselves. The Unix variant
    /// spans Linux and macOS, which ship as separate archives.
    pub fn download_url(self) -> &'static str {
        match self {
            Platform::Windows => WINDOWS_DOWNLOAD_URL,
            Platform::Unix => {
                if cfg!(target_os = "macos") {
                    MACOS_DOWNLOAD_URL
                } else {
                    LINUX_DOWNLOAD_URL
                }
            }
        }
    }

    /// Marks the binary executable where the OS requires it; a no-op on
    /// Windows.
    pub fn set_executable(self, path: &Path) -> Result<()> {
        match self {
            Platform::Windows => Ok(()),
            Platform::Unix => mark_executable(path),
        }
    }

    /// Argv for a tunnel-less daemon start.
    pub fn start_args(self, region: Region) -> Vec<String> {
        vec![
            "start".to_string(),
            "--none".to_string(),
            "--region".to_string(),
            region.code().to_string(),
        ]
    }

    /// Same as [`Platform::start_args`] plus structured log output on
    /// stdout, for the piped-log start variant.
    pub fn start_with_logging_args(self, region: Region) -> Vec<String> {
        let mut args = self.start_args(region);
        args.push("--log=stdout".to_string());
        args
    }

    /// Argv for the one-shot credential-registration subcommand.
    pub fn register_token_args(self, token: &str) -> Vec<String> {
        vec![
            "config".to_string(),
            "add-authtoken".to_string(),
            token.to_string(),
        ]
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
