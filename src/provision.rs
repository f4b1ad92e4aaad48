// Binary provisioning seam
//
// The supervisor assumes the agent binary exists and is executable before
// `start` is called; this trait is where that guarantee comes from.
// Byte-level download and archive extraction live behind it, outside this
// crate.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::config::NgrokConfig;
use crate::error::{Error, Result};
use crate::platform::Platform;

/// Supplies a ready-to-run agent binary. Implementations must return the
/// path to an existing, executable binary or fail.
#[async_trait]
pub trait BinaryProvider: Send + Sync {
    async fn provision(&self, platform: Platform, config: &NgrokConfig) -> Result<PathBuf>;
}

/// Default provider: expects the binary to already sit in
/// `config.binary_dir` and only applies the executable bit. Errors carry
/// the per-OS download URL so an operator knows what to fetch.
#[derive(Debug, Default)]
pub struct DirBinaryProvider;

#[async_trait]
impl BinaryProvider for DirBinaryProvider {
    async fn provision(&self, platform: Platform, config: &NgrokConfig) -> Result<PathBuf> {
        let path = platform.binary_path(&config.binary_dir);
        if !path.is_file() {
            return Err(Error::BinaryMissing {
                path,
                download_url: platform.download_url(),
            });
        }

        platform.set_executable(&path)?;
        debug!(binary = %path.display(), "Agent binary provisioned");
        Ok(path)
    }
}
