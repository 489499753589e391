//! Proof service configuration and environment loading.
use std::env;
use std::path::PathBuf;

use zk::BackendKind;

/// Configuration shared by the service builder and its worker.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Directory holding `<circuit>.zkey` / `<circuit>.vkey` files.
    pub key_dir: PathBuf,
    pub backend: BackendKind,
    /// Evaluate every constraint while computing the witness.
    pub sanity_check: bool,
    /// When set, every generated proof is also written here as JSON.
    pub save_proofs_dir: Option<PathBuf>,
    /// Capacity of the worker's command channel.
    pub request_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            key_dir: default_key_dir(),
            backend: BackendKind::InMemory,
            sanity_check: false,
            save_proofs_dir: None,
            request_buffer: 16,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `RPS_KEY_DIR` - Proving/verifying key directory (default: platform data dir)
    /// - `RPS_BACKEND` - `file-path`, `in-memory` or `bridged` (default: in-memory)
    /// - `RPS_SANITY_CHECK` - Check constraints during witness computation (default: false)
    /// - `RPS_SAVE_PROOFS_DIR` - Directory for proof JSON files (default: unset)
    /// - `RPS_REQUEST_BUFFER` - Worker queue size (default: 16)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("RPS_KEY_DIR") {
            config.key_dir = PathBuf::from(dir);
        }

        if let Some(backend) = read_env::<BackendKind>("RPS_BACKEND") {
            config.backend = backend;
        }

        if let Some(enable) = read_env::<bool>("RPS_SANITY_CHECK") {
            config.sanity_check = enable;
        } else if env::var("RPS_SANITY_CHECK").is_ok() {
            // A bare `RPS_SANITY_CHECK=` counts as enabled.
            config.sanity_check = true;
        }

        config.save_proofs_dir = env::var("RPS_SAVE_PROOFS_DIR").ok().map(PathBuf::from);

        if let Some(capacity) = read_env::<usize>("RPS_REQUEST_BUFFER") {
            config.request_buffer = capacity.max(1);
        }

        config
    }
}

/// Platform data directory for keys.
///
/// - Linux: `~/.local/share/rps-zk/keys`
/// - macOS: `~/Library/Application Support/rps-zk/keys`
/// - Fallback: `./keys`
pub fn default_key_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "rps-zk")
        .map(|dirs| dirs.data_dir().join("keys"))
        .unwrap_or_else(|| PathBuf::from("./keys"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
