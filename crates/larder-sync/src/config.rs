//! # Sync Configuration
//!
//! Configuration for the resolution pipeline, the remote clients and the
//! snapshot location.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Explicit path passed to load_or_default                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/larder/larder.toml (Linux)                               │
//! │     ~/Library/Application Support/org.larder.larder/larder.toml (mac)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     local pantry backend, public Open Food Facts, platform data dir    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # larder.toml
//! [remote]
//! base_url = "http://127.0.0.1:8000"
//! scan_timeout_ms = 3000      # T1: authoritative barcode match
//!
//! [fallback]
//! base_url = "https://world.openfoodfacts.org"
//! lookup_timeout_ms = 5000    # T2: public fallback lookup
//!
//! [store]
//! # data_dir = "/var/lib/larder"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// File name of the config file under the platform config directory.
pub const CONFIG_FILE: &str = "larder.toml";

// =============================================================================
// Remote Settings
// =============================================================================

/// Settings for the authoritative pantry backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the pantry backend.
    #[serde(default = "default_remote_url")]
    pub base_url: String,

    /// Stage-1 deadline (milliseconds) for the barcode-match endpoint.
    /// A timeout here is treated like an explicit "not found" and the
    /// pipeline falls through to the fallback.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_ms: u64,
}

fn default_remote_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_scan_timeout() -> u64 {
    3_000
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            base_url: default_remote_url(),
            scan_timeout_ms: default_scan_timeout(),
        }
    }
}

// =============================================================================
// Fallback Settings
// =============================================================================

/// Settings for the public Open Food Facts fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Base URL of the fallback product database.
    #[serde(default = "default_fallback_url")]
    pub base_url: String,

    /// Stage-2 deadline (milliseconds) for the fallback lookup. A timeout
    /// here yields `NotFoundAnywhere { FallbackUnreachable }`.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_ms: u64,
}

fn default_fallback_url() -> String {
    "https://world.openfoodfacts.org".to_string()
}

fn default_lookup_timeout() -> u64 {
    5_000
}

impl Default for FallbackSettings {
    fn default() -> Self {
        FallbackSettings {
            base_url: default_fallback_url(),
            lookup_timeout_ms: default_lookup_timeout(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Settings for the local snapshot location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Override for the snapshot directory. When absent the platform data
    /// directory is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

// =============================================================================
// Larder Config
// =============================================================================

/// Top-level configuration for the sync layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LarderConfig {
    /// Authoritative pantry backend.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Public fallback database.
    #[serde(default)]
    pub fallback: FallbackSettings,

    /// Local snapshot location.
    #[serde(default)]
    pub store: StoreSettings,
}

impl LarderConfig {
    /// Default config file path under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "larder", "larder")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Directory the inventory snapshot lives in: the configured override,
    /// or the platform data directory, or `./data` as a last resort.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.store.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("org", "larder", "larder")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    /// Loads config from the given path, or the default path, falling back
    /// to defaults when no file exists. A file that exists but fails to
    /// parse is an error - silently ignoring a typo'd config is worse than
    /// refusing to start.
    pub fn load_or_default(path: Option<PathBuf>) -> SyncResult<Self> {
        let path = match path.or_else(Self::default_path) {
            Some(path) => path,
            None => {
                debug!("No config directory available, using defaults");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        let config: LarderConfig = toml::from_str(&raw)?;
        config.validate()?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Writes the config as TOML (first-run provisioning).
    pub fn save_to(&self, path: &PathBuf) -> SyncResult<()> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }
        std::fs::write(path, raw).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        Ok(())
    }

    /// Validates URLs and timeouts.
    pub fn validate(&self) -> SyncResult<()> {
        Url::parse(&self.remote.base_url)?;
        Url::parse(&self.fallback.base_url)?;

        if self.remote.scan_timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "remote.scan_timeout_ms must be > 0".into(),
            ));
        }
        if self.fallback.lookup_timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "fallback.lookup_timeout_ms must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Stage-1 deadline as a Duration.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.scan_timeout_ms)
    }

    /// Stage-2 deadline as a Duration.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback.lookup_timeout_ms)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LarderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.remote.scan_timeout_ms, 3_000);
        assert_eq!(config.fallback.lookup_timeout_ms, 5_000);
        assert!(config.fallback.base_url.contains("openfoodfacts"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: LarderConfig = toml::from_str(
            r#"
            [remote]
            base_url = "http://pantry.local:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.base_url, "http://pantry.local:9000");
        // untouched sections keep their defaults
        assert_eq!(config.remote.scan_timeout_ms, 3_000);
        assert_eq!(config.fallback.base_url, default_fallback_url());
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_timeout() {
        let mut config = LarderConfig::default();
        config.remote.base_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidUrl(_))
        ));

        let mut config = LarderConfig::default();
        config.remote.scan_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = LarderConfig::default();
        config.remote.base_url = "http://pantry.local:9000".into();
        config.store.data_dir = Some(PathBuf::from("/tmp/larder-data"));
        config.save_to(&path).unwrap();

        let loaded = LarderConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.remote.base_url, "http://pantry.local:9000");
        assert_eq!(loaded.store.data_dir, Some(PathBuf::from("/tmp/larder-data")));
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = LarderConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(config.remote.base_url, default_remote_url());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[remote\nbase_url = ").unwrap();

        assert!(matches!(
            LarderConfig::load_or_default(Some(path)),
            Err(SyncError::ConfigLoadFailed(_))
        ));
    }
}
