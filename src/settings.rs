//! Fixture settings.
//!
//! One JSON file selects which flavour of the test provider gets registered:
//! the target catalog variant, whether synchronize simulates progress or just
//! pops a notification, which target fails, and the simulated timings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogVariant;

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "CERTSYNC_FIXTURE_SETTINGS";

/// Target id that fails halfway through a simulated sync unless overridden.
pub const DEFAULT_FAILING_TARGET: &str = "test-target-fail";

/// Number of certificates the simulation pretends to upload.
pub const DEFAULT_CERTIFICATE_COUNT: usize = 77;

/// How `synchronize` behaves once the host lets it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Run the full progress simulation inside the host's progress task.
    Progress,
    /// Only show an information message naming the target.
    Notify,
}

/// Simulated latencies, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncDelays {
    pub setup_ms: u64,
    pub per_certificate_ms: u64,
    pub trust_store_ms: u64,
    pub restart_ms: u64,
}

impl Default for SyncDelays {
    fn default() -> Self {
        Self {
            setup_ms: 100,
            per_certificate_ms: 50,
            trust_store_ms: 200,
            restart_ms: 200,
        }
    }
}

impl SyncDelays {
    /// No waiting at all; useful for harness runs that only care about ordering.
    pub fn zero() -> Self {
        Self {
            setup_ms: 0,
            per_certificate_ms: 0,
            trust_store_ms: 0,
            restart_ms: 0,
        }
    }

    pub fn setup(&self) -> Duration {
        Duration::from_millis(self.setup_ms)
    }

    pub fn per_certificate(&self) -> Duration {
        Duration::from_millis(self.per_certificate_ms)
    }

    pub fn trust_store(&self) -> Duration {
        Duration::from_millis(self.trust_store_ms)
    }

    pub fn restart(&self) -> Duration {
        Duration::from_millis(self.restart_ms)
    }
}

/// Fixture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
    /// Which target list `get_targets` advertises.
    pub catalog: CatalogVariant,
    /// Progress simulation or plain notification.
    pub mode: SyncMode,
    /// Target id whose sync fails halfway. `None` disables failure injection.
    pub failing_target_id: Option<String>,
    /// Simulated certificate count (the caller's list length is ignored).
    pub certificate_count: usize,
    pub delays: SyncDelays,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            catalog: CatalogVariant::Declared,
            mode: SyncMode::Progress,
            failing_target_id: Some(DEFAULT_FAILING_TARGET.to_string()),
            certificate_count: DEFAULT_CERTIFICATE_COUNT,
            delays: SyncDelays::default(),
        }
    }
}

impl FixtureSettings {
    /// Resolve the settings path: `$CERTSYNC_FIXTURE_SETTINGS`, else the
    /// user config directory.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("certsync-provider-test")
            .join("settings.json")
    }

    /// Load settings from a JSON file. Falls back to defaults when the file is
    /// missing, unreadable or malformed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse fixture settings: {}, using defaults", e);
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No fixture settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Cannot read fixture settings at {} ({:?}): {}, using defaults",
                    path.display(),
                    e.kind(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Fixture settings saved to {}", path.display());
        Ok(())
    }
}
