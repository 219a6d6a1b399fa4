use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::drivers::SessionError;

/// Roughly one reading per frame at 60 fps.
pub const FAST_INTERVAL_MS: u32 = 16;
pub const SLOW_INTERVAL_MS: u32 = 1000;
pub const DEFAULT_CONFIG_FILE: &str = "motionlab.json";
pub const CONFIG_ENV: &str = "MOTIONLAB_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub amplitude: f64,
    pub noise: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            noise: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub update_interval_ms: u32,
    pub default_label: String,
    pub persistence_url: Option<String>,
    pub train_url: Option<String>,
    pub predict_url: Option<String>,
    /// Used by the local store when `persistence_url` is unset.
    pub store_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub simulation: SimulationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: FAST_INTERVAL_MS,
            default_label: "Motion 1".to_owned(),
            persistence_url: None,
            train_url: None,
            predict_url: None,
            store_dir: PathBuf::from("sessions"),
            request_timeout_secs: 30,
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text).context("invalid config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Explicit path, then `$MOTIONLAB_CONFIG`, then `./motionlab.json`, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        interval(self.update_interval_ms).map(|_| ())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.update_interval_ms.max(1)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Sampling intervals are positive whole milliseconds.
pub fn interval(ms: u32) -> Result<Duration, SessionError> {
    if ms == 0 {
        return Err(SessionError::InvalidInterval(ms));
    }
    Ok(Duration::from_millis(u64::from(ms)))
}
