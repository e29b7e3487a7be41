use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filter::DEFAULT_WINDOW_DAYS;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "QUICKSHOP_CONFIG";

/// Longest default window accepted from a config file, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Startup settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Days before the last date the default filter starts at.
    pub default_window_days: i64,
    /// Directory the save dialog opens in.
    pub export_dir: Option<PathBuf>,
    pub window_size: [f32; 2],
    /// Show the sample on launch instead of the upload prompt.
    pub start_with_sample: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_window_days: DEFAULT_WINDOW_DAYS,
            export_dir: None,
            window_size: [1200.0, 800.0],
            start_with_sample: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        anyhow::ensure!(
            (0..=MAX_WINDOW_DAYS).contains(&config.default_window_days),
            "default_window_days must be between 0 and {MAX_WINDOW_DAYS}, got {}",
            config.default_window_days
        );
        Ok(config)
    }

    /// Read the file named by `QUICKSHOP_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
