//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use can_translator::TranslatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from vehicle.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Signal table, DBC imports and message handlers
    #[serde(flatten)]
    pub vehicle: TranslatorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Prefix each event with the frame timestamp
    #[serde(default)]
    pub include_timestamps: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// `name value [event]`
    Txt,
}

/// Load configuration from a TOML file
///
/// Relative DBC paths are resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.vehicle.dbc_files = config
        .vehicle
        .dbc_files
        .iter()
        .map(|dbc| resolve(base, dbc))
        .collect();

    validate(&config)?;
    Ok(config)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    for dbc in &config.vehicle.dbc_files {
        if !dbc.exists() {
            bail!("DBC file not found: {:?}", dbc);
        }
    }
    if !config.vehicle.bindings.is_empty() && config.vehicle.dbc_files.is_empty() {
        bail!("Bindings require at least one DBC file");
    }
    Ok(())
}
