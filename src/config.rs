use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub display: DisplayConfig,
    #[serde(default)]
    pub legend: LegendConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// GeoJSON FeatureCollection with `name`, `avgprice` and `avgbedrooms` properties.
    pub data: PathBuf,
}

/// Screen the page is laid out for, in CSS pixels.
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LegendConfig {
    #[serde(default = "default_price_step")]
    pub price_step: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self { price_step: default_price_step() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

fn default_price_step() -> f64 {
    15.0
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        anyhow::ensure!(
            config.legend.price_step > 0.0,
            "legend.price_step must be positive, got {}",
            config.legend.price_step
        );
        Ok(config)
    }
}
