use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{AppReference, ColumnProjection};

pub const MIN_TARGET_COUNT: u32 = 100;
pub const MAX_TARGET_COUNT: u32 = 100_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub collection: CollectionConfig,
    pub export: ExportConfig,
    pub catalog: Vec<CatalogEntry>,
}

/// Store endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_url: String,
    /// Optional per-request timeout. Unset means wait as long as the store takes.
    pub timeout_secs: Option<u64>,
    /// Reviews requested per feed page
    pub page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://play.google.com".to_string(),
            timeout_secs: None,
            page_size: 199,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Reviews per app when the command line does not override it
    pub target_count: u32,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self { target_count: 1000 }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub include_review_id: bool,
    pub projection: ColumnProjection,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_review_id: false,
            projection: ColumnProjection::Observed,
            output_dir: PathBuf::from("."),
        }
    }
}

/// One selectable app in the fixed catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub display_name: String,
    pub package_id: String,
}

impl From<&CatalogEntry> for AppReference {
    fn from(entry: &CatalogEntry) -> Self {
        AppReference::direct(entry.display_name.clone(), entry.package_id.clone())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Find a catalog entry by display name, ignoring case
    pub fn catalog_entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.catalog
            .iter()
            .find(|e| e.display_name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Clamp a requested per-app review count to the supported range
pub fn clamp_target_count(count: u32) -> u32 {
    count.clamp(MIN_TARGET_COUNT, MAX_TARGET_COUNT)
}
