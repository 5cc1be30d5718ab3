//! TOML catalog loading for the prediction engine.
//!
//! Provides three loading methods:
//! - `default_catalog()` - Loads the catalog compiled into the binary
//! - `load_catalog(path)` - Loads a custom catalog from a file path
//! - `load_catalog_or_default(path)` - Custom catalog with embedded fallback

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::catalog::RuleCatalog;
use super::types::CatalogConfig;

/// Default catalog embedded in the binary at compile time.
const DEFAULT_CATALOG: &str = include_str!("../../config/prediction_rules.toml");

/// Parse and validate a catalog from TOML source.
pub fn parse_catalog(source: &str) -> Result<RuleCatalog> {
    let config: CatalogConfig = toml::from_str(source).context("Invalid catalog TOML")?;
    let catalog = RuleCatalog::from_config(config)?;
    Ok(catalog)
}

/// Load a catalog from a TOML file at the given path.
///
/// # Returns
/// * `Ok(RuleCatalog)` - Parsed and validated catalog
/// * `Err` - If the file cannot be read, the TOML is invalid, or a rule
///   fails validation
pub fn load_catalog(path: &Path) -> Result<RuleCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let catalog =
        parse_catalog(&content).with_context(|| format!("Failed to load {}", path.display()))?;
    info!(
        "Loaded {} prediction rules (catalog v{}) from {}",
        catalog.len(),
        catalog.version(),
        path.display()
    );
    Ok(catalog)
}

/// Get the catalog embedded in the binary.
///
/// Covers oil, exhaust, temperature, power, starting, noise, vibration,
/// fuel and service-interval failures for diesel generator sets.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a build defect).
pub fn default_catalog() -> RuleCatalog {
    let catalog =
        parse_catalog(DEFAULT_CATALOG).expect("embedded prediction_rules.toml must be valid");
    info!(
        "Loaded {} prediction rules (embedded catalog v{})",
        catalog.len(),
        catalog.version()
    );
    catalog
}

/// Load the catalog at `path` if one is given, falling back to the
/// embedded catalog when it is missing or broken.
pub fn load_catalog_or_default(path: Option<&Path>) -> RuleCatalog {
    match path.map(load_catalog) {
        Some(Ok(catalog)) => catalog,
        Some(Err(e)) => {
            warn!("Falling back to embedded catalog: {:#}", e);
            default_catalog()
        }
        None => default_catalog(),
    }
}
