//! Configuration structures for the marketplace hub.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistence configuration.
    pub storage: StorageConfig,
    /// Known marketplaces.
    pub marketplaces: MarketplaceRegistry,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections use defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let storage = &self.storage;
        if storage.bundle_key.trim().is_empty() || storage.goals_key.trim().is_empty() {
            return Err(Error::config("storage keys must not be empty"));
        }
        if storage.bundle_key == storage.goals_key {
            return Err(Error::config("bundle_key and goals_key must differ"));
        }

        let mut seen = HashSet::new();
        for mp in &self.marketplaces.0 {
            if mp.id.trim().is_empty() {
                return Err(Error::config("marketplace id must not be empty"));
            }
            if !seen.insert(mp.id.as_str()) {
                return Err(Error::config(format!("duplicate marketplace id: {}", mp.id)));
            }
        }
        Ok(())
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub db_path: String,
    /// Key holding the marketplace bundle store.
    pub bundle_key: String,
    /// Key holding the goal configuration.
    pub goals_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "mhub.db".to_string(),
            bundle_key: "mhub4-data".to_string(),
            goals_key: "mhub4-goals".to_string(),
        }
    }
}

/// Display metadata for a marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceInfo {
    /// Store key (e.g., "amazon").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Brand color (hex).
    pub color: String,
}

impl MarketplaceInfo {
    fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Ordered list of known marketplaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketplaceRegistry(pub Vec<MarketplaceInfo>);

impl MarketplaceRegistry {
    /// Look up a marketplace by id.
    pub fn get(&self, id: &str) -> Option<&MarketplaceInfo> {
        self.0.iter().find(|mp| mp.id == id)
    }

    /// Iterate in display order.
    pub fn iter(&self) -> impl Iterator<Item = &MarketplaceInfo> {
        self.0.iter()
    }
}

impl Default for MarketplaceRegistry {
    fn default() -> Self {
        Self(vec![
            MarketplaceInfo::new("amazon", "Amazon", "#FF9900"),
            MarketplaceInfo::new("ebay", "eBay", "#0064D2"),
            MarketplaceInfo::new("otto", "Otto", "#D4213D"),
            MarketplaceInfo::new("kaufland", "Kaufland", "#E30613"),
            MarketplaceInfo::new("fressnapf", "Fressnapf", "#00A651"),
            MarketplaceInfo::new("saturn", "Saturn/MM", "#DF0000"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.bundle_key, "mhub4-data");
        assert_eq!(config.storage.goals_key, "mhub4-goals");
        assert_eq!(config.marketplaces.get("ebay").map(|m| m.name.as_str()), Some("eBay"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"storage":{"db_path":"/tmp/x.db"}}"#).unwrap();
        assert_eq!(config.storage.db_path, "/tmp/x.db");
        assert_eq!(config.storage.bundle_key, "mhub4-data");
        assert_eq!(config.marketplaces.iter().count(), 6);
    }

    #[test]
    fn test_validate_rejects_shared_keys() {
        let mut config = Config::default();
        config.storage.goals_key = config.storage.bundle_key.clone();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_marketplace() {
        let mut config = Config::default();
        config.marketplaces.0.push(MarketplaceInfo::new("amazon", "Amazon DE", "#000000"));
        assert!(config.validate().is_err());
    }
}
