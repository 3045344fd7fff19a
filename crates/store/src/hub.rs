//! Marketplace bundle repository.
//!
//! Every mutation reads the whole store, replaces one key and writes the
//! whole store back. Callers importing the same marketplace concurrently
//! must serialize those imports themselves.

use crate::kv::KeyValueStore;
use chrono::Utc;
use mhub_core::config::StorageConfig;
use mhub_core::{GoalConfig, MarketplaceBundle, Result, Store};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Bundles and goals over a key-value backend.
pub struct MarketplaceHub<S> {
    kv: S,
    bundle_key: String,
    goals_key: String,
}

impl<S: KeyValueStore> MarketplaceHub<S> {
    pub fn new(kv: S, storage: &StorageConfig) -> Self {
        Self {
            kv,
            bundle_key: storage.bundle_key.clone(),
            goals_key: storage.goals_key.clone(),
        }
    }

    /// Hub using the default storage keys.
    pub fn with_defaults(kv: S) -> Self {
        Self::new(kv, &StorageConfig::default())
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Snapshot of all stored bundles. A corrupt document reads as empty.
    pub fn load_store(&self) -> Result<Store> {
        self.load_document(&self.bundle_key)
    }

    pub fn bundle(&self, marketplace: &str) -> Result<Option<MarketplaceBundle>> {
        Ok(self.load_store()?.remove(marketplace))
    }

    /// Extract `raw` and store the result under its marketplace, replacing
    /// any earlier import. Nothing is written when extraction fails.
    pub fn import(&mut self, raw: &str) -> Result<MarketplaceBundle> {
        let bundle = mhub_ingestion::import(raw)?;
        self.save_bundle(bundle)
    }

    /// Stamp and store `bundle`, replacing the marketplace's previous bundle.
    pub fn save_bundle(&mut self, mut bundle: MarketplaceBundle) -> Result<MarketplaceBundle> {
        bundle.imported_at = Some(Utc::now());

        let mut store = self.load_store()?;
        let replaced = store
            .insert(bundle.marketplace.clone(), bundle.clone())
            .is_some();
        self.write_store(&store)?;

        info!(
            marketplace = %bundle.marketplace,
            replaced,
            marketplaces = store.len(),
            "bundle saved"
        );
        Ok(bundle)
    }

    /// Drop one marketplace. Returns whether it was stored.
    pub fn remove_bundle(&mut self, marketplace: &str) -> Result<bool> {
        let mut store = self.load_store()?;
        if store.remove(marketplace).is_none() {
            return Ok(false);
        }
        self.write_store(&store)?;
        Ok(true)
    }

    /// Drop every bundle. Goals are kept.
    pub fn clear_all(&mut self) -> Result<()> {
        self.kv.remove(&self.bundle_key)?;
        info!("all bundles cleared");
        Ok(())
    }

    pub fn goals(&self) -> Result<GoalConfig> {
        self.load_document(&self.goals_key)
    }

    pub fn save_goals(&mut self, goals: &GoalConfig) -> Result<()> {
        let json = serde_json::to_string(goals)?;
        self.kv.set(&self.goals_key, &json)?;
        debug!(goals = goals.len(), "goals saved");
        Ok(())
    }

    pub fn set_goal(&mut self, metric: &str, target: f64) -> Result<GoalConfig> {
        let mut goals = self.goals()?;
        goals.insert(metric.to_string(), target);
        self.save_goals(&goals)?;
        Ok(goals)
    }

    /// Returns whether the goal existed.
    pub fn unset_goal(&mut self, metric: &str) -> Result<bool> {
        let mut goals = self.goals()?;
        if goals.remove(metric).is_none() {
            return Ok(false);
        }
        self.save_goals(&goals)?;
        Ok(true)
    }

    fn write_store(&mut self, store: &Store) -> Result<()> {
        let json = serde_json::to_string(store)?;
        self.kv.set(&self.bundle_key, &json)?;
        debug!(key = %self.bundle_key, bytes = json.len(), "store written");
        Ok(())
    }

    fn load_document<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(json) = self.kv.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&json) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(key, error = %err, "stored document is corrupt, reading as empty");
                Ok(T::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use mhub_core::{BundleMeta, Error, ReportFormat};

    fn bundle(marketplace: &str, orders: u64) -> MarketplaceBundle {
        MarketplaceBundle {
            marketplace: marketplace.to_string(),
            format: ReportFormat::EbayOrders,
            daily: vec![],
            sku: vec![],
            states: vec![],
            hourly: vec![],
            weekday: vec![],
            meta: BundleMeta {
                orders,
                ..BundleMeta::default()
            },
            imported_at: None,
        }
    }

    #[test]
    fn test_empty_backend_reads_empty() {
        let hub = MarketplaceHub::with_defaults(MemoryStore::new());
        assert!(hub.load_store().unwrap().is_empty());
        assert!(hub.goals().unwrap().is_empty());
        assert_eq!(hub.bundle("ebay").unwrap(), None);
    }

    #[test]
    fn test_save_stamps_and_replaces() {
        let mut hub = MarketplaceHub::with_defaults(MemoryStore::new());
        hub.save_bundle(bundle("ebay", 1)).unwrap();
        hub.save_bundle(bundle("amazon", 2)).unwrap();
        let saved = hub.save_bundle(bundle("ebay", 3)).unwrap();

        assert!(saved.imported_at.is_some());
        let store = hub.load_store().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store["ebay"].meta.orders, 3);
        assert_eq!(store["amazon"].meta.orders, 2);
    }

    #[test]
    fn test_corrupt_store_degrades_to_empty() {
        let mut kv = MemoryStore::new();
        kv.set("mhub4-data", "{not json").unwrap();
        kv.set("mhub4-goals", "[1,2]").unwrap();
        let mut hub = MarketplaceHub::with_defaults(kv);

        assert!(hub.load_store().unwrap().is_empty());
        assert!(hub.goals().unwrap().is_empty());

        hub.save_bundle(bundle("ebay", 1)).unwrap();
        assert_eq!(hub.load_store().unwrap().len(), 1);
    }

    #[test]
    fn test_bundle_without_format_survives_save() {
        let mut kv = MemoryStore::new();
        kv.set("mhub4-data", r#"{"amazon":{"marketplace":"amazon","meta":{"orders":7}}}"#)
            .unwrap();
        let mut hub = MarketplaceHub::with_defaults(kv);

        hub.save_bundle(bundle("ebay", 1)).unwrap();

        let store = hub.load_store().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store["amazon"].format, ReportFormat::Unknown);
        assert_eq!(store["amazon"].meta.orders, 7);
    }

    #[test]
    fn test_failed_import_writes_nothing() {
        let mut hub = MarketplaceHub::with_defaults(MemoryStore::new());
        hub.save_bundle(bundle("ebay", 1)).unwrap();
        let before = hub.backend().get("mhub4-data").unwrap();

        assert!(matches!(hub.import("   "), Err(Error::EmptyInput)));
        assert!(matches!(
            hub.import("foo;bar\n1;2\n"),
            Err(Error::FormatUnrecognized { .. })
        ));
        assert_eq!(hub.backend().get("mhub4-data").unwrap(), before);
    }

    #[test]
    fn test_clear_keeps_goals() {
        let mut hub = MarketplaceHub::with_defaults(MemoryStore::new());
        hub.save_bundle(bundle("ebay", 1)).unwrap();
        hub.set_goal("monthlyRevenue", 5000.0).unwrap();

        hub.clear_all().unwrap();

        assert!(hub.load_store().unwrap().is_empty());
        assert_eq!(hub.goals().unwrap().get("monthlyRevenue"), Some(&5000.0));
    }

    #[test]
    fn test_goal_updates() {
        let mut hub = MarketplaceHub::with_defaults(MemoryStore::new());
        hub.set_goal("monthlyRevenue", 100.0).unwrap();
        let goals = hub.set_goal("monthlyOrders", 20.0).unwrap();
        assert_eq!(goals.len(), 2);

        assert!(hub.unset_goal("monthlyRevenue").unwrap());
        assert!(!hub.unset_goal("monthlyRevenue").unwrap());
        assert_eq!(hub.goals().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_bundle() {
        let mut hub = MarketplaceHub::with_defaults(MemoryStore::new());
        hub.save_bundle(bundle("ebay", 1)).unwrap();
        assert!(hub.remove_bundle("ebay").unwrap());
        assert!(!hub.remove_bundle("ebay").unwrap());
    }

    #[test]
    fn test_custom_keys() {
        let storage = StorageConfig {
            bundle_key: "bundles".into(),
            goals_key: "targets".into(),
            ..StorageConfig::default()
        };
        let mut hub = MarketplaceHub::new(MemoryStore::new(), &storage);
        hub.save_bundle(bundle("ebay", 1)).unwrap();
        assert!(hub.backend().get("bundles").unwrap().is_some());
        assert!(hub.backend().get("mhub4-data").unwrap().is_none());
    }
}
