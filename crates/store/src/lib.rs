//! Persistence for the marketplace hub.
//!
//! Bundles and goals are stored as JSON documents under two keys of a
//! key-value backend:
//! - `MemoryStore` for tests and throwaway sessions
//! - `SqliteStore` for durable storage
//!
//! `MarketplaceHub` layers import and whole-store read/modify/write on top.

pub mod hub;
pub mod kv;
pub mod sqlite;

pub use hub::MarketplaceHub;
pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;
