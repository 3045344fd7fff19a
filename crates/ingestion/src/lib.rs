//! Report ingestion and normalization for the marketplace hub.
//!
//! This crate handles:
//! - Locale-aware number and date parsing
//! - Quote-aware line splitting
//! - Report format detection
//! - Amazon transaction and eBay order report extraction

pub mod accumulator;
pub mod detector;
pub mod import;
pub mod locale;
pub mod order_report;
pub mod split;
pub mod transaction_report;

#[cfg(test)]
mod test_fixtures;

pub use accumulator::ExtractStats;
pub use detector::detect_format;
pub use import::{import, prepare_text};
pub use locale::{parse_number, parse_short_date, parse_timestamp, DateHour};
pub use order_report::{ColumnMap, Role};
pub use split::split_line;
pub use transaction_report::{normalize_regions, TransactionKind};
