//! Core data types for the marketplace hub.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Marketplace identifier (e.g., "amazon", "ebay").
pub type MarketplaceId = String;

/// Marketplace id produced by the Amazon transaction report.
pub const AMAZON: &str = "amazon";

/// Marketplace id produced by the eBay order report.
pub const EBAY: &str = "ebay";

/// Persisted bundles, keyed by marketplace id.
pub type Store = BTreeMap<MarketplaceId, MarketplaceBundle>;

/// User goals: metric name -> target value.
pub type GoalConfig = BTreeMap<String, f64>;

/// Round a monetary amount to cents.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Divide, resolving to 0 when the denominator is not positive.
#[inline]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Weekdays in breakdown order, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Two-letter German weekday label used by the weekday breakdown.
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Di",
        Weekday::Wed => "Mi",
        Weekday::Thu => "Do",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "So",
    }
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Amazon "custom transaction" report (comma separated).
    #[serde(rename = "amazon_transaction")]
    AmazonTransactions,
    /// eBay "all orders" report (semicolon separated).
    #[serde(rename = "ebay")]
    EbayOrders,
    /// No known signature.
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl ReportFormat {
    /// Stable tag used in messages and persisted bundles.
    pub fn tag(self) -> &'static str {
        match self {
            ReportFormat::AmazonTransactions => "amazon_transaction",
            ReportFormat::EbayOrders => "ebay",
            ReportFormat::Unknown => "unknown",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            ReportFormat::AmazonTransactions => "Amazon transaction report",
            ReportFormat::EbayOrders => "eBay order report",
            ReportFormat::Unknown => "Unknown report",
        }
    }

    /// Marketplace the format belongs to.
    pub fn marketplace(self) -> Option<&'static str> {
        match self {
            ReportFormat::AmazonTransactions => Some(AMAZON),
            ReportFormat::EbayOrders => Some(EBAY),
            ReportFormat::Unknown => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Summable sales figures shared by daily records, totals and monthly buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalesMetrics {
    /// Number of orders.
    pub orders: u64,
    /// Units sold.
    pub units: f64,
    /// Gross revenue.
    pub revenue: f64,
    /// Number of refund transactions.
    pub refunds: u64,
    /// Units refunded.
    pub refund_units: f64,
    /// Refunded amount (positive).
    pub refund_amount: f64,
    /// Selling fees (signed as exported).
    pub fees: f64,
    /// Fulfilment fees.
    pub fba_fees: f64,
    /// Promotional rebates.
    pub promo: f64,
    /// Shipping credits.
    pub shipping_credit: f64,
    /// Net proceeds.
    pub net: f64,
    /// Service fees.
    pub service_fees: f64,
    /// Storage fees.
    pub storage_fees: f64,
}

impl SalesMetrics {
    /// Add every field of `other` into `self`.
    pub fn accumulate(&mut self, other: &SalesMetrics) {
        self.orders += other.orders;
        self.units += other.units;
        self.revenue += other.revenue;
        self.refunds += other.refunds;
        self.refund_units += other.refund_units;
        self.refund_amount += other.refund_amount;
        self.fees += other.fees;
        self.fba_fees += other.fba_fees;
        self.promo += other.promo;
        self.shipping_credit += other.shipping_credit;
        self.net += other.net;
        self.service_fees += other.service_fees;
        self.storage_fees += other.storage_fees;
    }

    /// Sum of the absolute values of all fee kinds.
    pub fn total_fees(&self) -> f64 {
        self.fees.abs() + self.fba_fees.abs() + self.service_fees.abs() + self.storage_fees.abs()
    }
}

/// Canonical per-day record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar day (serialized as ISO `YYYY-MM-DD`).
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: SalesMetrics,
}

impl DailyRecord {
    /// Create an all-zero record for a date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            metrics: SalesMetrics::default(),
        }
    }
}

/// Canonical per-SKU record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkuRecord {
    pub sku: String,
    pub title: String,
    pub revenue: f64,
    pub units: f64,
    pub orders: u64,
    pub refunds: u64,
    pub refund_amount: f64,
    pub fees: f64,
    pub fba_fees: f64,
    pub promo: f64,
    pub net: f64,
}

impl SkuRecord {
    /// Create an empty record for a SKU.
    pub fn new(sku: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Add the numeric fields of `other` into `self`. Identity fields are kept.
    pub fn accumulate(&mut self, other: &SkuRecord) {
        self.revenue += other.revenue;
        self.units += other.units;
        self.orders += other.orders;
        self.refunds += other.refunds;
        self.refund_amount += other.refund_amount;
        self.fees += other.fees;
        self.fba_fees += other.fba_fees;
        self.promo += other.promo;
        self.net += other.net;
    }
}

/// Geographic breakdown entry (region or city, depending on the marketplace).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub name: String,
    pub orders: u64,
    pub revenue: f64,
    pub units: f64,
}

impl RegionRecord {
    /// Create an empty entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Orders per hour of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    /// Two-digit hour, "00" to "23".
    pub hour: String,
    pub orders: u64,
}

/// Orders and revenue per weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayRecord {
    /// Two-letter label, Monday first ("Mo" .. "So").
    pub day: String,
    pub orders: u64,
    pub revenue: f64,
}

/// Import summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleMeta {
    /// Orders counted while reading rows.
    pub orders: u64,
    /// Revenue counted while reading rows, rounded to cents.
    pub revenue: f64,
    /// Non-empty data lines after the header.
    pub rows: usize,
    /// First and last day with data.
    pub date_range: Option<[NaiveDate; 2]>,
}

/// Normalized result of one import for one marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceBundle {
    pub marketplace: MarketplaceId,
    /// `unknown` when a stored bundle predates the field.
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub daily: Vec<DailyRecord>,
    #[serde(default)]
    pub sku: Vec<SkuRecord>,
    #[serde(default)]
    pub states: Vec<RegionRecord>,
    #[serde(default)]
    pub hourly: Vec<HourlyRecord>,
    #[serde(default)]
    pub weekday: Vec<WeekdayRecord>,
    #[serde(default)]
    pub meta: BundleMeta,
    /// Set when the bundle is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
}
