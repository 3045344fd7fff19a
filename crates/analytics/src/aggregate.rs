//! Cross-marketplace aggregation.
//!
//! Pure functions of a `Store` snapshot or a combined daily series; nothing
//! here is cached between calls.

use chrono::{Datelike, Days, Months, NaiveDate};
use mhub_core::{
    ratio, round2, weekday_label, DailyRecord, HourlyRecord, MarketplaceId, SalesMetrics,
    SkuRecord, Store, WeekdayRecord, WEEK,
};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Summed figures plus the derived ratios.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    #[serde(flatten)]
    pub metrics: SalesMetrics,
    /// Revenue per order.
    pub avg_order_value: f64,
    /// Refunds per order.
    pub refund_rate: f64,
    /// Absolute sum of all fee kinds.
    pub total_fees: f64,
    /// Net per unit of revenue.
    pub net_margin: f64,
}

impl Totals {
    /// Derive the ratios from summed metrics. Ratios are 0 when undefined.
    pub fn from_metrics(metrics: SalesMetrics) -> Self {
        Self {
            avg_order_value: ratio(metrics.revenue, metrics.orders as f64),
            refund_rate: ratio(metrics.refunds as f64, metrics.orders as f64),
            total_fees: metrics.total_fees(),
            net_margin: ratio(metrics.net, metrics.revenue),
            metrics,
        }
    }
}

/// One calendar month of the combined daily series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    /// `YYYY-MM`.
    pub month: String,
    /// Short display label, e.g. `Feb 26`.
    pub label: String,
    /// First day of the month.
    #[serde(skip)]
    pub start: NaiveDate,
    /// Days with data.
    pub days: u32,
    #[serde(flatten)]
    pub totals: Totals,
    pub daily_avg_rev: f64,
    pub daily_avg_ord: f64,
}

impl MonthlyAggregate {
    /// Calendar length of the month.
    pub fn calendar_days(&self) -> u32 {
        days_in_month(self.start)
    }
}

/// One ISO week (Monday start) of the combined daily series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAggregate {
    /// Monday of the week.
    pub week: NaiveDate,
    pub orders: u64,
    pub units: f64,
    pub revenue: f64,
    pub refunds: u64,
    pub net: f64,
}

/// SKU record tagged with its marketplace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedSku {
    pub marketplace: MarketplaceId,
    #[serde(flatten)]
    pub record: SkuRecord,
}

/// Per-product ratios on top of the combined SKU view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetrics {
    #[serde(flatten)]
    pub product: CombinedSku,
    pub refund_rate: f64,
    pub avg_price: f64,
    pub fee_rate: f64,
    pub net_margin: f64,
}

/// Totals of one stored bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceSummary {
    pub marketplace: MarketplaceId,
    pub days: usize,
    pub skus: usize,
    pub date_range: Option<[NaiveDate; 2]>,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Sum every bundle's daily records per date, ascending by date.
pub fn combine_daily(store: &Store) -> Vec<DailyRecord> {
    let mut by_date: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();
    for record in store.values().flat_map(|bundle| &bundle.daily) {
        by_date
            .entry(record.date)
            .or_insert_with(|| DailyRecord::new(record.date))
            .metrics
            .accumulate(&record.metrics);
    }
    by_date.into_values().collect()
}

/// Sum SKU records per (marketplace, sku), highest revenue first.
pub fn combine_sku(store: &Store) -> Vec<CombinedSku> {
    let mut by_key: BTreeMap<(&str, &str), CombinedSku> = BTreeMap::new();
    for (marketplace, bundle) in store {
        for record in &bundle.sku {
            by_key
                .entry((marketplace.as_str(), record.sku.as_str()))
                .and_modify(|combined| combined.record.accumulate(record))
                .or_insert_with(|| CombinedSku {
                    marketplace: marketplace.clone(),
                    record: record.clone(),
                });
        }
    }

    let mut out: Vec<CombinedSku> = by_key.into_values().collect();
    out.sort_by_key(|s| Reverse(OrderedFloat(s.record.revenue)));
    out
}

/// Sum every bundle's hour-of-day counts, ascending by hour.
pub fn combine_hourly(store: &Store) -> Vec<HourlyRecord> {
    let mut by_hour: BTreeMap<&str, u64> = BTreeMap::new();
    for record in store.values().flat_map(|bundle| &bundle.hourly) {
        *by_hour.entry(record.hour.as_str()).or_insert(0) += record.orders;
    }
    by_hour
        .into_iter()
        .map(|(hour, orders)| HourlyRecord {
            hour: hour.to_string(),
            orders,
        })
        .collect()
}

/// Sum every bundle's weekday buckets, Monday first. Days no bundle has are
/// left out.
pub fn combine_weekday(store: &Store) -> Vec<WeekdayRecord> {
    let mut by_day: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for record in store.values().flat_map(|bundle| &bundle.weekday) {
        let bucket = by_day.entry(record.day.as_str()).or_insert((0, 0.0));
        bucket.0 += record.orders;
        bucket.1 += record.revenue;
    }
    WEEK.iter()
        .map(|day| weekday_label(*day))
        .filter_map(|label| {
            let (orders, revenue) = by_day.get(label)?;
            Some(WeekdayRecord {
                day: label.to_string(),
                orders: *orders,
                revenue: round2(*revenue),
            })
        })
        .collect()
}

fn sum_metrics<'a>(daily: impl IntoIterator<Item = &'a DailyRecord>) -> SalesMetrics {
    daily
        .into_iter()
        .fold(SalesMetrics::default(), |mut acc, d| {
            acc.accumulate(&d.metrics);
            acc
        })
}

/// Totals over a daily series.
pub fn totals(daily: &[DailyRecord]) -> Totals {
    Totals::from_metrics(sum_metrics(daily))
}

/// Calendar-month buckets, ascending.
pub fn monthly(daily: &[DailyRecord]) -> Vec<MonthlyAggregate> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&DailyRecord>> = BTreeMap::new();
    for record in daily {
        buckets.entry(month_start(record.date)).or_default().push(record);
    }

    buckets
        .into_iter()
        .map(|(start, records)| {
            let days = records.len() as u32;
            let totals = Totals::from_metrics(sum_metrics(records));
            MonthlyAggregate {
                month: start.format("%Y-%m").to_string(),
                label: month_label(start),
                start,
                days,
                daily_avg_rev: ratio(totals.metrics.revenue, days as f64),
                daily_avg_ord: ratio(totals.metrics.orders as f64, days as f64),
                totals,
            }
        })
        .collect()
}

/// Monday-start week buckets, ascending.
pub fn weekly(daily: &[DailyRecord]) -> Vec<WeeklyAggregate> {
    let mut buckets: BTreeMap<NaiveDate, WeeklyAggregate> = BTreeMap::new();
    for record in daily {
        let week = week_start(record.date);
        let bucket = buckets.entry(week).or_insert_with(|| WeeklyAggregate {
            week,
            orders: 0,
            units: 0.0,
            revenue: 0.0,
            refunds: 0,
            net: 0.0,
        });
        bucket.orders += record.metrics.orders;
        bucket.units += record.metrics.units;
        bucket.revenue += record.metrics.revenue;
        bucket.refunds += record.metrics.refunds;
        bucket.net += record.metrics.net;
    }
    buckets.into_values().collect()
}

/// Derived per-product ratios, in input order.
pub fn product_metrics(products: &[CombinedSku]) -> Vec<ProductMetrics> {
    products
        .iter()
        .map(|p| {
            let r = &p.record;
            ProductMetrics {
                refund_rate: ratio(r.refunds as f64, r.orders as f64),
                avg_price: ratio(r.revenue, r.units),
                fee_rate: ratio(r.fees.abs(), r.revenue),
                net_margin: ratio(r.net, r.revenue),
                product: p.clone(),
            }
        })
        .collect()
}

/// Totals per stored marketplace, in store key order.
pub fn marketplace_summaries(store: &Store) -> Vec<MarketplaceSummary> {
    store
        .iter()
        .map(|(marketplace, bundle)| MarketplaceSummary {
            marketplace: marketplace.clone(),
            days: bundle.daily.len(),
            skus: bundle.sku.len(),
            date_range: bundle.meta.date_range,
            totals: totals(&bundle.daily),
        })
        .collect()
}

pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Short month label, e.g. `Mar 26`.
pub(crate) fn month_label(date: NaiveDate) -> String {
    date.format("%b %y").to_string()
}

pub(crate) fn days_in_month(date: NaiveDate) -> u32 {
    let start = month_start(date);
    start
        .checked_add_months(Months::new(1))
        .map(|next| (next - start).num_days() as u32)
        .unwrap_or(31)
}
