//! Per-import aggregation state shared by the record extractors.

use chrono::{Datelike, NaiveDate};
use mhub_core::{
    round2, weekday_label, BundleMeta, DailyRecord, HourlyRecord, MarketplaceBundle,
    RegionRecord, ReportFormat, SkuRecord, WeekdayRecord, WEEK,
};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Counters for rows that were read but not aggregated.
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    /// Non-empty data lines after the header.
    pub rows: usize,
    /// Rows narrower than the format's minimum width.
    pub short_rows: usize,
    /// Rows without a parsable date.
    pub undated_rows: usize,
    /// Trailer or blank-key rows.
    pub blank_rows: usize,
}

impl ExtractStats {
    /// Rows that contributed to the bundle.
    pub fn used_rows(&self) -> usize {
        self.rows - self.short_rows - self.undated_rows - self.blank_rows
    }
}

/// Builder for one marketplace bundle.
#[derive(Debug, Default)]
pub(crate) struct BundleAccumulator {
    daily: BTreeMap<NaiveDate, DailyRecord>,
    pub(crate) skus: BTreeMap<String, SkuRecord>,
    regions: BTreeMap<String, RegionRecord>,
    hourly: BTreeMap<u8, u64>,
    /// Keyed by days from Monday.
    weekday: BTreeMap<u32, (u64, f64)>,
    /// Orders counted row by row.
    pub(crate) orders: u64,
    /// Revenue counted row by row.
    pub(crate) revenue: f64,
    pub(crate) stats: ExtractStats,
}

impl BundleAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Daily record for `date`, created on first use.
    pub(crate) fn day(&mut self, date: NaiveDate) -> &mut DailyRecord {
        self.daily.entry(date).or_insert_with(|| DailyRecord::new(date))
    }

    /// SKU record, created with `title` (truncated) on first use.
    pub(crate) fn sku(&mut self, sku: &str, title: &str) -> &mut SkuRecord {
        self.skus
            .entry(sku.to_string())
            .or_insert_with(|| SkuRecord::new(sku, truncate_title(title)))
    }

    /// Count one order line in a region bucket.
    pub(crate) fn add_region(&mut self, name: &str, revenue: f64, units: f64) {
        let region = self
            .regions
            .entry(name.to_string())
            .or_insert_with(|| RegionRecord::new(name));
        region.orders += 1;
        region.revenue += revenue;
        region.units += units;
    }

    /// Count one order in the hour-of-day bucket.
    pub(crate) fn add_hour(&mut self, hour: u8) {
        *self.hourly.entry(hour).or_insert(0) += 1;
    }

    /// Count one order line in the weekday bucket of `date`.
    pub(crate) fn add_weekday(&mut self, date: NaiveDate, revenue: f64) {
        let bucket = self
            .weekday
            .entry(date.weekday().num_days_from_monday())
            .or_insert((0, 0.0));
        bucket.0 += 1;
        bucket.1 += revenue;
    }

    /// Freeze into a bundle with the documented orderings, filed under the
    /// marketplace `format` belongs to.
    pub(crate) fn finish(self, format: ReportFormat) -> MarketplaceBundle {
        let marketplace = format.marketplace().unwrap_or_else(|| format.tag());
        let daily: Vec<DailyRecord> = self.daily.into_values().collect();
        let date_range = match (daily.first(), daily.last()) {
            (Some(first), Some(last)) => Some([first.date, last.date]),
            _ => None,
        };

        let mut sku: Vec<SkuRecord> = self.skus.into_values().collect();
        sku.sort_by_key(|s| Reverse(OrderedFloat(s.revenue)));

        let mut states: Vec<RegionRecord> = self.regions.into_values().collect();
        sort_regions(&mut states);

        let hourly = self
            .hourly
            .into_iter()
            .map(|(hour, orders)| HourlyRecord {
                hour: format!("{hour:02}"),
                orders,
            })
            .collect();

        let weekday = WEEK
            .iter()
            .filter_map(|day| {
                let (orders, revenue) = self.weekday.get(&day.num_days_from_monday())?;
                Some(WeekdayRecord {
                    day: weekday_label(*day).to_string(),
                    orders: *orders,
                    revenue: round2(*revenue),
                })
            })
            .collect();

        MarketplaceBundle {
            marketplace: marketplace.to_string(),
            format,
            daily,
            sku,
            states,
            hourly,
            weekday,
            meta: BundleMeta {
                orders: self.orders,
                revenue: round2(self.revenue),
                rows: self.stats.rows,
                date_range,
            },
            imported_at: None,
        }
    }
}

/// Sort regions by revenue, highest first.
pub(crate) fn sort_regions(regions: &mut [RegionRecord]) {
    regions.sort_by_key(|r| Reverse(OrderedFloat(r.revenue)));
}

const TITLE_MAX_CHARS: usize = 100;

fn truncate_title(title: &str) -> String {
    title.chars().take(TITLE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_finish_orders_outputs() {
        let mut acc = BundleAccumulator::new();
        acc.day(date(2025, 1, 3)).metrics.revenue = 5.0;
        acc.day(date(2025, 1, 1)).metrics.revenue = 7.0;
        acc.sku("B", "cheap").revenue = 1.0;
        acc.sku("A", "pricey").revenue = 9.0;
        acc.add_region("Bayern", 2.0, 1.0);
        acc.add_region("Berlin", 8.0, 1.0);
        acc.add_hour(9);
        acc.add_hour(7);
        acc.add_weekday(date(2025, 1, 5), 3.333); // Sunday
        acc.add_weekday(date(2025, 1, 6), 1.0); // Monday

        let bundle = acc.finish(ReportFormat::EbayOrders);

        assert_eq!(bundle.marketplace, "ebay");
        assert_eq!(bundle.daily[0].date, date(2025, 1, 1));
        assert_eq!(bundle.meta.date_range, Some([date(2025, 1, 1), date(2025, 1, 3)]));
        assert_eq!(bundle.sku[0].sku, "A");
        assert_eq!(bundle.states[0].name, "Berlin");
        assert_eq!(bundle.hourly[0].hour, "07");
        assert_eq!(bundle.weekday[0].day, "Mo");
        assert_eq!(bundle.weekday[1].day, "So");
        assert_eq!(bundle.weekday[1].revenue, 3.33);
    }

    #[test]
    fn test_title_truncated_by_chars() {
        let mut acc = BundleAccumulator::new();
        let long = "ä".repeat(150);
        let record = acc.sku("X", &long);
        assert_eq!(record.title.chars().count(), 100);
    }

    #[test]
    fn test_empty_bundle_has_no_range() {
        let bundle = BundleAccumulator::new().finish(ReportFormat::AmazonTransactions);
        assert_eq!(bundle.marketplace, "amazon");
        assert!(bundle.daily.is_empty());
        assert_eq!(bundle.meta.date_range, None);
    }
}
