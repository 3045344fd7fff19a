//! Flat-table and JSON export of the derived views.
//!
//! Values are written raw (`1234.56`, `0.125`); display formatting belongs to
//! whoever reads the file.

use chrono::NaiveDate;
use mhub_core::{DailyRecord, Error, GoalConfig, HourlyRecord, Result, Store, WeekdayRecord};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::aggregate::{
    combine_daily, combine_hourly, combine_sku, combine_weekday, marketplace_summaries, monthly,
    product_metrics, totals, weekly, MarketplaceSummary, MonthlyAggregate, ProductMetrics, Totals,
    WeeklyAggregate,
};
use crate::compare::{
    compare_periods, month_over_month, ComparisonSet, Metric, MonthOverMonth, Period,
};
use crate::forecast::{forecast, growth_rates, Forecast, ForecastPoint, GrowthRate};
use crate::goals::{goal_progress, GoalProgress};

/// Field separator of exported tables.
pub const DEFAULT_DELIMITER: u8 = b';';

/// A derived record that can be written as one row of a delimited table.
pub trait FlatTable {
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

/// Write `rows` with a header line.
pub fn write_table<T: FlatTable, W: Write>(writer: W, rows: &[T], delimiter: u8) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    out.write_record(T::HEADERS)
        .map_err(|e| Error::export(e.to_string()))?;
    for row in rows {
        out.write_record(row.row())
            .map_err(|e| Error::export(e.to_string()))?;
    }
    out.flush()?;
    Ok(())
}

/// [`write_table`] into a string.
pub fn table_to_string<T: FlatTable>(rows: &[T], delimiter: u8) -> Result<String> {
    let mut buf = Vec::new();
    write_table(&mut buf, rows, delimiter)?;
    String::from_utf8(buf).map_err(|e| Error::export(e.to_string()))
}

impl FlatTable for DailyRecord {
    const HEADERS: &'static [&'static str] = &[
        "date",
        "orders",
        "units",
        "revenue",
        "refunds",
        "refundAmount",
        "fees",
        "fbaFees",
        "serviceFees",
        "storageFees",
        "net",
    ];

    fn row(&self) -> Vec<String> {
        let m = &self.metrics;
        vec![
            self.date.to_string(),
            m.orders.to_string(),
            m.units.to_string(),
            m.revenue.to_string(),
            m.refunds.to_string(),
            m.refund_amount.to_string(),
            m.fees.to_string(),
            m.fba_fees.to_string(),
            m.service_fees.to_string(),
            m.storage_fees.to_string(),
            m.net.to_string(),
        ]
    }
}

impl FlatTable for MonthlyAggregate {
    const HEADERS: &'static [&'static str] = &[
        "month",
        "revenue",
        "orders",
        "units",
        "refunds",
        "refundRate",
        "totalFees",
        "net",
        "netMargin",
        "days",
        "dailyAvgRev",
    ];

    fn row(&self) -> Vec<String> {
        let t = &self.totals;
        vec![
            self.month.clone(),
            t.metrics.revenue.to_string(),
            t.metrics.orders.to_string(),
            t.metrics.units.to_string(),
            t.metrics.refunds.to_string(),
            t.refund_rate.to_string(),
            t.total_fees.to_string(),
            t.metrics.net.to_string(),
            t.net_margin.to_string(),
            self.days.to_string(),
            self.daily_avg_rev.to_string(),
        ]
    }
}

impl FlatTable for WeeklyAggregate {
    const HEADERS: &'static [&'static str] =
        &["week", "orders", "units", "revenue", "refunds", "net"];

    fn row(&self) -> Vec<String> {
        vec![
            self.week.to_string(),
            self.orders.to_string(),
            self.units.to_string(),
            self.revenue.to_string(),
            self.refunds.to_string(),
            self.net.to_string(),
        ]
    }
}

impl FlatTable for ProductMetrics {
    const HEADERS: &'static [&'static str] = &[
        "marketplace",
        "sku",
        "title",
        "revenue",
        "units",
        "orders",
        "refunds",
        "refundRate",
        "avgPrice",
        "feeRate",
        "net",
        "netMargin",
    ];

    fn row(&self) -> Vec<String> {
        let r = &self.product.record;
        vec![
            self.product.marketplace.clone(),
            r.sku.clone(),
            r.title.clone(),
            r.revenue.to_string(),
            r.units.to_string(),
            r.orders.to_string(),
            r.refunds.to_string(),
            self.refund_rate.to_string(),
            self.avg_price.to_string(),
            self.fee_rate.to_string(),
            r.net.to_string(),
            self.net_margin.to_string(),
        ]
    }
}

impl FlatTable for HourlyRecord {
    const HEADERS: &'static [&'static str] = &["hour", "orders"];

    fn row(&self) -> Vec<String> {
        vec![self.hour.clone(), self.orders.to_string()]
    }
}

impl FlatTable for WeekdayRecord {
    const HEADERS: &'static [&'static str] = &["day", "orders", "revenue"];

    fn row(&self) -> Vec<String> {
        vec![
            self.day.clone(),
            self.orders.to_string(),
            self.revenue.to_string(),
        ]
    }
}

impl FlatTable for GrowthRate {
    const HEADERS: &'static [&'static str] = &["month", "revGrowth"];

    fn row(&self) -> Vec<String> {
        vec![self.month.clone(), self.rev_growth.to_string()]
    }
}

/// One (period, metric) cell of a comparison set.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub period: Period,
    pub metric: Metric,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
}

/// Flatten a comparison set, periods first.
pub fn comparison_rows(set: &ComparisonSet) -> Vec<ComparisonRow> {
    set.periods
        .iter()
        .flat_map(|p| {
            p.metrics.iter().map(move |(metric, delta)| ComparisonRow {
                period: p.period,
                metric: *metric,
                current: delta.current,
                previous: delta.previous,
                change: delta.change,
            })
        })
        .collect()
}

impl FlatTable for ComparisonRow {
    const HEADERS: &'static [&'static str] = &["period", "metric", "current", "previous", "change"];

    fn row(&self) -> Vec<String> {
        vec![
            self.period.label().to_string(),
            self.metric.name().to_string(),
            self.current.to_string(),
            self.previous.to_string(),
            self.change.to_string(),
        ]
    }
}

impl FlatTable for ForecastPoint {
    const HEADERS: &'static [&'static str] = &["month", "label", "revenue", "orders"];

    fn row(&self) -> Vec<String> {
        vec![
            self.month.clone(),
            self.label.clone(),
            self.revenue.to_string(),
            self.orders.to_string(),
        ]
    }
}

/// Every derived view in one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub totals: Totals,
    pub marketplaces: Vec<MarketplaceSummary>,
    pub monthly: Vec<MonthlyAggregate>,
    pub weekly: Vec<WeeklyAggregate>,
    pub products: Vec<ProductMetrics>,
    pub daily: Vec<DailyRecord>,
    pub hourly: Vec<HourlyRecord>,
    pub weekday: Vec<WeekdayRecord>,
    pub comparisons: ComparisonSet,
    pub month_over_month: Option<MonthOverMonth>,
    pub growth: Vec<GrowthRate>,
    pub forecast: Forecast,
    pub goals: Vec<GoalProgress>,
}

impl Dashboard {
    /// Compute every view from a store snapshot. `as_of` anchors forecast labels.
    pub fn build(store: &Store, goals: &GoalConfig, as_of: NaiveDate) -> Self {
        let daily = combine_daily(store);
        let months = monthly(&daily);
        let total = totals(&daily);
        debug!(
            marketplaces = store.len(),
            days = daily.len(),
            months = months.len(),
            "building dashboard"
        );

        Self {
            as_of,
            marketplaces: marketplace_summaries(store),
            weekly: weekly(&daily),
            products: product_metrics(&combine_sku(store)),
            hourly: combine_hourly(store),
            weekday: combine_weekday(store),
            comparisons: compare_periods(&daily),
            month_over_month: month_over_month(&months),
            growth: growth_rates(&months),
            forecast: forecast(&months, as_of),
            goals: goal_progress(goals, &months, &total),
            totals: total,
            monthly: months,
            daily,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
