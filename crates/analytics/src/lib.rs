//! Derived views over stored marketplace bundles.
//!
//! This crate provides:
//! - Combined daily, SKU, hourly and weekday views, totals, monthly and weekly buckets
//! - Period-over-period and month-over-month comparison
//! - Damped-growth forecasting and the monthly growth series
//! - Goal progress and month projection
//! - Flat-table and JSON export

pub mod aggregate;
pub mod compare;
pub mod export;
pub mod forecast;
pub mod goals;

pub use aggregate::{
    combine_daily, combine_hourly, combine_sku, combine_weekday, marketplace_summaries, monthly,
    product_metrics, totals, weekly, CombinedSku, MarketplaceSummary, MonthlyAggregate,
    ProductMetrics, Totals, WeeklyAggregate,
};
pub use compare::{
    compare_periods, month_over_month, ComparisonSet, DateWindow, Metric, MetricDelta,
    MonthOverMonth, Period, PeriodComparison,
};
pub use export::{
    comparison_rows, table_to_string, write_table, Dashboard, FlatTable, DEFAULT_DELIMITER,
};
pub use forecast::{forecast, growth_rates, Forecast, ForecastPoint, GrowthRate};
pub use goals::{
    goal_progress, month_projection, GoalMetric, GoalProgress, GoalStatus, MonthProjection,
};
