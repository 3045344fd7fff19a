//! Period-over-period comparison anchored at the latest day with data.

use chrono::{Datelike, Days, NaiveDate};
use mhub_core::{DailyRecord, SalesMetrics};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{month_start, week_start, MonthlyAggregate};

/// Compared figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Revenue,
    Orders,
    Units,
    Refunds,
    Net,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Revenue,
        Metric::Orders,
        Metric::Units,
        Metric::Refunds,
        Metric::Net,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::Orders => "orders",
            Metric::Units => "units",
            Metric::Refunds => "refunds",
            Metric::Net => "net",
        }
    }

    fn value(self, m: &SalesMetrics) -> f64 {
        match self {
            Metric::Revenue => m.revenue,
            Metric::Orders => m.orders as f64,
            Metric::Units => m.units,
            Metric::Refunds => m.refunds as f64,
            Metric::Net => m.net,
        }
    }
}

/// Comparison horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Period::Day => "Today vs yesterday",
            Period::Week => "This week vs last week",
            Period::Month => "Month to date vs preceding days",
            Period::Year => "Year to date vs prior year",
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Current and previous value of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub current: f64,
    pub previous: f64,
    /// Relative change; see [`relative_change`].
    pub change: f64,
}

/// One horizon of the comparison set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub period: Period,
    pub current: DateWindow,
    pub previous: DateWindow,
    pub metrics: BTreeMap<Metric, MetricDelta>,
}

impl PeriodComparison {
    pub fn metric(&self, metric: Metric) -> Option<&MetricDelta> {
        self.metrics.get(&metric)
    }
}

/// Day, week, month and year comparisons, in that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSet {
    pub periods: Vec<PeriodComparison>,
}

impl ComparisonSet {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, period: Period) -> Option<&PeriodComparison> {
        self.periods.iter().find(|p| p.period == period)
    }
}

/// `(current - previous) / |previous|`; with no previous value, 1 for growth
/// from nothing and 0 otherwise.
pub fn relative_change(current: f64, previous: f64) -> f64 {
    if previous != 0.0 {
        (current - previous) / previous.abs()
    } else if current > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Compare the periods ending at the latest date in `daily`.
pub fn compare_periods(daily: &[DailyRecord]) -> ComparisonSet {
    let Some(today) = daily.iter().map(|d| d.date).max() else {
        return ComparisonSet::default();
    };

    let comparison = |period, current: DateWindow, previous: DateWindow| {
        let cur = sum_window(daily, current);
        let prev = sum_window(daily, previous);
        let metrics = Metric::ALL
            .iter()
            .map(|&metric| {
                let (c, p) = (metric.value(&cur), metric.value(&prev));
                (
                    metric,
                    MetricDelta {
                        current: c,
                        previous: p,
                        change: relative_change(c, p),
                    },
                )
            })
            .collect();
        PeriodComparison {
            period,
            current,
            previous,
            metrics,
        }
    };

    let yesterday = today - Days::new(1);
    let day = comparison(
        Period::Day,
        DateWindow::new(today, today),
        DateWindow::new(yesterday, yesterday),
    );

    let monday = week_start(today);
    let week = comparison(
        Period::Week,
        DateWindow::new(monday, today),
        DateWindow::new(monday - Days::new(7), monday - Days::new(1)),
    );

    // The previous month window has as many days as the current one has records.
    let first = month_start(today);
    let current_month = DateWindow::new(first, today);
    let recorded = daily.iter().filter(|d| current_month.contains(d.date)).count() as u64;
    let previous_end = first - Days::new(1);
    let month = comparison(
        Period::Month,
        current_month,
        DateWindow::new(previous_end - Days::new(recorded.saturating_sub(1)), previous_end),
    );

    let year = comparison(
        Period::Year,
        DateWindow::new(year_start(today.year()), today),
        DateWindow::new(year_start(today.year() - 1), same_day_prior_year(today)),
    );

    ComparisonSet {
        periods: vec![day, week, month, year],
    }
}

/// Latest month bucket against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOverMonth {
    /// `YYYY-MM` of the latest bucket.
    pub month: String,
    pub previous: String,
    /// `(latest - previous) / |previous|`, `None` when the previous value is 0.
    pub changes: BTreeMap<Metric, Option<f64>>,
}

impl MonthOverMonth {
    pub fn change(&self, metric: Metric) -> Option<f64> {
        self.changes.get(&metric).copied().flatten()
    }
}

/// Compare the last two buckets of `monthly`; `None` with fewer than two.
pub fn month_over_month(monthly: &[MonthlyAggregate]) -> Option<MonthOverMonth> {
    let [.., previous, latest] = monthly else {
        return None;
    };
    let (cur, prev) = (&latest.totals.metrics, &previous.totals.metrics);
    let changes = Metric::ALL
        .iter()
        .map(|&metric| {
            let (c, p) = (metric.value(cur), metric.value(prev));
            let change = (p.abs() > 0.0).then(|| (c - p) / p.abs());
            (metric, change)
        })
        .collect();
    Some(MonthOverMonth {
        month: latest.month.clone(),
        previous: previous.month.clone(),
        changes,
    })
}

fn sum_window(daily: &[DailyRecord], window: DateWindow) -> SalesMetrics {
    daily
        .iter()
        .filter(|d| window.contains(d.date))
        .fold(SalesMetrics::default(), |mut acc, d| {
            acc.accumulate(&d.metrics);
            acc
        })
}

fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Same month and day one year earlier; Feb 29 becomes Feb 28.
fn same_day_prior_year(date: NaiveDate) -> NaiveDate {
    let year = date.year() - 1;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::monthly;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(date: NaiveDate, revenue: f64) -> DailyRecord {
        let mut record = DailyRecord::new(date);
        record.metrics.revenue = revenue;
        record.metrics.orders = 1;
        record
    }

    fn series(start: NaiveDate, end: NaiveDate, revenue: f64) -> Vec<DailyRecord> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| day(d, revenue))
            .collect()
    }

    #[test]
    fn test_relative_change() {
        assert_abs_diff_eq!(relative_change(150.0, 100.0), 0.5);
        assert_abs_diff_eq!(relative_change(-50.0, -100.0), 0.5);
        assert_eq!(relative_change(5.0, 0.0), 1.0);
        assert_eq!(relative_change(0.0, 0.0), 0.0);
        assert_eq!(relative_change(-5.0, 0.0), 0.0);
    }

    #[test]
    fn test_empty_input_gives_empty_set() {
        assert!(compare_periods(&[]).is_empty());
    }

    #[test]
    fn test_month_window_matches_day_count() {
        let mut daily = series(date(2026, 1, 1), date(2026, 1, 31), 10.0);
        daily.extend(series(date(2026, 2, 1), date(2026, 2, 10), 20.0));

        let set = compare_periods(&daily);
        let month = set.get(Period::Month).unwrap();

        assert_eq!(month.current, DateWindow::new(date(2026, 2, 1), date(2026, 2, 10)));
        assert_eq!(month.previous, DateWindow::new(date(2026, 1, 22), date(2026, 1, 31)));
        assert_eq!(month.previous.days(), 10);

        let revenue = month.metric(Metric::Revenue).unwrap();
        assert_abs_diff_eq!(revenue.current, 200.0);
        assert_abs_diff_eq!(revenue.previous, 100.0);
        assert_abs_diff_eq!(revenue.change, 1.0);
    }

    #[test]
    fn test_day_missing_yesterday_counts_as_zero() {
        let daily = vec![day(date(2025, 3, 1), 40.0), day(date(2025, 3, 3), 30.0)];
        let set = compare_periods(&daily);
        let today = set.get(Period::Day).unwrap();

        assert_eq!(today.current.start, date(2025, 3, 3));
        let revenue = today.metric(Metric::Revenue).unwrap();
        assert_abs_diff_eq!(revenue.previous, 0.0);
        assert_abs_diff_eq!(revenue.change, 1.0);
    }

    #[test]
    fn test_week_windows() {
        // 2025-03-05 is a Wednesday.
        let daily = series(date(2025, 2, 20), date(2025, 3, 5), 1.0);
        let set = compare_periods(&daily);
        let week = set.get(Period::Week).unwrap();

        assert_eq!(week.current, DateWindow::new(date(2025, 3, 3), date(2025, 3, 5)));
        assert_eq!(week.previous, DateWindow::new(date(2025, 2, 24), date(2025, 3, 2)));
        assert_abs_diff_eq!(week.metric(Metric::Orders).unwrap().current, 3.0);
        assert_abs_diff_eq!(week.metric(Metric::Orders).unwrap().previous, 7.0);
    }

    #[test]
    fn test_year_window_clamps_leap_day() {
        let daily = vec![day(date(2023, 2, 28), 5.0), day(date(2024, 2, 29), 10.0)];
        let set = compare_periods(&daily);
        let year = set.get(Period::Year).unwrap();

        assert_eq!(year.previous, DateWindow::new(date(2023, 1, 1), date(2023, 2, 28)));
        assert_abs_diff_eq!(year.metric(Metric::Revenue).unwrap().previous, 5.0);
    }

    #[test]
    fn test_month_over_month() {
        let mut daily = vec![day(date(2025, 1, 10), 100.0), day(date(2025, 2, 3), 100.0)];
        daily.push(day(date(2025, 3, 1), 150.0));
        daily[2].metrics.refunds = 2;
        let months = monthly(&daily);

        let mom = month_over_month(&months).unwrap();
        assert_eq!(mom.month, "2025-03");
        assert_eq!(mom.previous, "2025-02");
        assert_abs_diff_eq!(mom.change(Metric::Revenue).unwrap(), 0.5);
        assert_abs_diff_eq!(mom.change(Metric::Orders).unwrap(), 0.0);
        // No refunds in February, so there is nothing to compare against.
        assert_eq!(mom.change(Metric::Refunds), None);
        assert_eq!(mom.changes.len(), Metric::ALL.len());
    }

    #[test]
    fn test_month_over_month_needs_two_months() {
        assert_eq!(month_over_month(&[]), None);
        assert_eq!(month_over_month(&monthly(&[day(date(2025, 1, 1), 5.0)])), None);
    }

    #[test]
    fn test_periods_in_order() {
        let set = compare_periods(&[day(date(2025, 6, 15), 1.0)]);
        let order: Vec<Period> = set.periods.iter().map(|p| p.period).collect();
        assert_eq!(order, vec![Period::Day, Period::Week, Period::Month, Period::Year]);
        assert!(set.periods.iter().all(|p| p.metrics.len() == Metric::ALL.len()));
    }
}
