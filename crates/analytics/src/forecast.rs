//! Damped-growth monthly forecast.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::aggregate::{month_label, month_start, MonthlyAggregate};

/// Monthly buckets considered for growth.
pub const TRAILING_MONTHS: usize = 6;

/// Months projected.
pub const HORIZON_MONTHS: u32 = 6;

/// Multiplier applied to the measured growth before compounding.
pub const DAMPENING: f64 = 0.7;

/// Buckets required before anything is projected.
pub const MIN_MONTHS: usize = 3;

/// One projected month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Offset label, `+1M` .. `+6M`.
    pub month: String,
    /// Calendar label, e.g. `Apr 26`.
    pub label: String,
    pub revenue: f64,
    pub orders: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub avg_growth: f64,
    pub points: Vec<ForecastPoint>,
}

/// Revenue growth of one bucket over the bucket before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRate {
    /// Label of the later bucket, e.g. `Feb 25`.
    pub month: String,
    pub rev_growth: f64,
}

/// Growth from `earlier` to `later` revenue; 0 when `earlier` is not positive.
fn revenue_growth(earlier: &MonthlyAggregate, later: &MonthlyAggregate) -> f64 {
    let (earlier, later) = (earlier.totals.metrics.revenue, later.totals.metrics.revenue);
    if earlier > 0.0 {
        (later - earlier) / earlier
    } else {
        0.0
    }
}

/// Growth of every bucket after the first, ascending.
pub fn growth_rates(monthly: &[MonthlyAggregate]) -> Vec<GrowthRate> {
    monthly
        .windows(2)
        .map(|pair| GrowthRate {
            month: pair[1].label.clone(),
            rev_growth: revenue_growth(&pair[0], &pair[1]),
        })
        .collect()
}

/// Mean month-over-month revenue growth over the trailing window.
pub fn average_growth(monthly: &[MonthlyAggregate]) -> f64 {
    if monthly.len() < MIN_MONTHS {
        return 0.0;
    }
    let trailing = &monthly[monthly.len().saturating_sub(TRAILING_MONTHS)..];
    let growths: Vec<f64> = trailing
        .windows(2)
        .map(|pair| revenue_growth(&pair[0], &pair[1]))
        .collect();
    growths.iter().mean()
}

/// Project revenue and orders for the months after `today`.
pub fn forecast(monthly: &[MonthlyAggregate], today: NaiveDate) -> Forecast {
    let Some(last) = monthly.last().filter(|_| monthly.len() >= MIN_MONTHS) else {
        return Forecast::default();
    };

    let avg_growth = average_growth(monthly);
    let factor = 1.0 + avg_growth * DAMPENING;
    let anchor = month_start(today);

    let points = (1..=HORIZON_MONTHS)
        .map(|i| {
            let scale = factor.powi(i as i32);
            let label = anchor
                .checked_add_months(Months::new(i))
                .map(month_label)
                .unwrap_or_default();
            ForecastPoint {
                month: format!("+{i}M"),
                label,
                revenue: (last.totals.metrics.revenue * scale).round(),
                orders: (last.totals.metrics.orders as f64 * scale).round(),
            }
        })
        .collect();

    Forecast { avg_growth, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::monthly;
    use approx::assert_abs_diff_eq;
    use mhub_core::DailyRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn months(revenues: &[f64]) -> Vec<MonthlyAggregate> {
        let daily: Vec<DailyRecord> = revenues
            .iter()
            .enumerate()
            .map(|(i, &revenue)| {
                let mut record = DailyRecord::new(date(2025, i as u32 + 1, 1));
                record.metrics.revenue = revenue;
                record.metrics.orders = (revenue / 10.0) as u64;
                record
            })
            .collect();
        monthly(&daily)
    }

    #[test]
    fn test_growth_and_first_point() {
        let f = forecast(&months(&[100.0, 110.0, 121.0]), date(2026, 3, 15));

        assert_abs_diff_eq!(f.avg_growth, 0.10, epsilon = 1e-9);
        assert_eq!(f.points.len(), 6);
        assert_eq!(f.points[0].revenue, 129.0);
        assert_eq!(f.points[0].orders, 13.0);
        assert_eq!(f.points[0].month, "+1M");
        assert_eq!(f.points[0].label, "Apr 26");
        assert_eq!(f.points[5].label, "Sep 26");
    }

    #[test]
    fn test_too_few_months() {
        let f = forecast(&months(&[100.0, 200.0]), date(2026, 1, 1));
        assert_eq!(f, Forecast::default());
        assert_eq!(average_growth(&months(&[100.0, 200.0])), 0.0);
    }

    #[test]
    fn test_only_trailing_window_counts() {
        // The jump from 1 to 100 falls outside the last six buckets.
        let f = forecast(
            &months(&[1.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0]),
            date(2026, 1, 1),
        );
        assert_abs_diff_eq!(f.avg_growth, 0.0);
        assert_eq!(f.points[5].revenue, 100.0);
    }

    #[test]
    fn test_zero_revenue_month_contributes_zero_growth() {
        let g = average_growth(&months(&[0.0, 50.0, 100.0]));
        // (0 + 1.0) / 2
        assert_abs_diff_eq!(g, 0.5);
    }

    #[test]
    fn test_growth_rates_series() {
        let rates = growth_rates(&months(&[0.0, 50.0, 100.0, 75.0]));
        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].month, "Feb 25");
        assert_eq!(rates[0].rev_growth, 0.0);
        assert_abs_diff_eq!(rates[1].rev_growth, 1.0);
        assert_abs_diff_eq!(rates[2].rev_growth, -0.25);
        assert!(growth_rates(&months(&[10.0])).is_empty());
    }

    #[test]
    fn test_year_rollover_labels() {
        let f = forecast(&months(&[10.0, 10.0, 10.0]), date(2025, 11, 30));
        assert_eq!(f.points[0].label, "Dec 25");
        assert_eq!(f.points[1].label, "Jan 26");
    }
}
