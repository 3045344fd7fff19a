//! Goal tracking against the latest month and the overall totals.

use mhub_core::{ratio, GoalConfig};
use serde::Serialize;

use crate::aggregate::{MonthlyAggregate, Totals};

/// Progress values are clamped to this ceiling.
pub const PROGRESS_CAP: f64 = 1.5;

/// Goal metrics with a progress rule. Other keys in a goal map are kept but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalMetric {
    MonthlyRevenue,
    MonthlyOrders,
    MonthlyNet,
    YearlyRevenue,
}

impl GoalMetric {
    pub const ALL: [GoalMetric; 4] = [
        GoalMetric::MonthlyRevenue,
        GoalMetric::MonthlyOrders,
        GoalMetric::MonthlyNet,
        GoalMetric::YearlyRevenue,
    ];

    /// Key in the stored goal map.
    pub fn key(self) -> &'static str {
        match self {
            GoalMetric::MonthlyRevenue => "monthlyRevenue",
            GoalMetric::MonthlyOrders => "monthlyOrders",
            GoalMetric::MonthlyNet => "monthlyNet",
            GoalMetric::YearlyRevenue => "yearlyRevenue",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    fn current(self, latest: Option<&MonthlyAggregate>, totals: &Totals) -> Option<f64> {
        match self {
            GoalMetric::MonthlyRevenue => latest.map(|m| m.totals.metrics.revenue),
            GoalMetric::MonthlyOrders => latest.map(|m| m.totals.metrics.orders as f64),
            GoalMetric::MonthlyNet => latest.map(|m| m.totals.metrics.net),
            GoalMetric::YearlyRevenue => Some(totals.metrics.revenue),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalStatus {
    Reached,
    OnTrack,
    Feasible,
    Critical,
}

impl GoalStatus {
    pub fn from_progress(progress: f64) -> Self {
        if progress >= 1.0 {
            GoalStatus::Reached
        } else if progress >= 0.75 {
            GoalStatus::OnTrack
        } else if progress >= 0.5 {
            GoalStatus::Feasible
        } else {
            GoalStatus::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub metric: GoalMetric,
    pub target: f64,
    pub current: f64,
    /// `current / target`, clamped to `[0, PROGRESS_CAP]`.
    pub progress: f64,
    pub status: GoalStatus,
}

/// Month-end outlook for a monthly revenue target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthProjection {
    pub target: f64,
    pub projected_revenue: f64,
    pub days_left: u32,
    pub required_daily: f64,
    /// Relative increase of the daily average needed to close the gap.
    pub required_increase: f64,
    pub on_track: bool,
}

/// Progress for every configured goal with a positive target.
pub fn goal_progress(
    goals: &GoalConfig,
    monthly: &[MonthlyAggregate],
    totals: &Totals,
) -> Vec<GoalProgress> {
    let latest = monthly.last();
    GoalMetric::ALL
        .into_iter()
        .filter_map(|metric| {
            let target = *goals.get(metric.key())?;
            if target <= 0.0 {
                return None;
            }
            let current = metric.current(latest, totals)?;
            let progress = (current / target).clamp(0.0, PROGRESS_CAP);
            Some(GoalProgress {
                metric,
                target,
                current,
                progress,
                status: GoalStatus::from_progress(progress),
            })
        })
        .collect()
}

/// Extrapolate `month` to its full calendar length against `target`.
pub fn month_projection(month: &MonthlyAggregate, target: f64) -> MonthProjection {
    let calendar_days = month.calendar_days();
    let projected_revenue = month.daily_avg_rev * f64::from(calendar_days);
    let days_left = calendar_days.saturating_sub(month.days);
    let gap = target - month.totals.metrics.revenue;
    let required_daily = ratio(gap, f64::from(days_left));
    let current_daily = month.daily_avg_rev;
    let required_increase = if current_daily > 0.0 {
        (required_daily - current_daily) / current_daily
    } else {
        0.0
    };

    MonthProjection {
        target,
        projected_revenue,
        days_left,
        required_daily,
        required_increase,
        on_track: projected_revenue >= target,
    }
}
