//! Plain-text digests of the forecast and anomaly artifacts

use crate::output::{AnomalyRow, ForecastRow};
use chrono::{Duration, NaiveDate};
use series_math::stats;

/// Number of days in a digest window
const WINDOW_DAYS: i64 = 7;

/// Summary of the coming week against the week before
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDigest {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Mean `yhat` over the coming window
    pub next_average: f64,
    /// Mean `yhat` over the previous window, if covered
    pub previous_average: Option<f64>,
    /// Week-over-week change in percent
    pub percent_change: Option<f64>,
    /// Day with the highest `yhat` (earliest on ties)
    pub peak_day: NaiveDate,
    /// Day with the lowest `yhat` (earliest on ties)
    pub low_day: NaiveDate,
}

impl ForecastDigest {
    /// Summarise `today ..= today + 6` against `today - 7 ..= today - 1`.
    /// Returns `None` when the forecast does not cover the coming window.
    pub fn weekly(rows: &[ForecastRow], today: NaiveDate) -> Option<Self> {
        let window_end = today + Duration::days(WINDOW_DAYS - 1);
        let previous_start = today - Duration::days(WINDOW_DAYS);

        let next: Vec<&ForecastRow> = rows
            .iter()
            .filter(|r| r.ds >= today && r.ds <= window_end)
            .collect();
        let previous: Vec<f64> = rows
            .iter()
            .filter(|r| r.ds >= previous_start && r.ds < today)
            .map(|r| r.yhat)
            .collect();

        let next_values: Vec<f64> = next.iter().map(|r| r.yhat).collect();
        let next_average = stats::mean(&next_values).ok()?;
        let previous_average = stats::mean(&previous).ok();
        let percent_change =
            previous_average.and_then(|prev| stats::percentage_change(prev, next_average));

        let mut peak = next[0];
        let mut low = next[0];
        for row in &next[1..] {
            if row.yhat > peak.yhat {
                peak = row;
            }
            if row.yhat < low.yhat {
                low = row;
            }
        }

        Some(Self {
            window_start: today,
            window_end,
            next_average,
            previous_average,
            percent_change,
            peak_day: peak.ds,
            low_day: low.ds,
        })
    }

    /// Alert body for one metric
    pub fn render(&self, metric: &str) -> String {
        let mut lines = vec![
            format!("Weekly Forecast Alert: {}", metric),
            format!("{} -> {}", self.window_start, self.window_end),
            format!("Avg {}: {:.2}", metric, self.next_average),
        ];
        if let Some(change) = self.percent_change {
            let direction = if change > 0.0 { "Increase" } else { "Decrease" };
            lines.push(format!("{} vs last week: {:.1}%", direction, change));
        }
        lines.push(format!("Peak on {}", self.peak_day));
        lines.push(format!("Lowest on {}", self.low_day));
        lines.join("\n")
    }
}

/// Most recent anomalies, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyDigest {
    entries: Vec<AnomalyRow>,
}

impl AnomalyDigest {
    /// Keep the `limit` most recent rows
    pub fn recent(rows: &[AnomalyRow], limit: usize) -> Self {
        let mut entries = rows.to_vec();
        // Stable, so rows of one date keep artifact order
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries.truncate(limit);
        Self { entries }
    }

    /// Selected rows, newest first
    pub fn entries(&self) -> &[AnomalyRow] {
        &self.entries
    }

    /// Check if no anomaly was selected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alert body, one line per anomaly
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No anomalies to alert.".to_string();
        }

        let mut lines = vec!["Ad Anomalies Detected!".to_string()];
        lines.extend(self.entries.iter().map(|row| {
            format!(
                "- {} | {} | {} | {}",
                row.date,
                row.dimension.as_deref().unwrap_or("-"),
                row.metric,
                row.classification
            )
        }));
        lines.join("\n")
    }
}
