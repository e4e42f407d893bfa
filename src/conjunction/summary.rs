//! Aggregate views over a set of conjunction events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analyzer::ConjunctionEvent;
use super::risk::RiskLevel;

/// Conjunction reporting configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConjunctionSettings {
    /// High-risk events closer than this many hours count as urgent
    pub urgent_window_hours: f64,
}

impl Default for ConjunctionSettings {
    fn default() -> Self {
        Self {
            urgent_window_hours: 24.0,
        }
    }
}

/// Risk distribution and headline statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RiskSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub max_probability: f64,
    pub mean_probability: f64,
    pub mean_min_range_km: f64,
    /// High-risk events with TCA inside the urgent window, past ones included
    pub urgent: usize,
}

impl RiskSummary {
    pub fn from_events(
        events: &[ConjunctionEvent],
        now: &DateTime<Utc>,
        settings: &ConjunctionSettings,
    ) -> Self {
        if events.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total: events.len(),
            ..Self::default()
        };
        let mut probability_sum = 0.0;
        let mut range_sum = 0.0;

        for event in events {
            match event.risk() {
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
            }

            summary.max_probability = summary.max_probability.max(event.probability());
            probability_sum += event.probability();
            range_sum += event.min_range_km();

            let urgent = event.hours_until(now) <= settings.urgent_window_hours;
            if event.risk() == RiskLevel::High && urgent {
                summary.urgent += 1;
            }
        }

        summary.mean_probability = probability_sum / events.len() as f64;
        summary.mean_min_range_km = range_sum / events.len() as f64;
        summary
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }
}

/// Number of events whose TCA falls in one time-to-go window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Upper edges (hours) of every bucket but the last
const BUCKET_EDGES: [(f64, &str); 4] = [
    (6.0, "0-6h"),
    (12.0, "6-12h"),
    (24.0, "12-24h"),
    (48.0, "24-48h"),
];
const LAST_BUCKET: &str = "48h+";

/// Count events by hours until TCA; already-passed events land in the first bucket
pub fn timeline(events: &[ConjunctionEvent], now: &DateTime<Utc>) -> Vec<TimelineBucket> {
    let mut buckets: Vec<TimelineBucket> = BUCKET_EDGES
        .iter()
        .map(|(_, label)| *label)
        .chain(std::iter::once(LAST_BUCKET))
        .map(|label| TimelineBucket { label, count: 0 })
        .collect();

    for event in events {
        let hours = event.hours_until(now);
        let index = BUCKET_EDGES
            .iter()
            .position(|(edge, _)| hours < *edge)
            .unwrap_or(BUCKET_EDGES.len());
        buckets[index].count += 1;
    }

    buckets
}
