//! Turning raw screening rows into ranked conjunction events

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::{ConjunctionFieldError, RawConjunctionRecord};
use super::risk::{RiskLevel, RiskThresholds};
use crate::data::SatelliteCatalog;

const UNKNOWN_NAME: &str = "Unknown";

/// Identity of one side of a conjunction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SatelliteRef {
    pub catalog_id: u32,
    pub name: String,
}

/// A validated close approach between a tracked satellite and another object
///
/// Only the analyzer builds these, so the risk level always agrees with the
/// range and probability it was classified from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConjunctionEvent {
    id: String,
    primary: SatelliteRef,
    secondary: SatelliteRef,
    tca: DateTime<Utc>,
    min_range_km: f64,
    probability: f64,
    relative_velocity_km_s: f64,
    risk: RiskLevel,
}

impl ConjunctionEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        sequence: usize,
        primary: SatelliteRef,
        secondary: SatelliteRef,
        tca: DateTime<Utc>,
        min_range_km: f64,
        probability: f64,
        relative_velocity_km_s: f64,
        thresholds: &RiskThresholds,
    ) -> Self {
        let id = format!(
            "{}-{}-{}-{}",
            primary.catalog_id,
            secondary.catalog_id,
            tca.format("%Y%m%d%H%M%S"),
            sequence
        );

        Self {
            id,
            primary,
            secondary,
            tca,
            min_range_km,
            probability,
            relative_velocity_km_s,
            risk: thresholds.classify(min_range_km, probability),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn primary(&self) -> &SatelliteRef {
        &self.primary
    }

    pub fn secondary(&self) -> &SatelliteRef {
        &self.secondary
    }

    pub fn tca(&self) -> DateTime<Utc> {
        self.tca
    }

    pub fn min_range_km(&self) -> f64 {
        self.min_range_km
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn relative_velocity_km_s(&self) -> f64 {
        self.relative_velocity_km_s
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn involves(&self, catalog_id: u32) -> bool {
        self.primary.catalog_id == catalog_id || self.secondary.catalog_id == catalog_id
    }

    /// Hours from `now` until closest approach, negative once it has passed
    pub fn hours_until(&self, now: &DateTime<Utc>) -> f64 {
        (self.tca - *now).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// The one ordering used for every list of events
///
/// Higher probability first, then smaller minimum range.
pub fn priority_order(a: &ConjunctionEvent, b: &ConjunctionEvent) -> Ordering {
    b.probability
        .total_cmp(&a.probability)
        .then_with(|| a.min_range_km.total_cmp(&b.min_range_km))
}

/// Sort events by priority; ties keep their input order
pub fn rank(events: &mut [ConjunctionEvent]) {
    events.sort_by(priority_order);
}

/// Counts from one parse run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub accepted: usize,
    pub self_conjunctions: usize,
    pub malformed: usize,
    pub zero_probability: usize,
}

impl ParseReport {
    pub fn skipped(&self) -> usize {
        self.self_conjunctions + self.malformed + self.zero_probability
    }

    pub fn total(&self) -> usize {
        self.accepted + self.skipped()
    }
}

enum RowOutcome {
    Accepted(ConjunctionEvent),
    SelfConjunction,
    ZeroProbability,
    Malformed(ConjunctionFieldError),
}

/// Parses and classifies conjunction rows against a catalog
pub struct ConjunctionAnalyzer<'a> {
    catalog: &'a SatelliteCatalog,
    thresholds: RiskThresholds,
}

impl<'a> ConjunctionAnalyzer<'a> {
    pub fn new(catalog: &'a SatelliteCatalog, thresholds: RiskThresholds) -> Self {
        Self {
            catalog,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn classify(&self, min_range_km: f64, probability: f64) -> RiskLevel {
        self.thresholds.classify(min_range_km, probability)
    }

    /// Events for `primary_id`, in input order
    pub fn parse(
        &self,
        records: &[RawConjunctionRecord],
        primary_id: u32,
    ) -> Vec<ConjunctionEvent> {
        self.parse_with_report(records, primary_id).0
    }

    /// Events for `primary_id` plus counts of what was skipped and why
    pub fn parse_with_report(
        &self,
        records: &[RawConjunctionRecord],
        primary_id: u32,
    ) -> (Vec<ConjunctionEvent>, ParseReport) {
        let primary = SatelliteRef {
            catalog_id: primary_id,
            name: self.catalog.display_name(primary_id),
        };

        let mut events = Vec::new();
        let mut report = ParseReport::default();

        for (row, record) in records.iter().enumerate() {
            match self.parse_row(record, &primary, events.len() + 1) {
                RowOutcome::Accepted(event) => {
                    report.accepted += 1;
                    events.push(event);
                }
                RowOutcome::SelfConjunction => {
                    log::trace!("Skipping conjunction row {}: primary against itself", row);
                    report.self_conjunctions += 1;
                }
                RowOutcome::ZeroProbability => {
                    log::debug!(
                        "Skipping conjunction row {}: no positive probability in {:?}",
                        row,
                        record.probability
                    );
                    report.zero_probability += 1;
                }
                RowOutcome::Malformed(err) => {
                    log::warn!("Skipping conjunction row {}: {}", row, err);
                    report.malformed += 1;
                }
            }
        }

        log::debug!(
            "Parsed {} conjunctions for {} ({} self, {} malformed, {} zero probability)",
            report.accepted,
            primary_id,
            report.self_conjunctions,
            report.malformed,
            report.zero_probability
        );

        (events, report)
    }

    fn parse_row(
        &self,
        record: &RawConjunctionRecord,
        primary: &SatelliteRef,
        sequence: usize,
    ) -> RowOutcome {
        let secondary_id = match record.secondary_catalog_id() {
            Ok(id) => id,
            Err(err) => return RowOutcome::Malformed(err),
        };
        if secondary_id == primary.catalog_id {
            return RowOutcome::SelfConjunction;
        }

        let probability = match record.probability() {
            Some(p) if p > 0.0 => p,
            _ => return RowOutcome::ZeroProbability,
        };

        let fields = record.tca_utc().and_then(|tca| {
            Ok((tca, record.min_range_km()?, record.relative_velocity_km_s()?))
        });
        let (tca, min_range_km, relative_velocity_km_s) = match fields {
            Ok(fields) => fields,
            Err(err) => return RowOutcome::Malformed(err),
        };

        let secondary = SatelliteRef {
            catalog_id: secondary_id,
            name: self.secondary_name(record, secondary_id),
        };

        RowOutcome::Accepted(ConjunctionEvent::new(
            sequence,
            primary.clone(),
            secondary,
            tca,
            min_range_km,
            probability,
            relative_velocity_km_s,
            &self.thresholds,
        ))
    }

    fn secondary_name(&self, record: &RawConjunctionRecord, secondary_id: u32) -> String {
        record
            .secondary_name()
            .or_else(|| self.catalog.known_name(secondary_id))
            .unwrap_or(UNKNOWN_NAME)
            .to_string()
    }
}

/// Events per tracked satellite, each group ranked
///
/// Every tracked id has a group, possibly empty. An event involving two
/// tracked satellites appears under both.
pub fn group_by_satellite(
    events: &[ConjunctionEvent],
    tracked_ids: &[u32],
) -> BTreeMap<u32, Vec<ConjunctionEvent>> {
    let mut groups: BTreeMap<u32, Vec<ConjunctionEvent>> =
        tracked_ids.iter().map(|id| (*id, Vec::new())).collect();

    for event in events {
        for id in [event.primary.catalog_id, event.secondary.catalog_id] {
            if let Some(group) = groups.get_mut(&id) {
                group.push(event.clone());
            }
        }
    }

    for group in groups.values_mut() {
        rank(group);
    }

    groups
}
