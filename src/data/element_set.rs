//! Two-line element sets and their validation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::from_instant;

/// Width of a standard TLE line (columns 1-69)
pub const TLE_LINE_WIDTH: usize = 69;

const EARTH_RADIUS_KM: f64 = 6371.0;
const MU_EARTH_KM3_S2: f64 = 398600.4418;
const SECONDS_PER_DAY: f64 = 86_400.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

/// Raw TLE text as it arrives from a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TleData {
    #[serde(default)]
    pub epoch: Option<String>,
    pub line1: String,
    pub line2: String,
}

/// Reasons an element set is rejected at parse time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSetError {
    /// A line is empty after trimming
    EmptyLine { line: u8 },

    /// A line is narrower than the fixed TLE field layout
    TooShort { line: u8, len: usize },

    /// A line does not start with its line-number marker
    BadLineMarker { line: u8 },

    /// Catalog number columns are not numeric
    BadCatalogNumber { value: String },

    /// Lines 1 and 2 describe different objects
    CatalogMismatch { line1: u32, line2: u32 },

    /// The propagator refused to initialize from these lines
    Rejected { message: String },
}

impl fmt::Display for ElementSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLine { line } => write!(f, "Malformed element set: line {} is empty", line),
            Self::TooShort { line, len } => write!(
                f,
                "Malformed element set: line {} has {} columns, expected at least {}",
                line, len, TLE_LINE_WIDTH
            ),
            Self::BadLineMarker { line } => write!(
                f,
                "Malformed element set: line {} does not start with \"{} \"",
                line, line
            ),
            Self::BadCatalogNumber { value } => {
                write!(f, "Malformed element set: bad catalog number {:?}", value)
            }
            Self::CatalogMismatch { line1, line2 } => write!(
                f,
                "Malformed element set: catalog number {} on line 1 but {} on line 2",
                line1, line2
            ),
            Self::Rejected { message } => {
                write!(f, "Malformed element set: {}", message)
            }
        }
    }
}

impl std::error::Error for ElementSetError {}

/// A validated, immutable two-line element set
///
/// Only constructed through [`OrbitalElementSet::parse`], which also initializes
/// the SGP4 record the propagator needs. The derived constants (mean motion,
/// eccentricity, epoch) are read from that record and never re-derived here.
#[derive(Clone)]
pub struct OrbitalElementSet {
    catalog_id: u32,
    name: Option<String>,
    line1: String,
    line2: String,
    epoch: DateTime<Utc>,
    mean_motion_rev_per_day: f64,
    eccentricity: f64,
    tle: satkit::TLE,
}

impl fmt::Debug for OrbitalElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElementSet")
            .field("catalog_id", &self.catalog_id)
            .field("name", &self.name)
            .field("epoch", &self.epoch)
            .field("mean_motion_rev_per_day", &self.mean_motion_rev_per_day)
            .field("eccentricity", &self.eccentricity)
            .finish()
    }
}

impl OrbitalElementSet {
    /// Validate and decode two TLE lines
    pub fn parse(line1: &str, line2: &str) -> Result<Self, ElementSetError> {
        Self::parse_named(None, line1, line2)
    }

    /// Validate and decode two TLE lines with an optional display name
    pub fn parse_named(
        name: Option<&str>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, ElementSetError> {
        let line1 = check_line(line1, 1)?;
        let line2 = check_line(line2, 2)?;

        let id1 = catalog_number(line1)?;
        let id2 = catalog_number(line2)?;
        if id1 != id2 {
            return Err(ElementSetError::CatalogMismatch {
                line1: id1,
                line2: id2,
            });
        }

        let tle = satkit::TLE::load_2line(line1, line2).map_err(|e| {
            log::trace!("Failed to parse TLE {}: {}", id1, e);
            ElementSetError::Rejected {
                message: e.to_string(),
            }
        })?;

        let epoch = from_instant(&tle.epoch).ok_or_else(|| ElementSetError::Rejected {
            message: "epoch is not a valid calendar time".to_string(),
        })?;

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.trim_start_matches("0 ").to_string());

        Ok(Self {
            catalog_id: id1,
            name,
            line1: line1.to_string(),
            line2: line2.to_string(),
            epoch,
            mean_motion_rev_per_day: tle.mean_motion,
            eccentricity: tle.eccen,
            tle,
        })
    }

    /// Parse raw catalog TLE data
    pub fn from_tle_data(name: Option<&str>, data: &TleData) -> Result<Self, ElementSetError> {
        Self::parse_named(name, &data.line1, &data.line2)
    }

    pub fn catalog_id(&self) -> u32 {
        self.catalog_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Display name (falls back to NORAD ID if no name)
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.catalog_id))
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> &str {
        &self.line2
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Mean motion in revolutions per day
    pub fn mean_motion_rev_per_day(&self) -> f64 {
        self.mean_motion_rev_per_day
    }

    /// Mean motion in radians per minute
    pub fn mean_motion_rad_per_min(&self) -> f64 {
        self.mean_motion_rev_per_day * std::f64::consts::TAU / MINUTES_PER_DAY
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    /// Initialized SGP4 record, opaque to everything but the propagator
    pub(crate) fn tle(&self) -> &satkit::TLE {
        &self.tle
    }

    /// Age of the element set at `timestamp` in days (negative before epoch)
    pub fn age_days(&self, timestamp: &DateTime<Utc>) -> f64 {
        (*timestamp - self.epoch).num_milliseconds() as f64 / (SECONDS_PER_DAY * 1000.0)
    }

    /// Estimate perigee/apogee altitudes (km above Earth's surface)
    pub fn perigee_apogee_km(&self) -> Option<(f64, f64)> {
        if !self.mean_motion_rev_per_day.is_finite() || !self.eccentricity.is_finite() {
            return None;
        }
        if self.mean_motion_rev_per_day <= 0.0 || !(0.0..1.0).contains(&self.eccentricity) {
            return None;
        }

        let n_rad_s = self.mean_motion_rev_per_day * std::f64::consts::TAU / SECONDS_PER_DAY;
        let a_km = (MU_EARTH_KM3_S2 / (n_rad_s * n_rad_s)).cbrt();
        if !a_km.is_finite() {
            return None;
        }

        let perigee_km = a_km * (1.0 - self.eccentricity) - EARTH_RADIUS_KM;
        let apogee_km = a_km * (1.0 + self.eccentricity) - EARTH_RADIUS_KM;
        Some((perigee_km, apogee_km))
    }
}

fn check_line(line: &str, number: u8) -> Result<&str, ElementSetError> {
    let line = line.trim_end_matches(['\r', '\n', ' ']);
    if line.trim().is_empty() {
        return Err(ElementSetError::EmptyLine { line: number });
    }

    let marker = if number == 1 { "1 " } else { "2 " };
    if !line.starts_with(marker) {
        return Err(ElementSetError::BadLineMarker { line: number });
    }

    if line.len() < TLE_LINE_WIDTH {
        return Err(ElementSetError::TooShort {
            line: number,
            len: line.len(),
        });
    }

    Ok(line)
}

/// Catalog number from columns 3-7
fn catalog_number(line: &str) -> Result<u32, ElementSetError> {
    let field = line.get(2..7).unwrap_or_default().trim();
    field
        .parse::<u32>()
        .map_err(|_| ElementSetError::BadCatalogNumber {
            value: field.to_string(),
        })
}
