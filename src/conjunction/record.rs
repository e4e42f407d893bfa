//! Raw conjunction rows as they arrive from an upstream screening table

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Number of cells in a screening row
pub const RECORD_COLUMNS: usize = 6;

/// A whole range cell: one number, optionally followed by `km`
static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:e[-+]?\d+)?)\s*(?:km)?\s*$").unwrap()
});

/// A whole velocity cell: one number, optionally followed by `km/s`
static VELOCITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:e[-+]?\d+)?)\s*(?:km/s)?\s*$").unwrap()
});

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

const TCA_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y %b %d %H:%M:%S%.f",
];

/// A cell of a raw conjunction row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConjunctionField {
    SecondaryId,
    SecondaryName,
    Tca,
    MinRange,
    RelativeVelocity,
    Probability,
}

impl ConjunctionField {
    pub fn name(&self) -> &'static str {
        match self {
            ConjunctionField::SecondaryId => "secondary_id",
            ConjunctionField::SecondaryName => "secondary_name",
            ConjunctionField::Tca => "tca",
            ConjunctionField::MinRange => "min_range",
            ConjunctionField::RelativeVelocity => "relative_velocity",
            ConjunctionField::Probability => "probability",
        }
    }
}

impl fmt::Display for ConjunctionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a conjunction row could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum ConjunctionFieldError {
    MissingColumns { expected: usize, found: usize },
    Unparsable { field: ConjunctionField, value: String },
}

impl fmt::Display for ConjunctionFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConjunctionFieldError::MissingColumns { expected, found } => {
                write!(f, "Row has {} cells, expected {}", found, expected)
            }
            ConjunctionFieldError::Unparsable { field, value } => {
                write!(f, "Unparsable {} cell: {:?}", field, value)
            }
        }
    }
}

impl std::error::Error for ConjunctionFieldError {}

/// One row of a conjunction screening table, cells kept as text
///
/// Cells are only interpreted by the typed accessors, so a malformed cell
/// fails the row that carries it and never the batch it came in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConjunctionRecord {
    #[serde(default, alias = "norad_id", deserialize_with = "cell")]
    pub secondary_id: String,
    #[serde(default, alias = "name", deserialize_with = "cell")]
    pub secondary_name: String,
    #[serde(default, deserialize_with = "cell")]
    pub tca: String,
    #[serde(default, alias = "min_range_km", deserialize_with = "cell")]
    pub min_range: String,
    #[serde(default, alias = "relative_velocity_km_s", deserialize_with = "cell")]
    pub relative_velocity: String,
    #[serde(default, deserialize_with = "cell")]
    pub probability: String,
}

/// Accept strings, numbers or null for any cell
fn cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl RawConjunctionRecord {
    /// Build a record from a table row
    ///
    /// Columns: secondary id, secondary name, TCA, minimum range, relative
    /// velocity, probability. Extra trailing columns are ignored.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Result<Self, ConjunctionFieldError> {
        if cells.len() < RECORD_COLUMNS {
            return Err(ConjunctionFieldError::MissingColumns {
                expected: RECORD_COLUMNS,
                found: cells.len(),
            });
        }

        let text = |i: usize| cells[i].as_ref().trim().to_string();
        Ok(Self {
            secondary_id: text(0),
            secondary_name: text(1),
            tca: text(2),
            min_range: text(3),
            relative_velocity: text(4),
            probability: text(5),
        })
    }

    /// Catalog id of the secondary object: the first digit run in its cell
    pub fn secondary_catalog_id(&self) -> Result<u32, ConjunctionFieldError> {
        DIGITS_REGEX
            .find(&self.secondary_id)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| unparsable(ConjunctionField::SecondaryId, &self.secondary_id))
    }

    /// Secondary name as given, if the cell is not blank
    pub fn secondary_name(&self) -> Option<&str> {
        let name = self.secondary_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Time of closest approach
    pub fn tca_utc(&self) -> Result<DateTime<Utc>, ConjunctionFieldError> {
        parse_tca(&self.tca).ok_or_else(|| unparsable(ConjunctionField::Tca, &self.tca))
    }

    /// Minimum range in km; a trailing `km` is allowed, negative values are not
    pub fn min_range_km(&self) -> Result<f64, ConjunctionFieldError> {
        measured_value(&RANGE_REGEX, &self.min_range)
            .filter(|v| *v >= 0.0)
            .ok_or_else(|| unparsable(ConjunctionField::MinRange, &self.min_range))
    }

    /// Relative velocity in km/s; a trailing `km/s` is allowed, negative values are not
    pub fn relative_velocity_km_s(&self) -> Result<f64, ConjunctionFieldError> {
        measured_value(&VELOCITY_REGEX, &self.relative_velocity)
            .filter(|v| *v >= 0.0)
            .ok_or_else(|| unparsable(ConjunctionField::RelativeVelocity, &self.relative_velocity))
    }

    /// Collision probability, `None` unless the whole cell is a number in [0, 1]
    pub fn probability(&self) -> Option<f64> {
        self.probability
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| (0.0..=1.0).contains(p))
    }
}

fn unparsable(field: ConjunctionField, value: &str) -> ConjunctionFieldError {
    ConjunctionFieldError::Unparsable {
        field,
        value: value.to_string(),
    }
}

/// The number in a cell matched by `pattern`, scientific notation included
fn measured_value(pattern: &Regex, cell: &str) -> Option<f64> {
    pattern
        .captures(cell)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a TCA cell; naive times are taken as UTC
pub fn parse_tca(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.with_timezone(&Utc));
    }

    TCA_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn row() -> RawConjunctionRecord {
        RawConjunctionRecord::from_cells(&[
            "25544",
            "ISS (ZARYA)",
            "2026-01-29 12:34:56.789",
            "0.812",
            "14.2",
            "1.327E-05",
        ])
        .unwrap()
    }

    #[test]
    fn test_from_cells() {
        let record = row();
        assert_eq!(record.secondary_catalog_id().unwrap(), 25544);
        assert_eq!(record.secondary_name(), Some("ISS (ZARYA)"));
        assert_eq!(record.min_range_km().unwrap(), 0.812);
        assert_eq!(record.relative_velocity_km_s().unwrap(), 14.2);
        assert!((record.probability().unwrap() - 1.327e-5).abs() < 1e-15);

        let tca = record.tca_utc().unwrap();
        assert_eq!(tca.hour(), 12);
        assert_eq!(tca.nanosecond() / 1_000_000, 789);
    }

    #[test]
    fn test_too_few_cells() {
        let err = RawConjunctionRecord::from_cells(&["1", "2", "3"]).unwrap_err();
        assert_eq!(
            err,
            ConjunctionFieldError::MissingColumns {
                expected: 6,
                found: 3
            }
        );
    }

    #[test]
    fn test_range_and_velocity_units() {
        let mut record = row();
        let cells = [("0.812 km", 0.812), ("0.812KM", 0.812), (" .5 ", 0.5), ("1e-1", 0.1)];
        for (cell, expected) in cells {
            record.min_range = cell.to_string();
            assert_eq!(record.min_range_km().unwrap(), expected, "{}", cell);
        }

        record.relative_velocity = "14.2 km/s".to_string();
        assert_eq!(record.relative_velocity_km_s().unwrap(), 14.2);
        record.relative_velocity = "14.2 km".to_string();
        assert!(record.relative_velocity_km_s().is_err());
    }

    #[test]
    fn test_range_with_leading_text_rejected() {
        let mut record = row();
        for cell in ["N/A 0", "approx 3 km", "0.8 or 1.2", "n/a", "", "nan", "inf"] {
            record.min_range = cell.to_string();
            assert_eq!(
                record.min_range_km(),
                Err(ConjunctionFieldError::Unparsable {
                    field: ConjunctionField::MinRange,
                    value: cell.to_string(),
                }),
                "{}",
                cell
            );
        }
    }

    #[test]
    fn test_probability_must_be_whole_cell() {
        let mut record = row();
        for cell in ["see note 1", "1 in 75,000", "Rev 1", "1.3E-05 (est)", "NaN", ""] {
            record.probability = cell.to_string();
            assert_eq!(record.probability(), None, "{}", cell);
        }

        record.probability = " 2.5E-06 ".to_string();
        assert_eq!(record.probability(), Some(2.5e-6));
        record.probability = "1".to_string();
        assert_eq!(record.probability(), Some(1.0));
    }

    #[test]
    fn test_secondary_id_digit_run() {
        let mut record = row();
        record.secondary_id = "[+] 43013".to_string();
        assert_eq!(record.secondary_catalog_id().unwrap(), 43013);

        record.secondary_id = "unknown".to_string();
        assert!(matches!(
            record.secondary_catalog_id(),
            Err(ConjunctionFieldError::Unparsable {
                field: ConjunctionField::SecondaryId,
                ..
            })
        ));
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut record = row();
        record.probability = "1.5".to_string();
        assert_eq!(record.probability(), None);
        record.probability = "-0.1".to_string();
        assert_eq!(record.probability(), None);
        record.probability = "garbage".to_string();
        assert_eq!(record.probability(), None);
    }

    #[test]
    fn test_negative_range_rejected() {
        let mut record = row();
        record.min_range = "-3".to_string();
        assert!(record.min_range_km().is_err());
    }

    #[test]
    fn test_tca_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 29, 12, 34, 56).unwrap();
        assert_eq!(parse_tca("2026-01-29 12:34:56"), Some(expected));
        assert_eq!(parse_tca("2026-01-29T12:34:56"), Some(expected));
        assert_eq!(parse_tca("2026-01-29T12:34:56Z"), Some(expected));
        assert_eq!(parse_tca("2026-01-29T13:34:56+01:00"), Some(expected));
        assert_eq!(parse_tca("2026 Jan 29 12:34:56"), Some(expected));
        assert_eq!(parse_tca("tomorrow"), None);
        assert_eq!(parse_tca(""), None);
    }

    #[test]
    fn test_json_cells_accept_numbers() {
        let json = r#"{
            "secondary_id": 43013,
            "secondary_name": null,
            "tca": "2026-01-29 12:34:56",
            "min_range": 4.2,
            "relative_velocity": "7.1 km/s",
            "probability": 2.5e-6
        }"#;
        let record: RawConjunctionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.secondary_catalog_id().unwrap(), 43013);
        assert_eq!(record.secondary_name(), None);
        assert_eq!(record.min_range_km().unwrap(), 4.2);
        assert_eq!(record.relative_velocity_km_s().unwrap(), 7.1);
        assert!((record.probability().unwrap() - 2.5e-6).abs() < 1e-18);
    }

    #[test]
    fn test_json_missing_cell_is_row_error() {
        let record: RawConjunctionRecord =
            serde_json::from_str(r#"{"secondary_id": "1", "probability": "1e-3"}"#).unwrap();
        assert!(record.tca_utc().is_err());
    }
}
