//! Conversions between chrono timestamps and satkit instants

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

/// Julian date of the Unix epoch (1970-01-01T00:00:00Z)
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian date of J2000.0 (2000-01-01T12:00:00)
pub const J2000_JD: f64 = 2_451_545.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a UTC timestamp into a satkit instant
pub fn to_instant(timestamp: &DateTime<Utc>) -> Option<satkit::Instant> {
    let seconds = timestamp.second() as f64 + timestamp.nanosecond() as f64 * 1e-9;
    satkit::Instant::from_datetime(
        timestamp.year() as i32,
        timestamp.month() as i32,
        timestamp.day() as i32,
        timestamp.hour() as i32,
        timestamp.minute() as i32,
        seconds,
    )
    .ok()
}

/// Convert a satkit instant back into a UTC timestamp
pub fn from_instant(instant: &satkit::Instant) -> Option<DateTime<Utc>> {
    let (year, month, day, hour, min, sec) = instant.as_datetime();
    let sec = sec as f64;
    let whole = sec.floor();

    let base = Utc
        .with_ymd_and_hms(
            year as i32,
            month as u32,
            day as u32,
            hour as u32,
            min as u32,
            whole as u32,
        )
        .single()?;

    Some(base + Duration::nanoseconds(((sec - whole) * 1e9).round() as i64))
}

/// Julian date (UTC, treated as UT1) of a timestamp
pub fn julian_date(timestamp: &DateTime<Utc>) -> f64 {
    let seconds = timestamp.timestamp() as f64 + timestamp.timestamp_subsec_nanos() as f64 * 1e-9;
    UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
}

/// Days elapsed since J2000.0
pub fn days_since_j2000(timestamp: &DateTime<Utc>) -> f64 {
    julian_date(timestamp) - J2000_JD
}

/// Offset a timestamp by a (possibly fractional) number of seconds
pub fn offset_seconds(timestamp: &DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    *timestamp + Duration::microseconds((seconds * 1e6).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_julian_date_j2000() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date(&t) - J2000_JD).abs() < 1e-9);
        assert!(days_since_j2000(&t).abs() < 1e-9);
    }

    #[test]
    fn test_instant_round_trip() {
        let t = Utc.with_ymd_and_hms(2026, 1, 29, 12, 30, 15).unwrap();
        let instant = to_instant(&t).unwrap();
        let back = from_instant(&instant).unwrap();
        assert!((back - t).num_milliseconds().abs() < 2);
    }

    #[test]
    fn test_offset_seconds() {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let later = offset_seconds(&t, 90.5);
        assert_eq!((later - t).num_milliseconds(), 90_500);
    }
}
