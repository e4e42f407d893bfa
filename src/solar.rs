//! Approximate solar geometry for day/night terminator rendering
//!
//! The sun direction comes from a low-order analytic expression: the mean
//! anomaly and mean longitude of the sun grow linearly with days since J2000.0,
//! two periodic terms give the ecliptic longitude, and the mean obliquity of
//! the ecliptic projects it onto the equatorial frame. Accuracy is about one
//! degree, which is what terminator shading needs. Do not use it where
//! sub-degree accuracy matters.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;

use crate::propagation::{ecef_to_eci, gmst, normalize_longitude, GeodeticPoint};
use crate::time::days_since_j2000;

/// Unit vector from Earth's center towards the Sun, valid at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunDirection {
    pub timestamp: DateTime<Utc>,
    /// Unit vector in the same inertial frame as propagated states
    pub unit: Vector3<f64>,
}

impl SunDirection {
    /// Solar declination in degrees
    pub fn declination_deg(&self) -> f64 {
        self.unit.z.clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Solar right ascension in degrees, [0, 360)
    pub fn right_ascension_deg(&self) -> f64 {
        self.unit.y.atan2(self.unit.x).to_degrees().rem_euclid(360.0)
    }

    /// Cosine of the Sun's angle from an inertial direction
    pub fn cos_angle_to(&self, direction: &Vector3<f64>) -> f64 {
        let norm = direction.norm();
        if norm == 0.0 {
            return 0.0;
        }
        self.unit.dot(direction) / norm
    }
}

/// Approximate direction of the Sun at `timestamp`
pub fn sun_direction(timestamp: &DateTime<Utc>) -> SunDirection {
    let d = days_since_j2000(timestamp);

    // Mean anomaly and mean longitude (deg)
    let g = (357.529 + 0.985_600_28 * d).to_radians();
    let q = 280.459 + 0.985_647_36 * d;

    let ecliptic_lon = (q + 1.915 * g.sin() + 0.020 * (2.0 * g).sin()).to_radians();
    let obliquity = (23.439 - 0.000_000_36 * d).to_radians();

    let unit = Vector3::new(
        ecliptic_lon.cos(),
        obliquity.cos() * ecliptic_lon.sin(),
        obliquity.sin() * ecliptic_lon.sin(),
    )
    .normalize();

    SunDirection {
        timestamp: *timestamp,
        unit,
    }
}

/// Point on the ground where the Sun is at the zenith
pub fn subsolar_point(timestamp: &DateTime<Utc>) -> GeodeticPoint {
    let sun = sun_direction(timestamp);
    let lon = sun.right_ascension_deg() - gmst(timestamp).to_degrees();

    GeodeticPoint::new(sun.declination_deg(), normalize_longitude(lon), 0.0)
}

/// Cosine of the solar zenith angle at a ground point (spherical Earth)
///
/// Positive on the day side, negative on the night side, zero on the
/// terminator.
pub fn illumination(point: &GeodeticPoint, timestamp: &DateTime<Utc>) -> f64 {
    let normal_eci = ecef_to_eci(&point.surface_normal(), gmst(timestamp));
    sun_direction(timestamp).cos_angle_to(&normal_eci)
}

/// Whether a ground point is on the day side of the terminator
pub fn is_sunlit(point: &GeodeticPoint, timestamp: &DateTime<Utc>) -> bool {
    illumination(point, timestamp) > 0.0
}
