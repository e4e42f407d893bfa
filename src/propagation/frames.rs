//! Inertial to Earth-fixed and geodetic conversions
//!
//! Rotation from the inertial frame into the Earth-fixed frame is a single
//! rotation about the polar axis by Greenwich Mean Sidereal Time. Geodetic
//! coordinates are taken on the WGS-84 ellipsoid.

use chrono::{DateTime, Utc};
use glam::Vec3;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use super::EARTH_RADIUS_KM;
use crate::time::{julian_date, J2000_JD};

const SECONDS_PER_JULIAN_CENTURY_DAY: f64 = 876_600.0 * 3600.0;

/// A point above the Earth's surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Geodetic latitude in degrees, [-90, 90]
    pub latitude_deg: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude_deg: f64,
    /// Height above the ellipsoid in km
    pub altitude_km: f64,
}

impl GeodeticPoint {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_km,
        }
    }

    /// Cartesian position on a spherical Earth (km)
    ///
    /// Used for distance checks between neighbouring path points, where the
    /// ellipsoid flattening is irrelevant.
    pub fn to_spherical_cartesian(&self) -> Vector3<f64> {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let r = EARTH_RADIUS_KM + self.altitude_km;

        Vector3::new(
            r * lat.cos() * lon.cos(),
            r * lat.cos() * lon.sin(),
            r * lat.sin(),
        )
    }

    /// Unit outward normal of a spherical Earth at this point
    pub fn surface_normal(&self) -> Vector3<f64> {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }
}

/// Radius window outside which a position is treated as implausible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityBounds {
    /// Lower bound as a multiple of Earth's radius
    pub min_radius_factor: f64,
    /// Upper bound as a multiple of Earth's radius
    pub max_radius_factor: f64,
}

impl Default for PlausibilityBounds {
    fn default() -> Self {
        Self {
            min_radius_factor: 0.9,
            max_radius_factor: 8.0,
        }
    }
}

impl PlausibilityBounds {
    pub fn contains_radius(&self, radius_km: f64) -> bool {
        radius_km.is_finite()
            && radius_km >= self.min_radius_factor * EARTH_RADIUS_KM
            && radius_km <= self.max_radius_factor * EARTH_RADIUS_KM
    }
}

/// An inertial position resolved into the Earth-fixed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarthFixedPosition {
    /// ECEF position in km
    pub ecef_km: Vector3<f64>,
    pub geodetic: GeodeticPoint,
}

/// Converts inertial vectors into Earth-fixed and geodetic coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameConverter {
    bounds: PlausibilityBounds,
}

impl FrameConverter {
    pub fn new(bounds: PlausibilityBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &PlausibilityBounds {
        &self.bounds
    }

    /// ECEF position (km) of an inertial position at `timestamp`
    pub fn to_earth_fixed(
        &self,
        position_km: &Vector3<f64>,
        timestamp: &DateTime<Utc>,
    ) -> Vector3<f64> {
        eci_to_ecef(position_km, gmst(timestamp))
    }

    /// Geodetic coordinates of an inertial position at `timestamp`
    pub fn to_geodetic(
        &self,
        position_km: &Vector3<f64>,
        timestamp: &DateTime<Utc>,
    ) -> GeodeticPoint {
        ecef_to_geodetic(&self.to_earth_fixed(position_km, timestamp))
    }

    /// Whether a position's distance from Earth's center is believable
    pub fn is_plausible(&self, position_km: &Vector3<f64>) -> bool {
        self.bounds.contains_radius(position_km.norm())
    }

    /// Resolve an inertial position with an explicit sidereal angle
    ///
    /// Returns `None` when the radius falls outside the plausibility bounds, so
    /// the caller drops the point instead of rendering it.
    pub fn locate_with_gmst(
        &self,
        position_km: &Vector3<f64>,
        gmst_rad: f64,
    ) -> Option<EarthFixedPosition> {
        let ecef_km = eci_to_ecef(position_km, gmst_rad);
        if !self.is_plausible(&ecef_km) {
            log::trace!("Dropping implausible position, radius {:.1} km", ecef_km.norm());
            return None;
        }

        Some(EarthFixedPosition {
            ecef_km,
            geodetic: ecef_to_geodetic(&ecef_km),
        })
    }

    /// Resolve an inertial position at `timestamp`, dropping implausible ones
    pub fn locate(
        &self,
        position_km: &Vector3<f64>,
        timestamp: &DateTime<Utc>,
    ) -> Option<EarthFixedPosition> {
        self.locate_with_gmst(position_km, gmst(timestamp))
    }
}

/// Greenwich Mean Sidereal Time in radians, [0, 2π)
///
/// IAU-82 expression in UT1; UTC is used as UT1 (|UT1 - UTC| < 0.9 s).
pub fn gmst(timestamp: &DateTime<Utc>) -> f64 {
    let tut1 = (julian_date(timestamp) - J2000_JD) / 36_525.0;

    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093104 * tut1 * tut1
        + (SECONDS_PER_JULIAN_CENTURY_DAY + 8_640_184.812866) * tut1
        + 67_310.54841;

    // 240 s of sidereal time per degree
    (seconds.to_radians() / 240.0).rem_euclid(std::f64::consts::TAU)
}

/// Rotate an inertial vector into the Earth-fixed frame
pub fn eci_to_ecef(position_km: &Vector3<f64>, gmst_rad: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -gmst_rad) * position_km
}

/// Rotate an Earth-fixed vector back into the inertial frame
pub fn ecef_to_eci(ecef_km: &Vector3<f64>, gmst_rad: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), gmst_rad) * ecef_km
}

/// Convert ECEF (km) to geodetic coordinates on WGS-84
pub fn ecef_to_geodetic(ecef_km: &Vector3<f64>) -> GeodeticPoint {
    let meters = [ecef_km.x * 1000.0, ecef_km.y * 1000.0, ecef_km.z * 1000.0];

    match satkit::itrfcoord::ITRFCoord::from_slice(&meters) {
        Ok(coord) => {
            let (lat, lon, hae_m) = coord.to_geodetic_deg();
            GeodeticPoint::new(lat, normalize_longitude(lon), hae_m / 1000.0)
        }
        Err(e) => {
            log::trace!("Spherical geodetic fallback: {}", e);
            spherical_geodetic(ecef_km)
        }
    }
}

/// Geocentric latitude and height above a spherical Earth
pub fn spherical_geodetic(ecef_km: &Vector3<f64>) -> GeodeticPoint {
    let r = ecef_km.norm();
    if r == 0.0 {
        return GeodeticPoint::new(0.0, 0.0, -EARTH_RADIUS_KM);
    }
    GeodeticPoint::new(
        (ecef_km.z / r).clamp(-1.0, 1.0).asin().to_degrees(),
        ecef_km.y.atan2(ecef_km.x).to_degrees(),
        r - EARTH_RADIUS_KM,
    )
}

/// Wrap a longitude into [-180, 180]
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    let mut lon = lon_deg;
    if lon > 180.0 || lon < -180.0 {
        lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
    }
    lon
}

/// Scene-space position in Earth radii for a Y-up renderer
///
/// Frame Z (polar) maps to render Y; frame Y maps to render -Z to keep the
/// basis right-handed.
pub fn to_scene(position_km: &Vector3<f64>) -> Vec3 {
    let scale = 1.0 / EARTH_RADIUS_KM;
    Vec3::new(
        (position_km.x * scale) as f32,
        (position_km.z * scale) as f32,
        (-position_km.y * scale) as f32,
    )
}
