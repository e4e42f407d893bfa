//! Position queries and path sampling over an owned catalog

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use glam::Vec3;
use serde::Serialize;

use crate::data::{OrbitalElementSet, SatelliteCatalog};
use crate::propagation::{
    to_scene, FrameConverter, OrbitPath, OrbitPathSampler, PathSegment, PropagatedState,
    PropagationFailure, SampleMode, Sgp4Propagator, StatePropagator,
};
use crate::settings::KernelSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    UnknownSatellite { catalog_id: u32 },
    Propagation(PropagationFailure),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::UnknownSatellite { catalog_id } => {
                write!(f, "Satellite {} is not in the catalog", catalog_id)
            }
            TrackerError::Propagation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Propagation(e) => Some(e),
            TrackerError::UnknownSatellite { .. } => None,
        }
    }
}

impl From<PropagationFailure> for TrackerError {
    fn from(e: PropagationFailure) -> Self {
        TrackerError::Propagation(e)
    }
}

/// Where a satellite is over the Earth at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatellitePosition {
    pub catalog_id: u32,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub speed_km_s: f64,
    /// Days since the element set epoch
    pub element_age_days: f64,
    /// Earth-fixed position in Earth radii, Y-up
    pub scene_position: Vec3,
}

/// Propagates catalog satellites and samples their paths
pub struct SatelliteTracker {
    catalog: SatelliteCatalog,
    propagator: Box<dyn StatePropagator>,
    frames: FrameConverter,
    settings: KernelSettings,
}

impl SatelliteTracker {
    /// Tracker backed by SGP4
    pub fn new(catalog: SatelliteCatalog, settings: KernelSettings) -> Self {
        Self::with_propagator(catalog, Box::new(Sgp4Propagator::new()), settings)
    }

    pub fn with_propagator(
        catalog: SatelliteCatalog,
        propagator: Box<dyn StatePropagator>,
        settings: KernelSettings,
    ) -> Self {
        log::debug!(
            "Tracking {} satellites with {}",
            catalog.len(),
            propagator.name()
        );
        Self {
            catalog,
            propagator,
            frames: FrameConverter::new(settings.plausibility),
            settings,
        }
    }

    pub fn catalog(&self) -> &SatelliteCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut SatelliteCatalog {
        &mut self.catalog
    }

    pub fn settings(&self) -> &KernelSettings {
        &self.settings
    }

    fn elements(&self, catalog_id: u32) -> Result<&OrbitalElementSet, TrackerError> {
        self.catalog
            .get(catalog_id)
            .ok_or(TrackerError::UnknownSatellite { catalog_id })
    }

    fn sampler(&self) -> OrbitPathSampler<'_> {
        OrbitPathSampler::new(self.propagator.as_ref(), self.frames, self.settings.sampling)
    }

    /// Inertial state of one satellite
    pub fn propagate(
        &self,
        catalog_id: u32,
        timestamp: &DateTime<Utc>,
    ) -> Result<PropagatedState, TrackerError> {
        let elements = self.elements(catalog_id)?;
        Ok(self.propagator.propagate(elements, timestamp)?)
    }

    /// Geodetic position of one satellite
    ///
    /// A state outside the plausibility bounds is reported as bad elements.
    pub fn position(
        &self,
        catalog_id: u32,
        timestamp: &DateTime<Utc>,
    ) -> Result<SatellitePosition, TrackerError> {
        let elements = self.elements(catalog_id)?;
        let state = self.propagator.propagate(elements, timestamp)?;

        let fixed = self
            .frames
            .locate(&state.position_km, timestamp)
            .ok_or(PropagationFailure::DecayedOrBadElements { catalog_id })?;

        Ok(SatellitePosition {
            catalog_id,
            name: elements.display_name(),
            timestamp: *timestamp,
            latitude_deg: fixed.geodetic.latitude_deg,
            longitude_deg: fixed.geodetic.longitude_deg,
            altitude_km: fixed.geodetic.altitude_km,
            speed_km_s: state.speed_km_s,
            element_age_days: elements.age_days(timestamp),
            scene_position: to_scene(&fixed.ecef_km),
        })
    }

    /// Positions of every satellite that propagates, in catalog id order
    pub fn positions(&self, timestamp: &DateTime<Utc>) -> Vec<SatellitePosition> {
        let ids = self.catalog.ids();
        let positions: Vec<SatellitePosition> = ids
            .iter()
            .filter_map(|id| match self.position(*id, timestamp) {
                Ok(position) => Some(position),
                Err(e) => {
                    log::trace!("No position for {}: {}", id, e);
                    None
                }
            })
            .collect();

        if positions.len() < ids.len() {
            log::debug!(
                "Propagated {}/{} satellites at {}",
                positions.len(),
                ids.len(),
                timestamp
            );
        }
        positions
    }

    /// One orbital period in the given mode with the configured step count
    pub fn orbit_path(
        &self,
        catalog_id: u32,
        start: &DateTime<Utc>,
        mode: SampleMode,
    ) -> Result<OrbitPath, TrackerError> {
        let elements = self.elements(catalog_id)?;
        let step_count = self.settings.sampling.step_count;
        Ok(self.sampler().sample(elements, start, mode, step_count))
    }

    /// One orbital period with the configured mode and step count
    pub fn orbit_path_default(
        &self,
        catalog_id: u32,
        start: &DateTime<Utc>,
    ) -> Result<OrbitPath, TrackerError> {
        let elements = self.elements(catalog_id)?;
        Ok(self.sampler().sample_default(elements, start))
    }

    /// Ground track over a fixed duration, one sample per `step`
    ///
    /// The final sample lands on `start + duration` even when `step` does not
    /// divide it.
    pub fn ground_track(
        &self,
        catalog_id: u32,
        start: &DateTime<Utc>,
        duration: Duration,
        step: Duration,
    ) -> Result<OrbitPath, TrackerError> {
        let elements = self.elements(catalog_id)?;

        let duration_seconds = duration.num_milliseconds() as f64 / 1000.0;
        let step_seconds = step.num_milliseconds() as f64 / 1000.0;
        Ok(self.sampler().sample_every(
            elements,
            start,
            SampleMode::GroundTrack,
            duration_seconds,
            step_seconds,
        ))
    }

    /// One orbital period split at discontinuities
    pub fn segments(
        &self,
        catalog_id: u32,
        start: &DateTime<Utc>,
        mode: SampleMode,
    ) -> Result<Vec<PathSegment>, TrackerError> {
        let path = self.orbit_path(catalog_id, start, mode)?;
        Ok(path.segments(self.settings.segmentation.max_jump_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::element_set::tests::{geo, iss};
    use crate::propagation::{state_from_vectors, EARTH_RADIUS_KM};
    use nalgebra::Vector3;

    fn tracker() -> SatelliteTracker {
        let mut catalog = SatelliteCatalog::new();
        catalog.insert(iss());
        SatelliteTracker::new(catalog, KernelSettings::default())
    }

    /// Always reports a position far outside the plausibility window
    struct RunawayPropagator;

    impl StatePropagator for RunawayPropagator {
        fn propagate(
            &self,
            elements: &OrbitalElementSet,
            timestamp: &DateTime<Utc>,
        ) -> Result<PropagatedState, PropagationFailure> {
            state_from_vectors(
                elements.catalog_id(),
                *timestamp,
                Vector3::new(20.0 * EARTH_RADIUS_KM, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            )
        }

        fn name(&self) -> &'static str {
            "runaway"
        }
    }

    #[test]
    fn test_position_at_epoch() {
        let tracker = tracker();
        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        let position = tracker.position(25544, &epoch).unwrap();

        assert_eq!(position.name, "ISS (ZARYA)");
        assert!(position.latitude_deg.abs() <= 51.7);
        assert!(position.longitude_deg.abs() <= 180.0);
        assert!(position.altitude_km > 300.0 && position.altitude_km < 450.0);
        assert!(position.speed_km_s > 7.0 && position.speed_km_s < 8.0);
        assert!(position.element_age_days.abs() < 1e-6);

        let radius = position.scene_position.length();
        assert!(radius > 1.0 && radius < 1.1);
    }

    #[test]
    fn test_unknown_satellite() {
        let tracker = tracker();
        let now = Utc::now();
        assert_eq!(
            tracker.position(1, &now).unwrap_err(),
            TrackerError::UnknownSatellite { catalog_id: 1 }
        );
        assert!(tracker.orbit_path_default(1, &now).is_err());
    }

    #[test]
    fn test_implausible_position_is_bad_elements() {
        let mut catalog = SatelliteCatalog::new();
        catalog.insert(iss());
        let tracker = SatelliteTracker::with_propagator(
            catalog,
            Box::new(RunawayPropagator),
            KernelSettings::default(),
        );

        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        assert_eq!(
            tracker.position(25544, &epoch).unwrap_err(),
            TrackerError::Propagation(PropagationFailure::DecayedOrBadElements {
                catalog_id: 25544,
            })
        );
        assert!(tracker.positions(&epoch).is_empty());
        assert!(tracker.orbit_path_default(25544, &epoch).unwrap().is_empty());
    }

    #[test]
    fn test_positions_skip_failures() {
        let tracker = tracker();
        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        let positions = tracker.positions(&epoch);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].catalog_id, 25544);
    }

    #[test]
    fn test_default_orbit_path() {
        let tracker = tracker();
        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        let path = tracker.orbit_path_default(25544, &epoch).unwrap();

        assert_eq!(path.mode, SampleMode::Inertial);
        assert_eq!(path.len(), 513);
    }

    #[test]
    fn test_ground_track_fixed_duration() {
        let tracker = tracker();
        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        let path = tracker
            .ground_track(25544, &epoch, Duration::minutes(30), Duration::seconds(60))
            .unwrap();

        assert_eq!(path.mode, SampleMode::GroundTrack);
        assert_eq!(path.len(), 31);
        let last = path.samples().last().unwrap();
        assert_eq!(last.timestamp, epoch + Duration::minutes(30));

        let empty = tracker
            .ground_track(25544, &epoch, Duration::minutes(30), Duration::zero())
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_ground_track_uneven_step() {
        let tracker = tracker();
        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        let path = tracker
            .ground_track(25544, &epoch, Duration::minutes(30), Duration::seconds(7))
            .unwrap();

        let samples = path.samples();
        assert_eq!(samples.len(), 259);
        assert_eq!(samples[0].timestamp, epoch);
        assert_eq!(samples[1].timestamp - samples[0].timestamp, Duration::seconds(7));
        assert_eq!(samples[257].timestamp, epoch + Duration::seconds(1799));
        assert_eq!(samples[258].timestamp, epoch + Duration::minutes(30));
    }

    #[test]
    fn test_geostationary_position() {
        let mut catalog = SatelliteCatalog::new();
        catalog.insert(geo());
        let tracker = SatelliteTracker::new(catalog, KernelSettings::default());

        let epoch = tracker.catalog().get(37481).unwrap().epoch();
        let position = tracker.position(37481, &epoch).unwrap();
        assert!((position.altitude_km - 35_786.0).abs() < 150.0);
        assert!(position.latitude_deg.abs() < 3.0);
        assert!(tracker.orbit_path_default(37481, &epoch).unwrap().is_renderable());
    }

    #[test]
    fn test_segments_cover_path() {
        let tracker = tracker();
        let epoch = tracker.catalog().get(25544).unwrap().epoch();
        let segments = tracker.segments(25544, &epoch, SampleMode::GroundTrack).unwrap();

        assert!(!segments.is_empty());
        assert!(segments.iter().all(|s| s.len() >= 2));
    }
}
