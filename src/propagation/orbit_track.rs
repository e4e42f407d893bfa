//! Orbit path sampling

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::frames::{gmst, FrameConverter, GeodeticPoint};
use super::segment::{segment_path, PathSegment};
use super::StatePropagator;
use crate::data::OrbitalElementSet;
use crate::time::offset_seconds;

/// How sidereal time is applied across the samples of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleMode {
    /// Sidereal time at each sample's own instant: the path trails the Earth's
    /// rotation and traces where the satellite passes over the ground.
    GroundTrack,
    /// One sidereal time taken at the start instant: Earth's rotation is
    /// removed and one period closes into a ring in space.
    #[default]
    Inertial,
}

impl SampleMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GroundTrack => "ground-track",
            Self::Inertial => "inertial",
        }
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Number of steps per path (a path has at most `step_count + 1` points)
    pub step_count: usize,
    /// Duration used when the element set gives no usable period
    pub fallback_duration_minutes: f64,
    /// Mode used when the caller does not pick one
    pub default_mode: SampleMode,
    /// Shortest period accepted from the mean motion
    pub min_period_seconds: f64,
    /// Longest period accepted from the mean motion
    pub max_period_seconds: f64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            step_count: 512,
            fallback_duration_minutes: 100.0,
            default_mode: SampleMode::Inertial,
            min_period_seconds: 300.0,
            max_period_seconds: 86_400.0,
        }
    }
}

/// One accepted sample of an orbit path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathSample {
    pub timestamp: DateTime<Utc>,
    pub point: GeodeticPoint,
    /// Earth-fixed position in km (under the path's sidereal convention)
    pub ecef_km: Vector3<f64>,
}

impl PathSample {
    /// Build a sample from geodetic coordinates alone
    pub fn from_geodetic(timestamp: DateTime<Utc>, point: GeodeticPoint) -> Self {
        Self {
            timestamp,
            point,
            ecef_km: point.to_spherical_cartesian(),
        }
    }
}

/// Ordered geodetic samples of one satellite's orbit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitPath {
    pub catalog_id: u32,
    pub mode: SampleMode,
    samples: Vec<PathSample>,
}

impl OrbitPath {
    /// Build a path from samples in time order
    ///
    /// Out-of-order samples are dropped so the sequence stays monotonic.
    pub fn new(catalog_id: u32, mode: SampleMode, samples: Vec<PathSample>) -> Self {
        let mut ordered: Vec<PathSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match ordered.last() {
                Some(last) if sample.timestamp <= last.timestamp => {
                    log::trace!("Dropping out-of-order sample at {}", sample.timestamp);
                }
                _ => ordered.push(sample),
            }
        }

        Self {
            catalog_id,
            mode,
            samples: ordered,
        }
    }

    /// Path with nothing to draw
    pub fn empty(catalog_id: u32, mode: SampleMode) -> Self {
        Self {
            catalog_id,
            mode,
            samples: Vec::new(),
        }
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    pub fn points(&self) -> impl Iterator<Item = &GeodeticPoint> + '_ {
        self.samples.iter().map(|s| &s.point)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// A path needs at least two points to be drawn as a line
    pub fn is_renderable(&self) -> bool {
        self.samples.len() >= 2
    }

    /// Split into drawable segments
    pub fn segments(&self, max_jump_km: f64) -> Vec<PathSegment> {
        segment_path(self, max_jump_km)
    }
}

/// Orbital period in seconds derived from the mean motion
///
/// `None` when the mean motion is unusable or the period falls outside the
/// configured window.
pub fn orbital_period_seconds(
    elements: &OrbitalElementSet,
    settings: &SamplerSettings,
) -> Option<f64> {
    let n = elements.mean_motion_rad_per_min();
    if !n.is_finite() || n <= 0.0 {
        return None;
    }

    let period = std::f64::consts::TAU / n * 60.0;
    if period < settings.min_period_seconds || period > settings.max_period_seconds {
        return None;
    }
    Some(period)
}

/// Samples orbit paths from element sets
pub struct OrbitPathSampler<'a> {
    propagator: &'a dyn StatePropagator,
    frames: FrameConverter,
    settings: SamplerSettings,
}

impl<'a> OrbitPathSampler<'a> {
    pub fn new(
        propagator: &'a dyn StatePropagator,
        frames: FrameConverter,
        settings: SamplerSettings,
    ) -> Self {
        Self {
            propagator,
            frames,
            settings,
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Duration of one orbit, or the fallback duration
    pub fn period_seconds(&self, elements: &OrbitalElementSet) -> f64 {
        orbital_period_seconds(elements, &self.settings).unwrap_or_else(|| {
            log::debug!(
                "No usable period for {}, using {} min",
                elements.catalog_id(),
                self.settings.fallback_duration_minutes
            );
            self.settings.fallback_duration_minutes * 60.0
        })
    }

    /// Sample one orbital period starting at `start`
    pub fn sample(
        &self,
        elements: &OrbitalElementSet,
        start: &DateTime<Utc>,
        mode: SampleMode,
        step_count: usize,
    ) -> OrbitPath {
        let duration = self.period_seconds(elements);
        self.sample_duration(elements, start, mode, duration, step_count)
    }

    /// Sample one orbital period with the configured mode and step count
    pub fn sample_default(&self, elements: &OrbitalElementSet, start: &DateTime<Utc>) -> OrbitPath {
        self.sample(
            elements,
            start,
            self.settings.default_mode,
            self.settings.step_count,
        )
    }

    /// Sample a fixed duration starting at `start`
    ///
    /// Samples that fail to propagate or land outside the plausibility bounds
    /// are skipped. Fewer than two surviving samples yield an empty path.
    pub fn sample_duration(
        &self,
        elements: &OrbitalElementSet,
        start: &DateTime<Utc>,
        mode: SampleMode,
        duration_seconds: f64,
        step_count: usize,
    ) -> OrbitPath {
        if step_count == 0 || !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return OrbitPath::empty(elements.catalog_id(), mode);
        }

        let step = duration_seconds / step_count as f64;
        let offsets: Vec<f64> = (0..=step_count).map(|i| step * i as f64).collect();
        self.sample_offsets(elements, start, mode, &offsets)
    }

    /// Sample every `step_seconds` from `start`, ending exactly at `duration_seconds`
    ///
    /// The last interval is shorter when the step does not divide the duration.
    pub fn sample_every(
        &self,
        elements: &OrbitalElementSet,
        start: &DateTime<Utc>,
        mode: SampleMode,
        duration_seconds: f64,
        step_seconds: f64,
    ) -> OrbitPath {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(duration_seconds) || !valid(step_seconds) {
            return OrbitPath::empty(elements.catalog_id(), mode);
        }

        let mut offsets: Vec<f64> = (0..)
            .map(|i| step_seconds * i as f64)
            .take_while(|t| *t < duration_seconds)
            .collect();
        offsets.push(duration_seconds);
        self.sample_offsets(elements, start, mode, &offsets)
    }

    /// Sample at the given offsets (seconds from `start`, increasing)
    fn sample_offsets(
        &self,
        elements: &OrbitalElementSet,
        start: &DateTime<Utc>,
        mode: SampleMode,
        offsets: &[f64],
    ) -> OrbitPath {
        let catalog_id = elements.catalog_id();
        let fixed_gmst = gmst(start);
        let mut samples = Vec::with_capacity(offsets.len());
        let mut failures = 0usize;

        for (i, offset) in offsets.iter().enumerate() {
            let t = offset_seconds(start, *offset);

            let state = match self.propagator.propagate(elements, &t) {
                Ok(state) => state,
                Err(e) => {
                    log::trace!("Skipping sample {} of {}: {}", i, catalog_id, e);
                    failures += 1;
                    continue;
                }
            };

            let sidereal = match mode {
                SampleMode::GroundTrack => gmst(&t),
                SampleMode::Inertial => fixed_gmst,
            };

            match self.frames.locate_with_gmst(&state.position_km, sidereal) {
                Some(fixed) => samples.push(PathSample {
                    timestamp: t,
                    point: fixed.geodetic,
                    ecef_km: fixed.ecef_km,
                }),
                None => failures += 1,
            }
        }

        if samples.len() < 2 {
            log::debug!(
                "Insufficient samples for {} ({} valid, {} skipped)",
                catalog_id,
                samples.len(),
                failures
            );
            return OrbitPath::empty(catalog_id, mode);
        }

        if failures > 0 {
            log::debug!("Orbit path for {} skipped {} samples", catalog_id, failures);
        }

        OrbitPath::new(catalog_id, mode, samples)
    }
}
