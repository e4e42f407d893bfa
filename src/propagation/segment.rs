//! Splitting sampled paths at discontinuities

use serde::{Deserialize, Serialize};

use super::orbit_track::{OrbitPath, PathSample};

/// Largest believable distance between neighbouring samples (km)
pub const DEFAULT_MAX_JUMP_KM: f64 = 800.0;

/// Segmentation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentSettings {
    pub max_jump_km: f64,
}

impl Default for SegmentSettings {
    fn default() -> Self {
        Self {
            max_jump_km: DEFAULT_MAX_JUMP_KM,
        }
    }
}

/// A run of path samples that can be drawn as one polyline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSegment {
    pub samples: Vec<PathSample>,
}

impl PathSegment {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Whether two neighbouring samples cannot be joined by a line
///
/// A longitude step above 180° is an antimeridian wrap even when the points
/// are close in space; a long Cartesian step is a jump even when it does not
/// cross the antimeridian.
pub fn is_discontinuity(prev: &PathSample, curr: &PathSample, max_jump_km: f64) -> bool {
    let lon_step = (curr.point.longitude_deg - prev.point.longitude_deg).abs();
    if lon_step > 180.0 {
        return true;
    }

    (curr.ecef_km - prev.ecef_km).norm() > max_jump_km
}

/// Split a path into drawable segments
///
/// Segments keep the path's order and together cover every sample except
/// those left alone between two discontinuities, which are dropped.
pub fn segment_path(path: &OrbitPath, max_jump_km: f64) -> Vec<PathSegment> {
    let samples = path.samples();
    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = vec![*first];

    for pair in samples.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if is_discontinuity(prev, curr, max_jump_km) {
            segments.push(std::mem::take(&mut current));
        }
        current.push(*curr);
    }
    segments.push(current);

    let total = segments.len();
    let segments: Vec<PathSegment> = segments
        .into_iter()
        .filter(|s| s.len() > 1)
        .map(|samples| PathSegment { samples })
        .collect();

    if segments.len() != total {
        log::trace!(
            "Dropped {} single-point segments from path of {}",
            total - segments.len(),
            path.catalog_id
        );
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{GeodeticPoint, SampleMode};
    use chrono::{Duration, TimeZone, Utc};

    fn path_from(points: &[(f64, f64, f64)]) -> OrbitPath {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon, alt))| {
                PathSample::from_geodetic(
                    t0 + Duration::seconds(10 * i as i64),
                    GeodeticPoint::new(lat, lon, alt),
                )
            })
            .collect();
        OrbitPath::new(1, SampleMode::GroundTrack, samples)
    }

    fn lons(segment: &PathSegment) -> Vec<f64> {
        segment.samples.iter().map(|s| s.point.longitude_deg).collect()
    }

    #[test]
    fn test_antimeridian_wrap_splits() {
        let path = path_from(&[
            (0.0, 177.0, 400.0),
            (0.0, 178.0, 400.0),
            (0.0, 179.0, 400.0),
            (0.0, -179.0, 400.0),
            (0.0, -178.0, 400.0),
        ]);

        let segments = segment_path(&path, DEFAULT_MAX_JUMP_KM);
        assert_eq!(segments.len(), 2);
        assert_eq!(lons(&segments[0]), vec![177.0, 178.0, 179.0]);
        assert_eq!(lons(&segments[1]), vec![-179.0, -178.0]);
    }

    #[test]
    fn test_close_points_stay_together() {
        let points: Vec<(f64, f64, f64)> = (0..20)
            .map(|i| (10.0 + 0.01 * i as f64, 20.0 + 0.05 * i as f64, 400.0))
            .collect();
        let path = path_from(&points);

        let segments = segment_path(&path, DEFAULT_MAX_JUMP_KM);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 20);
    }

    #[test]
    fn test_large_jump_without_wrap_splits() {
        let path = path_from(&[
            (0.0, 10.0, 400.0),
            (0.0, 11.0, 400.0),
            (0.0, 30.0, 400.0),
            (0.0, 31.0, 400.0),
        ]);

        let segments = segment_path(&path, DEFAULT_MAX_JUMP_KM);
        assert_eq!(segments.len(), 2);
        assert_eq!(lons(&segments[1]), vec![30.0, 31.0]);
    }

    #[test]
    fn test_single_point_segments_dropped() {
        let path = path_from(&[
            (0.0, 10.0, 400.0),
            (0.0, 11.0, 400.0),
            (0.0, 60.0, 400.0),
            (0.0, 120.0, 400.0),
            (0.0, 121.0, 400.0),
        ]);

        let segments = segment_path(&path, DEFAULT_MAX_JUMP_KM);
        assert_eq!(segments.len(), 2);
        assert_eq!(lons(&segments[0]), vec![10.0, 11.0]);
        assert_eq!(lons(&segments[1]), vec![120.0, 121.0]);
    }

    #[test]
    fn test_segments_preserve_order() {
        let points: Vec<(f64, f64, f64)> = (0..10)
            .map(|i| (0.0, 175.0 + i as f64 - if i > 5 { 360.0 } else { 0.0 }, 400.0))
            .collect();
        let path = path_from(&points);

        let flattened: Vec<f64> = segment_path(&path, DEFAULT_MAX_JUMP_KM)
            .iter()
            .flat_map(lons)
            .collect();
        let original: Vec<f64> = path.points().map(|p| p.longitude_deg).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_empty_and_single_point_paths() {
        assert!(segment_path(&path_from(&[]), DEFAULT_MAX_JUMP_KM).is_empty());
        assert!(segment_path(&path_from(&[(0.0, 0.0, 400.0)]), DEFAULT_MAX_JUMP_KM).is_empty());
    }

    #[test]
    fn test_sampled_ground_track_segments() {
        use crate::data::element_set::tests::iss;
        use crate::propagation::{FrameConverter, OrbitPathSampler, SamplerSettings, Sgp4Propagator};

        let set = iss();
        let propagator = Sgp4Propagator::new();
        let sampler = OrbitPathSampler::new(
            &propagator,
            FrameConverter::default(),
            SamplerSettings::default(),
        );
        let path = sampler.sample(&set, &set.epoch(), SampleMode::GroundTrack, 256);
        let segments = path.segments(DEFAULT_MAX_JUMP_KM);

        assert!(!segments.is_empty());
        let covered: usize = segments.iter().map(PathSegment::len).sum();
        assert!(covered <= path.len());
        for segment in &segments {
            assert!(segment.len() >= 2);
            for pair in segment.samples.windows(2) {
                assert!(!is_discontinuity(&pair[0], &pair[1], DEFAULT_MAX_JUMP_KM));
            }
        }
    }
}
