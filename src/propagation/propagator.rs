//! SGP4 propagation using satkit

use std::fmt;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use satkit::sgp4::sgp4;
use serde::Serialize;

use crate::data::OrbitalElementSet;
use crate::time::to_instant;

/// Below this magnitude (km) a position is treated as "no position"
const DEGENERATE_RADIUS_KM: f64 = 1.0e-6;

/// Propagation result for a single satellite at a single instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagatedState {
    /// NORAD ID of the element set that produced this state
    pub catalog_id: u32,
    /// Instant the state is valid for
    pub timestamp: DateTime<Utc>,
    /// Position in the inertial (TEME) frame, km
    pub position_km: Vector3<f64>,
    /// Velocity in the inertial (TEME) frame, km/s
    pub velocity_km_s: Vector3<f64>,
    /// Magnitude of the velocity, km/s
    pub speed_km_s: f64,
}

impl PropagatedState {
    /// Distance from Earth's center in km
    pub fn radius_km(&self) -> f64 {
        self.position_km.norm()
    }
}

/// Per-timestamp propagation failures
#[derive(Debug, Clone, PartialEq)]
pub enum PropagationFailure {
    /// The propagator reports no valid position (decayed or bad elements)
    DecayedOrBadElements { catalog_id: u32 },

    /// The propagator returned non-finite components
    NumericalDivergence { catalog_id: u32 },

    /// The timestamp cannot be represented by the propagator's time scale
    InvalidTimestamp { timestamp: DateTime<Utc> },
}

impl fmt::Display for PropagationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecayedOrBadElements { catalog_id } => {
                write!(f, "No valid position for {} (decayed or bad elements)", catalog_id)
            }
            Self::NumericalDivergence { catalog_id } => {
                write!(f, "Propagation of {} diverged to non-finite values", catalog_id)
            }
            Self::InvalidTimestamp { timestamp } => {
                write!(f, "Timestamp {} cannot be propagated to", timestamp)
            }
        }
    }
}

impl std::error::Error for PropagationFailure {}

/// Advances an element set to an arbitrary instant
///
/// Implementations must be pure: the same inputs always give the same state,
/// so callers can fan out across threads without coordination.
pub trait StatePropagator: Send + Sync {
    fn propagate(
        &self,
        elements: &OrbitalElementSet,
        timestamp: &DateTime<Utc>,
    ) -> Result<PropagatedState, PropagationFailure>;

    /// Name of the underlying model
    fn name(&self) -> &'static str;
}

/// SGP4/SDP4 propagator backed by satkit
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self
    }
}

impl StatePropagator for Sgp4Propagator {
    fn propagate(
        &self,
        elements: &OrbitalElementSet,
        timestamp: &DateTime<Utc>,
    ) -> Result<PropagatedState, PropagationFailure> {
        let catalog_id = elements.catalog_id();
        let instant = to_instant(timestamp).ok_or(PropagationFailure::InvalidTimestamp {
            timestamp: *timestamp,
        })?;

        // sgp4 updates internal state on the record, so work on a copy
        let mut tle = elements.tle().clone();
        let result = match sgp4(&mut tle, &[instant]) {
            Ok(result) => result,
            Err(_) => {
                log::trace!("SGP4 reported no position for {} at {}", catalog_id, timestamp);
                return Err(PropagationFailure::DecayedOrBadElements { catalog_id });
            }
        };

        // pos and vel are in TEME frame, in meters and m/s
        let pos = result.pos.column(0);
        let vel = result.vel.column(0);
        let position_km = Vector3::new(pos[0], pos[1], pos[2]) / 1000.0;
        let velocity_km_s = Vector3::new(vel[0], vel[1], vel[2]) / 1000.0;

        state_from_vectors(catalog_id, *timestamp, position_km, velocity_km_s)
    }

    fn name(&self) -> &'static str {
        "SGP4"
    }
}

/// Validate raw propagator output and wrap it into a state
pub(crate) fn state_from_vectors(
    catalog_id: u32,
    timestamp: DateTime<Utc>,
    position_km: Vector3<f64>,
    velocity_km_s: Vector3<f64>,
) -> Result<PropagatedState, PropagationFailure> {
    let finite = position_km.iter().chain(velocity_km_s.iter()).all(|c| c.is_finite());
    if !finite {
        return Err(PropagationFailure::NumericalDivergence { catalog_id });
    }
    if position_km.norm() < DEGENERATE_RADIUS_KM {
        return Err(PropagationFailure::DecayedOrBadElements { catalog_id });
    }

    Ok(PropagatedState {
        catalog_id,
        timestamp,
        position_km,
        velocity_km_s,
        speed_km_s: velocity_km_s.norm(),
    })
}
