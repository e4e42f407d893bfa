//! Orbital propagation module
//!
//! SGP4 via satkit advances a TLE to any instant; the rest of the module turns
//! those inertial states into Earth-fixed positions and renderable paths.
//!
//! - `propagator`: the [`StatePropagator`] seam and its SGP4 implementation
//! - `frames`: sidereal time, ECI -> ECEF -> geodetic, plausibility filter
//! - `orbit_track`: one-period sampling in ground-track or inertial mode
//! - `segment`: splitting sampled paths where they cannot be drawn as one line
//!
//! # Example
//!
//! ```ignore
//! use satwatch::propagation::*;
//!
//! let propagator = Sgp4Propagator::new();
//! let frames = FrameConverter::default();
//! let sampler = OrbitPathSampler::new(&propagator, frames, SamplerSettings::default());
//!
//! let path = sampler.sample(&elements, &start, SampleMode::Inertial, 512);
//! let segments = path.segments(DEFAULT_MAX_JUMP_KM);
//! ```

mod frames;
mod orbit_track;
mod propagator;
mod segment;

pub use frames::*;
pub use orbit_track::*;
pub use propagator::*;
pub use segment::*;

/// Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;
