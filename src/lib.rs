//! Satwatch - orbital mechanics and conjunction risk kernel
//!
//! Propagates two-line element sets with SGP4, converts states into Earth-fixed
//! and geodetic coordinates, samples renderable orbit paths, approximates the
//! Sun's direction for terminator shading, and ranks conjunction screening
//! results by risk.

pub mod conjunction;
pub mod data;
pub mod propagation;
pub mod settings;
pub mod solar;
pub mod time;
pub mod tracker;

pub use settings::KernelSettings;
pub use tracker::{SatellitePosition, SatelliteTracker, TrackerError};
