//! Kernel configuration
//!
//! Every value has a default, so a settings file only needs the fields it
//! changes:
//!
//! ```json
//! { "sampling": { "step_count": 256, "default_mode": "ground-track" },
//!   "risk": { "medium_range_km": 10.0 } }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::conjunction::{ConjunctionSettings, RiskThresholds};
use crate::propagation::{PlausibilityBounds, SamplerSettings, SegmentSettings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSettings {
    pub sampling: SamplerSettings,
    pub segmentation: SegmentSettings,
    pub plausibility: PlausibilityBounds,
    pub risk: RiskThresholds,
    pub conjunctions: ConjunctionSettings,
}

/// Load settings from a JSON file
pub fn load_settings(path: impl AsRef<Path>) -> Result<KernelSettings> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open settings file: {:?}", path))?;

    let settings: KernelSettings = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse settings: {:?}", path))?;

    log::debug!("Loaded settings from {:?}: {:?}", path, settings);
    Ok(settings)
}

/// Load settings when a path is given, defaults otherwise
pub fn load_settings_or_default(path: Option<&Path>) -> Result<KernelSettings> {
    match path {
        Some(path) => load_settings(path),
        None => Ok(KernelSettings::default()),
    }
}
