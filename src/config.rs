//! View parameters, loadable from a JSON sidecar file.

use crate::error::{ConfigError, Result};
use crate::lens::Lens;
use crate::sampling::{RowSelection, SamplerKind, MAX_SINE_SEED};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Edge length of the square color field, in pixels.
    pub size: u32,
    /// Grid cells per axis used by the reducer.
    pub bins: usize,
    /// Anchor rotation in degrees.
    pub rotation_degrees: f64,
    /// Rows fed into projection and reduction.
    pub sample_size: usize,
    pub row_selection: RowSelection,
    /// Paint the disk in a single color instead of the hue wheel.
    pub flat_mode: bool,
    pub lightness: f64,
    pub seed: u64,
    pub sampler: SamplerKind,
    pub lens: Option<Lens>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            size: 400,
            bins: 6,
            rotation_degrees: 0.0,
            sample_size: 1000,
            row_selection: RowSelection::Head,
            flat_mode: false,
            lightness: crate::color::DEFAULT_LIGHTNESS,
            seed: 1,
            sampler: SamplerKind::Sine,
            lens: None,
        }
    }
}

impl ViewConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: ViewConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if !(0.0..=1.0).contains(&self.lightness) {
            return Err(ConfigError::InvalidLightness(self.lightness));
        }
        if self.sampler == SamplerKind::Sine && self.seed >= MAX_SINE_SEED {
            return Err(ConfigError::SeedOutOfRange {
                seed: self.seed,
                max: MAX_SINE_SEED,
            });
        }
        if let Some(lens) = &self.lens {
            lens.validate()?;
        }
        Ok(())
    }

    pub fn rotation_radians(&self) -> f64 {
        self.rotation_degrees.to_radians()
    }
}
