use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PickError, Result};

/// Filter orders the preset editor offers.
pub const ALLOWED_CORNERS: [u32; 3] = [2, 4, 8];

// ---------------------------------------------------------------------------
// FilterPreset – one named bandpass configuration
// ---------------------------------------------------------------------------

/// A named zero-phase bandpass configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub name: String,
    /// Lower corner frequency in Hz.
    pub freqmin: f64,
    /// Upper corner frequency in Hz.
    pub freqmax: f64,
    /// Filter order per corner.
    pub corners: u32,
}

impl FilterPreset {
    /// Build a preset, rejecting invalid parameters.
    pub fn new(name: impl Into<String>, freqmin: f64, freqmax: f64, corners: u32) -> Result<Self> {
        let preset = FilterPreset {
            name: name.into(),
            freqmin,
            freqmax,
            corners,
        };
        preset.validate()?;
        Ok(preset)
    }

    /// Check `0 < freqmin < freqmax` and `corners ∈ {2, 4, 8}`.
    pub fn validate(&self) -> Result<()> {
        if !self.freqmin.is_finite() || self.freqmin <= 0.0 {
            return Err(PickError::invalid_input(format!(
                "freqmin must be a positive frequency, got {}",
                self.freqmin
            )));
        }
        if !self.freqmax.is_finite() || self.freqmax <= self.freqmin {
            return Err(PickError::invalid_input(format!(
                "freqmax ({}) must be greater than freqmin ({})",
                self.freqmax, self.freqmin
            )));
        }
        if !ALLOWED_CORNERS.contains(&self.corners) {
            return Err(PickError::invalid_input(format!(
                "corners must be one of {ALLOWED_CORNERS:?}, got {}",
                self.corners
            )));
        }
        Ok(())
    }

    /// Text attached to picks placed while this preset is active.
    pub fn description(&self) -> String {
        format!(
            "Bandpass {} (freqmin={}, freqmax={}, corners={}, zerophase=true)",
            self.name, self.freqmin, self.freqmax, self.corners
        )
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:.2} - {:.2} Hz]", self.name, self.freqmin, self.freqmax)
    }
}

// ---------------------------------------------------------------------------
// FilterPresetStore – ordered presets backed by a local JSON file
// ---------------------------------------------------------------------------

/// Ordered preset list, persisted independently of the picks.
#[derive(Debug, Clone)]
pub struct FilterPresetStore {
    path: PathBuf,
    presets: Vec<FilterPreset>,
}

impl FilterPresetStore {
    /// An empty store that will save to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            presets: Vec::new(),
        }
    }

    /// Load the store at `path`.
    ///
    /// A missing or unreadable store is not an error for the session: it is
    /// logged and an empty list is used instead.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match read_presets(&path) {
            Ok(presets) => {
                log::info!("Loaded {} filter presets from {:?}", presets.len(), path);
                Self { path, presets }
            }
            Err(e) => {
                log::warn!("{e}; starting with no filter presets");
                Self::empty(path)
            }
        }
    }

    /// Write the presets to the store file.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.presets)
            .map_err(|e| PickError::persistence(&self.path, e.into()))?;
        std::fs::write(&self.path, json).map_err(|e| PickError::persistence(&self.path, e))?;
        log::info!("Saved {} filter presets to {:?}", self.presets.len(), self.path);
        Ok(())
    }

    pub fn presets(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn get(&self, index: usize) -> Option<&FilterPreset> {
        self.presets.get(index)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Append a preset, returning its index.
    pub fn add(&mut self, preset: FilterPreset) -> Result<usize> {
        preset.validate()?;
        self.presets.push(preset);
        Ok(self.presets.len() - 1)
    }

    /// Replace the preset at `index`.
    pub fn update(&mut self, index: usize, preset: FilterPreset) -> Result<()> {
        preset.validate()?;
        let slot = self
            .presets
            .get_mut(index)
            .ok_or_else(|| PickError::invalid_input(format!("no filter preset at index {index}")))?;
        *slot = preset;
        Ok(())
    }

    /// Remove and return the preset at `index`.
    pub fn remove(&mut self, index: usize) -> Result<FilterPreset> {
        if index >= self.presets.len() {
            return Err(PickError::invalid_input(format!(
                "no filter preset at index {index}"
            )));
        }
        Ok(self.presets.remove(index))
    }
}

fn read_presets(path: &Path) -> Result<Vec<FilterPreset>> {
    let unavailable = |reason: String| PickError::StoreUnavailable {
        path: path.to_path_buf(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
    let presets: Vec<FilterPreset> =
        serde_json::from_str(&text).map_err(|e| unavailable(e.to_string()))?;

    Ok(presets
        .into_iter()
        .filter(|p| match p.validate() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping stored filter preset '{}': {e}", p.name);
                false
            }
        })
        .collect())
}
