use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::data::filter::{FilterPreset, FilterPresetStore};
use crate::data::model::WaveformCollection;
use crate::engine::AnnotationEngine;
use crate::error::Result;
use crate::picks::Onset;

// ---------------------------------------------------------------------------
// Preset editor fields
// ---------------------------------------------------------------------------

/// Values typed into the preset editor, not yet validated.
#[derive(Debug, Clone)]
pub struct PresetDraft {
    pub name: String,
    pub freqmin: f64,
    pub freqmax: f64,
    pub corners: u32,
    /// Preset being edited; `None` means the draft adds a new one.
    pub editing: Option<usize>,
}

impl Default for PresetDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            freqmin: 1.0,
            freqmax: 10.0,
            corners: 4,
            editing: None,
        }
    }
}

impl PresetDraft {
    /// Draft pre-filled from an existing preset.
    pub fn edit(index: usize, preset: &FilterPreset) -> Self {
        Self {
            name: preset.name.clone(),
            freqmin: preset.freqmin,
            freqmax: preset.freqmax,
            corners: preset.corners,
            editing: Some(index),
        }
    }

    pub fn to_preset(&self) -> Result<FilterPreset> {
        FilterPreset::new(self.name.trim(), self.freqmin, self.freqmax, self.corners)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Picking session (None until the user opens a waveform file).
    pub engine: Option<AnnotationEngine>,

    /// File the current session was loaded from.
    pub source: Option<PathBuf>,

    /// Preset the `f` key switches to.
    pub selected_preset: Option<usize>,

    /// Phase placed with the `e` key.
    pub custom_phase: String,

    /// Onset recorded on new picks.
    pub onset: Option<Onset>,

    pub preset_draft: PresetDraft,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Target of a requested plot screenshot, until the image arrives.
    pub pending_screenshot: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            engine: None,
            source: None,
            selected_preset: None,
            custom_phase: "Pg".to_string(),
            onset: None,
            preset_draft: PresetDraft::default(),
            status_message: None,
            pending_screenshot: None,
        }
    }

    /// Log a failed operation and show it in the status bar.
    pub fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
                None
            }
        }
    }

    /// Start a session on a newly loaded collection, ending the previous one.
    pub fn open_collection(&mut self, collection: WaveformCollection, source: &Path) {
        self.shutdown();
        let presets = FilterPresetStore::load(&self.config.filter_store);
        let started = AnnotationEngine::start(collection, presets, &self.config);
        if let Some(engine) = self.report(started) {
            self.selected_preset = (!engine.presets().is_empty()).then_some(0);
            self.engine = Some(engine);
            self.source = Some(source.to_path_buf());
            self.status_message = None;
        }
    }

    /// Switch between raw data and the selected preset.
    pub fn toggle_filter(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let target = match engine.active_filter() {
            Some(_) => None,
            None => match self.selected_preset {
                Some(index) => Some(index),
                None => {
                    self.status_message = Some("No filter preset selected".to_string());
                    return;
                }
            },
        };
        let result = engine.toggle_filter(target);
        self.report(result);
    }

    /// Place `phase` at sample `x` on `channel` with the current onset choice.
    pub fn place_pick(&mut self, x: f64, phase: &str, channel: &str) {
        let onset = self.onset;
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let result = match onset {
            Some(onset) => engine.place_pick_with_onset(x, phase, channel, Some(onset)),
            None => engine.place_pick(x, phase, channel),
        };
        if let Some(placement) = self.report(result) {
            log::info!("Placed {phase} on {channel} as pick #{}", placement.index());
            self.status_message = None;
        }
    }

    /// Add or update the preset described by the editor.
    pub fn commit_preset_draft(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let result = self.preset_draft.to_preset().and_then(|preset| {
            match self.preset_draft.editing {
                Some(index) => engine.update_preset(index, preset).map(|_| index),
                None => engine.add_preset(preset),
            }
        });
        if let Some(index) = self.report(result) {
            self.selected_preset = Some(index);
            self.preset_draft = PresetDraft::default();
        }
    }

    pub fn remove_preset(&mut self, index: usize) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let result = engine.remove_preset(index);
        if let Some(removed) = self.report(result) {
            log::info!("Removed filter preset {}", removed.name);
            self.selected_preset = match self.selected_preset {
                Some(s) if s == index => None,
                Some(s) if s > index => Some(s - 1),
                other => other,
            };
            if self.preset_draft.editing.is_some() {
                self.preset_draft = PresetDraft::default();
            }
        }
    }

    /// End the current session, if any.
    pub fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            let result = engine.shutdown();
            self.report(result);
            self.source = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::two_station_collection;

    fn state(dir: &Path) -> AppState {
        AppState::new(AppConfig {
            filter_store: dir.join("filters.json"),
            backup_catalog: dir.join("backup.xml"),
            ..AppConfig::default()
        })
    }

    #[test]
    fn test_draft_rejects_bad_preset() {
        let draft = PresetDraft {
            name: "x".into(),
            freqmin: 10.0,
            freqmax: 1.0,
            ..PresetDraft::default()
        };
        assert!(draft.to_preset().is_err());
    }

    #[test]
    fn test_open_and_reopen_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        state.open_collection(two_station_collection(), Path::new("a.json"));
        state.place_pick(10.0, "P", "Z");
        assert_eq!(state.engine.as_ref().unwrap().ledger().len(), 1);

        state.open_collection(two_station_collection(), Path::new("b.json"));
        assert!(dir.path().join("backup.xml").exists());
        assert!(state.engine.as_ref().unwrap().ledger().is_empty());
        assert_eq!(state.source.as_deref(), Some(Path::new("b.json")));
    }

    #[test]
    fn test_toggle_needs_selected_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        state.open_collection(two_station_collection(), Path::new("a.json"));
        state.toggle_filter();
        assert!(state.status_message.is_some());

        state.preset_draft.name = "local".into();
        state.commit_preset_draft();
        assert_eq!(state.selected_preset, Some(0));
        state.toggle_filter();
        assert_eq!(state.engine.as_ref().unwrap().active_filter(), Some(0));
        state.toggle_filter();
        assert_eq!(state.engine.as_ref().unwrap().active_filter(), None);
    }

    #[test]
    fn test_remove_selected_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        state.open_collection(two_station_collection(), Path::new("a.json"));
        for name in ["one", "two"] {
            state.preset_draft.name = name.into();
            state.commit_preset_draft();
        }
        assert_eq!(state.selected_preset, Some(1));
        state.remove_preset(0);
        assert_eq!(state.selected_preset, Some(0));
        state.remove_preset(0);
        assert_eq!(state.selected_preset, None);
    }
}
