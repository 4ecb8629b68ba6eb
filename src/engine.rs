use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::data::filter::{FilterPreset, FilterPresetStore};
use crate::data::model::WaveformCollection;
use crate::error::{PickError, Result};
use crate::picks::catalog;
use crate::picks::ledger::{PickLedger, Placement};
use crate::picks::{Onset, PhaseClass, Pick};
use crate::view::{StationCursor, StationView};

// ---------------------------------------------------------------------------
// Presentation types
// ---------------------------------------------------------------------------

/// A pick inside the current view, positioned on the sample axis.
#[derive(Debug, Clone, Copy)]
pub struct PickMarker<'a> {
    pub pick: &'a Pick,
    /// Fractional sample index on the view's time axis.
    pub x: f64,
    pub class: PhaseClass,
}

/// Inputs of the status bar text.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    /// One-based.
    pub station_number: usize,
    pub station_count: usize,
    pub pick_count: usize,
    pub filter: Option<FilterPreset>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Station {}/{} - {} Picks",
            self.station_number, self.station_count, self.pick_count
        )?;
        match &self.filter {
            Some(p) => write!(
                f,
                " - Bandpass {} [{:.2} - {:.2} Hz]",
                p.name, p.freqmin, p.freqmax
            ),
            None => write!(f, " - Raw Data"),
        }
    }
}

// ---------------------------------------------------------------------------
// AnnotationEngine
// ---------------------------------------------------------------------------

/// Owns one picking session over a waveform collection.
///
/// The engine exists only between [`start`](Self::start) and
/// [`shutdown`](Self::shutdown); the latter consumes it after flushing the
/// preset store and writing the backup catalog.
pub struct AnnotationEngine {
    collection: WaveformCollection,
    cursor: StationCursor,
    view: StationView,
    ledger: PickLedger,
    presets: FilterPresetStore,
    /// Index into `presets` while the filtered view is shown.
    active_filter: Option<usize>,
    catalog_path: Option<PathBuf>,
    backup_path: PathBuf,
}

impl AnnotationEngine {
    /// Begin a session on the first station, unfiltered.
    pub fn start(
        collection: WaveformCollection,
        presets: FilterPresetStore,
        config: &AppConfig,
    ) -> Result<Self> {
        let cursor = StationCursor::new(collection.stations())?;
        let view = StationView::select(&collection, cursor.current())
            .ok_or_else(|| PickError::invalid_input("waveform collection has no traces"))?;
        log::info!(
            "Session started: {} traces on {} stations",
            collection.len(),
            cursor.len()
        );
        if presets.is_empty() {
            log::info!("No filter presets defined");
        } else {
            log::info!("{} filter presets available", presets.len());
        }

        Ok(Self {
            collection,
            cursor,
            view,
            ledger: PickLedger::new(config.author.clone()),
            presets,
            active_filter: None,
            catalog_path: None,
            backup_path: config.backup_catalog.clone(),
        })
    }

    // -- Navigation --

    pub fn go_next(&mut self) {
        let station = self.cursor.next_station().to_string();
        self.show_station(&station);
    }

    pub fn go_previous(&mut self) {
        let station = self.cursor.previous_station().to_string();
        self.show_station(&station);
    }

    /// Jump to `station`; later next/previous steps continue from there.
    pub fn select_station(&mut self, station: &str) -> Result<()> {
        if !self.cursor.seat(station) {
            return Err(PickError::invalid_input(format!("unknown station '{station}'")));
        }
        self.show_station(station);
        Ok(())
    }

    /// Rebuild the view for `station`, keeping the filter mode.
    fn show_station(&mut self, station: &str) {
        let Some(mut view) = StationView::select(&self.collection, station) else {
            return;
        };
        if let Some(index) = self.active_filter {
            let preset = self.presets.get(index);
            if let Err(e) = view.apply_filter(preset) {
                log::warn!("Cannot filter station {station}: {e}; showing raw data");
                self.active_filter = None;
            }
        }
        log::info!("Showing station {station}");
        self.view = view;
    }

    // -- Filtering --

    /// Show the view bandpassed with preset `index`, or unfiltered for `None`.
    pub fn toggle_filter(&mut self, index: Option<usize>) -> Result<()> {
        match index {
            None => {
                self.view.apply_filter(None)?;
                self.active_filter = None;
            }
            Some(i) => {
                let preset = self
                    .presets
                    .get(i)
                    .ok_or_else(|| PickError::invalid_input(format!("no filter preset at index {i}")))?;
                self.view.apply_filter(Some(preset))?;
                self.active_filter = Some(i);
            }
        }
        Ok(())
    }

    pub fn add_preset(&mut self, preset: FilterPreset) -> Result<usize> {
        self.presets.add(preset)
    }

    /// Replace preset `index`, refreshing the view if it is the active one.
    pub fn update_preset(&mut self, index: usize, preset: FilterPreset) -> Result<()> {
        self.presets.update(index, preset)?;
        if self.active_filter == Some(index) {
            if let Err(e) = self.toggle_filter(Some(index)) {
                self.clear_filter();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Delete preset `index`. Deleting the active preset switches the view
    /// back to raw data.
    pub fn remove_preset(&mut self, index: usize) -> Result<FilterPreset> {
        let removed = self.presets.remove(index)?;
        match self.active_filter {
            Some(active) if active == index => self.clear_filter(),
            Some(active) if active > index => self.active_filter = Some(active - 1),
            _ => {}
        }
        Ok(removed)
    }

    fn clear_filter(&mut self) {
        self.active_filter = None;
        // Unfiltered re-derivation cannot fail.
        let _ = self.view.apply_filter(None);
    }

    // -- Picking --

    /// Place `phase_hint` at sample position `x` of `channel` in the current view.
    pub fn place_pick(&mut self, x: f64, phase_hint: &str, channel: &str) -> Result<Placement> {
        self.place_pick_with_onset(x, phase_hint, channel, None)
    }

    pub fn place_pick_with_onset(
        &mut self,
        x: f64,
        phase_hint: &str,
        channel: &str,
        onset: Option<Onset>,
    ) -> Result<Placement> {
        let phase_hint = phase_hint.trim();
        if phase_hint.is_empty() {
            return Err(PickError::invalid_input("phase hint must not be empty"));
        }
        if !x.is_finite() {
            return Err(PickError::invalid_input(format!("invalid sample position {x}")));
        }
        if !self.view.channels().any(|c| c.channel == channel) {
            return Err(PickError::invalid_input(format!(
                "station {} has no channel '{channel}'",
                self.view.station()
            )));
        }

        let window = self.view.window();
        let time = self.view.time_at(x);
        if !(window.start < time && time < window.end) {
            return Err(PickError::invalid_input(format!(
                "sample position {x:.1} is outside the displayed traces"
            )));
        }
        let comment = self.active_preset().map(FilterPreset::description);
        let placement = self.ledger.place(
            &window,
            channel,
            phase_hint,
            time,
            onset,
            comment,
        );
        Ok(placement)
    }

    // -- Catalog --

    /// Save to the path chosen earlier with [`save_catalog_as`](Self::save_catalog_as).
    pub fn save_catalog(&mut self) -> Result<PathBuf> {
        let path = self
            .catalog_path
            .clone()
            .ok_or_else(|| PickError::invalid_input("no catalog file chosen yet"))?;
        catalog::write(&path, self.ledger.as_slice())?;
        Ok(path)
    }

    /// Save to `path` (".xml" is appended if missing) and remember it.
    pub fn save_catalog_as(&mut self, path: impl Into<PathBuf>) -> Result<PathBuf> {
        let mut path = path.into();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if !is_xml {
            let mut name = path.into_os_string();
            name.push(".xml");
            path = PathBuf::from(name);
        }
        catalog::write(&path, self.ledger.as_slice())?;
        self.catalog_path = Some(path.clone());
        Ok(path)
    }

    /// Replace all picks with those in the catalog at `path`.
    ///
    /// On any error the current picks are kept.
    pub fn load_catalog(&mut self, path: &Path) -> Result<usize> {
        let picks = catalog::read(path)?;
        let count = picks.len();
        self.ledger.replace_all(picks);
        log::info!("Loaded {count} picks from {:?}", path);
        Ok(count)
    }

    // -- Accessors --

    pub fn view(&self) -> &StationView {
        &self.view
    }

    pub fn ledger(&self) -> &PickLedger {
        &self.ledger
    }

    pub fn stations(&self) -> &[String] {
        self.cursor.stations()
    }

    pub fn station_index(&self) -> usize {
        self.cursor.position()
    }

    pub fn current_station(&self) -> &str {
        self.view.station()
    }

    pub fn presets(&self) -> &[FilterPreset] {
        self.presets.presets()
    }

    pub fn active_filter(&self) -> Option<usize> {
        self.active_filter
    }

    pub fn active_preset(&self) -> Option<&FilterPreset> {
        self.active_filter.and_then(|i| self.presets.get(i))
    }

    pub fn catalog_path(&self) -> Option<&Path> {
        self.catalog_path.as_deref()
    }

    pub fn phase_hints(&self) -> impl Iterator<Item = &str> {
        self.ledger.phase_hints()
    }

    /// Picks inside the current view, with their sample positions.
    pub fn current_picks(&self) -> Vec<PickMarker<'_>> {
        let (start, end) = (self.view.start_time(), self.view.end_time());
        self.ledger
            .windowed(self.view.station(), start, end)
            .map(|pick| PickMarker {
                pick,
                x: self.view.sample_index(pick.time),
                class: pick.phase_class(),
            })
            .collect()
    }

    pub fn status(&self) -> StatusLine {
        let window = self.view.window();
        StatusLine {
            station_number: self.cursor.position() + 1,
            station_count: self.cursor.len(),
            pick_count: self
                .ledger
                .windowed(&window.station, window.start, window.end)
                .count(),
            filter: self.active_preset().cloned(),
        }
    }

    /// End the session: save the presets and write the backup catalog.
    ///
    /// Both writes are attempted; the first failure is returned.
    pub fn shutdown(self) -> Result<()> {
        let presets = self.presets.save();
        let backup = catalog::write(&self.backup_path, self.ledger.as_slice());
        log::info!("Session ended with {} picks", self.ledger.len());
        presets.and(backup)
    }
}
