use chrono::{DateTime, Utc};

use crate::data::filter::FilterPreset;
use crate::data::model::{add_seconds, seconds_between, Trace, WaveformCollection};
use crate::error::{PickError, Result};

// ---------------------------------------------------------------------------
// StationCursor – cyclic navigation over stations
// ---------------------------------------------------------------------------

/// Cyclic cursor over station codes in first-seen order.
#[derive(Debug, Clone)]
pub struct StationCursor {
    stations: Vec<String>,
    position: usize,
}

impl StationCursor {
    /// Cursor on the first station. Fails if there are no stations.
    pub fn new(stations: Vec<String>) -> Result<Self> {
        if stations.is_empty() {
            return Err(PickError::invalid_input("waveform collection has no stations"));
        }
        Ok(Self {
            stations,
            position: 0,
        })
    }

    pub fn current(&self) -> &str {
        &self.stations[self.position]
    }

    /// Zero-based index of the current station.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Step forward, wrapping after the last station.
    pub fn next_station(&mut self) -> &str {
        self.advance(1)
    }

    /// Step back one station, i.e. forward `len - 1` steps.
    pub fn previous_station(&mut self) -> &str {
        self.advance(self.stations.len() - 1)
    }

    /// Move the cursor onto `station`. Unknown stations leave it untouched.
    pub fn seat(&mut self, station: &str) -> bool {
        match self.stations.iter().position(|s| s == station) {
            Some(position) => {
                self.position = position;
                true
            }
            None => false,
        }
    }

    fn advance(&mut self, steps: usize) -> &str {
        self.position = (self.position + steps) % self.stations.len();
        self.current()
    }
}

// ---------------------------------------------------------------------------
// StationView – the snapshot being annotated
// ---------------------------------------------------------------------------

/// Station and time span covered by a view, used to scope pick lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewWindow {
    pub network: String,
    pub station: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// One displayed channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelView<'a> {
    pub channel: &'a str,
    pub samples: &'a [f64],
    pub delta: f64,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
}

/// Detrended (and optionally filtered) copy of one station's traces.
///
/// The filtered samples are always derived from the detrended copy, so
/// toggling a filter never compounds and switching it off restores the
/// unfiltered samples exactly.
#[derive(Debug, Clone)]
pub struct StationView {
    station: String,
    base: Vec<Trace>,
    traces: Vec<Trace>,
}

impl StationView {
    /// Copy, sort and detrend the traces of `station`.
    ///
    /// Returns `None` when the collection has no trace for `station`.
    pub fn select(collection: &WaveformCollection, station: &str) -> Option<Self> {
        let mut base = collection.select(station);
        if base.is_empty() {
            return None;
        }
        base.sort_by(|a, b| a.channel.cmp(&b.channel));
        for tr in &mut base {
            tr.detrend_linear();
        }
        Some(Self {
            station: station.to_string(),
            traces: base.clone(),
            base,
        })
    }

    /// Re-derive the displayed traces, bandpassed with `preset` if given.
    ///
    /// On error the displayed traces are left as they were.
    pub fn apply_filter(&mut self, preset: Option<&FilterPreset>) -> Result<()> {
        let mut traces = self.base.clone();
        if let Some(preset) = preset {
            for tr in &mut traces {
                tr.bandpass(preset)?;
            }
        }
        self.traces = traces;
        Ok(())
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    #[cfg(test)]
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Displayed channels, sorted by channel code.
    pub fn channels(&self) -> impl Iterator<Item = ChannelView<'_>> {
        self.traces.iter().map(|tr| ChannelView {
            channel: &tr.channel,
            samples: &tr.data,
            delta: tr.delta,
            starttime: tr.starttime,
            endtime: tr.endtime(),
        })
    }

    /// Trace the time axis is taken from.
    fn reference(&self) -> &Trace {
        &self.base[0]
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.reference().starttime
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.reference().endtime()
    }

    pub fn delta(&self) -> f64 {
        self.reference().delta
    }

    /// Fractional sample index of `t` on the view's time axis.
    pub fn sample_index(&self, t: DateTime<Utc>) -> f64 {
        seconds_between(self.start_time(), t) / self.delta()
    }

    /// Absolute time of (possibly fractional) sample `index`.
    pub fn time_at(&self, index: f64) -> DateTime<Utc> {
        add_seconds(self.start_time(), index * self.delta())
    }

    pub fn window(&self) -> ViewWindow {
        let reference = self.reference();
        ViewWindow {
            network: reference.network.clone(),
            station: self.station.clone(),
            location: reference.location.clone(),
            start: self.start_time(),
            end: self.end_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{t0, two_station_collection};

    fn cursor(n: usize) -> StationCursor {
        StationCursor::new((0..n).map(|i| format!("ST{i}")).collect()).unwrap()
    }

    #[test]
    fn test_cursor_rejects_empty() {
        assert!(matches!(
            StationCursor::new(Vec::new()),
            Err(PickError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cursor_wraps() {
        let mut c = cursor(3);
        assert_eq!(c.current(), "ST0");
        assert_eq!(c.next_station(), "ST1");
        assert_eq!(c.next_station(), "ST2");
        assert_eq!(c.next_station(), "ST0");
        assert_eq!(c.previous_station(), "ST2");
        assert_eq!(c.previous_station(), "ST1");
    }

    #[test]
    fn test_cursor_full_cycles_return_home() {
        for n in 1..5 {
            let mut c = cursor(n);
            c.next_station();
            let home = c.current().to_string();
            for _ in 0..2 * n {
                c.next_station();
            }
            assert_eq!(c.current(), home);
            for _ in 0..n {
                c.previous_station();
            }
            assert_eq!(c.current(), home);
        }
    }

    #[test]
    fn test_cursor_single_station() {
        let mut c = cursor(1);
        assert_eq!(c.next_station(), "ST0");
        assert_eq!(c.previous_station(), "ST0");
    }

    #[test]
    fn test_cursor_seat() {
        let mut c = cursor(4);
        assert!(c.seat("ST2"));
        assert_eq!(c.next_station(), "ST3");
        assert!(!c.seat("nope"));
        assert_eq!(c.current(), "ST3");
    }

    #[test]
    fn test_select_sorts_and_detrends() {
        let col = two_station_collection();
        let view = StationView::select(&col, "A").unwrap();
        let channels: Vec<&str> = view.channels().map(|c| c.channel).collect();
        assert_eq!(channels, vec!["E", "N", "Z"]);

        for tr in view.traces() {
            let mean = tr.data.iter().sum::<f64>() / tr.npts() as f64;
            assert!(mean.abs() < 1e-9);
        }
        // Raw collection untouched.
        assert_eq!(col.traces[0], crate::data::model::tests::trace("A", "Z", 100));
    }

    #[test]
    fn test_select_unknown_station() {
        assert!(StationView::select(&two_station_collection(), "C").is_none());
    }

    #[test]
    fn test_time_mapping() {
        let view = StationView::select(&two_station_collection(), "A").unwrap();
        assert_eq!(view.time_at(50.0), t0() + chrono::Duration::milliseconds(500));
        assert_eq!(view.sample_index(view.time_at(50.0)), 50.0);
        assert_eq!(view.sample_index(t0()), 0.0);
        assert_eq!(view.time_at(12.5), t0() + chrono::Duration::microseconds(125_000));
    }

    #[test]
    fn test_filter_toggle_restores_samples() {
        let col = two_station_collection();
        let mut view = StationView::select(&col, "A").unwrap();
        let before: Vec<Vec<f64>> = view.traces().iter().map(|t| t.data.clone()).collect();
        let window = view.window();

        let preset = FilterPreset::new("local", 1.0, 10.0, 4).unwrap();
        view.apply_filter(Some(&preset)).unwrap();
        let filtered: Vec<Vec<f64>> = view.traces().iter().map(|t| t.data.clone()).collect();
        assert_ne!(filtered, before);
        assert_eq!(view.window(), window);

        // Applying twice does not filter the filtered samples.
        view.apply_filter(Some(&preset)).unwrap();
        let again: Vec<Vec<f64>> = view.traces().iter().map(|t| t.data.clone()).collect();
        assert_eq!(again, filtered);

        view.apply_filter(None).unwrap();
        let after: Vec<Vec<f64>> = view.traces().iter().map(|t| t.data.clone()).collect();
        assert_eq!(after, before);
        assert_eq!(view.window(), window);
    }

    #[test]
    fn test_failed_filter_keeps_display() {
        let mut view = StationView::select(&two_station_collection(), "A").unwrap();
        let before: Vec<Vec<f64>> = view.traces().iter().map(|t| t.data.clone()).collect();
        let preset = FilterPreset::new("too high", 60.0, 70.0, 4).unwrap();
        assert!(view.apply_filter(Some(&preset)).is_err());
        let after: Vec<Vec<f64>> = view.traces().iter().map(|t| t.data.clone()).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn test_window() {
        let view = StationView::select(&two_station_collection(), "B").unwrap();
        let w = view.window();
        assert_eq!(w.station, "B");
        assert_eq!(w.network, "XX");
        assert_eq!(w.start, t0());
        assert_eq!(w.end, t0() + chrono::Duration::milliseconds(990));
    }
}
