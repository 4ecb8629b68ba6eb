use chrono::{DateTime, Duration, Utc};

use super::signal;
use crate::data::filter::FilterPreset;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Time helpers
// ---------------------------------------------------------------------------

/// Seconds elapsed from `from` to `to` (negative if `to` is earlier).
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let span = to - from;
    match span.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        // Spans beyond ~292 years overflow i64 nanoseconds.
        None => span.num_milliseconds() as f64 / 1e3,
    }
}

/// `t + seconds`, rounded to the nearest nanosecond.
pub fn add_seconds(t: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    t + Duration::nanoseconds((seconds * 1e9).round() as i64)
}

// ---------------------------------------------------------------------------
// Trace – one channel of one station
// ---------------------------------------------------------------------------

/// A single channel's time series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    /// Time of the first sample.
    pub starttime: DateTime<Utc>,
    /// Sample interval in seconds.
    pub delta: f64,
    pub data: Vec<f64>,
}

impl Trace {
    /// Number of samples.
    pub fn npts(&self) -> usize {
        self.data.len()
    }

    /// Time of the last sample.
    pub fn endtime(&self) -> DateTime<Utc> {
        let last = self.npts().saturating_sub(1) as f64;
        add_seconds(self.starttime, last * self.delta)
    }

    /// Sampling rate in Hz.
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.delta
    }

    /// Remove the least-squares straight line from the samples.
    pub fn detrend_linear(&mut self) {
        signal::detrend_linear(&mut self.data);
    }

    /// Zero-phase Butterworth bandpass with the preset's parameters.
    pub fn bandpass(&mut self, preset: &FilterPreset) -> Result<()> {
        let rate = self.sampling_rate();
        signal::bandpass_zerophase(
            &mut self.data,
            rate,
            preset.freqmin,
            preset.freqmax,
            preset.corners,
        )
    }
}

// ---------------------------------------------------------------------------
// WaveformCollection – the complete loaded recording set
// ---------------------------------------------------------------------------

/// All loaded traces, across stations, in load order.
#[derive(Debug, Clone, Default)]
pub struct WaveformCollection {
    pub traces: Vec<Trace>,
}

impl WaveformCollection {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    /// Distinct station codes in first-seen order.
    pub fn stations(&self) -> Vec<String> {
        let mut stations: Vec<String> = Vec::new();
        for tr in &self.traces {
            if !stations.contains(&tr.station) {
                stations.push(tr.station.clone());
            }
        }
        stations
    }

    /// Copies of every trace recorded at `station`.
    pub fn select(&self, station: &str) -> Vec<Trace> {
        self.traces
            .iter()
            .filter(|tr| tr.station == station)
            .cloned()
            .collect()
    }

    /// Number of traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether the collection holds no traces.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}
