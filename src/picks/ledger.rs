use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::{CreationInfo, EvaluationMode, Onset, Pick, WaveformStreamId};
use crate::view::ViewWindow;

/// Outcome of [`PickLedger::place`], carrying the ledger index of the pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Created(usize),
    Overwritten(usize),
}

impl Placement {
    pub fn index(&self) -> usize {
        match self {
            Placement::Created(i) | Placement::Overwritten(i) => *i,
        }
    }
}

// ---------------------------------------------------------------------------
// PickLedger – every pick across all stations
// ---------------------------------------------------------------------------

/// Ordered set of all picks.
///
/// Uniqueness of a phase per station view is kept by [`place`](Self::place)
/// overwriting the existing entry rather than by a global constraint: the
/// same station may carry the same phase in two disjoint time windows.
#[derive(Debug, Clone)]
pub struct PickLedger {
    picks: Vec<Pick>,
    author: String,
    serial: u64,
}

impl PickLedger {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            picks: Vec::new(),
            author: author.into(),
            serial: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pick> {
        self.picks.iter()
    }

    pub fn as_slice(&self) -> &[Pick] {
        &self.picks
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&Pick> {
        self.picks.get(index)
    }

    /// Picks of `station` with `start < time < end`, in ledger order.
    pub fn windowed<'a>(
        &'a self,
        station: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a Pick> + 'a {
        self.windowed_indices(station, start, end)
            .map(move |i| &self.picks[i])
    }

    fn windowed_indices<'a>(
        &'a self,
        station: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = usize> + 'a {
        self.picks
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.station() == station && start < p.time && p.time < end)
            .map(|(i, _)| i)
    }

    /// Record `phase_hint` at `time` for the station view described by `window`.
    ///
    /// Only picks inside the window are considered: an existing pick with the
    /// same phase hint there is updated in place, otherwise a new manual pick
    /// is appended. `time` itself is not checked against the window.
    pub fn place(
        &mut self,
        window: &ViewWindow,
        channel: &str,
        phase_hint: &str,
        time: DateTime<Utc>,
        onset: Option<Onset>,
        comment: Option<String>,
    ) -> Placement {
        let existing = self
            .windowed_indices(&window.station, window.start, window.end)
            .find(|&i| self.picks[i].phase_hint == phase_hint);

        if let Some(index) = existing {
            let pick = &mut self.picks[index];
            pick.time = time;
            pick.waveform_id.channel = channel.to_string();
            pick.onset = onset;
            pick.comment = comment;
            log::debug!("Moved {} pick on {} to {}", phase_hint, pick.waveform_id, time);
            return Placement::Overwritten(index);
        }

        let created = Utc::now();
        self.serial += 1;
        let pick = Pick {
            resource_id: format!(
                "smi:local/pick/{}.{}/{}-{}",
                window.network,
                window.station,
                created.format("%Y%m%dT%H%M%S%.f"),
                self.serial
            ),
            time,
            phase_hint: phase_hint.to_string(),
            waveform_id: WaveformStreamId {
                network: window.network.clone(),
                station: window.station.clone(),
                location: window.location.clone(),
                channel: channel.to_string(),
            },
            evaluation_mode: EvaluationMode::Manual,
            creation_info: CreationInfo {
                author: Some(self.author.clone()),
                creation_time: Some(created),
            },
            onset,
            comment,
        };
        log::debug!("New {} pick on {} at {}", phase_hint, pick.waveform_id, time);
        self.picks.push(pick);
        Placement::Created(self.picks.len() - 1)
    }

    /// Replace every pick, e.g. after loading a catalog.
    pub fn replace_all(&mut self, picks: Vec<Pick>) {
        self.picks = picks;
    }

    /// Distinct phase hints in first-seen order.
    pub fn phase_hints(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.iter()
            .map(|p| p.phase_hint.as_str())
            .filter(move |hint| seen.insert(*hint))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::{add_seconds, tests::t0};

    pub(crate) fn window(station: &str) -> ViewWindow {
        ViewWindow {
            network: "XX".into(),
            station: station.into(),
            location: String::new(),
            start: t0(),
            end: add_seconds(t0(), 0.99),
        }
    }

    #[test]
    fn test_place_creates_manual_pick() {
        let mut ledger = PickLedger::new("tester");
        let t = add_seconds(t0(), 0.5);
        let placed = ledger.place(&window("A"), "Z", "P", t, None, None);
        assert_eq!(placed, Placement::Created(0));

        let pick = ledger.get(0).unwrap();
        assert_eq!(pick.time, t);
        assert_eq!(pick.evaluation_mode, EvaluationMode::Manual);
        assert_eq!(pick.waveform_id.to_string(), "XX.A..Z");
        assert_eq!(pick.creation_info.author.as_deref(), Some("tester"));
        assert!(pick.creation_info.creation_time.is_some());
        assert!(pick.resource_id.starts_with("smi:local/pick/XX.A/"));
    }

    #[test]
    fn test_same_phase_overwrites() {
        let mut ledger = PickLedger::new("tester");
        let w = window("A");
        ledger.place(&w, "Z", "P", add_seconds(t0(), 0.2), None, None);
        let id = ledger.get(0).unwrap().resource_id.clone();

        let later = add_seconds(t0(), 0.6);
        let placed = ledger.place(
            &w,
            "N",
            "P",
            later,
            Some(Onset::Impulsive),
            Some("Bandpass x".into()),
        );
        assert_eq!(placed, Placement::Overwritten(0));
        assert_eq!(ledger.len(), 1);

        let pick = ledger.get(0).unwrap();
        assert_eq!(pick.time, later);
        assert_eq!(pick.waveform_id.channel, "N");
        assert_eq!(pick.onset, Some(Onset::Impulsive));
        assert_eq!(pick.comment.as_deref(), Some("Bandpass x"));
        assert_eq!(pick.resource_id, id);
    }

    #[test]
    fn test_distinct_phases_are_independent() {
        let mut ledger = PickLedger::new("tester");
        let w = window("A");
        ledger.place(&w, "Z", "P", add_seconds(t0(), 0.2), None, None);
        ledger.place(&w, "E", "S", add_seconds(t0(), 0.4), None, None);
        ledger.place(&w, "Z", "P", add_seconds(t0(), 0.3), None, None);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(1).unwrap().time, add_seconds(t0(), 0.4));
    }

    #[test]
    fn test_overwrite_scoped_to_station_and_window() {
        let mut ledger = PickLedger::new("tester");
        ledger.place(&window("A"), "Z", "P", add_seconds(t0(), 0.2), None, None);
        ledger.place(&window("B"), "Z", "P", add_seconds(t0(), 0.3), None, None);
        assert_eq!(ledger.len(), 2);

        // A later pass over station A in a different time window.
        let mut later = window("A");
        later.start = add_seconds(t0(), 60.0);
        later.end = add_seconds(t0(), 61.0);
        let placed = ledger.place(&later, "Z", "P", add_seconds(t0(), 60.5), None, None);
        assert_eq!(placed, Placement::Created(2));
        assert_eq!(ledger.get(0).unwrap().time, add_seconds(t0(), 0.2));
    }

    #[test]
    fn test_windowed_bounds_are_strict() {
        let mut ledger = PickLedger::new("tester");
        let w = window("A");
        ledger.place(&w, "Z", "P", w.start, None, None);
        ledger.place(&w, "Z", "S", add_seconds(t0(), 0.5), None, None);
        ledger.place(&w, "Z", "X", w.end, None, None);

        let phases: Vec<&str> = ledger
            .windowed("A", w.start, w.end)
            .map(|p| p.phase_hint.as_str())
            .collect();
        assert_eq!(phases, vec!["S"]);
        assert_eq!(ledger.windowed("B", w.start, w.end).count(), 0);
    }

    #[test]
    fn test_phase_hints_first_seen() {
        let mut ledger = PickLedger::new("tester");
        ledger.place(&window("A"), "Z", "Pn", add_seconds(t0(), 0.1), None, None);
        ledger.place(&window("A"), "Z", "S", add_seconds(t0(), 0.2), None, None);
        ledger.place(&window("B"), "Z", "Pn", add_seconds(t0(), 0.1), None, None);
        ledger.place(&window("B"), "Z", "Pg", add_seconds(t0(), 0.3), None, None);

        let hints: Vec<&str> = ledger.phase_hints().collect();
        assert_eq!(hints, vec!["Pn", "S", "Pg"]);
        // Restartable.
        assert_eq!(ledger.phase_hints().count(), 3);
    }

    #[test]
    fn test_replace_all() {
        let mut ledger = PickLedger::new("tester");
        ledger.place(&window("A"), "Z", "P", add_seconds(t0(), 0.1), None, None);
        let saved = ledger.as_slice().to_vec();
        ledger.place(&window("B"), "Z", "P", add_seconds(t0(), 0.1), None, None);
        ledger.replace_all(saved);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(0).unwrap().station(), "A");
    }
}
