/// Annotation layer: pick types, the ledger that owns them, and the
/// catalog codec that persists them.
///
/// ```text
///   place(x, phase) ──▶ ┌─────────┐ ◀── replace_all ── ┌─────────┐
///                       │ ledger  │                    │ catalog │ ◀─▶ QuakeML
///   windowed(view)  ◀── └─────────┘ ──── picks ──────▶ └─────────┘
/// ```
pub mod catalog;
pub mod ledger;

use std::fmt;

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Pick metadata
// ---------------------------------------------------------------------------

/// Channel a pick was made on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WaveformStreamId {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
}

impl fmt::Display for WaveformStreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    #[default]
    Manual,
    Automatic,
}

impl EvaluationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMode::Manual => "manual",
            EvaluationMode::Automatic => "automatic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(EvaluationMode::Manual),
            "automatic" => Some(EvaluationMode::Automatic),
            _ => None,
        }
    }
}

/// Sharpness of the phase onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Onset {
    Impulsive,
    Emergent,
    Questionable,
}

impl Onset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Onset::Impulsive => "impulsive",
            Onset::Emergent => "emergent",
            Onset::Questionable => "questionable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "impulsive" => Some(Onset::Impulsive),
            "emergent" => Some(Onset::Emergent),
            "questionable" => Some(Onset::Questionable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreationInfo {
    pub author: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// A manually placed phase arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    /// `smi:local/...` identifier, stable across save/load.
    pub resource_id: String,
    pub time: DateTime<Utc>,
    pub phase_hint: String,
    pub waveform_id: WaveformStreamId,
    pub evaluation_mode: EvaluationMode,
    pub creation_info: CreationInfo,
    pub onset: Option<Onset>,
    /// Description of the filter active when the pick was placed.
    pub comment: Option<String>,
}

impl Pick {
    pub fn station(&self) -> &str {
        &self.waveform_id.station
    }

    pub fn phase_class(&self) -> PhaseClass {
        PhaseClass::of(&self.phase_hint)
    }
}

/// Display grouping of phase hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseClass {
    P,
    S,
    Other,
}

impl PhaseClass {
    pub fn of(phase_hint: &str) -> Self {
        match phase_hint {
            "P" => PhaseClass::P,
            "S" => PhaseClass::S,
            _ => PhaseClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_class() {
        assert_eq!(PhaseClass::of("P"), PhaseClass::P);
        assert_eq!(PhaseClass::of("S"), PhaseClass::S);
        assert_eq!(PhaseClass::of("Pn"), PhaseClass::Other);
        assert_eq!(PhaseClass::of("p"), PhaseClass::Other);
    }

    #[test]
    fn test_stream_id_display() {
        let id = WaveformStreamId {
            network: "XX".into(),
            station: "OKAS01".into(),
            location: String::new(),
            channel: "HHZ".into(),
        };
        assert_eq!(id.to_string(), "XX.OKAS01..HHZ");
    }

    #[test]
    fn test_enum_strings() {
        for onset in [Onset::Impulsive, Onset::Emergent, Onset::Questionable] {
            assert_eq!(Onset::parse(onset.as_str()), Some(onset));
        }
        assert_eq!(EvaluationMode::parse("manual"), Some(EvaluationMode::Manual));
        assert_eq!(EvaluationMode::parse("auto"), None);
    }
}
