//! QuakeML catalog import/export.
//!
//! All picks are wrapped in a single event:
//!
//! ```xml
//! <quakeml xmlns="http://quakeml.org/xmlns/bed/1.2">
//!   <eventParameters publicID="smi:local/catalog">
//!     <event publicID="smi:local/event/picks">
//!       <pick publicID="smi:local/pick/XX.OKAS01/...">
//!         <time><value>2011-03-11T05:46:12.340Z</value></time>
//!         <waveformID networkCode="XX" stationCode="OKAS01" locationCode="" channelCode="HHZ"/>
//!         <onset>impulsive</onset>
//!         <phaseHint>P</phaseHint>
//!         <evaluationMode>manual</evaluationMode>
//!         <comment><text>Bandpass local (...)</text></comment>
//!         <creationInfo><author>pickme</author><creationTime>...</creationTime></creationInfo>
//!       </pick>
//!     </event>
//!   </eventParameters>
//! </quakeml>
//! ```

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::de::DeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CreationInfo, EvaluationMode, Onset, Pick, WaveformStreamId};
use crate::error::PickError;

const QUAKEML_NS: &str = "http://quakeml.org/xmlns/bed/1.2";

/// Errors raised while reading a catalog document.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The document could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] DeError),

    /// Required element or attribute is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A field is present but cannot be interpreted
    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },
}

impl FormatError {
    fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// XML document structure
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "quakeml")]
struct QuakeMl {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    #[serde(rename = "eventParameters")]
    event_parameters: Option<EventParameters>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventParameters {
    #[serde(rename = "@publicID", default)]
    public_id: String,
    #[serde(rename = "event", default)]
    events: Vec<XmlEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlEvent {
    #[serde(rename = "@publicID", default)]
    public_id: String,
    #[serde(rename = "pick", default)]
    picks: Vec<XmlPick>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlPick {
    #[serde(rename = "@publicID", default)]
    public_id: String,
    time: Option<TimeQuantity>,
    #[serde(rename = "waveformID")]
    waveform_id: Option<XmlWaveformId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    onset: Option<String>,
    #[serde(rename = "phaseHint")]
    phase_hint: Option<String>,
    #[serde(rename = "evaluationMode", skip_serializing_if = "Option::is_none")]
    evaluation_mode: Option<String>,
    #[serde(rename = "comment", default, skip_serializing_if = "Vec::is_empty")]
    comments: Vec<XmlComment>,
    #[serde(rename = "creationInfo", skip_serializing_if = "Option::is_none")]
    creation_info: Option<XmlCreationInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TimeQuantity {
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlWaveformId {
    #[serde(rename = "@networkCode", default)]
    network_code: String,
    #[serde(rename = "@stationCode")]
    station_code: String,
    #[serde(rename = "@locationCode", default)]
    location_code: String,
    #[serde(rename = "@channelCode", default)]
    channel_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlComment {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlCreationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(rename = "creationTime", skip_serializing_if = "Option::is_none")]
    creation_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Pick <-> XML
// ---------------------------------------------------------------------------

fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_time(field: &str, s: &str) -> Result<DateTime<Utc>, FormatError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| FormatError::invalid_value(field, s))
}

impl From<&Pick> for XmlPick {
    fn from(p: &Pick) -> Self {
        let creation_info = &p.creation_info;
        XmlPick {
            public_id: p.resource_id.clone(),
            time: Some(TimeQuantity {
                value: format_time(&p.time),
            }),
            waveform_id: Some(XmlWaveformId {
                network_code: p.waveform_id.network.clone(),
                station_code: p.waveform_id.station.clone(),
                location_code: p.waveform_id.location.clone(),
                channel_code: p.waveform_id.channel.clone(),
            }),
            onset: p.onset.map(|o| o.as_str().to_string()),
            phase_hint: Some(p.phase_hint.clone()),
            evaluation_mode: Some(p.evaluation_mode.as_str().to_string()),
            comments: p
                .comment
                .iter()
                .map(|text| XmlComment { text: text.clone() })
                .collect(),
            creation_info: (creation_info.author.is_some() || creation_info.creation_time.is_some())
                .then(|| XmlCreationInfo {
                    author: creation_info.author.clone(),
                    creation_time: creation_info.creation_time.as_ref().map(format_time),
                }),
        }
    }
}

impl XmlPick {
    fn into_pick(self, index: usize) -> Result<Pick, FormatError> {
        let time = self
            .time
            .ok_or_else(|| FormatError::missing_field(format!("pick[{index}].time")))?;
        let time = parse_time("pick.time", &time.value)?;

        let wid = self
            .waveform_id
            .ok_or_else(|| FormatError::missing_field(format!("pick[{index}].waveformID")))?;
        let phase_hint = self
            .phase_hint
            .ok_or_else(|| FormatError::missing_field(format!("pick[{index}].phaseHint")))?;

        let evaluation_mode = match self.evaluation_mode.as_deref() {
            None => EvaluationMode::Manual,
            Some(s) => EvaluationMode::parse(s.trim())
                .ok_or_else(|| FormatError::invalid_value("pick.evaluationMode", s))?,
        };
        let onset = match self.onset.as_deref() {
            None => None,
            Some(s) => Some(
                Onset::parse(s.trim()).ok_or_else(|| FormatError::invalid_value("pick.onset", s))?,
            ),
        };
        let creation_info = match self.creation_info {
            None => CreationInfo::default(),
            Some(info) => CreationInfo {
                author: info.author,
                creation_time: info
                    .creation_time
                    .map(|s| parse_time("pick.creationInfo.creationTime", &s))
                    .transpose()?,
            },
        };

        Ok(Pick {
            resource_id: if self.public_id.is_empty() {
                format!("smi:local/pick/{index}")
            } else {
                self.public_id
            },
            time,
            phase_hint,
            waveform_id: WaveformStreamId {
                network: wid.network_code,
                station: wid.station_code,
                location: wid.location_code,
                channel: wid.channel_code,
            },
            evaluation_mode,
            creation_info,
            onset,
            comment: self.comments.into_iter().next().map(|c| c.text),
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Serialize `picks` as a QuakeML document with a single event.
pub fn encode(picks: &[Pick]) -> Result<String, FormatError> {
    let doc = QuakeMl {
        xmlns: QUAKEML_NS.to_string(),
        event_parameters: Some(EventParameters {
            public_id: "smi:local/catalog".to_string(),
            events: vec![XmlEvent {
                public_id: "smi:local/event/picks".to_string(),
                picks: picks.iter().map(XmlPick::from).collect(),
            }],
        }),
    };

    let mut body = String::new();
    let mut ser = quick_xml::se::Serializer::new(&mut body);
    ser.indent(' ', 2);
    doc.serialize(ser)?;

    Ok(format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{body}\n"))
}

/// Parse the picks of the first event in a QuakeML document.
pub fn decode(text: &str) -> Result<Vec<Pick>, FormatError> {
    let doc: QuakeMl = quick_xml::de::from_str(text)?;
    let event_parameters = doc
        .event_parameters
        .ok_or_else(|| FormatError::missing_field("eventParameters"))?;
    let event = event_parameters
        .events
        .into_iter()
        .next()
        .ok_or_else(|| FormatError::missing_field("event"))?;

    event
        .picks
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.into_pick(i))
        .collect()
}

/// Read and decode the catalog at `path`.
pub fn read(path: &Path) -> Result<Vec<Pick>, FormatError> {
    let text = std::fs::read_to_string(path)?;
    decode(&text)
}

/// Encode `picks` and write them to `path`.
pub fn write(path: &Path, picks: &[Pick]) -> Result<(), PickError> {
    let xml = encode(picks)?;
    std::fs::write(path, xml).map_err(|e| PickError::persistence(path, e))?;
    log::info!("Wrote {} picks to {:?}", picks.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{add_seconds, tests::t0};
    use crate::picks::ledger::{tests::window, PickLedger};

    fn sample_ledger() -> PickLedger {
        let mut ledger = PickLedger::new("tester");
        ledger.place(&window("A"), "HHZ", "P", add_seconds(t0(), 0.123456789), None, None);
        ledger.place(
            &window("A"),
            "HHN",
            "S",
            add_seconds(t0(), 0.75),
            Some(Onset::Emergent),
            Some("Bandpass local (freqmin=1, freqmax=10, corners=4, zerophase=true)".into()),
        );
        ledger.place(&window("B"), "HHE", "Pn", add_seconds(t0(), 0.31), None, None);
        ledger
    }

    fn key(p: &Pick) -> (String, String, DateTime<Utc>, String) {
        (
            p.waveform_id.station.clone(),
            p.phase_hint.clone(),
            p.time,
            p.waveform_id.channel.clone(),
        )
    }

    #[test]
    fn test_roundtrip_preserves_picks() {
        let ledger = sample_ledger();
        let xml = encode(ledger.as_slice()).unwrap();
        let decoded = decode(&xml).unwrap();

        let mut expected: Vec<_> = ledger.iter().map(key).collect();
        let mut actual: Vec<_> = decoded.iter().map(key).collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);

        // Everything we write is read back identically.
        assert_eq!(decoded, ledger.as_slice());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picks.xml");
        let ledger = sample_ledger();
        write(&path, ledger.as_slice()).unwrap();
        assert_eq!(read(&path).unwrap(), ledger.as_slice());
    }

    #[test]
    fn test_empty_catalog_roundtrip() {
        let xml = encode(&[]).unwrap();
        assert!(decode(&xml).unwrap().is_empty());
    }

    #[test]
    fn test_encoded_document_shape() {
        let xml = encode(sample_ledger().as_slice()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<phaseHint>P</phaseHint>"));
        assert!(xml.contains("<evaluationMode>manual</evaluationMode>"));
        assert!(xml.contains("stationCode=\"A\""));
        assert!(xml.contains("<onset>emergent</onset>"));
        assert_eq!(xml.matches("<event ").count(), 1);
    }

    #[test]
    fn test_decode_foreign_document() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<quakeml xmlns="http://quakeml.org/xmlns/bed/1.2">
  <eventParameters publicID="smi:local/cat">
    <event publicID="smi:local/ev">
      <pick publicID="smi:local/p1">
        <time><value>2011-03-11T05:46:00.500000Z</value></time>
        <waveformID networkCode="BW" stationCode="OKAS01" locationCode="" channelCode="EHZ"></waveformID>
        <phaseHint>P</phaseHint>
        <evaluationMode>automatic</evaluationMode>
      </pick>
    </event>
  </eventParameters>
</quakeml>"#;
        let picks = decode(xml).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].time, add_seconds(t0(), 0.5));
        assert_eq!(picks[0].evaluation_mode, EvaluationMode::Automatic);
        assert_eq!(picks[0].waveform_id.to_string(), "BW.OKAS01..EHZ");
        assert_eq!(picks[0].resource_id, "smi:local/p1");
        assert_eq!(picks[0].comment, None);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode("<quakeml><eventParameters>"),
            Err(FormatError::Xml(_))
        ));
        assert!(matches!(
            decode("<quakeml></quakeml>"),
            Err(FormatError::MissingField { .. })
        ));
        assert!(matches!(
            decode("<quakeml><eventParameters></eventParameters></quakeml>"),
            Err(FormatError::MissingField { .. })
        ));
    }

    #[test]
    fn test_decode_missing_pick_fields() {
        let no_phase = r#"<quakeml><eventParameters><event><pick>
            <time><value>2011-03-11T05:46:00Z</value></time>
            <waveformID stationCode="A"/>
            </pick></event></eventParameters></quakeml>"#;
        assert!(matches!(
            decode(no_phase),
            Err(FormatError::MissingField { field }) if field.contains("phaseHint")
        ));

        let bad_time = r#"<quakeml><eventParameters><event><pick>
            <time><value>yesterday</value></time>
            <waveformID stationCode="A"/><phaseHint>P</phaseHint>
            </pick></event></eventParameters></quakeml>"#;
        assert!(matches!(
            decode(bad_time),
            Err(FormatError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read(&dir.path().join("absent.xml")),
            Err(FormatError::Io(_))
        ));
    }
}
