use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::model::{Trace, WaveformCollection};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a waveform collection from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `[{ "network": .., "station": .., "channel": .., "starttime": .., "delta": .., "data": [...] }, ...]`
/// * `.csv`  – same columns, `data` holding semicolon-separated floats
pub fn load_file(path: &Path) -> Result<WaveformCollection> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let collection = match ext.as_str() {
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if collection.is_empty() {
        bail!("{} contains no traces", path.display());
    }
    Ok(collection)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (one object per trace):
///
/// ```json
/// [
///   {
///     "network": "XX",
///     "station": "OKAS01",
///     "location": "",
///     "channel": "HHZ",
///     "starttime": "2011-03-11T05:46:00Z",
///     "delta": 0.01,
///     "data": [0.12, 0.14, ...]
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<WaveformCollection> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<WaveformCollection> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut traces = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Trace {i} is not a JSON object"))?;

        let code = |key: &str| -> Result<String> {
            match obj.get(key) {
                Some(JsonValue::String(s)) => Ok(s.clone()),
                None | Some(JsonValue::Null) if key == "location" => Ok(String::new()),
                _ => bail!("Trace {i}: missing or invalid '{key}'"),
            }
        };

        let starttime = obj
            .get("starttime")
            .and_then(|v| v.as_str())
            .with_context(|| format!("Trace {i}: missing 'starttime'"))?;
        let delta = obj
            .get("delta")
            .and_then(|v| v.as_f64())
            .with_context(|| format!("Trace {i}: missing or invalid 'delta'"))?;
        let data = json_array_to_f64(obj.get("data"), i)?;

        traces.push(build_trace(
            i,
            code("network")?,
            code("station")?,
            code("location")?,
            code("channel")?,
            starttime,
            delta,
            data,
        )?);
    }

    Ok(WaveformCollection::new(traces))
}

fn json_array_to_f64(val: Option<&JsonValue>, trace: usize) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Trace {trace}: missing or invalid 'data' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Trace {trace}, data[{j}]: not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row `network,station,location,channel,starttime,delta,data`
/// (any column order). `data` contains semicolon-separated floats:
///   `"0.12;0.14;0.11"`
fn load_csv(path: &Path) -> Result<WaveformCollection> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    parse_csv(reader)
}

fn parse_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<WaveformCollection> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let network_idx = column("network")?;
    let station_idx = column("station")?;
    let location_idx = headers.iter().position(|h| h == "location");
    let channel_idx = column("channel")?;
    let start_idx = column("starttime")?;
    let delta_idx = column("delta")?;
    let data_idx = column("data")?;

    let mut traces = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let delta_text = field(delta_idx);
        let delta: f64 = delta_text
            .parse()
            .with_context(|| format!("CSV row {row_no}: delta '{delta_text}' is not a number"))?;
        let data = parse_semicolon_floats(&field(data_idx), row_no)?;

        traces.push(build_trace(
            row_no,
            field(network_idx),
            field(station_idx),
            location_idx.map(field).unwrap_or_default(),
            field(channel_idx),
            &field(start_idx),
            delta,
            data,
        )?);
    }

    Ok(WaveformCollection::new(traces))
}

fn parse_semicolon_floats(s: &str, row: usize) -> Result<Vec<f64>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, data[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn build_trace(
    index: usize,
    network: String,
    station: String,
    location: String,
    channel: String,
    starttime: &str,
    delta: f64,
    data: Vec<f64>,
) -> Result<Trace> {
    if station.is_empty() {
        bail!("Trace {index}: empty station code");
    }
    if !(delta > 0.0 && delta.is_finite()) {
        bail!("Trace {index}: delta must be positive, got {delta}");
    }
    let starttime = parse_time(starttime)
        .with_context(|| format!("Trace {index}: invalid starttime '{starttime}'"))?;

    Ok(Trace {
        network,
        station,
        location,
        channel,
        starttime,
        delta,
        data,
    })
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
