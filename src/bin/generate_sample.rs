use std::f64::consts::PI;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde_json::json;

/// Decaying sinusoid starting at `onset` seconds.
fn wavelet(t: f64, onset: f64, freq: f64, decay: f64, amplitude: f64) -> f64 {
    if t < onset {
        return 0.0;
    }
    let dt = t - onset;
    amplitude * (-dt / decay).exp() * (2.0 * PI * freq * dt).sin()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// Station code and epicentral distance in km.
const STATIONS: [(&str, f64); 3] = [("OKAS01", 18.0), ("OKAS02", 35.0), ("OKAS03", 52.0)];
const CHANNELS: [&str; 3] = ["HHE", "HHN", "HHZ"];
const VP: f64 = 6.0;
const VS: f64 = 3.5;
const ORIGIN_OFFSET: f64 = 5.0;
const DELTA: f64 = 0.01;
const NPTS: usize = 3000;

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_waveforms.json".to_string());
    let mut rng = SimpleRng::new(42);
    let start = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .context("invalid start time")?;

    let mut traces = Vec::new();
    for &(station, distance) in &STATIONS {
        let p_onset = ORIGIN_OFFSET + distance / VP;
        let s_onset = ORIGIN_OFFSET + distance / VS;
        // Amplitude falls off with distance.
        let scale = 20.0 / distance;

        for &channel in &CHANNELS {
            let (p_amp, s_amp) = if channel.ends_with('Z') {
                (1.0, 0.6)
            } else {
                (0.3, 1.4)
            };
            // Slow drift gives detrending something to remove.
            let drift = rng.gauss(0.0, 0.002);
            let data: Vec<f64> = (0..NPTS)
                .map(|i| {
                    let t = i as f64 * DELTA;
                    wavelet(t, p_onset, 8.0, 0.6, p_amp * scale)
                        + wavelet(t, s_onset, 4.0, 1.2, s_amp * scale)
                        + 0.3 * (2.0 * PI * 0.05 * t).sin()
                        + drift * i as f64
                        + rng.gauss(0.0, 0.02)
                })
                .collect();

            traces.push(json!({
                "network": "XX",
                "station": station,
                "location": "",
                "channel": channel,
                "starttime": start.to_rfc3339(),
                "delta": DELTA,
                "data": data,
            }));
        }
    }

    let text = serde_json::to_string(&traces)?;
    std::fs::write(&output_path, text).with_context(|| format!("writing {output_path}"))?;

    println!(
        "Wrote {} traces ({} samples each) for {} stations to {output_path}",
        traces.len(),
        NPTS,
        STATIONS.len()
    );
    Ok(())
}
