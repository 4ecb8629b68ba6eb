//! Signal processing applied to station views: linear detrending and a
//! zero-phase Butterworth bandpass built from cascaded biquad sections.

use std::f64::consts::PI;

use crate::error::{PickError, Result};

// ---------------------------------------------------------------------------
// Detrending
// ---------------------------------------------------------------------------

/// Subtract the least-squares line through `(i, data[i])`.
pub fn detrend_linear(data: &mut [f64]) {
    let n = data.len();
    if n == 0 {
        return;
    }
    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = data.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in data.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

    for (i, y) in data.iter_mut().enumerate() {
        *y -= y_mean + slope * (i as f64 - x_mean);
    }
}

// ---------------------------------------------------------------------------
// Biquad sections
// ---------------------------------------------------------------------------

/// Normalised second-order section (a0 == 1).
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b: [f64; 3],
    a: [f64; 2],
}

impl Biquad {
    fn normalised(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Biquad {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [a[1] / a0, a[2] / a0],
        }
    }

    fn lowpass(fc: f64, q: f64, fs: f64) -> Self {
        let w0 = 2.0 * PI * fc / fs;
        let (sinw0, cosw0) = w0.sin_cos();
        let alpha = sinw0 / (2.0 * q);
        Self::normalised(
            [(1.0 - cosw0) * 0.5, 1.0 - cosw0, (1.0 - cosw0) * 0.5],
            [1.0 + alpha, -2.0 * cosw0, 1.0 - alpha],
        )
    }

    fn highpass(fc: f64, q: f64, fs: f64) -> Self {
        let w0 = 2.0 * PI * fc / fs;
        let (sinw0, cosw0) = w0.sin_cos();
        let alpha = sinw0 / (2.0 * q);
        Self::normalised(
            [(1.0 + cosw0) * 0.5, -(1.0 + cosw0), (1.0 + cosw0) * 0.5],
            [1.0 + alpha, -2.0 * cosw0, 1.0 - alpha],
        )
    }

    /// Direct form I, zero initial state.
    fn run(&self, data: &mut [f64]) {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        for v in data.iter_mut() {
            let x0 = *v;
            let y0 = self.b[0] * x0 + self.b[1] * x1 + self.b[2] * x2
                - self.a[0] * y1
                - self.a[1] * y2;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
            *v = y0;
        }
    }
}

/// Q factors of the second-order sections of an even-order Butterworth filter.
fn butterworth_qs(order: u32) -> impl Iterator<Item = f64> {
    let n = order as f64;
    (0..order / 2).map(move |k| 1.0 / (2.0 * (PI * (2.0 * k as f64 + 1.0) / (2.0 * n)).cos()))
}

// ---------------------------------------------------------------------------
// Bandpass
// ---------------------------------------------------------------------------

/// Butterworth bandpass of `corners` order per edge, run forward then
/// backward so that no phase shift is introduced.
///
/// If `freqmax` reaches the Nyquist frequency only the highpass edge is
/// applied. A `freqmin` at or above Nyquist is rejected.
pub fn bandpass_zerophase(
    data: &mut [f64],
    sampling_rate: f64,
    freqmin: f64,
    freqmax: f64,
    corners: u32,
) -> Result<()> {
    let nyquist = 0.5 * sampling_rate;
    if freqmin >= nyquist {
        return Err(PickError::invalid_input(format!(
            "low corner frequency {freqmin} Hz is above Nyquist ({nyquist} Hz)"
        )));
    }

    let mut sections: Vec<Biquad> = butterworth_qs(corners)
        .map(|q| Biquad::highpass(freqmin, q, sampling_rate))
        .collect();
    if freqmax / nyquist > 1.0 - 1e-6 {
        log::warn!(
            "Upper corner {freqmax} Hz is at or above Nyquist ({nyquist} Hz), applying highpass only"
        );
    } else {
        sections.extend(butterworth_qs(corners).map(|q| Biquad::lowpass(freqmax, q, sampling_rate)));
    }

    for section in &sections {
        section.run(data);
    }
    data.reverse();
    for section in &sections {
        section.run(data);
    }
    data.reverse();
    Ok(())
}
