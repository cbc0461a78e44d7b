use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::input::IqSample;

/// Generate Blackman window coefficients
/// Better sidelobe suppression (-58 dB) than Hann (-31 dB) at cost of wider main lobe
pub fn blackman_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    (0..size)
        .map(|n| {
            let x = n as f32 / (size - 1) as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

/// Peak FFT bin power of the raw IQ stream, used to judge reception while recording.
///
/// Works on a fixed-size prefix of each buffer so the FFT plan and window are
/// built once per session.
pub struct SignalMeter {
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SignalMeter {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft,
            window: blackman_window(fft_size),
            scratch: Vec::with_capacity(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Peak bin power in dB relative to a full-scale 8-bit tone, skipping DC.
    /// Returns negative infinity when the buffer is shorter than the FFT.
    pub fn peak_power_db(&mut self, samples: &[IqSample]) -> f32 {
        let n = self.window.len();
        if n == 0 || samples.len() < n {
            return f32::NEG_INFINITY;
        }

        self.scratch.clear();
        self.scratch.extend(
            samples[..n]
                .iter()
                .zip(&self.window)
                .map(|(s, w)| Complex::new(s.re * w, s.im * w)),
        );
        self.fft.process(&mut self.scratch);

        let peak_power = self
            .scratch
            .iter()
            .skip(1)
            .map(|c| c.norm_sqr())
            .fold(0.0f32, f32::max);

        // Normalize by FFT size and 8-bit full scale, then convert to dB
        let full_scale = 127.5 * 127.5;
        let normalized_power = peak_power / ((n * n) as f32 * full_scale);
        10.0 * normalized_power.log10()
    }
}
