/// North American broadcast time constant (75 µs)
pub const DEFAULT_TAU: f32 = 75e-6;

/// De-emphasis filter for FM broadcast audio.
///
/// Single-pole IIR low-pass undoing the transmitter's pre-emphasis:
/// `y[n] = alpha*x[n] + (1 - alpha)*y[n-1]` with `alpha = dt / (RC + dt)`.
///
/// The previous output is kept between calls so consecutive buffers filter
/// as one continuous signal. Common time constants are 75 µs (Americas,
/// South Korea) and 50 µs (Europe and most other regions).
pub struct DeemphasisFilter {
    alpha: f32,
    prev_y: f32,
}

impl DeemphasisFilter {
    pub fn new(sample_rate: f32, tau: f32) -> Self {
        let dt = 1.0 / sample_rate;
        Self {
            alpha: dt / (tau + dt),
            prev_y: 0.0,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Filter `samples` in place, updating the carried state
    pub fn process(&mut self, samples: &mut [f32]) {
        let a = self.alpha;
        for x in samples.iter_mut() {
            let y = a * *x + (1.0 - a) * self.prev_y;
            *x = y;
            self.prev_y = y;
        }
    }

    /// Clear the previous output back to the session-start value
    pub fn reset(&mut self) {
        self.prev_y = 0.0;
    }
}
