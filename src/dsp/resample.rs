//! Linear-interpolation rate conversion.
//!
//! [`resample`] treats each buffer on its own: output time restarts at zero
//! and positions past the last input sample are clamped to it.
//! [`LinearResampler`] keeps the fractional read position and the last input
//! sample between calls, so a stream split into buffers produces the same
//! output as the unsplit stream.

/// Resample one buffer from `input_rate` to `output_rate`.
///
/// Output length is `floor(len * output_rate / input_rate)`. Output `i` sits
/// at input time `t = i * input_rate / output_rate` and is interpolated
/// between the two neighbouring samples, or clamped to the last sample when
/// there is no right neighbour.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Vec<f32> {
    if input.is_empty() || input_rate == 0 {
        return Vec::new();
    }

    let out_len = (input.len() as u64 * output_rate as u64 / input_rate as u64) as usize;
    let step = input_rate as f64 / output_rate as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let t = i as f64 * step;
            let idx = t.floor() as usize;
            let frac = (t - idx as f64) as f32;
            if idx < last {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else {
                input[last]
            }
        })
        .collect()
}

/// Streaming linear resampler.
///
/// The read position is tracked exactly as a count of `1 / output_rate`
/// steps, so no rounding drift builds up over long sessions.
///
/// After `M` input samples in total the resampler has emitted
/// `ceil((M - 1) * output_rate / input_rate)` outputs: one for every output
/// instant strictly before the newest sample. A single buffer therefore
/// yields the difference of that count across the buffer, which is within
/// one of the stateless [`resample`] length `floor(N * output_rate /
/// input_rate)` and may exceed it. For the first buffer of 8191 samples at
/// 180 kHz to 44.1 kHz that is 2007 against 2006.
pub struct LinearResampler {
    input_rate: u64,
    output_rate: u64,
    /// Next output position in units of 1/output_rate input samples,
    /// relative to the oldest sample held (history or first of the buffer)
    cursor: u64,
    history: Option<f32>,
}

impl LinearResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        Self {
            input_rate: input_rate as u64,
            output_rate: output_rate as u64,
            cursor: 0,
            history: None,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let Some(&newest) = input.last() else {
            return Vec::new();
        };

        let offset = usize::from(self.history.is_some());
        let len = input.len() + offset;
        let sample = |k: usize| match self.history {
            Some(h) if k == 0 => h,
            _ => input[k - offset],
        };

        let capacity = (input.len() as u64 * self.output_rate / self.input_rate) as usize + 1;
        let mut out = Vec::with_capacity(capacity);
        let mut cursor = self.cursor;
        loop {
            let idx = (cursor / self.output_rate) as usize;
            if idx + 1 >= len {
                break;
            }
            let frac = (cursor % self.output_rate) as f32 / self.output_rate as f32;
            out.push(sample(idx) * (1.0 - frac) + sample(idx + 1) * frac);
            cursor += self.input_rate;
        }

        // Re-anchor on the newest sample, which becomes the history
        self.cursor = cursor - (len as u64 - 1) * self.output_rate;
        self.history = Some(newest);
        out
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.history = None;
    }
}
