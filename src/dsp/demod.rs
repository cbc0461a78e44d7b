use crate::input::IqSample;

/// Delay-and-conjugate FM discriminator over one buffer.
///
/// Produces `iq.len() - 1` phase differences in radians, each in `(-π, π]`.
/// Fewer than two samples give an empty result. The last sample of one
/// buffer is never compared with the first sample of the next; use
/// [`FmDemodulator`] to close that gap.
pub fn demodulate(iq: &[IqSample]) -> Vec<f32> {
    if iq.len() < 2 {
        return Vec::new();
    }
    iq.windows(2).map(|w| (w[1] * w[0].conj()).arg()).collect()
}

/// FM discriminator with optional memory of the previous buffer's last sample
pub struct FmDemodulator {
    carry: bool,
    last: Option<IqSample>,
}

impl FmDemodulator {
    /// With `carry` set, the seam pair between consecutive buffers is
    /// demodulated too, so a stream of N samples yields N - 1 outputs in total.
    pub fn new(carry: bool) -> Self {
        Self { carry, last: None }
    }

    pub fn process(&mut self, iq: &[IqSample]) -> Vec<f32> {
        if !self.carry {
            return demodulate(iq);
        }

        let Some(&newest) = iq.last() else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(iq.len());
        if let Some(prev) = self.last {
            out.push((iq[0] * prev.conj()).arg());
        }
        out.extend(demodulate(iq));
        self.last = Some(newest);
        out
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
