/// Zero every sample whose magnitude is below `threshold`.
///
/// A threshold of zero leaves the buffer untouched.
pub fn squelch(samples: &mut [f32], threshold: f32) {
    for s in samples.iter_mut() {
        if s.abs() < threshold {
            *s = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_quiet_samples_only() {
        let input = [0.05, -0.2, 0.5, -0.09, 0.1, 3.0];
        let mut out = input;
        squelch(&mut out, 0.1);

        assert_eq!(out, [0.0, -0.2, 0.5, 0.0, 0.1, 3.0]);
        for (o, i) in out.iter().zip(&input) {
            assert!(o.abs() == 0.0 || o.abs() == i.abs());
        }
    }

    #[test]
    fn zero_threshold_is_passthrough() {
        let input = [0.0, 1e-9, -1e-9, 2.0];
        let mut out = input;
        squelch(&mut out, 0.0);
        assert_eq!(out, input);
    }
}
