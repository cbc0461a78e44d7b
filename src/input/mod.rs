pub mod stream;

use rustfft::num_complex::Complex;

use crate::error::{Error, Result};

pub use stream::{Connection, IqStreamReader};

/// IQ sample pair (In-phase, Quadrature) as complex baseband
pub type IqSample = Complex<f32>;

/// DC offset of unsigned 8-bit IQ bytes
pub const CU8_OFFSET: f32 = 127.5;

/// Decode interleaved unsigned 8-bit I/Q bytes into complex samples.
///
/// Each sample consumes two bytes; an odd-length buffer would leave a
/// truncated sample and is rejected as a stream-integrity error.
pub fn decode_cu8(raw: &[u8]) -> Result<Vec<IqSample>> {
    if raw.len() % 2 != 0 {
        return Err(Error::OddLength { len: raw.len() });
    }

    Ok(raw
        .chunks_exact(2)
        .map(|c| Complex::new(c[0] as f32 - CU8_OFFSET, c[1] as f32 - CU8_OFFSET))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_half_as_many_samples() {
        let raw: Vec<u8> = (0..=255).collect();
        let samples = decode_cu8(&raw).unwrap();
        assert_eq!(samples.len(), 128);
        for (k, s) in samples.iter().enumerate() {
            assert_eq!(s.re, raw[2 * k] as f32 - 127.5);
            assert_eq!(s.im, raw[2 * k + 1] as f32 - 127.5);
        }
    }

    #[test]
    fn extremes_map_symmetrically() {
        let samples = decode_cu8(&[0, 255, 127, 128]).unwrap();
        assert_eq!(samples[0], Complex::new(-127.5, 127.5));
        assert_eq!(samples[1], Complex::new(-0.5, 0.5));
    }

    #[test]
    fn empty_buffer_is_empty() {
        assert!(decode_cu8(&[]).unwrap().is_empty());
    }

    #[test]
    fn odd_length_is_rejected() {
        let err = decode_cu8(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::OddLength { len: 3 }));
        assert!(!err.to_string().contains("expected"));
    }
}
