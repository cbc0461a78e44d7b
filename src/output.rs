use chrono::{DateTime, Local};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Destination for the audio of a finished session
pub trait AudioSink {
    fn write_audio(&mut self, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Scale samples to 16-bit PCM against the loudest sample of the whole sequence.
///
/// `scaled[i] = round(sample[i] / max_abs * 32767)`. An all-zero sequence stays
/// all-zero.
pub fn normalize_to_i16(samples: &[f32]) -> Vec<i16> {
    let max_abs = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if max_abs == 0.0 {
        return vec![0; samples.len()];
    }
    samples
        .iter()
        .map(|&s| (s / max_abs * 32767.0).round() as i16)
        .collect()
}

/// Write mono audio to a WAV file (int16 PCM, normalized to full scale)
pub fn write_audio_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let wrap = |source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wrap)?;
    for sample in normalize_to_i16(samples) {
        writer.write_sample(sample).map_err(wrap)?;
    }
    writer.finalize().map_err(wrap)?;
    Ok(())
}

/// Generate output filename for a recording
pub fn generate_filename(center_frequency: u32, start_time: DateTime<Local>) -> String {
    format!(
        "fm_{}_{}.wav",
        center_frequency,
        start_time.format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Writes the session audio to a WAV file on disk
pub struct WavFileSink {
    path: PathBuf,
}

impl WavFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSink for WavFileSink {
    fn write_audio(&mut self, samples: &[f32], sample_rate: u32) -> Result<()> {
        write_audio_wav(&self.path, samples, sample_rate)?;
        info!(
            "Audio data saved to {} ({} samples, {:.1}s)",
            self.path.display(),
            samples.len(),
            samples.len() as f32 / sample_rate as f32
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hound::WavReader;

    #[test]
    fn normalizes_against_global_peak() {
        let scaled = normalize_to_i16(&[0.5, -2.0, 1.0, 0.0]);
        assert_eq!(scaled, vec![8192, -32767, 16384, 0]);
    }

    #[test]
    fn rounds_to_nearest() {
        // 1/3 of full scale is 10922.33
        assert_eq!(normalize_to_i16(&[1.0, 1.0 / 3.0]), vec![32767, 10922]);
        assert_eq!(normalize_to_i16(&[-3.0, 2.0]), vec![-32767, 21845]);
    }

    #[test]
    fn all_zero_stays_zero() {
        assert_eq!(normalize_to_i16(&[0.0; 5]), vec![0; 5]);
        assert!(normalize_to_i16(&[]).is_empty());
    }

    #[test]
    fn wav_has_mono_header_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = WavFileSink::new(&path);
        sink.write_audio(&[0.1, -0.2, 0.05], 44_100).unwrap();

        let reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![16384, -32767, 8192]);
    }

    #[test]
    fn unwritable_path_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.wav");
        let err = write_audio_wav(&path, &[0.0], 44_100).unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
    }

    #[test]
    fn filename_has_frequency_and_timestamp() {
        let t = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            generate_filename(88_900_000, t),
            "fm_88900000_2024-03-09_14-05-07.wav"
        );
    }
}
