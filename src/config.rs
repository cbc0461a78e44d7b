use std::time::Duration;

use crate::dsp::DEFAULT_TAU;
use crate::error::{Error, Result};

/// Bytes pulled from the stream per pipeline pass
pub const DEFAULT_BUFFER_SIZE: usize = 16384;

/// Tuner gain selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainMode {
    /// Automatic gain control
    Auto,
    /// Manual gain (value in tenths of dB, e.g. 496 = 49.6 dB)
    Manual(u32),
}

/// Settings pushed to the tuner before streaming starts
#[derive(Debug, Clone)]
pub struct TunerConfig {
    /// Center frequency in Hz
    pub center_frequency: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub gain_mode: GainMode,
    /// Frequency correction in PPM
    pub ppm_correction: i32,
    pub tuner_agc: bool,
    pub device_agc: bool,
    /// Power the antenna via coax
    pub bias_tee: bool,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            center_frequency: 88_900_000,
            sample_rate: 2_048_000,
            gain_mode: GainMode::Auto,
            ppm_correction: 0,
            tuner_agc: true,
            device_agc: false,
            bias_tee: false,
        }
    }
}

/// How stage state is treated at buffer boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    /// Demodulator, de-emphasis and resampler state carry across buffers
    Continuous,
    /// Every buffer is processed from a fresh state
    PerBuffer,
}

/// When to stop streaming, besides end-of-stream and cancellation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StopCondition {
    /// Wall-clock recording time
    pub duration: Option<Duration>,
    /// Total IQ samples consumed
    pub max_iq_samples: Option<u64>,
}

impl StopCondition {
    /// Stop after `duration` of wall-clock time or the equivalent number of
    /// IQ samples at `sample_rate`, whichever comes first
    pub fn for_duration(duration: Duration, sample_rate: u32) -> Self {
        Self {
            duration: Some(duration),
            max_iq_samples: Some((duration.as_secs_f64() * sample_rate as f64) as u64),
        }
    }

    /// Like [`StopCondition::for_duration`], from a seconds count given on the
    /// command line. Negative, NaN and out-of-range values are rejected.
    pub fn for_secs(secs: f64, sample_rate: u32) -> Result<Self> {
        let duration = Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::config(format!("invalid duration {}: {}", secs, e)))?;
        Ok(Self::for_duration(duration, sample_rate))
    }
}

/// Per-session pipeline settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub buffer_size: usize,
    /// Sample rate of the incoming IQ stream, and of the demodulated audio
    pub input_rate: u32,
    pub audio_rate: u32,
    /// Zero demodulated samples below this magnitude (radians); 0 disables
    pub squelch: f32,
    /// De-emphasis time constant in seconds
    pub deemphasis_tau: f32,
    pub continuity: Continuity,
    pub stop: StopCondition,
    /// Consume the rtl_tcp greeting before streaming
    pub skip_header: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            input_rate: 2_048_000,
            audio_rate: 44_100,
            squelch: 0.0,
            deemphasis_tau: DEFAULT_TAU,
            continuity: Continuity::Continuous,
            stop: StopCondition::default(),
            skip_header: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 || self.buffer_size % 2 != 0 {
            return Err(Error::config(format!(
                "buffer size must be a non-zero even number of bytes, got {}",
                self.buffer_size
            )));
        }
        if self.input_rate == 0 || self.audio_rate == 0 {
            return Err(Error::config("sample rates must be non-zero"));
        }
        if self.squelch.is_nan() || self.squelch < 0.0 {
            return Err(Error::config(format!(
                "squelch threshold must be non-negative, got {}",
                self.squelch
            )));
        }
        if self.deemphasis_tau.is_nan() || self.deemphasis_tau <= 0.0 {
            return Err(Error::config("de-emphasis time constant must be positive"));
        }
        Ok(())
    }

    /// IQ samples per buffer
    pub fn samples_per_buffer(&self) -> usize {
        self.buffer_size / 2
    }

    /// Number of buffers covering about one second of IQ data
    pub fn buffers_per_second(&self) -> usize {
        (self.input_rate as usize / self.samples_per_buffer().max(1)).max(1)
    }
}
