//! Session orchestration.
//!
//! A [`Session`] starts `Idle` and walks `Connecting → Configuring →
//! Streaming → Draining → Closed`. While streaming it pulls one fixed-size buffer at a time and runs
//! it through decode, demodulation, squelch, de-emphasis and rate conversion,
//! appending the audio to a single session-wide buffer. The stream ends on a
//! short read, on cancellation, or when the configured limit is reached; the
//! audio gathered so far is always handed to the sink.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{Continuity, SessionConfig, TunerConfig};
use crate::dsp::{resample, squelch, DeemphasisFilter, FmDemodulator, LinearResampler};
use crate::error::{Error, Result};
use crate::input::{decode_cu8, Connection, IqSample, IqStreamReader};
use crate::meter::SignalMeter;
use crate::output::AudioSink;
use crate::protocol::DongleInfo;
use crate::tuner;

const METER_FFT_SIZE: usize = 1024;

/// Upper bound on the audio buffer reserved before streaming starts
const MAX_RESERVE_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, `run` not yet called
    Idle,
    Connecting,
    Configuring,
    Streaming,
    Draining,
    Closed,
}

/// Why streaming ended
#[derive(Debug)]
pub enum StopReason {
    /// The peer closed the stream on a buffer boundary
    EndOfStream,
    Cancelled,
    DurationReached,
    SampleLimitReached,
    /// Short or malformed buffer; audio up to the previous buffer is kept
    StreamError(Error),
}

#[derive(Debug)]
pub struct SessionReport {
    pub stop_reason: StopReason,
    pub buffers: u64,
    pub iq_samples: u64,
    pub audio_samples: usize,
    pub elapsed: Duration,
    pub command_failures: usize,
    pub dongle: Option<DongleInfo>,
}

/// Demodulation chain with all state that must survive buffer boundaries
pub struct Pipeline {
    continuity: Continuity,
    input_rate: u32,
    audio_rate: u32,
    squelch: f32,
    demod: FmDemodulator,
    deemphasis: DeemphasisFilter,
    resampler: LinearResampler,
}

impl Pipeline {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            continuity: config.continuity,
            input_rate: config.input_rate,
            audio_rate: config.audio_rate,
            squelch: config.squelch,
            demod: FmDemodulator::new(config.continuity == Continuity::Continuous),
            deemphasis: DeemphasisFilter::new(config.input_rate as f32, config.deemphasis_tau),
            resampler: LinearResampler::new(config.input_rate, config.audio_rate),
        }
    }

    /// Decode and process one raw buffer
    pub fn process(&mut self, raw: &[u8]) -> Result<Vec<f32>> {
        let iq = decode_cu8(raw)?;
        Ok(self.process_iq(&iq))
    }

    pub fn process_iq(&mut self, iq: &[IqSample]) -> Vec<f32> {
        if self.continuity == Continuity::PerBuffer {
            self.demod.reset();
            self.deemphasis.reset();
        }

        let mut audio = self.demod.process(iq);
        squelch(&mut audio, self.squelch);
        self.deemphasis.process(&mut audio);

        match self.continuity {
            Continuity::Continuous => self.resampler.process(&audio),
            Continuity::PerBuffer => resample(&audio, self.input_rate, self.audio_rate),
        }
    }
}

pub struct Session {
    tuner: TunerConfig,
    config: SessionConfig,
    state: SessionState,
}

impl Session {
    pub fn new(tuner: TunerConfig, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if tuner.sample_rate != config.input_rate {
            warn!(
                "Tuner sample rate {} Hz differs from pipeline input rate {} Hz",
                tuner.sample_rate, config.input_rate
            );
        }
        Ok(Self {
            tuner,
            config,
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run one capture session to completion.
    ///
    /// `connect` opens the tuner connection. Connection and output failures
    /// are returned as errors; a stream that breaks mid-session still
    /// produces a file and is reported through [`StopReason::StreamError`].
    /// The connection is released before the audio is written.
    pub fn run<R, W, C>(
        &mut self,
        connect: C,
        sink: &mut dyn AudioSink,
        cancel: &CancellationToken,
    ) -> Result<SessionReport>
    where
        R: Read,
        W: Write,
        C: FnOnce() -> Result<Connection<R, W>>,
    {
        self.transition(SessionState::Connecting);
        let mut conn = match connect() {
            Ok(conn) => conn,
            Err(e) => {
                self.transition(SessionState::Closed);
                return Err(e);
            }
        };

        self.transition(SessionState::Configuring);
        let command_failures = tuner::configure(&mut conn.control, &self.tuner);
        if command_failures > 0 {
            warn!(
                "{} tuner command(s) failed, tuner may be misconfigured",
                command_failures
            );
        }
        let dongle = if self.config.skip_header {
            conn.stream.read_dongle_info()
        } else {
            None
        };

        self.transition(SessionState::Streaming);
        let (audio, mut report) = self.stream(&mut conn.stream, cancel);
        report.command_failures = command_failures;
        report.dongle = dongle;
        drop(conn);
        info!("Connection closed");

        self.transition(SessionState::Draining);
        let written = sink.write_audio(&audio, self.config.audio_rate);
        self.transition(SessionState::Closed);
        written?;

        Ok(report)
    }

    fn stream<R: Read>(
        &self,
        stream: &mut IqStreamReader<R>,
        cancel: &CancellationToken,
    ) -> (Vec<f32>, SessionReport) {
        let stop = self.config.stop;
        let meter_every = self.config.buffers_per_second() as u64;
        let mut pipeline = Pipeline::new(&self.config);
        let mut meter = SignalMeter::new(METER_FFT_SIZE.min(self.config.samples_per_buffer()));
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut audio: Vec<f32> = Vec::new();
        if let Some(limit) = stop.max_iq_samples {
            let ratio = self.config.audio_rate as f64 / self.config.input_rate as f64;
            let cap = self.config.audio_rate as u64 * MAX_RESERVE_SECS;
            let expected = (limit as f64 * ratio).min(cap as f64) as usize;
            audio.reserve(expected + 1);
        }

        let mut buffers: u64 = 0;
        let mut iq_samples: u64 = 0;

        match stop.duration {
            Some(d) => info!("Starting data reception for {:.1} seconds", d.as_secs_f32()),
            None => info!("Starting data reception (Ctrl+C to stop)"),
        }
        let start = Instant::now();

        let stop_reason = loop {
            if cancel.is_cancelled() {
                info!("Streaming stopped by user");
                break StopReason::Cancelled;
            }

            let received = stream.read_buffer(&mut buffer);
            if received == 0 {
                info!("Stream closed");
                break StopReason::EndOfStream;
            }
            if received < buffer.len() {
                let err = Error::StreamIntegrity {
                    expected: buffer.len(),
                    received,
                };
                warn!("Incomplete data received: {}", err);
                break StopReason::StreamError(err);
            }

            let iq = match decode_cu8(&buffer) {
                Ok(iq) => iq,
                Err(e) => break StopReason::StreamError(e),
            };

            if buffers % meter_every == 0 {
                debug!(
                    "[meter] peak power {:.1} dBFS after {:.1}s",
                    meter.peak_power_db(&iq),
                    start.elapsed().as_secs_f32()
                );
            }

            audio.extend(pipeline.process_iq(&iq));
            buffers += 1;
            iq_samples += iq.len() as u64;

            if stop.max_iq_samples.is_some_and(|max| iq_samples >= max) {
                info!("Sample limit reached");
                break StopReason::SampleLimitReached;
            }
            if stop.duration.is_some_and(|d| start.elapsed() >= d) {
                info!("Desired recording duration reached");
                break StopReason::DurationReached;
            }
        };

        let report = SessionReport {
            stop_reason,
            buffers,
            iq_samples,
            audio_samples: audio.len(),
            elapsed: start.elapsed(),
            command_failures: 0,
            dongle: None,
        };
        (audio, report)
    }
}
