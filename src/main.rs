use clap::Parser;
use chrono::Local;
use log::{error, info, warn};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use fm_capture::config::{
    Continuity, GainMode, SessionConfig, StopCondition, TunerConfig, DEFAULT_BUFFER_SIZE,
};
use fm_capture::input::Connection;
use fm_capture::output::{generate_filename, WavFileSink};
use fm_capture::pipeline::{Session, StopReason};

/// Record wideband FM audio from an rtl_tcp server
#[derive(Parser, Debug)]
#[command(name = "fm-capture")]
#[command(version, about, long_about = None)]
struct Args {
    /// rtl_tcp server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// rtl_tcp server port
    #[arg(short, long, default_value = "1234")]
    port: u16,

    /// Center frequency in Hz
    #[arg(short, long, default_value = "88900000")]
    frequency: u32,

    /// Tuner sample rate in Hz
    #[arg(short, long, default_value = "2048000")]
    sample_rate: u32,

    /// Output audio sample rate in Hz
    #[arg(short, long, default_value = "44100")]
    audio_rate: u32,

    /// Manual tuner gain in tenths of a dB (automatic gain if omitted)
    #[arg(short, long)]
    gain: Option<u32>,

    /// Frequency correction in ppm
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    ppm: i32,

    /// Tuner AGC (on/off)
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    tuner_agc: bool,

    /// Enable the RTL2832 digital AGC
    #[arg(long)]
    device_agc: bool,

    /// Power the antenna through the bias tee
    #[arg(long)]
    bias_tee: bool,

    /// Recording duration in seconds (runs until Ctrl+C or end of stream if omitted)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Stop after this many IQ samples
    #[arg(long)]
    max_samples: Option<u64>,

    /// Bytes read from the stream per processing pass (even)
    #[arg(short, long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Zero demodulated samples quieter than this (radians, 0 disables)
    #[arg(long, default_value = "0")]
    squelch: f32,

    /// De-emphasis time constant in microseconds (75 Americas, 50 Europe)
    #[arg(long, default_value = "75")]
    deemphasis_us: f32,

    /// Reset filter and resampler state on every buffer
    #[arg(long)]
    per_buffer_reset: bool,

    /// Treat the first bytes as IQ data instead of an rtl_tcp greeting
    #[arg(long)]
    no_skip_header: bool,

    /// Output WAV file (defaults to a timestamped name in --output-dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for timestamped recordings
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn tuner_config(&self) -> TunerConfig {
        TunerConfig {
            center_frequency: self.frequency,
            sample_rate: self.sample_rate,
            gain_mode: self.gain.map_or(GainMode::Auto, GainMode::Manual),
            ppm_correction: self.ppm,
            tuner_agc: self.tuner_agc,
            device_agc: self.device_agc,
            bias_tee: self.bias_tee,
        }
    }

    fn session_config(&self) -> fm_capture::Result<SessionConfig> {
        let mut stop = match self.duration {
            Some(secs) => StopCondition::for_secs(secs, self.sample_rate)?,
            None => StopCondition::default(),
        };
        if let Some(max) = self.max_samples {
            stop.max_iq_samples = Some(stop.max_iq_samples.map_or(max, |m| m.min(max)));
        }

        Ok(SessionConfig {
            buffer_size: self.buffer_size,
            input_rate: self.sample_rate,
            audio_rate: self.audio_rate,
            squelch: self.squelch,
            deemphasis_tau: self.deemphasis_us * 1e-6,
            continuity: if self.per_buffer_reset {
                Continuity::PerBuffer
            } else {
                Continuity::Continuous
            },
            stop,
            skip_header: !self.no_skip_header,
        })
    }

    fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self
                .output_dir
                .join(generate_filename(self.frequency, Local::now())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.output.is_none() {
        std::fs::create_dir_all(&args.output_dir)?;
    }

    let mut session = Session::new(args.tuner_config(), args.session_config()?)?;
    let addr = format!("{}:{}", args.host, args.port);
    let mut sink = WavFileSink::new(args.output_path());

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current buffer");
            ctrl_c_token.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || {
        session.run(|| Connection::open(&addr), &mut sink, &cancel)
    })
    .await??;

    info!(
        "Processed {} buffers ({} IQ samples, {} audio samples) in {:.1}s",
        report.buffers,
        report.iq_samples,
        report.audio_samples,
        report.elapsed.as_secs_f32()
    );
    if report.command_failures > 0 {
        warn!("{} tuner command(s) were not delivered", report.command_failures);
    }

    if let StopReason::StreamError(e) = report.stop_reason {
        error!("Recording ended early: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
