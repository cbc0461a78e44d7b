use std::io::Write;

use log::{debug, info, warn};

use crate::config::{GainMode, TunerConfig};
use crate::error::{Error, Result};
use crate::protocol::{CommandFrame, Opcode, FRAME_LEN};

impl TunerConfig {
    /// Command frames that apply this configuration, in send order
    pub fn commands(&self) -> Vec<CommandFrame> {
        let mut frames = vec![
            CommandFrame::set_sample_rate(self.sample_rate),
            CommandFrame::set_frequency(self.center_frequency),
        ];
        if self.ppm_correction != 0 {
            frames.push(CommandFrame::set_frequency_correction(self.ppm_correction));
        }
        match self.gain_mode {
            GainMode::Auto => frames.push(CommandFrame::set_gain_mode(false)),
            GainMode::Manual(tenths_db) => {
                frames.push(CommandFrame::set_gain_mode(true));
                frames.push(CommandFrame::set_gain(tenths_db));
            }
        }
        frames.push(CommandFrame::set_tuner_agc(self.tuner_agc));
        frames.push(CommandFrame::set_device_agc(self.device_agc));
        if self.bias_tee {
            frames.push(CommandFrame::set_bias_tee(true));
        }
        frames
    }
}

/// Write one command frame. A short write is reported, never retried.
pub fn send_command<W: Write>(control: &mut W, frame: CommandFrame) -> Result<()> {
    let written = control.write(&frame.encode())?;
    if written != FRAME_LEN {
        return Err(Error::ProtocolWrite {
            opcode: frame.opcode,
            written,
        });
    }
    debug!("Sent {:?}", frame);
    Ok(())
}

/// Push the whole configuration to the tuner.
///
/// Failed commands are logged and skipped so the session can still start,
/// possibly with the tuner misconfigured. Returns the number of failures.
pub fn configure<W: Write>(control: &mut W, config: &TunerConfig) -> usize {
    let mut failures = 0;
    for frame in config.commands() {
        let setting = describe(&frame);
        match send_command(control, frame) {
            Ok(()) => info!("Set {}", setting),
            Err(e) => {
                warn!("Failed to set {}: {}", setting, e);
                failures += 1;
            }
        }
    }
    if let Err(e) = control.flush() {
        warn!("Failed to flush tuner commands: {}", e);
    }
    failures
}

/// Human-readable form of the setting a frame applies
pub fn describe(frame: &CommandFrame) -> String {
    match frame.kind() {
        Some(Opcode::SetFrequency) => format!("center frequency to {} Hz", frame.parameter),
        Some(Opcode::SetSampleRate) => format!("sample rate to {} Hz", frame.parameter),
        Some(Opcode::SetGainMode) if frame.parameter == 0 => "gain mode to auto".to_string(),
        Some(Opcode::SetGainMode) => "gain mode to manual".to_string(),
        Some(Opcode::SetGain) => format!("gain to {:.1} dB", frame.parameter as f32 / 10.0),
        Some(Opcode::SetFrequencyCorrection) => {
            format!("frequency correction to {} ppm", frame.parameter as i32)
        }
        Some(Opcode::SetTunerAgc) => format!("tuner AGC {}", on_off(frame.parameter != 0)),
        Some(Opcode::SetDeviceAgc) => format!("device AGC {}", on_off(frame.parameter != 0)),
        Some(Opcode::SetBiasTee) => format!("bias tee {}", on_off(frame.parameter != 0)),
        None => format!(
            "unknown command 0x{:02x} to {}",
            frame.opcode, frame.parameter
        ),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Accepts only the first `limit` bytes of each write
    struct Stingy {
        limit: usize,
        sent: Vec<u8>,
    }

    impl Write for Stingy {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.limit);
            self.sent.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_plan_matches_recorder_setup() {
        let opcodes: Vec<u8> = TunerConfig::default()
            .commands()
            .iter()
            .map(|f| f.opcode)
            .collect();
        assert_eq!(opcodes, vec![0x02, 0x01, 0x03, 0x06, 0x08]);
    }

    #[test]
    fn manual_gain_adds_gain_command() {
        let config = TunerConfig {
            gain_mode: GainMode::Manual(496),
            ppm_correction: -3,
            bias_tee: true,
            ..Default::default()
        };
        let frames = config.commands();
        assert!(frames.contains(&CommandFrame::set_gain_mode(true)));
        assert!(frames.contains(&CommandFrame::set_gain(496)));
        assert!(frames.contains(&CommandFrame::set_frequency_correction(-3)));
        assert_eq!(frames.last(), Some(&CommandFrame::set_bias_tee(true)));
    }

    #[test]
    fn configure_writes_all_frames() {
        let config = TunerConfig::default();
        let mut sink = Vec::new();
        assert_eq!(configure(&mut sink, &config), 0);

        assert_eq!(sink.len(), 5 * config.commands().len());
        assert_eq!(&sink[..5], &[0x02, 0x00, 0x1F, 0x40, 0x00]);
    }

    #[test]
    fn short_write_is_reported() {
        let mut sink = Stingy {
            limit: 3,
            sent: Vec::new(),
        };
        let err = send_command(&mut sink, CommandFrame::set_sample_rate(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::ProtocolWrite {
                opcode: 0x02,
                written: 3
            }
        ));
    }

    #[test]
    fn describes_each_setting() {
        let config = TunerConfig {
            gain_mode: GainMode::Manual(496),
            ppm_correction: -3,
            bias_tee: true,
            ..Default::default()
        };
        let settings: Vec<String> = config.commands().iter().map(describe).collect();
        assert_eq!(
            settings,
            vec![
                "sample rate to 2048000 Hz",
                "center frequency to 88900000 Hz",
                "frequency correction to -3 ppm",
                "gain mode to manual",
                "gain to 49.6 dB",
                "tuner AGC on",
                "device AGC off",
                "bias tee on",
            ]
        );
    }

    #[test]
    fn unknown_opcode_is_described_raw() {
        let frame = CommandFrame {
            opcode: 0x42,
            parameter: 7,
        };
        assert_eq!(describe(&frame), "unknown command 0x42 to 7");
    }

    #[test]
    fn short_writes_do_not_stop_configuration() {
        let config = TunerConfig::default();
        let mut sink = Stingy {
            limit: 4,
            sent: Vec::new(),
        };
        let failures = configure(&mut sink, &config);
        assert_eq!(failures, config.commands().len());
        assert_eq!(sink.sent.len(), 4 * failures);
    }
}
