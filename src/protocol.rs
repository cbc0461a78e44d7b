//! rtl_tcp control protocol
//!
//! Every command is exactly 5 bytes: an opcode followed by a big-endian u32
//! parameter. The server never acknowledges commands. On connect the server
//! may send a 12-byte greeting describing the dongle.

/// Length of an encoded command frame
pub const FRAME_LEN: usize = 5;

/// Length of the dongle info greeting sent by rtl_tcp on connect
pub const DONGLE_INFO_LEN: usize = 12;

const DONGLE_MAGIC: &[u8; 4] = b"RTL0";

/// Tuner commands understood by rtl_tcp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Center frequency in Hz
    SetFrequency = 0x01,
    /// Sample rate in Hz
    SetSampleRate = 0x02,
    /// 0 = automatic gain, 1 = manual gain
    SetGainMode = 0x03,
    /// Manual gain in tenths of a dB
    SetGain = 0x04,
    /// Frequency correction in ppm (two's complement)
    SetFrequencyCorrection = 0x05,
    /// Tuner AGC, 0 = off, 1 = on
    SetTunerAgc = 0x06,
    /// RTL2832 digital AGC, 0 = off, 1 = on
    SetDeviceAgc = 0x08,
    /// Bias tee power on the antenna port, 0 = off, 1 = on
    SetBiasTee = 0x0e,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Opcode::SetFrequency),
            0x02 => Ok(Opcode::SetSampleRate),
            0x03 => Ok(Opcode::SetGainMode),
            0x04 => Ok(Opcode::SetGain),
            0x05 => Ok(Opcode::SetFrequencyCorrection),
            0x06 => Ok(Opcode::SetTunerAgc),
            0x08 => Ok(Opcode::SetDeviceAgc),
            0x0e => Ok(Opcode::SetBiasTee),
            other => Err(other),
        }
    }
}

/// A single tuner command, immutable once built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub opcode: u8,
    pub parameter: u32,
}

impl CommandFrame {
    pub fn new(opcode: Opcode, parameter: u32) -> Self {
        Self {
            opcode: opcode as u8,
            parameter,
        }
    }

    pub fn set_frequency(hz: u32) -> Self {
        Self::new(Opcode::SetFrequency, hz)
    }

    pub fn set_sample_rate(hz: u32) -> Self {
        Self::new(Opcode::SetSampleRate, hz)
    }

    pub fn set_gain_mode(manual: bool) -> Self {
        Self::new(Opcode::SetGainMode, u32::from(manual))
    }

    pub fn set_gain(tenths_db: u32) -> Self {
        Self::new(Opcode::SetGain, tenths_db)
    }

    pub fn set_frequency_correction(ppm: i32) -> Self {
        // rtl_tcp reinterprets the parameter as a signed value
        Self::new(Opcode::SetFrequencyCorrection, ppm as u32)
    }

    pub fn set_tuner_agc(on: bool) -> Self {
        Self::new(Opcode::SetTunerAgc, u32::from(on))
    }

    pub fn set_device_agc(on: bool) -> Self {
        Self::new(Opcode::SetDeviceAgc, u32::from(on))
    }

    pub fn set_bias_tee(on: bool) -> Self {
        Self::new(Opcode::SetBiasTee, u32::from(on))
    }

    /// Serialize to the 5-byte wire form. No range checking is done on the
    /// parameter; that is the tuner's concern.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let p = self.parameter.to_be_bytes();
        [self.opcode, p[0], p[1], p[2], p[3]]
    }

    pub fn decode(bytes: &[u8; FRAME_LEN]) -> Self {
        Self {
            opcode: bytes[0],
            parameter: u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        }
    }

    /// Recognized opcode, if any
    pub fn kind(&self) -> Option<Opcode> {
        Opcode::try_from(self.opcode).ok()
    }
}

/// Encode an opcode/parameter pair directly
pub fn encode(opcode: u8, parameter: u32) -> [u8; FRAME_LEN] {
    CommandFrame { opcode, parameter }.encode()
}

/// Greeting sent by rtl_tcp right after the connection is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DongleInfo {
    pub tuner_type: u32,
    pub gain_count: u32,
}

impl DongleInfo {
    /// Parse the greeting, returning `None` when the magic does not match
    pub fn parse(bytes: &[u8; DONGLE_INFO_LEN]) -> Option<Self> {
        if &bytes[0..4] != DONGLE_MAGIC {
            return None;
        }
        Some(Self {
            tuner_type: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            gain_count: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    pub fn tuner_name(&self) -> &'static str {
        match self.tuner_type {
            1 => "E4000",
            2 => "FC0012",
            3 => "FC0013",
            4 => "FC2580",
            5 => "R820T",
            6 => "R828D",
            _ => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_opcode_then_big_endian() {
        let bytes = encode(0x01, 88_900_000);
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..], &88_900_000u32.to_be_bytes());
        assert_eq!(bytes, [0x01, 0x05, 0x4C, 0x81, 0xA0]);
    }

    #[test]
    fn encode_does_not_validate_parameter() {
        assert_eq!(encode(0xff, u32::MAX), [0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(encode(0x03, 0), [0x03, 0, 0, 0, 0]);
    }

    #[test]
    fn frame_round_trips() {
        let frames = [
            CommandFrame::set_sample_rate(2_048_000),
            CommandFrame::set_gain(496),
            CommandFrame::set_frequency_correction(-12),
            CommandFrame { opcode: 0x7f, parameter: 0xDEAD_BEEF },
        ];
        for frame in frames {
            assert_eq!(CommandFrame::decode(&frame.encode()), frame);
        }
    }

    #[test]
    fn typed_constructors_use_rtl_tcp_codes() {
        assert_eq!(CommandFrame::set_frequency(1).opcode, 0x01);
        assert_eq!(CommandFrame::set_gain_mode(true).encode(), [0x03, 0, 0, 0, 1]);
        assert_eq!(CommandFrame::set_tuner_agc(true).opcode, 0x06);
        assert_eq!(CommandFrame::set_device_agc(false).encode(), [0x08, 0, 0, 0, 0]);
        assert_eq!(CommandFrame::set_bias_tee(true).opcode, 0x0e);
    }

    #[test]
    fn negative_ppm_is_twos_complement() {
        let frame = CommandFrame::set_frequency_correction(-1);
        assert_eq!(frame.encode(), [0x05, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(frame.parameter as i32, -1);
    }

    #[test]
    fn kind_recognizes_known_opcodes() {
        assert_eq!(CommandFrame::set_gain(10).kind(), Some(Opcode::SetGain));
        assert_eq!(CommandFrame { opcode: 0x42, parameter: 0 }.kind(), None);
        assert_eq!(Opcode::try_from(0x42), Err(0x42));
    }

    #[test]
    fn dongle_info_parses_greeting() {
        let mut bytes = [0u8; DONGLE_INFO_LEN];
        bytes[0..4].copy_from_slice(b"RTL0");
        bytes[4..8].copy_from_slice(&5u32.to_be_bytes());
        bytes[8..12].copy_from_slice(&29u32.to_be_bytes());
        let info = DongleInfo::parse(&bytes).unwrap();
        assert_eq!(info.tuner_type, 5);
        assert_eq!(info.gain_count, 29);
        assert_eq!(info.tuner_name(), "R820T");
    }

    #[test]
    fn dongle_info_rejects_bad_magic() {
        assert_eq!(DongleInfo::parse(&[127u8; DONGLE_INFO_LEN]), None);
    }
}
