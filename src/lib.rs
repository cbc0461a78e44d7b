//! Wideband FM recorder for rtl_tcp tuners.
//!
//! The crate configures a networked tuner with 5-byte commands, pulls raw
//! unsigned 8-bit IQ data in fixed-size buffers, demodulates it to mono audio
//! and writes the session to a WAV file.

pub mod config;
pub mod dsp;
pub mod error;
pub mod input;
pub mod meter;
pub mod output;
pub mod pipeline;
pub mod protocol;
pub mod tuner;

pub use error::{Error, Result};
