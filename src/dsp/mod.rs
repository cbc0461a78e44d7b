//! FM audio chain: discriminator, squelch, de-emphasis and rate conversion.
//!
//! Each stage has a stateless buffer-local form and, where the stage has
//! memory, a stateful block that carries it across buffer boundaries.

pub mod deemphasis;
pub mod demod;
pub mod resample;
pub mod squelch;

pub use deemphasis::{DeemphasisFilter, DEFAULT_TAU};
pub use demod::{demodulate, FmDemodulator};
pub use resample::{resample, LinearResampler};
pub use squelch::squelch;
