// Audio capture, spectral analysis, and cue classification for the oracle decoder.

pub mod capture;
pub mod classifier;
pub mod decode;
pub mod error;
pub mod fft;
pub mod peak;
pub mod segment;
pub mod session;
pub mod wav;
