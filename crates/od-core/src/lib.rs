/// Configuration, cue tables, and shared types for the oracle decoder.
///
/// This crate holds everything the analysis pipeline and the application
/// agree on: the closed set of cues, their frequency tables, the decoder
/// configuration, and the core error type.

pub mod config;
pub mod cue;
pub mod error;
pub mod sequence;

pub use config::DecoderConfig;
pub use cue::{Cue, CueTable};
pub use error::CoreError;
pub use sequence::CueSequence;
