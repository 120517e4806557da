use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cue::{Cue, CueTable};
use crate::error::CoreError;

/// Default transform size, in samples.
pub const DEFAULT_FFT_SIZE: usize = 4096;

/// Default match tolerance, as a fraction of one FFT bin.
pub const DEFAULT_TOLERANCE_BINS: f64 = 0.5;

/// Window function applied to each analysis window before the FFT.
///
/// # Example
/// ```
/// use od_core::config::WindowFunction;
/// assert_eq!(WindowFunction::default(), WindowFunction::Rectangular);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum WindowFunction {
    /// No weighting. The built-in cue tables were observed this way.
    #[default]
    Rectangular,
    /// Hann window, lower leakage around tone onsets.
    Hann,
}

/// How an interleaved multi-channel stream is laid into analysis windows.
///
/// # Example
/// ```
/// use od_core::config::ChannelMode;
/// assert_eq!(ChannelMode::default(), ChannelMode::Interleaved);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ChannelMode {
    /// Samples are read as one flat stream, whatever the channel count: a
    /// window holds N interleaved samples. On a stereo recording a tone at
    /// F Hz peaks at F / 2. The built-in cue tables assume this reading.
    #[default]
    Interleaved,
    /// Channels are averaged per frame: a window holds N mono frames and
    /// tones peak at their true frequency. Tables must be re-measured.
    Downmix,
}

impl ChannelMode {
    /// Number of interleaved samples folded into one window slot.
    #[inline]
    #[must_use]
    pub fn samples_per_slot(self, channels: u16) -> usize {
        match self {
            ChannelMode::Interleaved => 1,
            ChannelMode::Downmix => usize::from(channels.max(1)),
        }
    }
}

/// Configuration du décodeur d'oracles.
///
/// Every field has a sane default; a TOML file may override any subset.
///
/// # Example
/// ```
/// use od_core::config::DecoderConfig;
/// let config = DecoderConfig::default();
/// assert_eq!(config.fft_size, 4096);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DecoderConfig {
    /// Transform size N. Must be a power of two.
    pub fft_size: usize,
    /// Match tolerance in bins. A peak matches a table entry when it is
    /// closer than `tolerance_bins * sample_rate / fft_size` Hz.
    pub tolerance_bins: f64,
    /// Weighting applied before the transform.
    pub window: WindowFunction,
    /// Channel handling of interleaved recordings.
    pub channels: ChannelMode,
    /// Known frequencies per cue.
    pub cues: CueTable,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            tolerance_bins: DEFAULT_TOLERANCE_BINS,
            window: WindowFunction::Rectangular,
            channels: ChannelMode::Interleaved,
            cues: CueTable::default(),
        }
    }
}

impl DecoderConfig {
    /// Checks the configuration once at startup.
    ///
    /// # Errors
    /// Returns a `CoreError` if the FFT size is not a non-zero power of two,
    /// the tolerance is not a positive number, or a cue table is invalid.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(CoreError::InvalidFftSize {
                size: self.fft_size,
            });
        }
        if !(self.tolerance_bins.is_finite() && self.tolerance_bins > 0.0) {
            return Err(CoreError::Config(format!(
                "tolerance_bins doit être > 0 (reçu {})",
                self.tolerance_bins
            )));
        }
        self.cues.validate()
    }

    /// Width of one FFT bin in Hz for the given sample rate.
    #[inline]
    #[must_use]
    pub fn bin_width(&self, sample_rate: u32) -> f64 {
        f64::from(sample_rate) / self.fft_size as f64
    }

    /// Match tolerance in Hz for the given sample rate.
    #[inline]
    #[must_use]
    pub fn tolerance_hz(&self, sample_rate: u32) -> f64 {
        self.tolerance_bins * self.bin_width(sample_rate)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    analysis: Option<AnalysisSection>,
    cues: Option<BTreeMap<String, Vec<f64>>>,
}

/// Analysis section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct AnalysisSection {
    fft_size: Option<usize>,
    tolerance_bins: Option<f64>,
    window: Option<WindowFunction>,
    channels: Option<ChannelMode>,
}

/// Parses TOML text and merges it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML, names an unknown cue, or
/// the merged configuration fails validation.
///
/// # Example
/// ```
/// use od_core::config::parse_config;
/// let config = parse_config("[analysis]\nfft_size = 8192\n").unwrap();
/// assert_eq!(config.fft_size, 8192);
/// ```
pub fn parse_config(content: &str) -> Result<DecoderConfig> {
    let file: ConfigFile = toml::from_str(content).context("TOML invalide")?;
    let mut config = DecoderConfig::default();

    if let Some(a) = file.analysis {
        if let Some(v) = a.fft_size {
            config.fft_size = v;
        }
        if let Some(v) = a.tolerance_bins {
            config.tolerance_bins = v;
        }
        if let Some(v) = a.window {
            config.window = v;
        }
        if let Some(v) = a.channels {
            config.channels = v;
        }
    }

    if let Some(cues) = file.cues {
        for (label, frequencies) in cues {
            let cue: Cue = label.parse()?;
            config.cues.set_frequencies(cue, frequencies);
        }
    }

    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use od_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<DecoderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}
