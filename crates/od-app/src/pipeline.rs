use std::path::Path;

use anyhow::{Context, Result};
use od_audio::session::{SessionDecoder, SessionReport};
use od_audio::wav::open_wav;
use od_core::DecoderConfig;

use crate::cli::Cli;

/// Resolve config: file (or defaults), then CLI overrides, then validation.
///
/// # Errors
/// Returns an error if the file exists but is invalid, or if the merged
/// configuration fails validation.
pub fn resolve_config(cli: &Cli) -> Result<DecoderConfig> {
    let mut config = if cli.config.exists() {
        od_core::config::load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        DecoderConfig::default()
    };

    if let Some(size) = cli.fft_size {
        config.fft_size = size;
    }
    if let Some(tol) = cli.tolerance_bins {
        config.tolerance_bins = tol;
    }
    if let Some(window) = cli.window {
        config.window = window.into();
    }
    if let Some(channels) = cli.channels {
        config.channels = channels.into();
    }

    config.validate().context("Configuration rejetée")?;
    Ok(config)
}

/// Decodes one recording file as a fresh session.
///
/// WAV files stream their PCM data chunk straight into the segmenter; other
/// containers are decoded to interleaved samples first.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn analyze_path(path: &Path, config: &DecoderConfig) -> Result<SessionReport> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    if is_wav {
        let stream = open_wav(path)
            .with_context(|| format!("Lecture WAV impossible : {}", path.display()))?;
        let mut decoder = SessionDecoder::new(config, stream.sample_rate)?;
        let format = stream.format;
        Ok(decoder.decode_reader(stream.into_reader(), format)?)
    } else {
        let recording = od_audio::decode::decode_file(path)?;
        let mut decoder = SessionDecoder::new(config, recording.sample_rate)?;
        Ok(decoder.decode_samples(&recording.samples, recording.channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use od_core::config::ChannelMode;
    use od_core::{Cue, CueTable};

    /// Stereo 48 kHz float WAV, one flat 4096-sample window per entry: each
    /// window is 2048 L/R frames of a tone at twice the listed frequency.
    fn write_tone_wav(path: &Path, freqs: &[f64]) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &f in freqs {
            let step = 2.0 * std::f64::consts::PI * 2.0 * f / 48_000.0;
            for i in 0..2048 {
                let s = (0.3 * (step * f64::from(i)).sin()) as f32;
                writer.write_sample(s).unwrap();
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn wav_recording_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oracles.wav");
        let t = CueTable::default();
        let r1 = t.frequencies(Cue::R1);
        let l2 = t.frequencies(Cue::L2);
        write_tone_wav(&path, &[10.0, l2[0], l2[1], 10.0, r1[1], r1[0], l2[0], l2[1]]);

        let report = analyze_path(&path, &DecoderConfig::default()).unwrap();
        assert_eq!(report.windows, 8);
        assert_eq!(report.sequence.as_slice(), &[Cue::L2, Cue::R1]);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let cli = Cli::try_parse_from([
            "oracle-decoder",
            "--config",
            "/nonexistent/decoder.toml",
            "analyze",
            "x.wav",
            "--tolerance-bins",
            "0.25",
            "--channels",
            "downmix",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.fft_size, 4096);
        assert!((config.tolerance_bins - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.channels, ChannelMode::Downmix);
    }

    #[test]
    fn cli_override_is_validated() {
        let cli = Cli::try_parse_from([
            "oracle-decoder",
            "analyze",
            "x.wav",
            "--config",
            "/nonexistent/decoder.toml",
            "--fft-size",
            "1000",
        ])
        .unwrap();
        assert!(resolve_config(&cli).is_err());
    }
}
