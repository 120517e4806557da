use std::io::Read;

use od_core::config::ChannelMode;
use od_core::{CueSequence, DecoderConfig};

use crate::classifier::CueClassifier;
use crate::error::AudioError;
use crate::fft::SpectralAnalyzer;
use crate::peak::find_peak;
use crate::segment::{PcmFormat, PcmWindows, SampleWindows};

/// Outcome of one analysed recording session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionReport {
    /// Confirmed cues, in first-confirmation order.
    pub sequence: CueSequence,
    /// Number of analysis windows processed.
    pub windows: usize,
    /// Confirmations emitted by the classifier, duplicates included.
    pub confirmations: usize,
}

/// Décodeur d'une session d'enregistrement.
///
/// Chains segmenter, spectral analyzer, peak extractor, classifier and
/// accumulator. Every `decode_*` call is a new session: the classifier is
/// reset and the returned sequence starts empty.
pub struct SessionDecoder {
    analyzer: SpectralAnalyzer,
    classifier: CueClassifier,
    channels: ChannelMode,
    sample_rate: u32,
}

impl SessionDecoder {
    /// Builds a decoder for a stream recorded at `sample_rate` Hz.
    ///
    /// # Errors
    /// Returns `AudioError::Config` if the configuration is invalid or the
    /// sample rate is zero.
    ///
    /// # Example
    /// ```
    /// use od_audio::session::SessionDecoder;
    /// use od_core::DecoderConfig;
    /// let mut decoder = SessionDecoder::new(&DecoderConfig::default(), 48_000).unwrap();
    /// let report = decoder.decode_samples(&vec![0.0; 48_000], 1);
    /// assert!(report.sequence.is_empty());
    /// assert_eq!(report.windows, 12);
    /// ```
    pub fn new(config: &DecoderConfig, sample_rate: u32) -> Result<Self, AudioError> {
        config.validate()?;
        let analyzer = SpectralAnalyzer::new(config.fft_size, sample_rate, config.window)?;
        let classifier = CueClassifier::new(config.cues.clone(), config.tolerance_hz(sample_rate));
        Ok(Self {
            analyzer,
            classifier,
            channels: config.channels,
            sample_rate,
        })
    }

    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.analyzer.fft_size()
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decodes an interleaved PCM byte stream, channels laid out per the
    /// configured `ChannelMode`.
    ///
    /// # Errors
    /// Returns the first read error of the stream.
    pub fn decode_reader<R: Read>(
        &mut self,
        reader: R,
        format: PcmFormat,
    ) -> Result<SessionReport, AudioError> {
        let windows = PcmWindows::new(reader, format, self.channels, self.fft_size());
        self.decode_windows(windows)
    }

    /// Decodes interleaved samples already in memory.
    #[must_use]
    pub fn decode_samples(&mut self, samples: &[f32], channels: u16) -> SessionReport {
        let mut report = self.begin();
        let windows = SampleWindows::new(samples, channels, self.channels, self.fft_size());
        for window in windows {
            self.step(&window, &mut report);
        }
        self.finish(&report);
        report
    }

    /// Decodes a sequence of analysis windows.
    ///
    /// # Errors
    /// Stops at, and returns, the first error item.
    pub fn decode_windows<I>(&mut self, windows: I) -> Result<SessionReport, AudioError>
    where
        I: IntoIterator<Item = Result<Vec<f32>, AudioError>>,
    {
        let mut report = self.begin();
        for window in windows {
            self.step(&window?, &mut report);
        }
        self.finish(&report);
        Ok(report)
    }

    fn begin(&mut self) -> SessionReport {
        self.classifier.reset();
        SessionReport::default()
    }

    fn step(&mut self, window: &[f32], report: &mut SessionReport) {
        let peak = find_peak(&self.analyzer.process(window));
        log::trace!(
            "Fenêtre {} : pic {:.3} Hz (bin {}, mag {:.5})",
            report.windows,
            peak.frequency,
            peak.bin,
            peak.magnitude
        );
        report.windows += 1;

        if let Some(cue) = self.classifier.push(peak.frequency) {
            report.confirmations += 1;
            report.sequence.push(cue);
        }
    }

    fn finish(&self, report: &SessionReport) {
        let secs = (report.windows * self.fft_size()) as f64 / f64::from(self.sample_rate);
        log::info!(
            "Session analysée : {} fenêtres (~{secs:.1} s), {} confirmations, séquence {}",
            report.windows,
            report.confirmations,
            report.sequence
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use od_core::{Cue, CueTable};

    use crate::segment::PcmEncoding;

    const RATE: u32 = 48_000;
    const N: usize = 4096;

    fn tone(freq: f64, len: usize) -> Vec<f32> {
        let step = 2.0 * std::f64::consts::PI * freq / f64::from(RATE);
        (0..len).map(|i| (0.5 * (step * i as f64).sin()) as f32).collect()
    }

    /// One window per frequency; 0.0 means a silent window.
    fn windows_of(freqs: &[f64]) -> Vec<f32> {
        freqs
            .iter()
            .flat_map(|&f| if f == 0.0 { vec![0.0; N] } else { tone(f, N) })
            .collect()
    }

    /// Duplicates every mono sample into an L/R frame, as F32 bytes.
    fn stereo_bytes(mono: &[f32]) -> Vec<u8> {
        mono.iter()
            .flat_map(|&s| [s, s])
            .flat_map(f32::to_le_bytes)
            .collect()
    }

    const STEREO_F32: PcmFormat = PcmFormat {
        encoding: PcmEncoding::F32,
        channels: 2,
    };

    fn decoder() -> SessionDecoder {
        SessionDecoder::new(&DecoderConfig::default(), RATE).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = DecoderConfig {
            fft_size: 3000,
            ..DecoderConfig::default()
        };
        assert!(matches!(
            SessionDecoder::new(&config, RATE),
            Err(AudioError::Config(_))
        ));
        assert!(SessionDecoder::new(&DecoderConfig::default(), 0).is_err());
    }

    #[test]
    fn silence_yields_no_cue() {
        let report = decoder().decode_samples(&vec![0.0; N * 5 + 17], 1);
        assert_eq!(report.windows, 6);
        assert!(report.sequence.is_empty());
        assert_eq!(report.confirmations, 0);
    }

    #[test]
    fn sustained_tone_pair_confirms_cue() {
        let table = CueTable::default();
        let l1 = table.frequencies(Cue::L1);
        let samples = windows_of(&[0.0, l1[0], l1[1], 0.0]);
        let report = decoder().decode_samples(&samples, 1);
        assert_eq!(report.sequence.as_slice(), &[Cue::L1]);
    }

    #[test]
    fn single_bin_sustain_does_not_confirm() {
        let m = CueTable::default().frequencies(Cue::M)[0];
        let report = decoder().decode_samples(&windows_of(&[m, m, m]), 1);
        assert!(report.sequence.is_empty());
    }

    #[test]
    fn two_cues_in_order_each_once() {
        let t = CueTable::default();
        let r2 = t.frequencies(Cue::R2);
        let l3 = t.frequencies(Cue::L3);
        let samples = windows_of(&[r2[0], r2[1], 0.0, l3[1], l3[0], 0.0, r2[1], r2[0], 0.0]);
        let report = decoder().decode_samples(&samples, 1);
        assert_eq!(report.sequence.as_slice(), &[Cue::R2, Cue::L3]);
        assert_eq!(report.confirmations, 3);
    }

    #[test]
    fn stereo_stream_is_read_flat() {
        // Read flat, a stereo frame sequence at 2F peaks at F.
        let t = CueTable::default();
        let l1 = t.frequencies(Cue::L1);
        let frames = [tone(2.0 * l1[0], N), tone(2.0 * l1[1], N)].concat();
        let bytes = stereo_bytes(&frames);

        let report = decoder().decode_reader(&bytes[..], STEREO_F32).unwrap();
        assert_eq!(report.windows, 4);
        assert_eq!(report.sequence.as_slice(), &[Cue::L1]);
    }

    #[test]
    fn stereo_tones_at_table_frequency_miss_when_read_flat() {
        let t = CueTable::default();
        let l1 = t.frequencies(Cue::L1);
        let bytes = stereo_bytes(&windows_of(&[l1[0], l1[1]]));
        let report = decoder().decode_reader(&bytes[..], STEREO_F32).unwrap();
        assert!(report.sequence.is_empty());
    }

    #[test]
    fn stereo_downmix_decodes_true_frequencies() {
        let config = DecoderConfig {
            channels: ChannelMode::Downmix,
            ..DecoderConfig::default()
        };
        let t = CueTable::default();
        let m = t.frequencies(Cue::M);
        let bytes = stereo_bytes(&windows_of(&[m[0], m[1]]));

        let mut decoder = SessionDecoder::new(&config, RATE).unwrap();
        let report = decoder.decode_reader(&bytes[..], STEREO_F32).unwrap();
        assert_eq!(report.windows, 2);
        assert_eq!(report.sequence.as_slice(), &[Cue::M]);

        let interleaved: Vec<f32> = windows_of(&[m[0], m[1]])
            .iter()
            .flat_map(|&s| [s, s])
            .collect();
        let report = decoder.decode_samples(&interleaved, 2);
        assert_eq!(report.sequence.as_slice(), &[Cue::M]);
    }

    #[test]
    fn each_call_is_a_new_session() {
        let l1 = CueTable::default().frequencies(Cue::L1).to_vec();
        let mut decoder = decoder();
        let first = decoder.decode_samples(&windows_of(&[l1[0], l1[1]]), 1);
        assert_eq!(first.sequence.as_slice(), &[Cue::L1]);

        // A candidate left pending at the end of a session does not leak.
        let pending = decoder.decode_samples(&windows_of(&[l1[0]]), 1);
        assert!(pending.sequence.is_empty());
        let next = decoder.decode_samples(&windows_of(&[l1[1]]), 1);
        assert!(next.sequence.is_empty());
    }

    #[test]
    fn read_error_is_returned() {
        let windows = vec![Ok(vec![0.0; N]), Err(AudioError::StreamError("coupure".into()))];
        assert!(decoder().decode_windows(windows).is_err());
    }
}
