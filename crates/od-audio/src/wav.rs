use std::fs::File;
use std::io::{BufReader, Read, Take};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec};

use crate::error::AudioError;
use crate::segment::{PcmEncoding, PcmFormat};

/// Maps a WAV header to the segmenter's PCM layout.
///
/// # Errors
/// Returns `AudioError::UnsupportedFormat` for encodings the segmenter
/// cannot read (8-bit, float other than 32-bit, ...).
///
/// # Example
/// ```
/// use od_audio::segment::PcmEncoding;
/// use od_audio::wav::pcm_format;
/// let spec = hound::WavSpec {
///     channels: 2,
///     sample_rate: 48_000,
///     bits_per_sample: 32,
///     sample_format: hound::SampleFormat::Float,
/// };
/// assert_eq!(pcm_format(&spec).unwrap().encoding, PcmEncoding::F32);
/// ```
pub fn pcm_format(spec: &WavSpec) -> Result<PcmFormat, AudioError> {
    let encoding = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => PcmEncoding::F32,
        (SampleFormat::Int, 16) => PcmEncoding::I16,
        (SampleFormat::Int, 24) => PcmEncoding::I24,
        (SampleFormat::Int, 32) => PcmEncoding::I32,
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat(format!(
                "{format:?} {bits} bits"
            )));
        }
    };
    Ok(PcmFormat {
        encoding,
        channels: spec.channels,
    })
}

/// An opened WAV recording: header facts plus the raw data chunk.
pub struct WavStream {
    pub sample_rate: u32,
    pub format: PcmFormat,
    data: Take<BufReader<File>>,
}

impl WavStream {
    /// The PCM bytes of the data chunk, nothing after it.
    pub fn into_reader(self) -> impl Read {
        self.data
    }
}

/// Ouvre un enregistrement WAV pour l'analyse.
///
/// # Errors
/// Returns an error if the file cannot be opened, is not a WAV file, or uses
/// an unsupported encoding.
pub fn open_wav(path: impl AsRef<Path>) -> Result<WavStream, AudioError> {
    let path = path.as_ref();
    let reader = WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();
    let format = pcm_format(&spec)?;

    // `len` counts samples across all channels.
    let data_bytes = u64::from(reader.len()) * format.encoding.bytes_per_sample() as u64;
    log::info!(
        "WAV {} : {} Hz, {} canaux, {} bits {:?}, {:.1} s",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format,
        f64::from(reader.duration()) / f64::from(spec.sample_rate.max(1))
    );

    Ok(WavStream {
        sample_rate: spec.sample_rate,
        format,
        data: reader.into_inner().take(data_bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_data_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [1i16, -1, 300, -300] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let stream = open_wav(&path).unwrap();
        assert_eq!(stream.sample_rate, 44_100);
        assert_eq!(
            stream.format,
            PcmFormat {
                encoding: PcmEncoding::I16,
                channels: 2
            }
        );
        let mut bytes = Vec::new();
        stream.into_reader().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..2], &1i16.to_le_bytes());
    }

    #[test]
    fn rejects_8_bit() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        assert!(matches!(
            pcm_format(&spec),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(open_wav("/nonexistent/oracles.wav").is_err());
    }
}
