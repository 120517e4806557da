use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A compressed recording decoded to interleaved f32 samples.
///
/// Channels are kept interleaved, exactly as a PCM WAV data chunk would hold
/// them, so the session's `ChannelMode` applies the same way to both paths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedRecording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Décode un enregistrement non-WAV (MP3, FLAC, OGG, AAC...) au taux natif.
///
/// No resampling: the cue tables are matched against the recording's own bin
/// grid. A corrupt packet is skipped with a warning; a broken container ends
/// decoding with what was read so far.
///
/// # Errors
/// Returns an error if the file cannot be opened, probed, or has no track
/// with a known sample rate.
///
/// # Example
/// ```no_run
/// use od_audio::decode::decode_file;
/// let recording = decode_file("oracles.flac").unwrap();
/// println!("{} Hz, {} canaux", recording.sample_rate, recording.channels);
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedRecording> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let mut format = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Format audio non reconnu")?
        .format;

    let track = format.default_track().context("Aucune piste audio")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Piste sans taux d'échantillonnage")?;
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Codec non pris en charge")?;

    let samples = read_track(format.as_mut(), decoder.as_mut(), track_id);
    let recording = DecodedRecording {
        samples,
        sample_rate,
        channels: u16::try_from(channels).unwrap_or(u16::MAX),
    };
    log::info!(
        "{} décodé : {} échantillons, {} Hz, {} canaux",
        path.display(),
        recording.samples.len(),
        recording.sample_rate,
        recording.channels
    );
    Ok(recording)
}

/// Pulls every packet of `track_id` through `decoder`, interleaved.
fn read_track(
    format: &mut dyn FormatReader,
    decoder: &mut dyn Decoder,
    track_id: u32,
) -> Vec<f32> {
    let mut samples = Vec::new();
    let mut buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Lecture du conteneur interrompue : {e}");
                break;
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Paquet ignoré : {e}");
                continue;
            }
        };

        // Grow the scratch buffer only when a packet outsizes it.
        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        if buf.as_ref().is_none_or(|b| b.capacity() < needed) {
            buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let Some(sample_buf) = buf.as_mut() else {
            continue;
        };
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }
    samples
}
