use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};

use crate::error::AudioError;

/// How often the recorder drains the ring buffer while waiting to stop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `tick`, then waits up to `interval` for `stop`, until a message
/// arrives (`Some`) or every sender is gone (`None`).
fn poll_until<T, E>(
    stop: &flume::Receiver<T>,
    interval: Duration,
    mut tick: impl FnMut() -> Result<(), E>,
) -> Result<Option<T>, E> {
    loop {
        tick()?;
        match stop.recv_timeout(interval) {
            Ok(msg) => return Ok(Some(msg)),
            Err(flume::RecvTimeoutError::Disconnected) => return Ok(None),
            Err(flume::RecvTimeoutError::Timeout) => {}
        }
    }
}

/// Where the recorder listens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureSource {
    /// What the default output device is playing (WASAPI loopback).
    #[default]
    Loopback,
    /// The default input device.
    Input,
}

/// Facts about a finished recording.
#[derive(Clone, Debug, PartialEq)]
pub struct Recording {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved frames written.
    pub frames: usize,
    /// Samples lost to ring-buffer overflow.
    pub dropped: usize,
}

/// Audio capture via cpal.
///
/// Writes interleaved f32 samples into a lock-free ring buffer; the owning
/// thread drains it into a WAV file.
///
/// # Example
/// ```no_run
/// use od_audio::capture::{CaptureSource, LoopbackRecorder};
/// let recorder = LoopbackRecorder::start(CaptureSource::Loopback).unwrap();
/// ```
pub struct LoopbackRecorder {
    stream: cpal::Stream,
    consumer: Consumer<f32>,
    sample_rate: u32,
    channels: u16,
    dropped: Arc<AtomicUsize>,
}

impl LoopbackRecorder {
    /// Start capturing from `source`.
    ///
    /// # Errors
    /// Returns an error if the device is unavailable, does not deliver f32
    /// samples, or refuses the stream.
    pub fn start(source: CaptureSource) -> Result<Self> {
        let host = cpal::default_host();
        let (device, config) = match source {
            CaptureSource::Loopback => {
                let device = host
                    .default_output_device()
                    .ok_or(AudioError::NoOutputDevice)?;
                let config = device.default_output_config()?;
                (device, config)
            }
            CaptureSource::Input => {
                let device = host
                    .default_input_device()
                    .ok_or(AudioError::NoInputDevice)?;
                let config = device.default_input_config()?;
                (device, config)
            }
        };

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat(format!(
                "capture {:?}, f32 attendu",
                config.sample_format()
            ))
            .into());
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        // Ring buffer: 2 seconds of audio @ sample_rate
        let buf_size = sample_rate as usize * usize::from(channels) * 2;
        let (mut producer, consumer) = RingBuffer::new(buf_size);
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_cb = Arc::clone(&dropped);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &sample in data {
                        if producer.push(sample).is_err() {
                            dropped_cb.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                },
                |err| {
                    log::error!("Audio stream error: {err}");
                },
                None,
            )
            .with_context(|| match source {
                CaptureSource::Loopback => {
                    "Capture loopback impossible sur cet hôte audio (essayez --input)"
                }
                CaptureSource::Input => "Capture du périphérique d'entrée impossible",
            })?;

        stream.play()?;
        log::info!("Capture {source:?} démarrée : {sample_rate} Hz, {channels} canaux");

        Ok(Self {
            stream,
            consumer,
            sample_rate,
            channels,
            dropped,
        })
    }

    /// The sample rate of the capture stream.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// WAV header matching what the stream delivers.
    #[must_use]
    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        }
    }

    /// Moves every buffered sample into `writer`. Returns how many were written.
    ///
    /// # Errors
    /// Returns an error if the writer fails.
    pub fn drain_into<W: Write + Seek>(
        &mut self,
        writer: &mut hound::WavWriter<W>,
    ) -> Result<usize, AudioError> {
        let mut count = 0;
        while let Ok(sample) = self.consumer.pop() {
            writer.write_sample(sample)?;
            count += 1;
        }
        Ok(count)
    }

    /// Records into `path` until `stop` receives a message or disconnects.
    ///
    /// Returns the recording together with the message that ended it, `None`
    /// when the channel disconnected, so the caller can act on it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn record_until<T>(
        mut self,
        path: &Path,
        stop: &flume::Receiver<T>,
    ) -> Result<(Recording, Option<T>)> {
        let file = File::create(path)
            .with_context(|| format!("Impossible de créer {}", path.display()))?;
        let mut writer = hound::WavWriter::new(BufWriter::new(file), self.wav_spec())?;

        let mut samples = 0;
        let reason = poll_until(stop, POLL_INTERVAL, || {
            samples += self.drain_into(&mut writer)?;
            Ok::<_, AudioError>(())
        })?;

        if let Err(e) = self.stream.pause() {
            log::warn!("Arrêt du stream audio : {e}");
        }
        samples += self.drain_into(&mut writer)?;
        writer.finalize()?;

        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            log::warn!("{dropped} échantillons perdus (ring buffer plein)");
        }

        let recording = Recording {
            path: path.to_path_buf(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            frames: samples / usize::from(self.channels.max(1)),
            dropped,
        };
        log::info!(
            "Enregistrement terminé : {} ({} frames)",
            recording.path.display(),
            recording.frames
        );
        Ok((recording, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn stop_message_is_handed_back() {
        let (tx, rx) = flume::unbounded();
        let mut ticks = 0;
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send("q").unwrap();
        });
        let reason = poll_until(&rx, TICK, || {
            ticks += 1;
            Ok::<_, AudioError>(())
        })
        .unwrap();
        handle.join().unwrap();
        assert_eq!(reason, Some("q"));
        assert!(ticks >= 1);
    }

    #[test]
    fn disconnect_stops_without_message() {
        let (tx, rx) = flume::unbounded::<u8>();
        drop(tx);
        let reason = poll_until(&rx, TICK, || Ok::<_, AudioError>(())).unwrap();
        assert_eq!(reason, None);
    }

    #[test]
    fn tick_error_aborts_wait() {
        let (_tx, rx) = flume::unbounded::<u8>();
        let result = poll_until(&rx, TICK, || Err(AudioError::StreamError("plein".into())));
        assert!(matches!(result, Err(AudioError::StreamError(_))));
    }
}
