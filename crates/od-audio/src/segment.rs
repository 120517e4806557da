use std::io::{ErrorKind, Read};

use od_core::config::ChannelMode;

use crate::error::AudioError;

/// Sample encoding of a linear PCM byte stream (little-endian).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcmEncoding {
    /// IEEE 754 float, 4 bytes.
    F32,
    /// Signed integer, 2 bytes.
    I16,
    /// Signed integer, 3 bytes packed.
    I24,
    /// Signed integer, 4 bytes.
    I32,
}

impl PcmEncoding {
    #[must_use]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            PcmEncoding::I16 => 2,
            PcmEncoding::I24 => 3,
            PcmEncoding::F32 | PcmEncoding::I32 => 4,
        }
    }

    /// Converts one sample to f32 in [-1, 1]. `bytes` is exactly
    /// `bytes_per_sample()` long.
    #[inline]
    fn decode(self, bytes: &[u8]) -> f32 {
        match self {
            PcmEncoding::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            PcmEncoding::I16 => f32::from(i16::from_le_bytes([bytes[0], bytes[1]])) / 32_768.0,
            PcmEncoding::I24 => {
                // Sign-extend through the top byte of an i32.
                let raw = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8;
                raw as f32 / 8_388_608.0
            }
            PcmEncoding::I32 => {
                let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                (f64::from(raw) / 2_147_483_648.0) as f32
            }
        }
    }
}

/// Layout of an interleaved PCM stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcmFormat {
    pub encoding: PcmEncoding,
    pub channels: u16,
}

/// Découpe un flux PCM en fenêtres d'analyse de taille fixe.
///
/// Each window holds `window_len` slots. With `ChannelMode::Interleaved` a
/// slot is one sample of the flat interleaved stream; with
/// `ChannelMode::Downmix` it is one frame with its channels averaged. A short
/// final read is zero-padded. Windows do not overlap. The sequence ends at the
/// first read that yields no complete slot, or after yielding an I/O error.
///
/// # Example
/// ```
/// use od_audio::segment::{PcmEncoding, PcmFormat, PcmWindows};
/// use od_core::config::ChannelMode;
/// let bytes: Vec<u8> = [0.5f32, 0.25, -0.5].iter().flat_map(|s| s.to_le_bytes()).collect();
/// let format = PcmFormat { encoding: PcmEncoding::F32, channels: 1 };
/// let windows: Vec<Vec<f32>> = PcmWindows::new(&bytes[..], format, ChannelMode::Interleaved, 4)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(windows, vec![vec![0.5, 0.25, -0.5, 0.0]]);
/// ```
pub struct PcmWindows<R> {
    reader: R,
    encoding: PcmEncoding,
    per_slot: usize,
    window_len: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> PcmWindows<R> {
    #[must_use]
    pub fn new(reader: R, format: PcmFormat, mode: ChannelMode, window_len: usize) -> Self {
        let per_slot = mode.samples_per_slot(format.channels);
        Self {
            reader,
            encoding: format.encoding,
            per_slot,
            window_len,
            buf: vec![0; window_len * per_slot * format.encoding.bytes_per_sample()],
            done: window_len == 0,
        }
    }

    /// Reads until the buffer is full or the stream ends. Returns bytes read.
    fn fill(&mut self) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for PcmWindows<R> {
    type Item = Result<Vec<f32>, AudioError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let filled = match self.fill() {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };
        if filled < self.buf.len() {
            self.done = true;
        }

        let bps = self.encoding.bytes_per_sample();
        let slot_bytes = bps * self.per_slot;
        let slots = filled / slot_bytes;
        if slots == 0 {
            self.done = true;
            return None;
        }

        let encoding = self.encoding;
        let mut window = vec![0.0f32; self.window_len];
        for (value, slot) in window
            .iter_mut()
            .zip(self.buf[..slots * slot_bytes].chunks_exact(slot_bytes))
        {
            let samples = slot.chunks_exact(bps).map(|s| encoding.decode(s));
            *value = average(samples, self.per_slot);
        }
        Some(Ok(window))
    }
}

#[inline]
fn average(samples: impl Iterator<Item = f32>, count: usize) -> f32 {
    samples.sum::<f32>() / count as f32
}

/// Same windowing contract as `PcmWindows`, over already-decoded interleaved
/// samples.
///
/// # Example
/// ```
/// use od_audio::segment::SampleWindows;
/// use od_core::config::ChannelMode;
/// let samples = vec![1.0f32; 10];
/// let windows: Vec<Vec<f32>> =
///     SampleWindows::new(&samples, 1, ChannelMode::Interleaved, 4).collect();
/// assert_eq!(windows.len(), 3);
/// assert_eq!(windows[2], vec![1.0, 1.0, 0.0, 0.0]);
/// ```
pub struct SampleWindows<'a> {
    samples: &'a [f32],
    per_slot: usize,
    window_len: usize,
    pos: usize,
}

impl<'a> SampleWindows<'a> {
    #[must_use]
    pub fn new(samples: &'a [f32], channels: u16, mode: ChannelMode, window_len: usize) -> Self {
        Self {
            samples,
            per_slot: mode.samples_per_slot(channels),
            window_len,
            pos: 0,
        }
    }
}

impl Iterator for SampleWindows<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        let whole = (self.samples.len() - self.pos) / self.per_slot;
        if self.window_len == 0 || whole == 0 {
            return None;
        }
        let slots = whole.min(self.window_len);
        let end = self.pos + slots * self.per_slot;

        let mut window = vec![0.0f32; self.window_len];
        for (value, slot) in window
            .iter_mut()
            .zip(self.samples[self.pos..end].chunks_exact(self.per_slot))
        {
            *value = average(slot.iter().copied(), self.per_slot);
        }
        self.pos = end;
        Some(window)
    }
}
