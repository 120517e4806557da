use od_core::CoreError;
use od_core::config::WindowFunction;
use realfft::RealFftPlanner;

/// Magnitude spectrum of one window, paired with its bin-to-Hz mapping.
///
/// Both slices have `fft_size / 2 + 1` entries.
#[derive(Clone, Copy, Debug)]
pub struct Spectrum<'a> {
    pub magnitudes: &'a [f32],
    pub frequencies: &'a [f64],
}

/// FFT pipeline: windowed real FFT using realfft.
///
/// Pre-allocates the FFT plan, scratch buffers and the frequency mapping so
/// that `process` does not allocate.
///
/// # Example
/// ```
/// use od_audio::fft::SpectralAnalyzer;
/// use od_core::config::WindowFunction;
/// let mut fft = SpectralAnalyzer::new(256, 48_000, WindowFunction::Rectangular).unwrap();
/// let spectrum = fft.process(&vec![0.0f32; 256]);
/// assert_eq!(spectrum.magnitudes.len(), 129); // N/2 + 1
/// assert_eq!(spectrum.frequencies[1], 48_000.0 / 256.0);
/// ```
pub struct SpectralAnalyzer {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f32>>,
    scratch: Vec<realfft::num_complex::Complex<f32>>,
    plan: std::sync::Arc<dyn realfft::RealToComplex<f32>>,
    window: Vec<f32>,
    magnitudes: Vec<f32>,
    frequencies: Vec<f64>,
}

impl SpectralAnalyzer {
    /// Create an analyzer for windows of `size` samples at `sample_rate` Hz.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidFftSize` if `size` is not a power of two
    /// (or is smaller than 2), and `CoreError::Config` for a zero sample rate.
    pub fn new(size: usize, sample_rate: u32, window: WindowFunction) -> Result<Self, CoreError> {
        if size < 2 || !size.is_power_of_two() {
            return Err(CoreError::InvalidFftSize { size });
        }
        if sample_rate == 0 {
            return Err(CoreError::Config("sample rate nul".into()));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        let window: Vec<f32> = match window {
            WindowFunction::Rectangular => vec![1.0; size],
            // Hann window
            WindowFunction::Hann => (0..size)
                .map(|i| {
                    0.5 * (1.0
                        - (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos())
                })
                .collect(),
        };

        let bins = spectrum_buf.len();
        let bin_width = f64::from(sample_rate) / size as f64;
        let frequencies = (0..bins).map(|k| k as f64 * bin_width).collect();

        Ok(Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
            magnitudes: vec![0.0; bins],
            frequencies,
        })
    }

    /// Process `samples` through the windowed FFT.
    ///
    /// Input shorter than the FFT size is zero-padded, longer input is
    /// truncated. An all-zero window yields an all-zero spectrum.
    pub fn process(&mut self, samples: &[f32]) -> Spectrum<'_> {
        let n = self.fft_size.min(samples.len());

        // Copy and window
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n {
                samples[i] * self.window[i]
            } else {
                0.0
            };
        }

        if let Err(e) = self.plan.process_with_scratch(
            &mut self.input_buf,
            &mut self.spectrum_buf,
            &mut self.scratch,
        ) {
            log::warn!("FFT échouée, spectre nul : {e}");
            self.magnitudes.fill(0.0);
        } else {
            let scale = self.fft_size as f32;
            for (mag, c) in self.magnitudes.iter_mut().zip(&self.spectrum_buf) {
                *mag = (c.re * c.re + c.im * c.im).sqrt() / scale;
            }
        }

        Spectrum {
            magnitudes: &self.magnitudes,
            frequencies: &self.frequencies,
        }
    }

    /// FFT window size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency of bin `k` in Hz.
    #[must_use]
    pub fn bin_frequency(&self, k: usize) -> f64 {
        self.frequencies.get(k).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (2.0 * std::f64::consts::PI * freq * i as f64 / f64::from(sample_rate)).sin() as f32
            })
            .collect()
    }

    fn argmax(values: &[f32]) -> usize {
        let mut best = 0;
        for (i, &v) in values.iter().enumerate() {
            if v > values[best] {
                best = i;
            }
        }
        best
    }

    #[test]
    fn rejects_bad_sizes() {
        for size in [0, 1, 1000] {
            assert!(SpectralAnalyzer::new(size, 48_000, WindowFunction::Rectangular).is_err());
        }
        assert!(SpectralAnalyzer::new(1024, 0, WindowFunction::Rectangular).is_err());
    }

    #[test]
    fn silence_is_flat_zero() {
        let mut fft = SpectralAnalyzer::new(1024, 48_000, WindowFunction::Hann).unwrap();
        let spectrum = fft.process(&vec![0.0; 1024]);
        assert!(spectrum.magnitudes.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn bin_centre_tone_peaks_on_its_bin() {
        let size = 4096;
        let rate = 48_000;
        for window in [WindowFunction::Rectangular, WindowFunction::Hann] {
            let mut fft = SpectralAnalyzer::new(size, rate, window).unwrap();
            let freq = fft.bin_frequency(25);
            let spectrum = fft.process(&tone(freq, rate, size));
            assert_eq!(argmax(spectrum.magnitudes), 25, "{window:?}");
        }
    }

    #[test]
    fn short_input_is_zero_padded() {
        let mut fft = SpectralAnalyzer::new(512, 8_000, WindowFunction::Rectangular).unwrap();
        let spectrum = fft.process(&[1.0; 4]);
        // DC of four unit samples over N = 512
        assert!((spectrum.magnitudes[0] - 4.0 / 512.0).abs() < 1e-6);
    }
}
