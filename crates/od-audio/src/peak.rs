use crate::fft::Spectrum;

/// Dominant bin of one window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub bin: usize,
    pub frequency: f64,
    pub magnitude: f32,
}

/// Global maximum of the spectrum.
///
/// Ties go to the lowest bin and NaN never wins, so an all-zero (or empty)
/// spectrum reports bin 0 at 0 Hz. Only one tone per window is reported:
/// with overlapping cues the loudest one masks the others.
///
/// # Example
/// ```
/// use od_audio::fft::Spectrum;
/// use od_audio::peak::find_peak;
/// let spectrum = Spectrum { magnitudes: &[0.1, 0.9, 0.9], frequencies: &[0.0, 10.0, 20.0] };
/// assert_eq!(find_peak(&spectrum).frequency, 10.0);
/// ```
#[must_use]
pub fn find_peak(spectrum: &Spectrum<'_>) -> Peak {
    let mut bin = 0;
    let mut magnitude = f32::NEG_INFINITY;
    for (i, &m) in spectrum.magnitudes.iter().enumerate() {
        if m > magnitude {
            bin = i;
            magnitude = m;
        }
    }

    Peak {
        bin,
        frequency: spectrum.frequencies.get(bin).copied().unwrap_or(0.0),
        magnitude: if magnitude.is_finite() { magnitude } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_degenerates_to_dc() {
        let spectrum = Spectrum {
            magnitudes: &[0.0; 8],
            frequencies: &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        };
        let peak = find_peak(&spectrum);
        assert_eq!(peak.bin, 0);
        assert_eq!(peak.frequency, 0.0);
    }

    #[test]
    fn empty_spectrum() {
        let spectrum = Spectrum {
            magnitudes: &[],
            frequencies: &[],
        };
        assert_eq!(
            find_peak(&spectrum),
            Peak {
                bin: 0,
                frequency: 0.0,
                magnitude: 0.0
            }
        );
    }

    #[test]
    fn nan_is_ignored() {
        let spectrum = Spectrum {
            magnitudes: &[f32::NAN, 0.2, f32::NAN, 0.1],
            frequencies: &[0.0, 5.0, 10.0, 15.0],
        };
        assert_eq!(find_peak(&spectrum).bin, 1);
    }

    #[test]
    fn first_maximum_wins() {
        let spectrum = Spectrum {
            magnitudes: &[0.0, 0.5, 0.3, 0.5],
            frequencies: &[0.0, 5.0, 10.0, 15.0],
        };
        let peak = find_peak(&spectrum);
        assert_eq!(peak.bin, 1);
        assert_eq!(peak.frequency, 5.0);
    }
}
