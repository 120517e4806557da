use od_core::{Cue, CueSequence, CueTable};

/// Debounce state carried from one window to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ClassifierState {
    /// No pending match.
    #[default]
    Idle,
    /// The previous window matched `cue` at `frequency`; the next window
    /// confirms or denies it.
    Candidate { cue: Cue, frequency: f64 },
}

/// Turns per-window peak frequencies into confirmed cue events.
///
/// A cue is confirmed by two consecutive peaks that both fall in its table
/// and are not the same bin. A repeat of the candidate's own frequency keeps
/// the candidate pending; any other peak settles it (confirm or deny) and
/// returns to `Idle`.
///
/// # Example
/// ```
/// use od_audio::classifier::CueClassifier;
/// use od_core::{Cue, CueTable};
/// let mut classifier = CueClassifier::new(CueTable::default(), 5.859_375);
/// assert_eq!(classifier.push(292.968_75), None);
/// assert_eq!(classifier.push(152.343_75), Some(Cue::L1));
/// ```
#[derive(Clone, Debug)]
pub struct CueClassifier {
    table: CueTable,
    tolerance: f64,
    state: ClassifierState,
}

impl CueClassifier {
    /// `tolerance` is the match radius in Hz, usually half a bin width.
    #[must_use]
    pub fn new(table: CueTable, tolerance: f64) -> Self {
        Self {
            table,
            tolerance,
            state: ClassifierState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> ClassifierState {
        self.state
    }

    #[must_use]
    pub fn table(&self) -> &CueTable {
        &self.table
    }

    /// Drops any pending candidate.
    pub fn reset(&mut self) {
        self.state = ClassifierState::Idle;
    }

    /// Feeds the peak frequency of the next window.
    ///
    /// Returns the confirmed cue, or `None` for "no cue".
    pub fn push(&mut self, frequency: f64) -> Option<Cue> {
        match self.state {
            ClassifierState::Idle => {
                if let Some(cue) = self.table.lookup(frequency, self.tolerance) {
                    log::trace!("Candidat {cue} à {frequency:.3} Hz");
                    self.state = ClassifierState::Candidate { cue, frequency };
                }
                None
            }
            ClassifierState::Candidate {
                cue,
                frequency: previous,
            } => {
                // Same bin read twice: hold, never confirm on a repeat.
                if (frequency - previous).abs() < self.tolerance {
                    return None;
                }

                self.state = ClassifierState::Idle;
                if self.table.contains(cue, frequency, self.tolerance) {
                    log::info!("Oracle {cue} confirmé ({previous:.3} Hz puis {frequency:.3} Hz)");
                    Some(cue)
                } else {
                    log::trace!("Candidat {cue} rejeté par {frequency:.3} Hz");
                    None
                }
            }
        }
    }
}

/// Runs `peaks` through a fresh classifier state and collects the session's
/// confirmed cues.
///
/// # Example
/// ```
/// use od_audio::classifier::{classify_peaks, CueClassifier};
/// use od_core::{Cue, CueTable};
/// let mut classifier = CueClassifier::new(CueTable::default(), 5.859_375);
/// let seq = classify_peaks(&mut classifier, [292.968_75, 152.343_75, 10.0]);
/// assert_eq!(seq.as_slice(), &[Cue::L1]);
/// ```
pub fn classify_peaks(
    classifier: &mut CueClassifier,
    peaks: impl IntoIterator<Item = f64>,
) -> CueSequence {
    classifier.reset();
    let mut sequence = CueSequence::new();
    for frequency in peaks {
        if let Some(cue) = classifier.push(frequency) {
            sequence.push(cue);
        }
    }
    sequence
}
