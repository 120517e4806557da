use std::fmt;

use serde::Serialize;

use crate::cue::Cue;

/// Ordered, duplicate-free list of confirmed cues for one recording session.
///
/// A cue is kept at the position of its first confirmation; later
/// confirmations of the same cue are dropped.
///
/// # Example
/// ```
/// use od_core::{Cue, sequence::CueSequence};
/// let mut seq = CueSequence::new();
/// assert!(seq.push(Cue::R1));
/// assert!(seq.push(Cue::L3));
/// assert!(!seq.push(Cue::R1));
/// assert_eq!(seq.as_slice(), &[Cue::R1, Cue::L3]);
/// assert_eq!(seq.to_string(), "R1 -> L3");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CueSequence {
    cues: Vec<Cue>,
}

impl CueSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `cue` unless it was already confirmed in this session.
    ///
    /// Returns `true` if the sequence grew.
    pub fn push(&mut self, cue: Cue) -> bool {
        if self.cues.contains(&cue) {
            log::debug!("Oracle {cue} déjà confirmé, ignoré");
            return false;
        }
        self.cues.push(cue);
        true
    }

    #[must_use]
    pub fn contains(&self, cue: Cue) -> bool {
        self.cues.contains(&cue)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Cue] {
        &self.cues
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Cue> + '_ {
        self.cues.iter().copied()
    }
}

impl fmt::Display for CueSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cues.is_empty() {
            return f.write_str("(none)");
        }
        for (i, cue) in self.cues.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{cue}")?;
        }
        Ok(())
    }
}

impl Extend<Cue> for CueSequence {
    fn extend<T: IntoIterator<Item = Cue>>(&mut self, iter: T) {
        for cue in iter {
            self.push(cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_push_is_idempotent() {
        let mut seq = CueSequence::new();
        seq.push(Cue::M);
        seq.push(Cue::L1);
        let before = seq.clone();
        assert!(!seq.push(Cue::M));
        assert!(!seq.push(Cue::L1));
        assert_eq!(seq, before);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn keeps_first_confirmation_order() {
        let mut seq = CueSequence::new();
        seq.extend([Cue::R3, Cue::L1, Cue::R3, Cue::M, Cue::L1]);
        assert_eq!(seq.as_slice(), &[Cue::R3, Cue::L1, Cue::M]);
    }

    #[test]
    fn empty_displays_none() {
        let seq = CueSequence::new();
        assert!(seq.is_empty());
        assert_eq!(seq.to_string(), "(none)");
    }
}
