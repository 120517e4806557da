use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// FFT size must be a non-zero power of two.
    #[error("Taille FFT invalide : {size} (puissance de 2 attendue)")]
    InvalidFftSize {
        /// Rejected size.
        size: usize,
    },

    /// A cue was configured without any known frequency.
    #[error("Table de fréquences vide pour l'oracle {cue}")]
    EmptyCueTable {
        /// Cue label.
        cue: String,
    },

    /// Unknown cue label in a config file or on the command line.
    #[error("Oracle inconnu : {label}")]
    UnknownCue {
        /// The label that did not parse.
        label: String,
    },
}
