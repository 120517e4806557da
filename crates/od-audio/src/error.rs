use od_core::CoreError;
use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio input device found.
    #[error("Aucun périphérique audio d'entrée trouvé")]
    NoInputDevice,

    /// No audio output device found (needed for loopback capture).
    #[error("Aucun périphérique audio de sortie trouvé")]
    NoOutputDevice,

    /// Unsupported audio format.
    #[error("Format audio non supporté : {0}")]
    UnsupportedFormat(String),

    /// Audio stream error.
    #[error("Erreur de stream audio : {0}")]
    StreamError(String),

    /// WAV container error.
    #[error("Erreur WAV : {0}")]
    Wav(#[from] hound::Error),

    /// Read error on the PCM stream.
    #[error("Erreur de lecture PCM : {0}")]
    Io(#[from] std::io::Error),

    /// Invalid decoder configuration.
    #[error(transparent)]
    Config(#[from] CoreError),
}
