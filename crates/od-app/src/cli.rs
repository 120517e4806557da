use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use od_core::config::{ChannelMode, WindowFunction};

/// oracle-decoder : détecte la séquence d'oracles dans l'audio du jeu.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Taille FFT (puissance de 2). Remplace la valeur du fichier.
    #[arg(long, global = true)]
    pub fft_size: Option<usize>,

    /// Tolérance de correspondance, en fraction de bin FFT.
    #[arg(long, global = true)]
    pub tolerance_bins: Option<f64>,

    /// Fenêtre d'analyse appliquée avant la FFT.
    #[arg(long, value_enum, global = true)]
    pub window: Option<WindowArg>,

    /// Lecture des canaux : flux entrelacé brut, ou moyenne par frame.
    #[arg(long, value_enum, global = true)]
    pub channels: Option<ChannelArg>,

    /// Sortie JSON au lieu du texte.
    #[arg(long, default_value_t = false, global = true)]
    pub json: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enregistre des sessions en boucle et décode chacune.
    ///
    /// Entrée démarre une session, Entrée l'arrête ; `q` quitte.
    Record {
        /// WAV de la session, écrasé à chaque session.
        #[arg(short, long, default_value = "oracles.wav")]
        output: PathBuf,

        /// Capturer le périphérique d'entrée au lieu du loopback de sortie.
        #[arg(long, default_value_t = false)]
        input: bool,
    },
    /// Décode un enregistrement existant (WAV, ou tout format lu par symphonia).
    Analyze {
        /// Chemin de l'enregistrement.
        file: PathBuf,
    },
}

/// CLI spelling of `WindowFunction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    Rectangular,
    Hann,
}

impl From<WindowArg> for WindowFunction {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Rectangular => WindowFunction::Rectangular,
            WindowArg::Hann => WindowFunction::Hann,
        }
    }
}

/// CLI spelling of `ChannelMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    Interleaved,
    Downmix,
}

impl From<ChannelArg> for ChannelMode {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Interleaved => ChannelMode::Interleaved,
            ChannelArg::Downmix => ChannelMode::Downmix,
        }
    }
}
