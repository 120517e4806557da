use std::io::BufRead;
use std::path::Path;
use std::thread;

use anyhow::Result;
use od_audio::capture::{CaptureSource, LoopbackRecorder};
use od_core::DecoderConfig;

use crate::pipeline::analyze_path;
use crate::report::render;

/// One line typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Entrée : démarrer ou arrêter une session.
    Toggle,
    Quit,
}

impl KeyCommand {
    #[must_use]
    pub fn from_line(line: &str) -> Self {
        if line.trim().eq_ignore_ascii_case("q") {
            KeyCommand::Quit
        } else {
            KeyCommand::Toggle
        }
    }

    /// `true` when `received` should end the session loop: an explicit quit,
    /// or a closed stdin.
    #[must_use]
    pub fn ends_loop(received: Option<Self>) -> bool {
        !matches!(received, Some(KeyCommand::Toggle))
    }
}

/// Forwards stdin lines as `KeyCommand`s. The channel closes at EOF.
fn spawn_stdin_reader(tx: flume::Sender<KeyCommand>) -> Result<()> {
    thread::Builder::new()
        .name("od-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(KeyCommand::from_line(&line)).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

/// Boucle interactive : enregistrer, décoder, afficher, recommencer.
///
/// Every session overwrites `output` and is decoded from an empty result
/// sequence.
///
/// # Errors
/// Returns an error if capture cannot start or the recording cannot be
/// written. A recording that fails to decode is reported and the loop
/// continues.
pub fn run_sessions(
    output: &Path,
    source: CaptureSource,
    config: &DecoderConfig,
    json: bool,
) -> Result<()> {
    let (tx, rx) = flume::unbounded();
    spawn_stdin_reader(tx)?;

    let mut session = 0usize;
    loop {
        println!("[Entrée] pour enregistrer les oracles, [q] pour quitter.");
        if KeyCommand::ends_loop(rx.recv().ok()) {
            break;
        }

        session += 1;
        let recorder = LoopbackRecorder::start(source)?;
        println!("Enregistrement de la session {session}... [Entrée] pour arrêter.");
        let (recording, stop) = recorder.record_until(output, &rx)?;
        println!("Enregistrement arrêté ({} frames).", recording.frames);

        match analyze_path(&recording.path, config) {
            Ok(report) => println!("{}", render(&recording.path, &report, json)?),
            Err(e) => log::error!("Analyse de la session {session} échouée : {e:#}"),
        }
        // `q` typed mid-recording stops the session and the loop.
        if KeyCommand::ends_loop(stop) {
            break;
        }
    }

    log::info!("{session} session(s) enregistrée(s)");
    Ok(())
}
