use std::path::Path;

use anyhow::Result;
use od_audio::session::SessionReport;
use od_core::CueSequence;
use serde::Serialize;

/// JSON shape of one decoded session.
#[derive(Serialize)]
struct SessionJson<'a> {
    source: String,
    sequence: &'a CueSequence,
    windows: usize,
    confirmations: usize,
}

/// Formats a session result for the terminal.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn render(source: &Path, report: &SessionReport, json: bool) -> Result<String> {
    if json {
        let payload = SessionJson {
            source: source.display().to_string(),
            sequence: &report.sequence,
            windows: report.windows,
            confirmations: report.confirmations,
        };
        return Ok(serde_json::to_string(&payload)?);
    }
    Ok(format!("Oracles : {}", report.sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_core::Cue;

    fn report() -> SessionReport {
        let mut sequence = CueSequence::new();
        sequence.push(Cue::R2);
        sequence.push(Cue::M);
        SessionReport {
            sequence,
            windows: 40,
            confirmations: 3,
        }
    }

    #[test]
    fn text_lists_cues_in_order() {
        let text = render(Path::new("oracles.wav"), &report(), false).unwrap();
        assert_eq!(text, "Oracles : R2 -> M");
    }

    #[test]
    fn text_for_empty_session() {
        let text = render(Path::new("oracles.wav"), &SessionReport::default(), false).unwrap();
        assert_eq!(text, "Oracles : (none)");
    }

    #[test]
    fn json_has_sequence_array() {
        let text = render(Path::new("oracles.wav"), &report(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["sequence"], serde_json::json!(["R2", "M"]));
        assert_eq!(value["windows"], 40);
        assert_eq!(value["source"], "oracles.wav");
    }
}
