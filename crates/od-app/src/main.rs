use anyhow::Result;
use clap::Parser;
use od_audio::capture::CaptureSource;

pub mod cli;
pub mod pipeline;
pub mod record;
pub mod report;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger et valider la config (fatal si invalide)
    let config = pipeline::resolve_config(&cli)?;
    log::info!(
        "Config : FFT {}, tolérance {} bin, fenêtre {:?}",
        config.fft_size,
        config.tolerance_bins,
        config.window
    );

    match &cli.command {
        cli::Command::Record { output, input } => {
            let source = if *input {
                CaptureSource::Input
            } else {
                CaptureSource::Loopback
            };
            record::run_sessions(output, source, &config, cli.json)
        }
        cli::Command::Analyze { file } => {
            let report = pipeline::analyze_path(file, &config)?;
            println!("{}", report::render(file, &report, cli.json)?);
            Ok(())
        }
    }
}
