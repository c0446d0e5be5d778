use anyhow::Result;
use clap::Parser;
use drumfix::{Args, FixError, FixOptions, fix_midi_file};
use log::{LevelFilter, debug, error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(if args.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let options = FixOptions::from(&args);
    debug!("Options: {:?}", options);

    for file in &args.files {
        debug!("Processing {}", file.display());

        match fix_midi_file(file, &options) {
            Ok(report) => info!(
                "Fixed '{}' -> '{}' (multiplier {})..!",
                file.display(),
                report.output.display(),
                report.multiplier
            ),
            Err(FixError::NoConversionNeeded) => {
                info!("No drum notes seen, not converting '{}'.", file.display());
                info!("Specify '-f' to still convert even without drum notes.");
            }
            Err(e) => error!(
                "Error processing '{}'; likely invalid/corrupt midi file: {}",
                file.display(),
                e
            ),
        }
    }

    Ok(())
}
