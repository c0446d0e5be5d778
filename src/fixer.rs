use crate::analyzer::{Analysis, analyze};
use crate::codec::{decode, encode};
use crate::error::Result;
use crate::model::config::FixOptions;
use crate::transformer::transform;
use crate::util::{drum_summary, file_name_of};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// The result of fixing one file in memory.
#[derive(Debug, Clone)]
pub struct FixedMidi {
    pub bytes: Vec<u8>,
    pub analysis: Analysis,
    pub multiplier: u32,
}

#[derive(Debug, Clone)]
pub struct FixReport {
    pub output: PathBuf,
    pub analysis: Analysis,
    pub multiplier: u32,
}

/// Runs the whole pipeline over a MIDI byte stream: decode, analyze, transform, validate, encode.
/// `source_filename` is the input's file name and feeds the synthesized track name.
pub fn fix_midi_bytes(bytes: &[u8], source_filename: &str, options: &FixOptions) -> Result<FixedMidi> {
    let file = decode(bytes)?;
    let analysis = analyze(&file)?;

    let summary = drum_summary(&analysis);
    if options.summary {
        info!("Drum Count Summary");
        summary.iter().for_each(|line| info!("{}", line));
    } else {
        debug!("Drum Count Summary");
        summary.iter().for_each(|line| debug!("{}", line));
    }

    let transformed = transform(file, &analysis, options, source_filename)?;
    let bytes = encode(&transformed.file)?;

    Ok(FixedMidi {
        bytes,
        analysis,
        multiplier: transformed.multiplier,
    })
}

/// Fixes the MIDI file at `path` and writes the result into `options.output_dir`
/// under the same file name. Nothing is written unless the whole pipeline succeeds.
pub fn fix_midi_file<P: AsRef<Path>>(path: P, options: &FixOptions) -> Result<FixReport> {
    let path = path.as_ref();
    let source_filename = file_name_of(path);
    let bytes = fs::read(path)?;

    let fixed = fix_midi_bytes(&bytes, &source_filename, options)?;

    fs::create_dir_all(&options.output_dir)?;
    let output = options.output_dir.join(&source_filename);
    fs::write(&output, &fixed.bytes)?;
    debug!("Wrote file: {}", output.display());

    Ok(FixReport {
        output,
        analysis: fixed.analysis,
        multiplier: fixed.multiplier,
    })
}
