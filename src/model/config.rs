use clap::Parser;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "fixed";

#[derive(Parser, Debug)]
#[command(
    name = "drumfix",
    about = "Rewrite MIDI files so drum-practice players can load them!"
)]
pub struct Args {
    /// Paths to the MIDI files to fix.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Convert even if no drum events were found.
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Print debug messages.
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    /// Force the timing multiplier. Use '-m 1' to disable the multiplier.
    #[arg(short, long)]
    pub multiplier: Option<NonZeroU32>,

    /// Print a summary of the drums present.
    #[arg(short, long, default_value_t = false)]
    pub summary: bool,

    /// Use the original filenames as track names.
    #[arg(short, long, default_value_t = false)]
    pub use_filenames: bool,

    /// Keep the track names in the MIDI file. Overrides `--use-filenames`.
    #[arg(short, long, default_value_t = false)]
    pub no_trackname_change: bool,

    /// Output directory. Will be created if it doesn't exist.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

/// How the fixed file's track name is chosen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackNamePolicy {
    /// Derive a readable name from the file name, e.g. `BackInBlack.mid` -> `Back In Black`.
    #[default]
    Derived,

    /// Use the file name verbatim.
    Filename,

    /// Keep whatever track names the file already has.
    Keep,
}

impl TrackNamePolicy {
    pub fn resolve(use_filenames: bool, no_trackname_change: bool) -> Self {
        match (use_filenames, no_trackname_change) {
            (_, true) => TrackNamePolicy::Keep,
            (true, false) => TrackNamePolicy::Filename,
            (false, false) => TrackNamePolicy::Derived,
        }
    }
}

/// Resolved options for fixing a single file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FixOptions {
    pub force: bool,
    pub multiplier: Option<NonZeroU32>,
    pub summary: bool,
    pub track_name: TrackNamePolicy,
    pub output_dir: PathBuf,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            force: false,
            multiplier: None,
            summary: false,
            track_name: TrackNamePolicy::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl From<&Args> for FixOptions {
    fn from(args: &Args) -> Self {
        Self {
            force: args.force,
            multiplier: args.multiplier,
            summary: args.summary,
            track_name: TrackNamePolicy::resolve(args.use_filenames, args.no_trackname_change),
            output_dir: args.output_dir.clone(),
        }
    }
}
