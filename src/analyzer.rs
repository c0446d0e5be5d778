use crate::error::{FixError, Result};
use crate::model::event::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MICROSECONDS_PER_MINUTE: u32 = 60_000_000;

/// What the first pass learned about a file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Fastest tempo anywhere in the file, `None` when the file has no tempo events.
    pub max_tempo_bpm: Option<u32>,
    pub has_drum_notes: bool,
    /// Sounding notes on the percussion channel, keyed by pitch.
    pub drum_counts: BTreeMap<u8, u32>,
}

impl Analysis {
    /// Drum pitches and their counts, most frequent first.
    pub fn drums_by_count(&self) -> Vec<(u8, u32)> {
        let mut drums: Vec<(u8, u32)> = self.drum_counts.iter().map(|(p, c)| (*p, *c)).collect();
        drums.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        drums
    }
}

/// Reads the tempo payload of a meta event as beats per minute.
pub fn tempo_bpm(bytes: &[u8]) -> Result<u32> {
    match tempo_from_bytes(bytes) {
        Some(us_per_quarter) if us_per_quarter > 0 => Ok(MICROSECONDS_PER_MINUTE / us_per_quarter),
        _ => Err(FixError::MalformedTempoEvent(bytes.to_vec())),
    }
}

/// Scans every track for the maximum tempo and for sounding percussion notes.
pub fn analyze(file: &MidiFile) -> Result<Analysis> {
    let mut analysis = Analysis::default();

    for event in file.events() {
        match &event.kind {
            EventKind::Meta {
                kind: MetaKind::Tempo,
                bytes,
                ..
            } => {
                let bpm = tempo_bpm(bytes)?;
                debug!("Tempo: {} (track {})", bpm, event.track_index);
                analysis.max_tempo_bpm = analysis.max_tempo_bpm.max(Some(bpm));
            }
            // velocity 0 is a note off
            EventKind::NoteOn {
                channel: PERCUSSION_CHANNEL,
                pitch,
                velocity,
            } if *velocity > 0 => {
                analysis.has_drum_notes = true;
                *analysis.drum_counts.entry(*pitch).or_default() += 1;
            }
            _ => {}
        }
    }

    Ok(analysis)
}
