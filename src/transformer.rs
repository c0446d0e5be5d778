use crate::analyzer::Analysis;
use crate::error::{FixError, Result};
use crate::model::config::{FixOptions, TrackNamePolicy};
use crate::model::controls::{controller_name, program_name};
use crate::model::event::*;
use crate::util::derive_track_name;
use log::debug;
use std::num::NonZeroU32;

/// Songs slower than this get their grid expanded.
const EXPAND_BELOW_BPM: u32 = 140;
const EXPANSION_MULTIPLIER: NonZeroU32 = NonZeroU32::new(2).unwrap();

/// Everything the per-event rewrite needs, resolved once per file.
#[derive(Debug, Clone)]
pub struct Rewriter {
    pub multiplier: NonZeroU32,
    /// Payload of the track name written after each track start, `None` to keep the file's own.
    pub track_name: Option<Vec<u8>>,
}

/// What a single input event turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Drop,
    Emit(MidiEvent),
    /// A track start followed by its synthesized track name.
    EmitNamed(MidiEvent, MidiEvent),
    /// The header's new division. Headers are not track events.
    Division(u16),
}

/// An explicit multiplier always wins. Otherwise songs under 140bpm are
/// expanded by 2, and files without any tempo are left alone.
pub fn resolve_multiplier(analysis: &Analysis, multiplier: Option<NonZeroU32>) -> NonZeroU32 {
    match (multiplier, analysis.max_tempo_bpm) {
        (Some(multiplier), _) => multiplier,
        (None, Some(bpm)) if bpm < EXPAND_BELOW_BPM => EXPANSION_MULTIPLIER,
        (None, _) => NonZeroU32::MIN,
    }
}

/// A collapsed file along with the multiplier that was applied to it.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub file: MidiFile,
    pub multiplier: u32,
}

pub fn track_name_for(policy: TrackNamePolicy, source_filename: &str) -> Option<Vec<u8>> {
    match policy {
        TrackNamePolicy::Derived => Some(derive_track_name(source_filename).into_bytes()),
        TrackNamePolicy::Filename => Some(source_filename.as_bytes().to_vec()),
        TrackNamePolicy::Keep => None,
    }
}

impl Rewriter {
    pub fn new(analysis: &Analysis, options: &FixOptions, source_filename: &str) -> Self {
        let rewriter = Self {
            multiplier: resolve_multiplier(analysis, options.multiplier),
            track_name: track_name_for(options.track_name, source_filename),
        };

        debug!("Multiplier set to {}", rewriter.multiplier);
        if let Some(name) = &rewriter.track_name {
            debug!("Setting TRACK_NAME to {}", String::from_utf8_lossy(name));
        }

        rewriter
    }

    /// Rewrites one event of the input stream. Every surviving event is moved to track 0.
    pub fn rewrite(&self, event: MidiEvent) -> Result<Rewrite> {
        let event = MidiEvent {
            track_index: 0,
            ..event
        };

        let rewrite = match &event.kind {
            EventKind::Header { division, .. } => {
                Rewrite::Division((*division as u32 / self.multiplier.get()) as u16)
            }
            EventKind::TrackStart => match &self.track_name {
                Some(name) => {
                    let named = MidiEvent::new(
                        0,
                        event.delta_time,
                        EventKind::meta(MetaKind::TrackName, name.clone()),
                    );
                    Rewrite::EmitNamed(event, named)
                }
                None => Rewrite::Emit(event),
            },
            EventKind::Meta {
                kind: MetaKind::Tempo,
                bytes,
                ..
            } => {
                let us_per_quarter = tempo_from_bytes(bytes)
                    .ok_or_else(|| FixError::MalformedTempoEvent(bytes.clone()))?;
                let scaled = tempo_to_bytes(us_per_quarter / self.multiplier.get()).to_vec();
                Rewrite::Emit(MidiEvent {
                    kind: EventKind::meta(MetaKind::Tempo, scaled),
                    ..event
                })
            }
            EventKind::ControlChange {
                channel: PERCUSSION_CHANNEL,
                controller,
                value,
            } => {
                debug!(
                    "skip CONTROL_CHANGE: '{}' ({}) value: {} {}",
                    controller_name(*controller).unwrap_or("Undefined"),
                    controller,
                    value,
                    running_label(&event)
                );
                Rewrite::Drop
            }
            EventKind::ProgramChange {
                channel: PERCUSSION_CHANNEL,
                program,
            } => {
                debug!(
                    "skip PROGRAM_CHANGE: '{}' ({}) {}",
                    program_name(*program).unwrap_or("Unknown"),
                    program + 1,
                    running_label(&event)
                );
                Rewrite::Drop
            }
            EventKind::SysEx { bytes } | EventKind::SysExContinuation { bytes } => {
                debug!("skip SYSEX ({} bytes)", bytes.len());
                Rewrite::Drop
            }
            EventKind::NoteOn { .. }
            | EventKind::NoteOff { .. }
            | EventKind::PolyAftertouch { .. }
            | EventKind::ControlChange { .. }
            | EventKind::ProgramChange { .. }
            | EventKind::ChannelAftertouch { .. }
            | EventKind::PitchBend { .. }
            | EventKind::Meta { .. } => Rewrite::Emit(event),
        };

        Ok(rewrite)
    }
}

fn running_label(event: &MidiEvent) -> &'static str {
    if event.running_status { "[running]" } else { "" }
}

/// Second pass: collapses `file` into a single format 0 track, scaling tempo and
/// division by the resolved multiplier and dropping events drum players choke on.
pub fn transform(
    file: MidiFile,
    analysis: &Analysis,
    options: &FixOptions,
    source_filename: &str,
) -> Result<Transformed> {
    if !analysis.has_drum_notes && !options.force {
        return Err(FixError::NoConversionNeeded);
    }

    let rewriter = Rewriter::new(analysis, options, source_filename);
    let mut division = file.division;
    let mut events = Vec::with_capacity(file.events().count() + file.tracks.len());

    for event in file.into_stream() {
        match rewriter.rewrite(event)? {
            Rewrite::Drop => {}
            Rewrite::Emit(event) => events.push(event),
            Rewrite::EmitNamed(event, named) => {
                events.push(event);
                events.push(named);
            }
            Rewrite::Division(scaled) => division = scaled,
        }
    }

    Ok(Transformed {
        file: MidiFile {
            format: 0,
            division,
            tracks: vec![events],
        },
        multiplier: rewriter.multiplier.get(),
    })
}
