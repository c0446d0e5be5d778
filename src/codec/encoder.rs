use crate::error::{FixError, Result};
use crate::model::event::*;
use log::debug;
use midly::num::{u4, u7, u14, u15, u24, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, Track, TrackEvent, TrackEventKind};

const MAX_DIVISION: u16 = 0x7FFF;
const MAX_DELTA: u32 = 0x0FFF_FFFF;
const MAX_PITCH_BEND: u16 = 0x3FFF;

/// Validates `file` and serializes it. Nothing is returned unless the whole
/// file passes [`validate`].
pub fn encode(file: &MidiFile) -> Result<Vec<u8>> {
    validate(file)?;

    let format = match file.format {
        0 => Format::SingleTrack,
        _ => Format::Parallel,
    };
    let header = Header::new(format, Timing::Metrical(u15::from(file.division)));
    let tracks: Vec<Track> = file.tracks.iter().map(|events| encode_track(events)).collect();

    let smf = Smf { header, tracks };
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| FixError::InvalidOutputFile(format!("Failed to write MIDI: {}", e)))?;

    debug!(
        "Encoded {} track(s) into {} bytes..!",
        file.tracks.len(),
        bytes.len()
    );

    Ok(bytes)
}

/// Track framing is owned by the encoder: `TrackStart` markers produce no
/// bytes, and `EndOfTrack` metas are folded away (their delta carries into the
/// next event) so that exactly one terminates the track.
fn encode_track(events: &[MidiEvent]) -> Track<'_> {
    let mut track = Track::new();
    let mut carried: u32 = 0;

    for event in events {
        let kind = match &event.kind {
            EventKind::Header { .. } | EventKind::TrackStart => None,
            EventKind::Meta {
                kind: MetaKind::EndOfTrack,
                ..
            } => None,
            EventKind::NoteOn {
                channel,
                pitch,
                velocity,
            } => Some(midi(
                *channel,
                MidiMessage::NoteOn {
                    key: u7::from(*pitch),
                    vel: u7::from(*velocity),
                },
            )),
            EventKind::NoteOff {
                channel,
                pitch,
                velocity,
            } => Some(midi(
                *channel,
                MidiMessage::NoteOff {
                    key: u7::from(*pitch),
                    vel: u7::from(*velocity),
                },
            )),
            EventKind::PolyAftertouch {
                channel,
                pitch,
                pressure,
            } => Some(midi(
                *channel,
                MidiMessage::Aftertouch {
                    key: u7::from(*pitch),
                    vel: u7::from(*pressure),
                },
            )),
            EventKind::ControlChange {
                channel,
                controller,
                value,
            } => Some(midi(
                *channel,
                MidiMessage::Controller {
                    controller: u7::from(*controller),
                    value: u7::from(*value),
                },
            )),
            EventKind::ProgramChange { channel, program } => Some(midi(
                *channel,
                MidiMessage::ProgramChange {
                    program: u7::from(*program),
                },
            )),
            EventKind::ChannelAftertouch { channel, pressure } => Some(midi(
                *channel,
                MidiMessage::ChannelAftertouch {
                    vel: u7::from(*pressure),
                },
            )),
            EventKind::PitchBend { channel, value } => Some(midi(
                *channel,
                MidiMessage::PitchBend {
                    bend: PitchBend(u14::from(*value)),
                },
            )),
            EventKind::SysEx { bytes } => Some(TrackEventKind::SysEx(bytes)),
            EventKind::SysExContinuation { bytes } => Some(TrackEventKind::Escape(bytes)),
            EventKind::Meta { kind, bytes, .. } => Some(TrackEventKind::Meta(match kind {
                MetaKind::TrackName => MetaMessage::TrackName(bytes),
                // validated as 3 bytes already
                MetaKind::Tempo => {
                    MetaMessage::Tempo(u24::from(tempo_from_bytes(bytes).unwrap_or_default()))
                }
                other => MetaMessage::Unknown(other.type_byte(), bytes),
            })),
        };

        let delta = carried.saturating_add(event.delta_time).min(MAX_DELTA);
        match kind {
            Some(kind) => {
                track.push(TrackEvent {
                    delta: u28::from(delta),
                    kind,
                });
                carried = 0;
            }
            None => carried = delta,
        }
    }

    track.push(TrackEvent {
        delta: u28::from(carried),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    track
}

fn midi(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::from(channel - 1),
        message,
    }
}

/// Checks that `file` can be written without producing an inconsistent SMF.
pub fn validate(file: &MidiFile) -> Result<()> {
    let invalid = |reason: String| Err(FixError::InvalidOutputFile(reason));

    if file.format > 1 {
        return invalid(format!("unsupported format {}", file.format));
    }
    if file.division == 0 || file.division > MAX_DIVISION {
        return invalid(format!("division {} out of range", file.division));
    }
    if file.format == 0 && file.tracks.len() != 1 {
        return invalid(format!(
            "format 0 requires exactly one track, found {}",
            file.tracks.len()
        ));
    }

    for (track_index, events) in file.tracks.iter().enumerate() {
        match events.first() {
            Some(MidiEvent {
                kind: EventKind::TrackStart,
                ..
            }) => {}
            _ => return invalid(format!("track {} does not begin with a track start", track_index)),
        }

        for (i, event) in events.iter().enumerate() {
            if event.track_index != track_index {
                return invalid(format!(
                    "event {} of track {} claims track index {}",
                    i, track_index, event.track_index
                ));
            }
            if event.delta_time > MAX_DELTA {
                return invalid(format!(
                    "event {} of track {} has delta time {} out of range",
                    i, track_index, event.delta_time
                ));
            }
            validate_kind(&event.kind).map_err(|reason| {
                FixError::InvalidOutputFile(format!(
                    "event {} of track {}: {}",
                    i, track_index, reason
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_kind(kind: &EventKind) -> std::result::Result<(), String> {
    if let Some(channel) = kind.channel() {
        if !(1..=16).contains(&channel) {
            return Err(format!("channel {} out of range", channel));
        }
    }

    let data = match kind {
        EventKind::Header { .. } => return Err("header inside a track".into()),
        EventKind::NoteOn { pitch, velocity, .. } | EventKind::NoteOff { pitch, velocity, .. } => {
            vec![*pitch, *velocity]
        }
        EventKind::PolyAftertouch { pitch, pressure, .. } => vec![*pitch, *pressure],
        EventKind::ControlChange {
            controller, value, ..
        } => vec![*controller, *value],
        EventKind::ProgramChange { program, .. } => vec![*program],
        EventKind::ChannelAftertouch { pressure, .. } => vec![*pressure],
        EventKind::PitchBend { value, .. } if *value > MAX_PITCH_BEND => {
            return Err(format!("pitch bend {:#06X} out of range", value));
        }
        EventKind::Meta {
            kind,
            length,
            bytes,
        } => {
            if *length as usize != bytes.len() {
                return Err(format!(
                    "meta {:?} declares length {} but carries {} bytes",
                    kind,
                    length,
                    bytes.len()
                ));
            }
            if *kind == MetaKind::Tempo && !tempo_from_bytes(bytes).is_some_and(|t| t > 0) {
                return Err(format!("invalid tempo payload {:02X?}", bytes));
            }
            if MetaKind::from_type_byte(kind.type_byte()) != *kind || kind.type_byte() > 0x7F {
                return Err(format!("invalid meta type {:#04X}", kind.type_byte()));
            }
            vec![]
        }
        _ => vec![],
    };

    match data.iter().find(|byte| **byte > 0x7F) {
        Some(byte) => Err(format!("data byte {:#04X} out of range", byte)),
        None => Ok(()),
    }
}
