use crate::error::{FixError, Result};
use crate::model::event::*;
use log::debug;
use midly::{Format, MidiMessage, SmfBytemap, Timing, TrackEvent, TrackEventKind};

/// Decodes a Standard MIDI File into a [`MidiFile`]. Each track begins with a
/// [`EventKind::TrackStart`] marker, and every event keeps its track index,
/// delta time and whether it relied on running status.
pub fn decode(bytes: &[u8]) -> Result<MidiFile> {
    let smf = SmfBytemap::parse(bytes)?;

    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => {
            return Err(FixError::UnsupportedInputFile(
                "format 2 (sequential) MIDI files are not supported".into(),
            ));
        }
    };

    let division = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(_fps, _subframe) => {
            return Err(FixError::UnsupportedInputFile(
                "SMPTE timecode midi timing is not supported".into(),
            ));
        }
    };

    if division == 0 {
        return Err(FixError::MalformedInputFile(
            "header declares a division of 0 ticks per quarter note".into(),
        ));
    }

    debug!("Ticks per quarter note: {}", division);
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let mut tracks = Vec::with_capacity(smf.tracks.len());
    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut events = Vec::with_capacity(track.len() + 1);
        events.push(MidiEvent::new(track_index, 0, EventKind::TrackStart));

        for (raw, event) in track.iter() {
            events.push(decode_event(track_index, raw, event)?);
        }

        tracks.push(events);
    }

    Ok(MidiFile {
        format,
        division,
        tracks,
    })
}

/// `raw` holds the bytes of the event after its delta time. A leading data byte
/// (high bit clear) means the status byte was omitted.
fn decode_event(track_index: usize, raw: &[u8], event: &TrackEvent) -> Result<MidiEvent> {
    let running_status = raw.first().is_some_and(|status| status & 0x80 == 0);

    let kind = match &event.kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int() + 1;
            match message {
                MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                    channel,
                    pitch: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, vel } => EventKind::NoteOff {
                    channel,
                    pitch: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::Aftertouch { key, vel } => EventKind::PolyAftertouch {
                    channel,
                    pitch: key.as_int(),
                    pressure: vel.as_int(),
                },
                MidiMessage::Controller { controller, value } => EventKind::ControlChange {
                    channel,
                    controller: controller.as_int(),
                    value: value.as_int(),
                },
                MidiMessage::ProgramChange { program } => EventKind::ProgramChange {
                    channel,
                    program: program.as_int(),
                },
                MidiMessage::ChannelAftertouch { vel } => EventKind::ChannelAftertouch {
                    channel,
                    pressure: vel.as_int(),
                },
                MidiMessage::PitchBend { bend } => EventKind::PitchBend {
                    channel,
                    value: bend.0.as_int(),
                },
            }
        }
        TrackEventKind::SysEx(data) => EventKind::SysEx {
            bytes: data.to_vec(),
        },
        TrackEventKind::Escape(data) => EventKind::SysExContinuation {
            bytes: data.to_vec(),
        },
        TrackEventKind::Meta(_) => decode_meta(raw)?,
    };

    Ok(MidiEvent {
        track_index,
        delta_time: event.delta.as_int(),
        running_status,
        kind,
    })
}

/// Meta events are framed as `FF <type> <length: vlq> <payload>`. The payload
/// is taken from the wire as-is so it re-encodes byte for byte.
fn decode_meta(raw: &[u8]) -> Result<EventKind> {
    let malformed = || FixError::MalformedInputFile(format!("bad meta event framing {:02X?}", raw));

    let [0xFF, type_byte, rest @ ..] = raw else {
        return Err(malformed());
    };
    let (length, consumed) = read_vlq(rest).ok_or_else(malformed)?;
    let bytes = rest
        .get(consumed..consumed + length as usize)
        .ok_or_else(malformed)?
        .to_vec();

    Ok(EventKind::Meta {
        kind: MetaKind::from_type_byte(*type_byte),
        length,
        bytes,
    })
}

/// Reads a variable-length quantity (at most 4 bytes), returning the value and
/// the number of bytes it took.
pub(crate) fn read_vlq(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, byte) in bytes.iter().take(4).enumerate() {
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn vlq_lengths() {
        assert_eq!(read_vlq(&[0x00]), Some((0, 1)));
        assert_eq!(read_vlq(&[0x7F, 0x12]), Some((0x7F, 1)));
        assert_eq!(read_vlq(&[0x81, 0x00]), Some((0x80, 2)));
        assert_eq!(read_vlq(&[0xFF, 0xFF, 0xFF, 0x7F]), Some((0x0FFF_FFFF, 4)));
        assert_eq!(read_vlq(&[0x81]), None);
        assert_eq!(read_vlq(&[0x81, 0x80, 0x80, 0x80, 0x00]), None);
    }

    #[test]
    fn decode_two_track_file() {
        env_logger::try_init().unwrap_or(());

        let midi = smf_bytes(1, 480, &[&tempo_track(), &drum_track()]);
        let file = decode(&midi).unwrap();

        assert_eq!(file.format, 1);
        assert_eq!(file.division, 480);
        assert_eq!(file.tracks.len(), 2);

        let tempo = &file.tracks[0];
        assert_eq!(tempo[0].kind, EventKind::TrackStart);
        assert_eq!(
            tempo[1].kind,
            EventKind::Meta {
                kind: MetaKind::Tempo,
                length: 3,
                bytes: vec![0x07, 0xA1, 0x20]
            }
        );
        assert_eq!(
            tempo[2].kind,
            EventKind::SysEx {
                bytes: vec![0x7E, 0x7F, 0x09, 0x01, 0xF7]
            }
        );
        assert!(matches!(
            tempo[3].kind,
            EventKind::Meta {
                kind: MetaKind::EndOfTrack,
                ..
            }
        ));

        let drums = &file.tracks[1];
        assert!(drums.iter().all(|e| e.track_index == 1));
        assert_eq!(
            drums[1].kind,
            EventKind::meta(MetaKind::TrackName, b"Drums".to_vec())
        );
        assert_eq!(
            drums[2].kind,
            EventKind::NoteOn {
                channel: 10,
                pitch: 36,
                velocity: 100
            }
        );
        assert!(!drums[2].running_status);

        assert_eq!(drums[3].delta_time, 96);
        assert_eq!(
            drums[3].kind,
            EventKind::NoteOn {
                channel: 10,
                pitch: 36,
                velocity: 0
            }
        );
        assert!(drums[3].running_status);

        assert_eq!(
            drums[4].kind,
            EventKind::ControlChange {
                channel: 10,
                controller: 7,
                value: 100
            }
        );
        assert_eq!(
            drums[5].kind,
            EventKind::ControlChange {
                channel: 10,
                controller: 10,
                value: 64
            }
        );
        assert!(drums[5].running_status);
        assert_eq!(
            drums[6].kind,
            EventKind::ProgramChange {
                channel: 10,
                program: 0
            }
        );
        assert!(!drums[6].running_status);
    }

    #[test]
    fn decode_channel_messages() {
        let track = [
            0x00, 0xB9, 0x07, 0x64, // control change, channel 10
            0x00, 0xC0, 0x05, // program change, channel 1
            0x00, 0xE1, 0x00, 0x40, // pitch bend center, channel 2
            0x00, 0xD2, 0x33, // channel aftertouch, channel 3
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let file = decode(&smf_bytes(0, 96, &[&track])).unwrap();
        let kinds: Vec<_> = file.tracks[0].iter().map(|e| e.kind.clone()).collect();

        assert_eq!(
            kinds[1],
            EventKind::ControlChange {
                channel: 10,
                controller: 7,
                value: 100
            }
        );
        assert_eq!(
            kinds[2],
            EventKind::ProgramChange {
                channel: 1,
                program: 5
            }
        );
        assert_eq!(
            kinds[3],
            EventKind::PitchBend {
                channel: 2,
                value: 0x2000
            }
        );
        assert_eq!(
            kinds[4],
            EventKind::ChannelAftertouch {
                channel: 3,
                pressure: 0x33
            }
        );
    }

    #[test]
    fn reject_garbage() {
        assert!(matches!(
            decode(b"definitely not a midi file"),
            Err(FixError::MalformedInputFile(_))
        ));
    }

    #[test]
    fn reject_truncated_track() {
        let midi = smf_bytes(1, 480, &[&tempo_track(), &drum_track()]);
        let truncated = &midi[..midi.len() - 5];
        assert!(matches!(
            decode(truncated),
            Err(FixError::MalformedInputFile(_))
        ));
    }

    #[test]
    fn reject_oversized_track_length() {
        let mut midi = smf_bytes(1, 480, &[&tempo_track(), &drum_track()]);
        // first MTrk chunk starts right after the 14 byte header
        assert_eq!(&midi[14..18], b"MTrk");
        midi[18..22].copy_from_slice(&200u32.to_be_bytes());
        assert!(matches!(
            decode(&midi),
            Err(FixError::MalformedInputFile(_))
        ));
    }

    #[test]
    fn reject_smpte_timing() {
        let mut midi = smf_bytes(0, 96, &[&[0x00, 0xFF, 0x2F, 0x00]]);
        // -25 fps, 40 subframes
        midi[12] = 0xE7;
        midi[13] = 0x28;
        assert!(matches!(
            decode(&midi),
            Err(FixError::UnsupportedInputFile(_))
        ));
    }
}
