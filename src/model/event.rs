use serde::{Deserialize, Serialize};

/// The human-facing (1-indexed) General MIDI percussion channel.
pub const PERCUSSION_CHANNEL: u8 = 10;

const META_TRACK_NAME: u8 = 0x03;
const META_END_OF_TRACK: u8 = 0x2F;
const META_TEMPO: u8 = 0x51;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    TrackName,
    Tempo,
    EndOfTrack,
    /// Any other meta event, keyed by its type byte.
    Other(u8),
}

impl MetaKind {
    pub fn from_type_byte(type_byte: u8) -> Self {
        match type_byte {
            META_TRACK_NAME => MetaKind::TrackName,
            META_TEMPO => MetaKind::Tempo,
            META_END_OF_TRACK => MetaKind::EndOfTrack,
            other => MetaKind::Other(other),
        }
    }

    pub fn type_byte(&self) -> u8 {
        match self {
            MetaKind::TrackName => META_TRACK_NAME,
            MetaKind::Tempo => META_TEMPO,
            MetaKind::EndOfTrack => META_END_OF_TRACK,
            MetaKind::Other(type_byte) => *type_byte,
        }
    }
}

/// What an event does. Channels are 1-indexed here; the codec shifts them to
/// the 0-indexed wire value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Header chunk. Only ever appears at the head of a file's event stream.
    Header { format: u16, division: u16 },

    /// Marks the beginning of a track chunk.
    TrackStart,

    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    PolyAftertouch { channel: u8, pitch: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// Raw 14-bit bend value, 0x2000 is centered.
    PitchBend { channel: u8, value: u16 },

    SysEx { bytes: Vec<u8> },
    SysExContinuation { bytes: Vec<u8> },

    /// `length` is the declared length field and must match `bytes.len()` to be written.
    Meta { kind: MetaKind, length: u32, bytes: Vec<u8> },
}

impl EventKind {
    /// Builds a meta event whose declared length matches its payload.
    pub fn meta(kind: MetaKind, bytes: Vec<u8>) -> Self {
        EventKind::Meta {
            kind,
            length: bytes.len() as u32,
            bytes,
        }
    }

    pub fn channel(&self) -> Option<u8> {
        match self {
            EventKind::NoteOn { channel, .. }
            | EventKind::NoteOff { channel, .. }
            | EventKind::PolyAftertouch { channel, .. }
            | EventKind::ControlChange { channel, .. }
            | EventKind::ProgramChange { channel, .. }
            | EventKind::ChannelAftertouch { channel, .. }
            | EventKind::PitchBend { channel, .. } => Some(*channel),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    pub track_index: usize,
    pub delta_time: u32,
    /// Whether the status byte was omitted on the wire.
    pub running_status: bool,
    pub kind: EventKind,
}

impl MidiEvent {
    pub fn new(track_index: usize, delta_time: u32, kind: EventKind) -> Self {
        Self {
            track_index,
            delta_time,
            running_status: false,
            kind,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    /// 0 for a single track, 1 for simultaneous tracks.
    pub format: u16,
    /// Ticks per quarter note.
    pub division: u16,
    pub tracks: Vec<Vec<MidiEvent>>,
}

impl MidiFile {
    pub fn header(&self) -> MidiEvent {
        MidiEvent::new(
            0,
            0,
            EventKind::Header {
                format: self.format,
                division: self.division,
            },
        )
    }

    /// Every track event in file order, without the header.
    pub fn events(&self) -> impl Iterator<Item = &MidiEvent> {
        self.tracks.iter().flatten()
    }

    /// The full event stream: the header followed by every track event in file order.
    pub fn into_stream(self) -> impl Iterator<Item = MidiEvent> {
        std::iter::once(self.header()).chain(self.tracks.into_iter().flatten())
    }
}

/// Decodes a tempo payload into microseconds per quarter note.
/// Returns `None` unless the payload is exactly 3 bytes.
pub fn tempo_from_bytes(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b, c] => Some(((*a as u32) << 16) | ((*b as u32) << 8) | *c as u32),
        _ => None,
    }
}

/// Encodes microseconds per quarter note as a 3 byte big-endian payload.
pub fn tempo_to_bytes(us_per_quarter: u32) -> [u8; 3] {
    let [_, a, b, c] = us_per_quarter.to_be_bytes();
    [a, b, c]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tempo_round_trip_is_identity() {
        for tempo in [1, 0xFF, 0x100, 500_000, 0x7F_FFFF, 0xFF_FFFF] {
            assert_eq!(tempo_from_bytes(&tempo_to_bytes(tempo)), Some(tempo));
        }
        assert_eq!(tempo_to_bytes(500_000), [0x07, 0xA1, 0x20]);
    }

    #[test]
    fn tempo_requires_three_bytes() {
        assert_eq!(tempo_from_bytes(&[0x07, 0xA1]), None);
        assert_eq!(tempo_from_bytes(&[0x00, 0x07, 0xA1, 0x20]), None);
    }

    #[test]
    fn meta_kind_type_bytes() {
        assert_eq!(MetaKind::from_type_byte(0x03), MetaKind::TrackName);
        assert_eq!(MetaKind::from_type_byte(0x51), MetaKind::Tempo);
        assert_eq!(MetaKind::from_type_byte(0x58), MetaKind::Other(0x58));
        assert_eq!(MetaKind::Other(0x58).type_byte(), 0x58);
    }

    #[test]
    fn stream_starts_with_header() {
        let file = MidiFile {
            format: 1,
            division: 96,
            tracks: vec![
                vec![MidiEvent::new(0, 0, EventKind::TrackStart)],
                vec![MidiEvent::new(1, 0, EventKind::TrackStart)],
            ],
        };

        let stream: Vec<_> = file.into_stream().collect();
        assert_eq!(stream.len(), 3);
        assert_eq!(
            stream[0].kind,
            EventKind::Header {
                format: 1,
                division: 96
            }
        );
        assert_eq!(stream[2].track_index, 1);
    }
}
