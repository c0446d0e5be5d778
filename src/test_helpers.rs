/// Assembles a Standard MIDI File from raw track bodies (everything after each `MTrk` length).
pub fn smf_bytes(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());

    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }

    bytes
}

/// Conductor track: tempo 500000us/qn (120bpm), a GM reset sysex, end of track.
pub fn tempo_track() -> Vec<u8> {
    vec![
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, //
        0x00, 0xF0, 0x05, 0x7E, 0x7F, 0x09, 0x01, 0xF7, //
        0x00, 0xFF, 0x2F, 0x00,
    ]
}

/// Drum track: a track name, one kick on channel 10 and its release by running status,
/// then channel 10 volume, pan (running status) and a program change.
pub fn drum_track() -> Vec<u8> {
    vec![
        0x00, 0xFF, 0x03, 0x05, b'D', b'r', b'u', b'm', b's', //
        0x00, 0x99, 0x24, 0x64, //
        0x60, 0x24, 0x00, //
        0x00, 0xB9, 0x07, 0x64, //
        0x00, 0x0A, 0x40, //
        0x00, 0xC9, 0x00, //
        0x00, 0xFF, 0x2F, 0x00,
    ]
}
