//! Standard MIDI File codec, built on `midly`.
//!
//! Decoding yields the crate's own [`MidiFile`](crate::MidiFile) model so the
//! analysis and transform passes never touch wire details. Encoding always
//! validates first.

mod decoder;
mod encoder;

pub use decoder::decode;
pub use encoder::{encode, validate};
