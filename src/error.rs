use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed MIDI file: {0}")]
    MalformedInputFile(String),

    #[error("Unsupported MIDI file: {0}")]
    UnsupportedInputFile(String),

    #[error("Malformed tempo event, expected 3 non-zero bytes but got {0:02X?}")]
    MalformedTempoEvent(Vec<u8>),

    #[error("No drum notes seen")]
    NoConversionNeeded,

    #[error("Refusing to write invalid MIDI file: {0}")]
    InvalidOutputFile(String),
}

impl From<midly::Error> for FixError {
    fn from(e: midly::Error) -> Self {
        FixError::MalformedInputFile(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FixError>;
