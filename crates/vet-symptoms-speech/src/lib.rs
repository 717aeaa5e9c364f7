//! Speech collaborators for the symptom lookup service.
//!
//! The lookup engine treats speech as two black boxes: audio in, text out
//! ([`Transcriber`]) and text in, playable audio out ([`Synthesizer`]). This
//! crate defines those seams, the on-disk store for generated audio, and the
//! implementations the service ships with.

pub mod synthesis;
pub mod transcription;

#[cfg(feature = "http-tts")]
pub mod google_tts;

pub use synthesis::*;
pub use transcription::*;

#[cfg(feature = "http-tts")]
pub use google_tts::GoogleTranslateTts;

use thiserror::Error;

/// Speech errors.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech was not understood")]
    NotUnderstood,

    #[error("Speech service request failed: {0}")]
    Service(String),

    #[error("Audio decoding failed: {0}")]
    Audio(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Synthesis is disabled")]
    Disabled,

    #[cfg(feature = "http-tts")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type SpeechResult<T> = Result<T, SpeechError>;

impl SpeechError {
    /// Text shown in place of a transcript when transcription fails.
    ///
    /// The request keeps going with whatever typed fields it carried, so the
    /// placeholder tells the caller why the spoken part was dropped.
    pub fn transcript_placeholder(&self) -> String {
        match self {
            SpeechError::NotUnderstood => "(Not understood / புரியவில்லை)".to_string(),
            SpeechError::Service(_) => "(API Error / பிழை)".to_string(),
            other => format!("(Audio Error: {})", other),
        }
    }
}
