//! Speech-to-text seam.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{SpeechError, SpeechResult};

/// Container format of an uploaded recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    /// Browser MediaRecorder output
    Webm,
    Wav,
    Mp3,
    OggOpus,
}

impl AudioFormat {
    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::OggOpus => "audio/ogg",
        }
    }

    /// Guess the format from a file name extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "webm" => Some(Self::Webm),
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "ogg" | "opus" => Some(Self::OggOpus),
            _ => None,
        }
    }
}

/// A recording submitted with a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self { bytes, format }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of a successful transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text
    pub text: String,
    /// Detected language tag (e.g., "ta-IN")
    pub language: String,
}

/// Converts recorded speech into text.
///
/// `language_hint` is a BCP-47 tag such as "ta-IN". Implementations must
/// fail rather than hang; the caller has no cancellation hook.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, clip: &AudioClip, language_hint: &str) -> SpeechResult<Transcript>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

/// Transcriber that replays canned outcomes in order (for testing).
///
/// Once the script runs out every further call reports
/// [`SpeechError::NotUnderstood`].
pub struct ScriptedTranscriber {
    outcomes: Mutex<Vec<SpeechResult<Transcript>>>,
}

impl ScriptedTranscriber {
    pub fn new(outcomes: Vec<SpeechResult<Transcript>>) -> Self {
        let mut outcomes = outcomes;
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
        }
    }

    /// Always hears the same Tamil text.
    pub fn hearing(text: &str) -> Self {
        Self::new(vec![Ok(Transcript {
            text: text.to_string(),
            language: "ta-IN".to_string(),
        })])
    }

    /// Fails the first call with the given error.
    pub fn failing(error: SpeechError) -> Self {
        Self::new(vec![Err(error)])
    }
}

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&self, clip: &AudioClip, _language_hint: &str) -> SpeechResult<Transcript> {
        if clip.is_empty() {
            return Err(SpeechError::Audio("empty recording".into()));
        }
        let mut outcomes = self
            .outcomes
            .lock()
            .map_err(|e| SpeechError::Service(format!("lock poisoned: {}", e)))?;
        outcomes.pop().unwrap_or(Err(SpeechError::NotUnderstood))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
