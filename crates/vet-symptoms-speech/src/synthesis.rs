//! Text-to-speech seam and generated-audio storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{SpeechError, SpeechResult};

/// Handle to a generated audio artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioHandle {
    /// Unique artifact ID (never reused)
    pub id: String,
    /// URL the caller serves the file under (e.g., "/audio/response_<id>.mp3")
    pub url: String,
    /// Location on disk
    pub path: PathBuf,
    /// Creation timestamp
    pub created_at: String,
}

/// Converts text into playable audio.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, text: &str, language: &str) -> SpeechResult<AudioHandle>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

/// Directory of generated audio files, shared by all requests.
///
/// Every allocation gets a fresh v4 UUID, so concurrent requests never
/// collide. Nothing here deletes old files.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    url_prefix: String,
}

impl AudioStore {
    pub fn new<P: AsRef<Path>>(dir: P, url_prefix: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a new artifact location, creating the directory if needed.
    pub fn allocate(&self) -> SpeechResult<AudioHandle> {
        fs::create_dir_all(&self.dir)?;
        let id = Uuid::new_v4().to_string();
        let filename = format!("response_{}.mp3", id);
        Ok(AudioHandle {
            url: format!("{}/{}", self.url_prefix, filename),
            path: self.dir.join(&filename),
            id,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Allocate a new artifact and write `bytes` into it.
    pub fn write(&self, bytes: &[u8]) -> SpeechResult<AudioHandle> {
        let handle = self.allocate()?;
        fs::write(&handle.path, bytes)?;
        debug!(url = %handle.url, bytes = bytes.len(), "stored audio artifact");
        Ok(handle)
    }
}

/// Synthesizer used when speech output is switched off.
pub struct DisabledSynthesizer;

impl Synthesizer for DisabledSynthesizer {
    fn synthesize(&self, _text: &str, _language: &str) -> SpeechResult<AudioHandle> {
        Err(SpeechError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Synthesizer that stores the request text instead of audio (for testing).
///
/// Each call writes the UTF-8 text into a freshly allocated artifact and
/// remembers the `(text, language)` pair.
pub struct RecordingSynthesizer {
    store: AudioStore,
    requests: Mutex<Vec<(String, String)>>,
}

impl RecordingSynthesizer {
    pub fn new(store: AudioStore) -> Self {
        Self {
            store,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All `(text, language)` pairs seen so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Synthesizer for RecordingSynthesizer {
    fn synthesize(&self, text: &str, language: &str) -> SpeechResult<AudioHandle> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((text.to_string(), language.to_string()));
        }
        self.store.write(text.as_bytes())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Split text into pieces of at most `max_chars` characters.
///
/// Breaks on whitespace and closes a piece after sentence punctuation;
/// single words longer than the limit are cut by character.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        for piece in split_long_word(word, max_chars) {
            let piece_len = piece.chars().count();
            if current_len > 0 && current_len + 1 + piece_len > max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;

            if ends_sentence(&piece) {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long_word(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}

fn ends_sentence(piece: &str) -> bool {
    matches!(piece.chars().last(), Some('.' | '?' | '!' | '।'))
}
