//! Text-to-speech through the public translate TTS endpoint.

use std::time::Duration;

use tracing::debug;

use crate::synthesis::{chunk_text, AudioHandle, AudioStore, Synthesizer};
use crate::{SpeechError, SpeechResult};

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// The endpoint rejects longer inputs.
const MAX_CHUNK_CHARS: usize = 100;

/// Synthesizer backed by the translate TTS endpoint (MP3 output).
pub struct GoogleTranslateTts {
    client: reqwest::blocking::Client,
    store: AudioStore,
}

impl GoogleTranslateTts {
    pub fn new(store: AudioStore, timeout: Duration) -> SpeechResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, store })
    }

    fn fetch_chunk(&self, chunk: &str, index: usize, total: usize, language: &str) -> SpeechResult<Vec<u8>> {
        let idx = index.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        let response = self
            .client
            .get(TTS_ENDPOINT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", chunk),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()?
            .error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

impl Synthesizer for GoogleTranslateTts {
    fn synthesize(&self, text: &str, language: &str) -> SpeechResult<AudioHandle> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::Service("nothing to synthesize".into()));
        }

        // MP3 frames are self-delimiting, so chunk outputs concatenate cleanly.
        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, index, chunks.len(), language)?);
        }
        debug!(chunks = chunks.len(), bytes = audio.len(), "synthesized speech");

        self.store.write(&audio)
    }

    fn provider_name(&self) -> &'static str {
        "google-translate-tts"
    }
}
