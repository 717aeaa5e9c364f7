//! Response assembly.
//!
//! Turns a match outcome into the localized payload and asks the
//! synthesizer for a spoken rendition. Synthesis is best effort: a failed
//! or disabled synthesizer leaves `audio_url` empty and nothing else.

use std::sync::Arc;

use tracing::{debug, warn};
use vet_symptoms_speech::{AudioHandle, SpeechError, Synthesizer};

use super::DiagnosisError;
use crate::dictionary::BilingualDictionary;
use crate::models::{DiagnosisResponse, MatchResult, Record};

/// Placeholder disease name on failure paths ("unknown").
pub const UNKNOWN_DISEASE: &str = "தெரியவில்லை";

/// Spoken when species and filters leave no records.
pub const NOT_FOUND_MESSAGE: &str = "இந்த விலங்கு தரவுத்தளத்தில் இல்லை";

/// Spoken when candidates exist but no symptom overlaps.
pub const NO_MATCH_MESSAGE: &str = "அறிகுறிகள் பொருந்தவில்லை";

/// Shown when the animal type is missing.
pub const MISSING_SPECIES_MESSAGE: &str = "விலங்கு வகையைத் தேர்ந்தெடுக்கவும்";

/// Shown when no symptom was given in any form.
pub const NO_SYMPTOMS_MESSAGE: &str = "அறிகுறிகளைச் சொல்லவும்";

/// Disease name used by the internal-fault payload.
pub const INTERNAL_ERROR_DISEASE: &str = "Error";

/// Builds [`DiagnosisResponse`] payloads.
pub struct ResultFormatter {
    dictionary: Arc<BilingualDictionary>,
    synthesizer: Arc<dyn Synthesizer>,
    language: String,
}

impl ResultFormatter {
    pub fn new(
        dictionary: Arc<BilingualDictionary>,
        synthesizer: Arc<dyn Synthesizer>,
        language: &str,
    ) -> Self {
        Self {
            dictionary,
            synthesizer,
            language: language.to_string(),
        }
    }

    /// Language code passed to the synthesizer.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn synthesizer(&self) -> Arc<dyn Synthesizer> {
        self.synthesizer.clone()
    }

    /// Format a scoring outcome. A missing record is the "no match" path.
    pub fn format(&self, result: &MatchResult, transcript: Option<String>) -> DiagnosisResponse {
        match &result.record {
            Some(record) => self.format_record(record, transcript),
            None => self.format_error(&DiagnosisError::NoMatch, transcript),
        }
    }

    /// Success payload for a selected record.
    pub fn format_record(&self, record: &Record, transcript: Option<String>) -> DiagnosisResponse {
        let disease = self.dictionary.translate_output(&record.disease_name);
        let medicine = record
            .medicine()
            .map(|m| self.dictionary.translate_output(m));
        let care: Vec<String> = record
            .care_instructions()
            .into_iter()
            .map(|c| self.dictionary.translate_output(c))
            .collect();
        let vet_required = self.dictionary.translate_output(&record.vet_required);

        let full_text = summary_sentence(
            &disease,
            medicine.as_deref(),
            &care,
            &record.recovery_days,
            &vet_required,
        );
        let audio_url = self.synthesize(&full_text).map(|h| h.url);

        let remedies = medicine.into_iter().chain(care).collect();

        DiagnosisResponse {
            transcribed_text: transcript,
            disease,
            remedies,
            recovery_days: record.recovery_days.clone(),
            vet_required,
            full_text,
            audio_url,
            error: None,
        }
    }

    /// Same-shape payload for a failure outcome.
    ///
    /// Not-found and no-match messages are also synthesized; input errors and
    /// internal faults are not.
    pub fn format_error(&self, error: &DiagnosisError, transcript: Option<String>) -> DiagnosisResponse {
        match error {
            DiagnosisError::NoCandidates { .. } => self.spoken_failure(
                NOT_FOUND_MESSAGE,
                "Animal/Details not found",
                transcript,
            ),
            DiagnosisError::NoMatch => {
                self.spoken_failure(NO_MATCH_MESSAGE, "No matching disease found", transcript)
            }
            DiagnosisError::MissingSpecies => DiagnosisResponse::failure(
                UNKNOWN_DISEASE,
                MISSING_SPECIES_MESSAGE.to_string(),
                format!("Invalid input: {}", error),
                transcript,
            ),
            DiagnosisError::NoSymptomInput => DiagnosisResponse::failure(
                UNKNOWN_DISEASE,
                NO_SYMPTOMS_MESSAGE.to_string(),
                format!("Invalid input: {}", error),
                transcript,
            ),
            DiagnosisError::Internal(detail) => {
                let message = format!("Server Error: {}", detail);
                DiagnosisResponse::failure(
                    INTERNAL_ERROR_DISEASE,
                    message.clone(),
                    message,
                    transcript,
                )
            }
        }
    }

    fn spoken_failure(
        &self,
        message: &str,
        detail: &str,
        transcript: Option<String>,
    ) -> DiagnosisResponse {
        let mut response = DiagnosisResponse::failure(
            UNKNOWN_DISEASE,
            message.to_string(),
            format!("{} ({})", message, detail),
            transcript,
        );
        response.audio_url = self.synthesize(message).map(|h| h.url);
        response
    }

    /// Synthesize `text`, logging and swallowing any failure.
    pub fn synthesize(&self, text: &str) -> Option<AudioHandle> {
        match self.synthesizer.synthesize(text, &self.language) {
            Ok(handle) => {
                debug!(
                    provider = self.synthesizer.provider_name(),
                    url = %handle.url,
                    "synthesized audio"
                );
                Some(handle)
            }
            Err(SpeechError::Disabled) => None,
            Err(e) => {
                warn!(
                    provider = self.synthesizer.provider_name(),
                    error = %e,
                    "speech synthesis failed"
                );
                None
            }
        }
    }
}

/// Compose the spoken summary of a diagnosis.
///
/// A missing medicine and an empty care list both render as "-".
pub fn summary_sentence(
    disease: &str,
    medicine: Option<&str>,
    care: &[String],
    recovery_days: &str,
    vet_required: &str,
) -> String {
    let care = if care.is_empty() {
        "-".to_string()
    } else {
        care.join(", ")
    };

    format!(
        "உங்கள் விலங்கிற்கு இருக்கும் நோய்: {}. மருந்து (Medicine): {}. பராமரிப்பு (Care): {}. முழுமையாக குணமாகும் நாட்கள்: {}. மருத்துவர் தேவை: {}.",
        disease,
        medicine.unwrap_or("-"),
        care,
        recovery_days,
        vet_required
    )
}
