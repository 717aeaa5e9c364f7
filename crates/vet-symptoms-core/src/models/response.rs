//! Response payload returned to callers.

use serde::{Deserialize, Serialize};

/// Localized diagnosis payload.
///
/// Success and failure share one shape: failure paths fill the same keys
/// with placeholder values and set `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    /// Transcript of the uploaded recording, or a failure placeholder
    pub transcribed_text: Option<String>,
    /// Localized disease name
    pub disease: String,
    /// Localized medicine followed by care instructions
    pub remedies: Vec<String>,
    /// Recovery duration
    pub recovery_days: String,
    /// Localized vet-required flag
    pub vet_required: String,
    /// Summary sentence (also the text sent to speech synthesis)
    pub full_text: String,
    /// Handle of the synthesized audio, if synthesis succeeded
    pub audio_url: Option<String>,
    /// Failure description; absent on success
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl DiagnosisResponse {
    /// Placeholder payload for a failure path.
    pub fn failure(
        disease: &str,
        full_text: String,
        error: String,
        transcribed_text: Option<String>,
    ) -> Self {
        Self {
            transcribed_text,
            disease: disease.to_string(),
            remedies: Vec::new(),
            recovery_days: "-".to_string(),
            vet_required: "-".to_string(),
            full_text,
            audio_url: None,
            error: Some(error),
        }
    }

    /// Check if a disease was identified.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
