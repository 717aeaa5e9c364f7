//! Vet-Symptoms Core Library
//!
//! Symptom-to-diagnosis lookup for livestock and pets, answering in Tamil.
//!
//! # Architecture
//!
//! ```text
//! Audio ─► Transcription ─┐
//!                         ▼
//! Slots / Free text ─► Normalization ─► canonical symptom set
//!                                               │
//! Species, breed, age, sex ─► Record Filter ─► candidates
//!                                               │
//!                                            Scoring
//!                                               │
//!                             ┌─────────────────▼─────────────────┐
//!                             │         Result Formatter          │
//!                             │  translate fields, summary text   │
//!                             └─────────────────┬─────────────────┘
//!                                               │
//!                               ┌───────────────┴───────────────┐
//!                               ▼                               ▼
//!                        Response payload               Speech synthesis
//!                                                        (audio handle)
//! ```
//!
//! # Core Principle
//!
//! **Every request gets a payload.** Missing input, unknown animals, unmatched
//! symptoms and internal faults all come back in the success shape with
//! placeholder values and an `error` field.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Record, NormalizedQuery, MatchResult, DiagnosisResponse)
//! - [`dictionary`]: Bilingual symptom and output tables
//! - [`resolver`]: Normalizer, record filter, scorer and formatter
//! - [`dataset`]: CSV record table loader
//! - [`service`]: Request orchestration
//! - [`prompts`]: Guided conversation prompts
//! - [`config`]: TOML service configuration
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod dataset;
pub mod dictionary;
pub mod logging;
pub mod models;
pub mod prompts;
pub mod resolver;
pub mod service;

// Re-export commonly used types
pub use config::{ServiceConfig, SpeechConfig};
pub use dataset::RecordTable;
pub use dictionary::BilingualDictionary;
pub use models::{DiagnosisResponse, MatchResult, NormalizedQuery, Record, SymptomInput};
pub use prompts::{Conversation, ConversationStep};
pub use resolver::{DiagnosisError, RecordFilter, Resolver, SymptomNormalizer, SymptomScorer};
pub use service::{DiagnosisRequest, DiagnosisService};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use vet_symptoms_speech::{AudioClip, AudioFormat, AudioHandle};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VetSymptomsError {
    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Speech error: {0}")]
    SpeechError(String),
}

impl From<service::ServiceError> for VetSymptomsError {
    fn from(e: service::ServiceError) -> Self {
        match e {
            service::ServiceError::Dataset(e) => VetSymptomsError::DatasetError(e.to_string()),
            service::ServiceError::Config(e) => VetSymptomsError::ConfigError(e.to_string()),
            service::ServiceError::Dictionary(e) => VetSymptomsError::ConfigError(e.to_string()),
            service::ServiceError::Speech(e) => VetSymptomsError::SpeechError(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for VetSymptomsError {
    fn from(e: config::ConfigError) -> Self {
        VetSymptomsError::ConfigError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a service from a TOML configuration file.
#[uniffi::export]
pub fn open_service(config_path: String) -> Result<Arc<VetSymptomsService>, VetSymptomsError> {
    let config = ServiceConfig::load(&config_path)?;
    logging::init_logging(&config.log_filter);
    let service = DiagnosisService::from_config(&config)?;
    Ok(Arc::new(VetSymptomsService { inner: service }))
}

/// Open a service over a dataset with default settings and speech off.
#[uniffi::export]
pub fn open_service_with_dataset(
    dataset_path: String,
) -> Result<Arc<VetSymptomsService>, VetSymptomsError> {
    let config = ServiceConfig {
        dataset_path: dataset_path.into(),
        speech: SpeechConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = DiagnosisService::from_config(&config)?;
    Ok(Arc::new(VetSymptomsService { inner: service }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
#[derive(uniffi::Object)]
pub struct VetSymptomsService {
    inner: DiagnosisService,
}

#[uniffi::export]
impl VetSymptomsService {
    // =========================================================================
    // Diagnosis
    // =========================================================================

    /// Look up the best-matching disease. Failures come back as payloads.
    pub fn diagnose(
        &self,
        request: FfiDiagnosisRequest,
    ) -> Result<FfiDiagnosisResponse, VetSymptomsError> {
        let request = DiagnosisRequest::try_from(request)?;
        Ok(self.inner.diagnose(request).into())
    }

    /// Canonical symptom tags for slot terms and/or free text.
    pub fn normalize_symptoms(
        &self,
        symptoms: Vec<String>,
        free_text: Option<String>,
    ) -> Result<Vec<String>, VetSymptomsError> {
        let input = SymptomInput {
            slots: slots_from_vec(symptoms)?,
            free_text,
        };
        Ok(self.inner.normalize_symptoms(&input).into_iter().collect())
    }

    /// Localize an English disease/remedy phrase (pass-through on miss).
    pub fn translate_output(&self, text: String) -> String {
        self.inner.translate_output(&text)
    }

    // =========================================================================
    // Speech
    // =========================================================================

    /// Synthesize arbitrary text.
    pub fn speak(&self, text: String) -> Option<FfiAudioHandle> {
        self.inner.speak(&text).map(Into::into)
    }

    /// Synthesize one conversation question by its form key ("breed", "symptom1", ...).
    pub fn speak_prompt(&self, step_key: String) -> Result<Option<FfiAudioHandle>, VetSymptomsError> {
        let step = parse_step(&step_key)?;
        Ok(self.inner.speak_prompt(step).map(Into::into))
    }

    /// Synthesize the greeting for a selected species.
    pub fn speak_welcome(&self, species: String) -> Option<FfiAudioHandle> {
        self.inner.speak_welcome(&species).map(Into::into)
    }

    // =========================================================================
    // Conversation Prompts
    // =========================================================================

    /// Display text of a conversation question.
    pub fn prompt_text(&self, step_key: String) -> Result<FfiPrompt, VetSymptomsError> {
        Ok(parse_step(&step_key)?.into())
    }

    /// All conversation questions in asking order.
    pub fn prompts(&self) -> Vec<FfiPrompt> {
        ConversationStep::ALL.into_iter().map(Into::into).collect()
    }

    /// Greeting text shown after species selection.
    pub fn welcome_text(&self, species: String) -> String {
        prompts::welcome_display(&species)
    }

    /// Species present in the loaded table.
    pub fn species(&self) -> Vec<String> {
        self.inner
            .table()
            .species()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn parse_step(key: &str) -> Result<ConversationStep, VetSymptomsError> {
    ConversationStep::from_key(key)
        .ok_or_else(|| VetSymptomsError::InvalidInput(format!("unknown conversation step: {}", key)))
}

fn slots_from_vec(symptoms: Vec<String>) -> Result<[Option<String>; 3], VetSymptomsError> {
    if symptoms.len() > 3 {
        return Err(VetSymptomsError::InvalidInput(format!(
            "at most 3 symptoms, got {}",
            symptoms.len()
        )));
    }
    let mut slots: [Option<String>; 3] = Default::default();
    for (slot, symptom) in slots.iter_mut().zip(symptoms) {
        *slot = Some(symptom);
    }
    Ok(slots)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe diagnosis request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiagnosisRequest {
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    /// Up to three symptom terms
    pub symptoms: Vec<String>,
    pub free_text: Option<String>,
    /// Recorded audio bytes
    pub audio: Option<Vec<u8>>,
    /// File name of the recording, used to detect the format (default webm)
    pub audio_file_name: Option<String>,
}

impl TryFrom<FfiDiagnosisRequest> for DiagnosisRequest {
    type Error = VetSymptomsError;

    fn try_from(request: FfiDiagnosisRequest) -> Result<Self, Self::Error> {
        let format = request
            .audio_file_name
            .as_deref()
            .and_then(AudioFormat::from_file_name)
            .unwrap_or(AudioFormat::Webm);

        Ok(DiagnosisRequest {
            species: request.species,
            breed: request.breed,
            age: request.age,
            sex: request.sex,
            symptoms: slots_from_vec(request.symptoms)?,
            free_text: request.free_text,
            audio: request.audio.map(|bytes| AudioClip::new(bytes, format)),
        })
    }
}

/// FFI-safe diagnosis response.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiagnosisResponse {
    pub transcribed_text: Option<String>,
    pub disease: String,
    pub remedies: Vec<String>,
    pub recovery_days: String,
    pub vet_required: String,
    pub full_text: String,
    pub audio_url: Option<String>,
    pub error: Option<String>,
}

impl From<DiagnosisResponse> for FfiDiagnosisResponse {
    fn from(response: DiagnosisResponse) -> Self {
        Self {
            transcribed_text: response.transcribed_text,
            disease: response.disease,
            remedies: response.remedies,
            recovery_days: response.recovery_days,
            vet_required: response.vet_required,
            full_text: response.full_text,
            audio_url: response.audio_url,
            error: response.error,
        }
    }
}

/// FFI-safe audio handle.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAudioHandle {
    pub id: String,
    pub url: String,
    pub path: String,
    pub created_at: String,
}

impl From<AudioHandle> for FfiAudioHandle {
    fn from(handle: AudioHandle) -> Self {
        Self {
            id: handle.id,
            url: handle.url,
            path: handle.path.display().to_string(),
            created_at: handle.created_at,
        }
    }
}

/// FFI-safe conversation question.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrompt {
    pub key: String,
    pub display_text: String,
    pub speech_text: String,
    /// Key of the following question, if any
    pub next_key: Option<String>,
}

impl From<ConversationStep> for FfiPrompt {
    fn from(step: ConversationStep) -> Self {
        Self {
            key: step.key().to_string(),
            display_text: step.display_text().to_string(),
            speech_text: step.speech_text().to_string(),
            next_key: step.next().map(|s| s.key().to_string()),
        }
    }
}
