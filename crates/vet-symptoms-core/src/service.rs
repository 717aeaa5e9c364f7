//! Request orchestration.
//!
//! [`DiagnosisService`] owns the shared read-only state (record table and
//! dictionary) plus the speech collaborators, and runs one request through
//! transcription, normalization, filtering, scoring and formatting. It holds
//! no per-request state, so one instance serves any number of threads.

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use vet_symptoms_speech::{
    AudioClip, AudioHandle, DisabledSynthesizer, SpeechError, Synthesizer, Transcriber,
};

use crate::config::{ConfigError, ServiceConfig, SpeechConfig};
use crate::dataset::{DatasetError, RecordTable};
use crate::dictionary::{BilingualDictionary, DictionaryError};
use crate::models::{DiagnosisResponse, SymptomInput};
use crate::prompts::{welcome_message, ConversationStep};
use crate::resolver::{
    DiagnosisError, QueryAttributes, Resolver, ResultFormatter, SymptomNormalizer, SymptomScorer,
};

/// Startup errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// One lookup request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosisRequest {
    /// Animal type (required)
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    /// Per-slot symptom terms
    pub symptoms: [Option<String>; 3],
    /// Typed description
    pub free_text: Option<String>,
    /// Spoken description, transcribed before matching
    pub audio: Option<AudioClip>,
}

impl DiagnosisRequest {
    pub fn new(species: &str) -> Self {
        Self {
            species: species.to_string(),
            ..Default::default()
        }
    }

    /// True if neither slots, free text nor audio carry anything.
    pub fn has_no_symptom_input(&self) -> bool {
        let typed_empty = self
            .symptoms
            .iter()
            .chain(std::iter::once(&self.free_text))
            .all(|s| s.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true));
        typed_empty && self.audio.is_none()
    }

    fn attributes(&self) -> QueryAttributes {
        QueryAttributes {
            species: self.species.clone(),
            breed: self.breed.clone(),
            age: self.age.clone(),
            sex: self.sex.clone(),
        }
    }
}

/// Symptom lookup service.
pub struct DiagnosisService {
    table: Arc<RecordTable>,
    dictionary: Arc<BilingualDictionary>,
    resolver: Resolver,
    formatter: ResultFormatter,
    transcriber: Option<Arc<dyn Transcriber>>,
    input_language: String,
}

impl DiagnosisService {
    /// Create a service with default matching settings and output language "ta".
    pub fn new(
        table: Arc<RecordTable>,
        dictionary: Arc<BilingualDictionary>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        let defaults = SpeechConfig::default();
        Self {
            resolver: Resolver::new(dictionary.clone()),
            formatter: ResultFormatter::new(
                dictionary.clone(),
                synthesizer,
                &defaults.output_language,
            ),
            table,
            dictionary,
            transcriber: None,
            input_language: defaults.input_language,
        }
    }

    /// Build a service from configuration: loads the record table, merges
    /// extra dictionary terms and picks the synthesis backend.
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;

        let table = RecordTable::from_path(&config.dataset_path)?;

        let mut dictionary = BilingualDictionary::new();
        if let Some(path) = &config.dictionary_path {
            dictionary.merge_symptom_file(path)?;
        }

        let synthesizer = build_synthesizer(&config.speech)?;

        let service = Self::new(Arc::new(table), Arc::new(dictionary), synthesizer)
            .with_fuzzy_threshold(config.fuzzy_threshold)
            .with_languages(&config.speech.input_language, &config.speech.output_language);

        info!(
            records = service.table.len(),
            symptom_terms = service.dictionary.symptom_term_count(),
            threshold = config.fuzzy_threshold,
            "diagnosis service ready"
        );
        Ok(service)
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn SymptomScorer>) -> Self {
        self.resolver = self.resolver.with_scorer(scorer);
        self
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        let normalizer = SymptomNormalizer::new(self.dictionary.clone()).with_threshold(threshold);
        self.resolver = self.resolver.with_normalizer(normalizer);
        self
    }

    /// Set the transcription hint and the synthesis language.
    pub fn with_languages(mut self, input: &str, output: &str) -> Self {
        self.input_language = input.to_string();
        self.formatter = ResultFormatter::new(
            self.dictionary.clone(),
            self.formatter.synthesizer(),
            output,
        );
        self
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn dictionary(&self) -> &BilingualDictionary {
        &self.dictionary
    }

    /// Run one request. Never fails: every outcome is a payload.
    pub fn diagnose(&self, request: DiagnosisRequest) -> DiagnosisResponse {
        // Filled once transcription finishes, so a later fault still reports it.
        let mut transcribed_text = None;
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.run(&request, &mut transcribed_text)));
        match outcome {
            Ok(response) => response,
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                error!(species = %request.species, detail = %detail, "diagnosis aborted");
                self.formatter
                    .format_error(&DiagnosisError::Internal(detail), transcribed_text)
            }
        }
    }

    fn run(&self, request: &DiagnosisRequest, transcribed_text: &mut Option<String>) -> DiagnosisResponse {
        if request.species.trim().is_empty() {
            return self.reject(DiagnosisError::MissingSpecies, None);
        }
        if request.has_no_symptom_input() {
            return self.reject(DiagnosisError::NoSymptomInput, None);
        }

        let heard = match &request.audio {
            Some(clip) => {
                let (display, heard) = self.transcribe(clip);
                *transcribed_text = Some(display);
                heard
            }
            None => None,
        };

        let free_text = [request.free_text.as_deref(), heard.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let input = SymptomInput {
            slots: request.symptoms.clone(),
            free_text: Some(free_text).filter(|t| !t.is_empty()),
        };

        let query = self.resolver.normalize(&request.attributes(), &input);
        debug!(species = %query.species, symptoms = ?query.symptoms, "normalized query");

        match self.resolver.resolve(self.table.records(), &query) {
            Ok(result) => {
                let response = self.formatter.format(&result, transcribed_text.clone());
                info!(
                    species = %query.species,
                    disease = %response.disease,
                    score = result.score,
                    "diagnosis matched"
                );
                response
            }
            Err(e) => self.reject(e, transcribed_text.clone()),
        }
    }

    fn reject(&self, error: DiagnosisError, transcribed_text: Option<String>) -> DiagnosisResponse {
        info!(outcome = %error, "diagnosis not matched");
        self.formatter.format_error(&error, transcribed_text)
    }

    /// Transcribe a clip. Returns the text to show the caller and, on
    /// success, the text to match on.
    fn transcribe(&self, clip: &AudioClip) -> (String, Option<String>) {
        let result = match &self.transcriber {
            Some(transcriber) => transcriber.transcribe(clip, &self.input_language),
            None => Err(SpeechError::Service("no transcriber configured".to_string())),
        };

        match result {
            Ok(transcript) => {
                debug!(language = %transcript.language, text = %transcript.text, "transcribed audio");
                (transcript.text.clone(), Some(transcript.text))
            }
            Err(e) => {
                warn!(error = %e, "transcription failed, continuing with typed input");
                (e.transcript_placeholder(), None)
            }
        }
    }

    /// Canonical tags for raw symptom input.
    pub fn normalize_symptoms(&self, input: &SymptomInput) -> BTreeSet<String> {
        self.resolver.normalizer().normalize(input)
    }

    /// Localize an English disease/remedy phrase.
    pub fn translate_output(&self, text: &str) -> String {
        self.dictionary.translate_output(text)
    }

    /// Standalone text-to-speech. Blank text and synthesis failures give `None`.
    pub fn speak(&self, text: &str) -> Option<AudioHandle> {
        if text.trim().is_empty() {
            return None;
        }
        self.formatter.synthesize(text)
    }

    /// Speak one question of the guided conversation.
    pub fn speak_prompt(&self, step: ConversationStep) -> Option<AudioHandle> {
        self.speak(step.speech_text())
    }

    /// Speak the greeting for a selected species.
    pub fn speak_welcome(&self, species: &str) -> Option<AudioHandle> {
        self.speak(&welcome_message(species))
    }
}

fn build_synthesizer(speech: &SpeechConfig) -> ServiceResult<Arc<dyn Synthesizer>> {
    if !speech.enabled {
        return Ok(Arc::new(DisabledSynthesizer));
    }

    #[cfg(feature = "http-tts")]
    let synthesizer: Arc<dyn Synthesizer> = {
        let store = vet_symptoms_speech::AudioStore::new(&speech.audio_dir, &speech.url_prefix);
        let timeout = std::time::Duration::from_secs(speech.timeout_secs);
        Arc::new(vet_symptoms_speech::GoogleTranslateTts::new(store, timeout)?)
    };

    #[cfg(not(feature = "http-tts"))]
    let synthesizer: Arc<dyn Synthesizer> = {
        warn!(
            audio_dir = %speech.audio_dir.display(),
            "speech enabled but no synthesis backend compiled in (enable `http-tts`)"
        );
        Arc::new(DisabledSynthesizer)
    };

    Ok(synthesizer)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown internal error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use vet_symptoms_speech::{AudioFormat, AudioStore, RecordingSynthesizer, ScriptedTranscriber};

    fn table() -> Arc<RecordTable> {
        let mut fever = Record::new("Cow".into(), "Viral Fever".into());
        fever.symptom_tags = ["fever, lethargy".into(), "".into(), "".into()];
        fever.remedy_primary = Some("Paracetamol".into());
        let mut cough = Record::new("Cow".into(), "Respiratory Infection".into());
        cough.symptom_tags = ["cough".into(), "nasal discharge".into(), "fever".into()];
        Arc::new(RecordTable::new(vec![fever, cough]))
    }

    fn service() -> DiagnosisService {
        DiagnosisService::new(
            table(),
            Arc::new(BilingualDictionary::new()),
            Arc::new(DisabledSynthesizer),
        )
    }

    fn clip() -> AudioClip {
        AudioClip::new(vec![0u8; 16], AudioFormat::Webm)
    }

    struct PanickingScorer;

    impl SymptomScorer for PanickingScorer {
        fn score(&self, _record: &Record, _symptoms: &BTreeSet<String>) -> u32 {
            panic!("scorer exploded")
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[test]
    fn test_service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiagnosisService>();
    }

    #[test]
    fn test_missing_species() {
        let mut request = DiagnosisRequest::new("  ");
        request.symptoms[0] = Some("fever".into());

        let response = service().diagnose(request);
        assert_eq!(
            response.error.as_deref(),
            Some("Invalid input: animal type is required")
        );
    }

    #[test]
    fn test_no_symptom_input() {
        let response = service().diagnose(DiagnosisRequest::new("Cow"));
        assert_eq!(response.error.as_deref(), Some("Invalid input: no symptoms supplied"));
    }

    #[test]
    fn test_transcript_feeds_matching() {
        let service = service().with_transcriber(Arc::new(ScriptedTranscriber::hearing(
            "இருமல் மற்றும் மூக்கு ஒழுகுதல்",
        )));
        let mut request = DiagnosisRequest::new("Cow");
        request.audio = Some(clip());

        let response = service.diagnose(request);
        assert!(response.is_success());
        assert_eq!(
            response.transcribed_text.as_deref(),
            Some("இருமல் மற்றும் மூக்கு ஒழுகுதல்")
        );
        assert!(response.disease.contains("Respiratory Infection"));
    }

    #[test]
    fn test_transcription_failure_degrades() {
        let service = service().with_transcriber(Arc::new(ScriptedTranscriber::failing(
            SpeechError::Service("quota".into()),
        )));
        let mut request = DiagnosisRequest::new("Cow");
        request.symptoms[0] = Some("kaaichal".into());
        request.audio = Some(clip());

        let response = service.diagnose(request);
        assert_eq!(response.transcribed_text.as_deref(), Some("(API Error / பிழை)"));
        assert!(response.is_success());
        assert!(response.disease.contains("Viral Fever"));
    }

    #[test]
    fn test_audio_without_transcriber() {
        let mut request = DiagnosisRequest::new("Cow");
        request.audio = Some(clip());

        let response = service().diagnose(request);
        assert_eq!(response.transcribed_text.as_deref(), Some("(API Error / பிழை)"));
        assert_eq!(
            response.error.as_deref(),
            Some("அறிகுறிகள் பொருந்தவில்லை (No matching disease found)")
        );
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let service = service().with_scorer(Box::new(PanickingScorer));
        let mut request = DiagnosisRequest::new("Cow");
        request.symptoms[0] = Some("fever".into());

        let response = service.diagnose(request);
        assert_eq!(response.disease, "Error");
        assert_eq!(response.error.as_deref(), Some("Server Error: scorer exploded"));
        assert!(response.audio_url.is_none());
    }

    #[test]
    fn test_internal_error_keeps_transcript() {
        let service = service()
            .with_transcriber(Arc::new(ScriptedTranscriber::hearing("irumal")))
            .with_scorer(Box::new(PanickingScorer));
        let mut request = DiagnosisRequest::new("Cow");
        request.audio = Some(clip());

        let response = service.diagnose(request);
        assert_eq!(response.disease, "Error");
        assert_eq!(response.transcribed_text.as_deref(), Some("irumal"));
        assert_eq!(response.error.as_deref(), Some("Server Error: scorer exploded"));
    }

    #[test]
    fn test_slot_case_variants_score_once() {
        let mut cough = Record::new("Cow".into(), "Respiratory Infection".into());
        cough.symptom_tags = ["cough".into(), "".into(), "".into()];
        let mut lame = Record::new("Cow".into(), "Foot Rot".into());
        lame.symptom_tags = ["limping".into(), "".into(), "".into()];
        let service = DiagnosisService::new(
            Arc::new(RecordTable::new(vec![cough, lame])),
            Arc::new(BilingualDictionary::new()),
            Arc::new(DisabledSynthesizer),
        );

        let input = SymptomInput::from_slots([
            Some("Limping".into()),
            Some("limping".into()),
            Some("cough".into()),
        ]);
        let tags = service.normalize_symptoms(&input);
        assert_eq!(tags.len(), 2);

        // One hit each, so the first record wins the tie
        let mut request = DiagnosisRequest::new("Cow");
        request.symptoms = input.slots;
        let response = service.diagnose(request);
        assert!(response.disease.contains("Respiratory Infection"));
    }

    #[test]
    fn test_speak_and_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Arc::new(RecordingSynthesizer::new(AudioStore::new(dir.path(), "/audio")));
        let service = DiagnosisService::new(table(), Arc::new(BilingualDictionary::new()), synth.clone())
            .with_languages("ta-IN", "ta");

        assert!(service.speak("   ").is_none());
        let handle = service.speak_prompt(ConversationStep::Age).unwrap();
        assert!(handle.path.exists());
        assert!(service.speak_welcome("Goat").is_some());

        let requests = synth.requests();
        assert_eq!(requests[0].0, "உங்கள் விலங்கின் வயது என்ன?");
        assert!(requests[1].0.contains("ஆடு"));
    }

    #[test]
    fn test_from_config_loads_dataset_and_terms() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("dataset.csv");
        std::fs::write(
            &dataset,
            "animal_type,disease,symptom_1,symptom_2,symptom_3,medicine\nGoat,PPR,fever,nasal discharge,,Antibiotics\n",
        )
        .unwrap();
        let extra = dir.path().join("extra.json");
        std::fs::write(&extra, r#"{"jwaram": "fever"}"#).unwrap();

        let config = ServiceConfig {
            dataset_path: dataset,
            dictionary_path: Some(extra),
            speech: SpeechConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let service = DiagnosisService::from_config(&config).unwrap();
        assert_eq!(service.table().len(), 1);

        let mut request = DiagnosisRequest::new("goat");
        request.symptoms[0] = Some("jwaram".into());
        let response = service.diagnose(request);
        assert!(response.is_success());
        assert!(response.audio_url.is_none());
    }

    #[test]
    fn test_from_config_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            dataset_path: dir.path().join("absent.csv"),
            ..Default::default()
        };
        assert!(matches!(
            DiagnosisService::from_config(&config),
            Err(ServiceError::Dataset(_))
        ));
    }
}
