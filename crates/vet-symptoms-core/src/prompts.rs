//! Guided conversation prompts.
//!
//! The voice front end asks six questions in a fixed order, speaks each one
//! in Tamil and shows it with an English gloss. Answers are collected into a
//! [`Conversation`] and turned into a [`DiagnosisRequest`] at the end.

use serde::{Deserialize, Serialize};

use crate::service::DiagnosisRequest;

/// One question of the guided conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    Breed,
    Age,
    Gender,
    Symptom1,
    Symptom2,
    Symptom3,
}

impl ConversationStep {
    /// All steps in asking order.
    pub const ALL: [ConversationStep; 6] = [
        ConversationStep::Breed,
        ConversationStep::Age,
        ConversationStep::Gender,
        ConversationStep::Symptom1,
        ConversationStep::Symptom2,
        ConversationStep::Symptom3,
    ];

    pub fn first() -> Self {
        ConversationStep::Breed
    }

    /// The step after this one, or `None` after the last symptom.
    pub fn next(&self) -> Option<Self> {
        let index = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    /// Field name used by form submissions.
    pub fn key(&self) -> &'static str {
        match self {
            ConversationStep::Breed => "breed",
            ConversationStep::Age => "age",
            ConversationStep::Gender => "gender",
            ConversationStep::Symptom1 => "symptom1",
            ConversationStep::Symptom2 => "symptom2",
            ConversationStep::Symptom3 => "symptom3",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key.trim())
    }

    /// Numbered Tamil question with an English gloss, for display.
    pub fn display_text(&self) -> &'static str {
        match self {
            ConversationStep::Breed => "1. உங்கள் விலங்கின் இனம் என்ன? (What is the breed?)",
            ConversationStep::Age => "2. உங்கள் விலங்கின் வயது என்ன? (What is the age?)",
            ConversationStep::Gender => "3. அது ஆணா அல்லது பெண்ணா? (Male or Female?)",
            ConversationStep::Symptom1 => "4. முதல் அறிகுறி என்ன? (What is the 1st symptom?)",
            ConversationStep::Symptom2 => "5. வேறு அறிகுறி உள்ளதா? (2nd Symptom?)",
            ConversationStep::Symptom3 => "6. வேறு ஏதேனும் அறிகுறி? (3rd Symptom?)",
        }
    }

    /// Tamil-only question sent to speech synthesis.
    pub fn speech_text(&self) -> &'static str {
        match self {
            ConversationStep::Breed => "உங்கள் விலங்கின் இனம் என்ன?",
            ConversationStep::Age => "உங்கள் விலங்கின் வயது என்ன?",
            ConversationStep::Gender => "அது ஆணா அல்லது பெண்ணா?",
            ConversationStep::Symptom1 => "முதல் அறிகுறி என்ன?",
            ConversationStep::Symptom2 => "வேறு அறிகுறி உள்ளதா?",
            ConversationStep::Symptom3 => "வேறு ஏதேனும் அறிகுறி?",
        }
    }
}

/// Species offered by the front end: (key, Tamil name).
pub const SPECIES_NAMES: &[(&str, &str)] = &[
    ("Cattle", "பசு"),
    ("Buffalo", "எருமை"),
    ("Goat", "ஆடு"),
    ("Poultry", "கோழி"),
    ("Dog", "நாய்"),
    ("Cat", "பூனை"),
];

/// Species used when none was selected.
pub const DEFAULT_SPECIES: &str = "Cow";

/// Tamil name for speech; unknown species are spoken as given.
pub fn species_voice_name(species: &str) -> &str {
    SPECIES_NAMES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(species.trim()))
        .map(|(_, tamil)| *tamil)
        .unwrap_or(species)
}

/// "பசு (Cattle)" style label; unknown species are shown as given.
pub fn species_display_name(species: &str) -> String {
    SPECIES_NAMES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(species.trim()))
        .map(|(key, tamil)| format!("{} ({})", tamil, key))
        .unwrap_or_else(|| species.to_string())
}

/// Greeting shown after species selection.
pub fn welcome_display(species: &str) -> String {
    format!("வணக்கம், நீங்கள் தேர்ந்தெடுத்தது: {}", species_display_name(species))
}

/// Spoken greeting asking the user to press "start".
pub fn welcome_message(species: &str) -> String {
    format!(
        "வணக்கம். நீங்கள் {} தேர்ந்தெடுத்தீர்கள். விவரங்களைச் சொல்ல, 'தொடங்கு' என்ற பொத்தானை அழுத்தவும்.",
        species_voice_name(species)
    )
}

/// Answers collected over one guided conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub species: String,
    current: Option<ConversationStep>,
    answers: Vec<(ConversationStep, String)>,
}

impl Conversation {
    pub fn new(species: &str) -> Self {
        let species = species.trim();
        Self {
            species: if species.is_empty() {
                DEFAULT_SPECIES.to_string()
            } else {
                species.to_string()
            },
            current: Some(ConversationStep::first()),
            answers: Vec::new(),
        }
    }

    /// Step awaiting an answer, or `None` once all six were asked.
    pub fn current_step(&self) -> Option<ConversationStep> {
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_none()
    }

    /// Store the answer to the current step and advance.
    ///
    /// Blank answers still advance but are not kept. Returns the next step.
    pub fn answer(&mut self, text: &str) -> Option<ConversationStep> {
        let step = self.current?;
        let text = text.trim();
        if !text.is_empty() {
            self.answers.push((step, text.to_string()));
        }
        self.current = step.next();
        self.current
    }

    pub fn answer_for(&self, step: ConversationStep) -> Option<&str> {
        self.answers
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, text)| text.as_str())
    }

    /// Build the final lookup request from the collected answers.
    pub fn to_request(&self) -> DiagnosisRequest {
        let answer = |step| self.answer_for(step).map(str::to_string);
        DiagnosisRequest {
            species: self.species.clone(),
            breed: answer(ConversationStep::Breed),
            age: answer(ConversationStep::Age),
            sex: answer(ConversationStep::Gender),
            symptoms: [
                answer(ConversationStep::Symptom1),
                answer(ConversationStep::Symptom2),
                answer(ConversationStep::Symptom3),
            ],
            free_text: None,
            audio: None,
        }
    }
}
