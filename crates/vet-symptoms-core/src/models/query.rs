//! Query models for the symptom resolver.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Record;

/// Raw symptom input as supplied by the caller.
///
/// Slots hold one term each (Tamil, Tanglish or English). Free text is a
/// whole utterance, typed or transcribed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SymptomInput {
    /// Per-slot symptom terms
    pub slots: [Option<String>; 3],
    /// Natural-language description
    pub free_text: Option<String>,
}

impl SymptomInput {
    /// Input made of explicit slot terms.
    pub fn from_slots(slots: [Option<String>; 3]) -> Self {
        Self {
            slots,
            free_text: None,
        }
    }

    /// Input made of a single utterance.
    pub fn from_text(text: &str) -> Self {
        Self {
            slots: Default::default(),
            free_text: Some(text.to_string()),
        }
    }

    /// True if no slot and no free text carries anything but whitespace.
    pub fn is_empty(&self) -> bool {
        self.slots
            .iter()
            .chain(std::iter::once(&self.free_text))
            .all(|s| s.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true))
    }
}

/// A query after symptom normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizedQuery {
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    /// Canonical symptom tags
    pub symptoms: BTreeSet<String>,
}

/// Outcome of scoring a candidate set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    /// Best record; `None` means nothing matched
    pub record: Option<Record>,
    /// Symptom hit count of the best record
    pub score: u32,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self::default()
    }

    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }
}
