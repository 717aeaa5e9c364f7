//! Symptom resolution and record matching.
//!
//! Pipeline: Normalization → Record Filter → Scoring → Formatting

mod filter;
mod formatter;
mod normalizer;
mod scorer;

pub use filter::*;
pub use formatter::*;
pub use normalizer::*;
pub use scorer::*;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::dictionary::BilingualDictionary;
use crate::models::{MatchResult, NormalizedQuery, Record, SymptomInput};

/// Diagnosis outcomes other than a matched record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosisError {
    #[error("animal type is required")]
    MissingSpecies,

    #[error("no symptoms supplied")]
    NoSymptomInput,

    #[error("no records for species: {species}")]
    NoCandidates { species: String },

    #[error("no matching disease found")]
    NoMatch,

    #[error("{0}")]
    Internal(String),
}

pub type DiagnosisResult<T> = Result<T, DiagnosisError>;

/// Raw query attributes before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAttributes {
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
}

/// Coordinates normalization, filtering and scoring.
pub struct Resolver {
    normalizer: SymptomNormalizer,
    filter: RecordFilter,
    scorer: Box<dyn SymptomScorer>,
}

impl Resolver {
    /// Create a resolver with the containment scorer.
    pub fn new(dictionary: Arc<BilingualDictionary>) -> Self {
        Self {
            normalizer: SymptomNormalizer::new(dictionary),
            filter: RecordFilter::new(),
            scorer: Box::new(ContainmentScorer),
        }
    }

    /// Replace the normalizer (e.g. to change the fuzzy threshold).
    pub fn with_normalizer(mut self, normalizer: SymptomNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replace the scoring strategy.
    pub fn with_scorer(mut self, scorer: Box<dyn SymptomScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Build a normalized query.
    ///
    /// Blank optional attributes become `None`.
    pub fn normalize(&self, attributes: &QueryAttributes, input: &SymptomInput) -> NormalizedQuery {
        NormalizedQuery {
            species: attributes.species.trim().to_string(),
            breed: non_blank(attributes.breed.as_deref()),
            age: non_blank(attributes.age.as_deref()),
            sex: non_blank(attributes.sex.as_deref()),
            symptoms: self.normalizer.normalize(input),
        }
    }

    /// Filter and score `records` for a normalized query.
    ///
    /// Returns the matched result, [`DiagnosisError::NoCandidates`] when the
    /// species has no records, or [`DiagnosisError::NoMatch`] when nothing
    /// overlaps.
    pub fn resolve(&self, records: &[Record], query: &NormalizedQuery) -> DiagnosisResult<MatchResult> {
        let candidates = self.filter.filter_query(records, query);
        if candidates.is_empty() {
            return Err(DiagnosisError::NoCandidates {
                species: query.species.clone(),
            });
        }

        let result = self.scorer.select_best(&candidates, &query.symptoms);
        debug!(
            scorer = self.scorer.name(),
            candidates = candidates.len(),
            symptoms = query.symptoms.len(),
            score = result.score,
            "scored candidates"
        );

        if result.is_match() {
            Ok(result)
        } else {
            Err(DiagnosisError::NoMatch)
        }
    }

    pub fn normalizer(&self) -> &SymptomNormalizer {
        &self.normalizer
    }

    pub fn scorer(&self) -> &dyn SymptomScorer {
        self.scorer.as_ref()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
