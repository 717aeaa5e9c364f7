//! Bilingual symptom dictionary.
//!
//! Two tables, both built once and read-only afterwards:
//! - Symptom terms: Tamil script and Tanglish spellings → canonical English tag
//!   (many-to-one, e.g. "kaaichal"/"kaaitsel"/"காய்ச்சல்" → "fever")
//! - Output phrases: English disease/remedy/care/yes-no text → Tamil
//!
//! Lookups are case-insensitive and pass unknown text through unchanged.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

const DEFAULT_SYMPTOM_TERMS: &str = include_str!("../data/symptoms_ta.json");
const DEFAULT_OUTPUT_PHRASES: &str = include_str!("../data/output_ta.json");

/// Dictionary errors.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DictionaryResult<T> = Result<T, DictionaryError>;

/// Case-fold a dictionary key or lookup term.
pub fn fold(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Symptom and output translation tables.
#[derive(Debug, Clone)]
pub struct BilingualDictionary {
    /// Symptom map: folded source term → canonical tag
    symptoms: HashMap<String, String>,
    /// Output map: folded English phrase → Tamil phrase
    output: HashMap<String, String>,
    /// Folded symptom keys in sorted order (stable fuzzy tie-breaks)
    symptom_keys: Vec<String>,
    /// Distinct folded canonical tags in sorted order
    canonical_tags: Vec<String>,
}

impl Default for BilingualDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl BilingualDictionary {
    /// Create a dictionary from the embedded Tamil tables.
    pub fn new() -> Self {
        // Embedded tables are validated by test_embedded_tables_parse.
        let symptoms: HashMap<String, String> =
            serde_json::from_str(DEFAULT_SYMPTOM_TERMS).unwrap_or_default();
        let output: HashMap<String, String> =
            serde_json::from_str(DEFAULT_OUTPUT_PHRASES).unwrap_or_default();
        Self::from_pairs(symptoms, output)
    }

    /// Build from explicit pairs. On duplicate keys the last pair wins.
    pub fn from_pairs<S, O, K, V, K2, V2>(symptoms: S, output: O) -> Self
    where
        S: IntoIterator<Item = (K, V)>,
        O: IntoIterator<Item = (K2, V2)>,
        K: AsRef<str>,
        V: AsRef<str>,
        K2: AsRef<str>,
        V2: AsRef<str>,
    {
        let mut dictionary = Self {
            symptoms: HashMap::new(),
            output: HashMap::new(),
            symptom_keys: Vec::new(),
            canonical_tags: Vec::new(),
        };
        for (term, tag) in symptoms {
            dictionary
                .symptoms
                .insert(fold(term.as_ref()), fold(tag.as_ref()));
        }
        for (english, localized) in output {
            dictionary
                .output
                .insert(fold(english.as_ref()), localized.as_ref().trim().to_string());
        }
        dictionary.reindex();
        dictionary
    }

    /// Resolve a source term to its canonical tag, or return it unchanged.
    pub fn resolve(&self, term: &str) -> String {
        self.symptoms
            .get(&fold(term))
            .cloned()
            .unwrap_or_else(|| term.to_string())
    }

    /// Canonical tag for a folded key, if registered.
    pub fn tag_for_key(&self, folded_key: &str) -> Option<&str> {
        self.symptoms.get(folded_key).map(String::as_str)
    }

    /// Translate an English output phrase, or return it unchanged.
    pub fn translate_output(&self, text: &str) -> String {
        self.output
            .get(&fold(text))
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }

    /// Register a symptom term, replacing any earlier mapping.
    pub fn add_symptom_term(&mut self, term: &str, tag: &str) {
        self.symptoms.insert(fold(term), fold(tag));
        self.reindex();
    }

    /// Register an output translation, replacing any earlier mapping.
    pub fn add_output_phrase(&mut self, english: &str, localized: &str) {
        self.output.insert(fold(english), localized.trim().to_string());
    }

    /// Overlay extra symptom terms; they take precedence over existing ones.
    pub fn merge_symptom_terms<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        terms: impl IntoIterator<Item = (K, V)>,
    ) {
        for (term, tag) in terms {
            self.symptoms
                .insert(fold(term.as_ref()), fold(tag.as_ref()));
        }
        self.reindex();
    }

    /// Overlay symptom terms from a JSON object file (`{"term": "tag"}`).
    pub fn merge_symptom_file<P: AsRef<Path>>(&mut self, path: P) -> DictionaryResult<usize> {
        let content = fs::read_to_string(path.as_ref())?;
        let terms: HashMap<String, String> = serde_json::from_str(&content)?;
        let count = terms.len();
        self.merge_symptom_terms(terms);
        debug!(path = %path.as_ref().display(), count, "merged extra symptom terms");
        Ok(count)
    }

    /// Registered symptom keys (folded, sorted).
    pub fn symptom_keys(&self) -> &[String] {
        &self.symptom_keys
    }

    /// Distinct canonical tags (folded, sorted).
    pub fn canonical_tags(&self) -> &[String] {
        &self.canonical_tags
    }

    pub fn symptom_term_count(&self) -> usize {
        self.symptoms.len()
    }

    pub fn output_phrase_count(&self) -> usize {
        self.output.len()
    }

    fn reindex(&mut self) {
        let mut keys: Vec<String> = self.symptoms.keys().cloned().collect();
        keys.sort();
        self.symptom_keys = keys;

        let tags: BTreeSet<String> = self.symptoms.values().cloned().collect();
        self.canonical_tags = tags.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_tables_parse() {
        let symptoms: HashMap<String, String> =
            serde_json::from_str(DEFAULT_SYMPTOM_TERMS).unwrap();
        let output: HashMap<String, String> =
            serde_json::from_str(DEFAULT_OUTPUT_PHRASES).unwrap();
        assert!(symptoms.len() > 40);
        assert!(output.len() > 60);
    }

    #[test]
    fn test_resolve_tamil_and_phonetic() {
        let dictionary = BilingualDictionary::new();

        assert_eq!(dictionary.resolve("காய்ச்சல்"), "fever");
        assert_eq!(dictionary.resolve("kaaichal"), "fever");
        assert_eq!(dictionary.resolve("KAAITSEL"), "fever");
        assert_eq!(dictionary.resolve(" irumal "), "cough");
        assert_eq!(dictionary.resolve("பேதி"), "loose motion");
    }

    #[test]
    fn test_resolve_passes_unknown_through() {
        let dictionary = BilingualDictionary::new();
        assert_eq!(dictionary.resolve("Sneezing Fits"), "Sneezing Fits");
        assert_eq!(dictionary.resolve(""), "");
    }

    #[test]
    fn test_translate_output() {
        let dictionary = BilingualDictionary::new();

        assert_eq!(dictionary.translate_output("Mastitis"), "மடி நோய் (Mastitis)");
        assert_eq!(dictionary.translate_output("yes"), "ஆம்");
        assert_eq!(dictionary.translate_output("No"), "இல்லை");
        assert_eq!(dictionary.translate_output("Unlisted Disease"), "Unlisted Disease");
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let dictionary = BilingualDictionary::from_pairs(
            vec![("vali", "ache"), ("Vali", "pain")],
            Vec::<(String, String)>::new(),
        );
        assert_eq!(dictionary.resolve("vali"), "pain");
        assert_eq!(dictionary.symptom_term_count(), 1);
    }

    #[test]
    fn test_canonical_tags_are_distinct() {
        let dictionary = BilingualDictionary::new();
        let tags = dictionary.canonical_tags();

        assert!(tags.contains(&"fever".to_string()));
        assert!(tags.contains(&"loss of appetite".to_string()));
        let unique: BTreeSet<&String> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn test_merge_overrides_existing() {
        let mut dictionary = BilingualDictionary::new();
        dictionary.merge_symptom_terms(vec![("kan", "eye discharge"), ("thummal", "sneezing")]);

        assert_eq!(dictionary.resolve("kan"), "eye discharge");
        assert_eq!(dictionary.resolve("thummal"), "sneezing");
        assert!(dictionary.canonical_tags().contains(&"sneezing".to_string()));
    }

    #[test]
    fn test_merge_symptom_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.json");
        fs::write(&path, r#"{"thummal": "sneezing", "nondi": "lameness"}"#).unwrap();

        let mut dictionary = BilingualDictionary::new();
        let count = dictionary.merge_symptom_file(&path).unwrap();

        assert_eq!(count, 2);
        assert_eq!(dictionary.resolve("nondi"), "lameness");
    }

    #[test]
    fn test_merge_symptom_file_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.json");
        fs::write(&path, "[not a map]").unwrap();

        let mut dictionary = BilingualDictionary::new();
        assert!(matches!(
            dictionary.merge_symptom_file(&path),
            Err(DictionaryError::Json(_))
        ));
    }
}
