//! Symptom normalizer.
//!
//! Turns heterogeneous symptom input into a set of canonical tags:
//! - Slot terms resolve through the dictionary (unknown terms pass through)
//! - Free text collects every dictionary key and canonical tag it contains
//! - Each free-text token is also fuzzy-matched against keys and tags
//!
//! Containment is plain substring search, so a short key such as "kan" also
//! fires inside longer words. Over-matching is preferred: a missed symptom
//! changes the diagnosis, an extra one only shifts tie-breaks.

use std::collections::BTreeSet;
use std::sync::Arc;

use strsim::normalized_levenshtein;
use tracing::debug;

use crate::dictionary::{fold, BilingualDictionary};
use crate::models::SymptomInput;

/// Minimum similarity for a fuzzy token match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Normalizer for raw symptom input.
#[derive(Debug, Clone)]
pub struct SymptomNormalizer {
    dictionary: Arc<BilingualDictionary>,
    fuzzy_threshold: f64,
}

impl SymptomNormalizer {
    /// Create a normalizer with the default fuzzy threshold.
    pub fn new(dictionary: Arc<BilingualDictionary>) -> Self {
        Self {
            dictionary,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    /// Override the fuzzy threshold (0.0 - 1.0).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }

    pub fn dictionary(&self) -> &BilingualDictionary {
        &self.dictionary
    }

    /// Normalize slot terms and free text into one tag set.
    ///
    /// Empty input yields an empty set, which callers treat as
    /// "no symptoms detected".
    pub fn normalize(&self, input: &SymptomInput) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();

        for slot in input.slots.iter().flatten() {
            let term = slot.trim();
            if !term.is_empty() {
                // Unmapped terms pass through as typed; fold so case variants collapse.
                tags.insert(fold(&self.dictionary.resolve(term)));
            }
        }

        if let Some(text) = input.free_text.as_deref() {
            tags.extend(self.normalize_text(text));
        }

        tags
    }

    /// Normalize a free-text utterance.
    pub fn normalize_text(&self, text: &str) -> BTreeSet<String> {
        let folded = fold(text);
        let mut tags = BTreeSet::new();
        if folded.is_empty() {
            return tags;
        }

        self.collect_contained(&folded, &mut tags);
        let contained = tags.len();
        self.collect_fuzzy_tokens(&folded, &mut tags);

        debug!(
            text = %text,
            contained,
            total = tags.len(),
            "normalized free-text symptoms"
        );
        tags
    }

    /// Keys and canonical tags that occur verbatim inside the text.
    fn collect_contained(&self, folded_text: &str, tags: &mut BTreeSet<String>) {
        for key in self.dictionary.symptom_keys() {
            if folded_text.contains(key.as_str()) {
                if let Some(tag) = self.dictionary.tag_for_key(key) {
                    tags.insert(tag.to_string());
                }
            }
        }

        for tag in self.dictionary.canonical_tags() {
            if folded_text.contains(tag.as_str()) {
                tags.insert(tag.clone());
            }
        }
    }

    /// Per-token fuzzy lookup against keys, then against canonical tags.
    fn collect_fuzzy_tokens(&self, folded_text: &str, tags: &mut BTreeSet<String>) {
        for token in folded_text.split_whitespace() {
            if let Some((key, _)) = self.closest(token, self.dictionary.symptom_keys()) {
                if let Some(tag) = self.dictionary.tag_for_key(key) {
                    tags.insert(tag.to_string());
                }
            }
            if let Some((tag, _)) = self.closest(token, self.dictionary.canonical_tags()) {
                tags.insert(tag.to_string());
            }
        }
    }

    /// Closest candidate at or above the threshold.
    ///
    /// Ties keep the earliest candidate, so sorted input gives a stable pick.
    pub fn closest<'a>(&self, token: &str, candidates: &'a [String]) -> Option<(&'a str, f64)> {
        let mut best: Option<(&'a str, f64)> = None;
        for candidate in candidates {
            let score = similarity(token, candidate);
            if score < self.fuzzy_threshold {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate.as_str(), score)),
            }
        }
        best
    }
}

/// Normalized string similarity (0.0 - 1.0), character based.
///
/// The larger of the normalized edit distance and the matching-subsequence
/// ratio `2 * M / T`, where `M` is the longest common subsequence and `T`
/// the combined length. The ratio forgives dropped or doubled vowels
/// ("kaichel" vs "kaaichal"), which edit distance counts twice.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b).max(subsequence_ratio(a, b))
}

fn subsequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(row[j])
            };
        }
        prev = row;
    }

    2.0 * prev[b.len()] as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> SymptomNormalizer {
        SymptomNormalizer::new(Arc::new(BilingualDictionary::new()))
    }

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_slots_resolve_through_dictionary() {
        let normalizer = normalizer();
        let input = SymptomInput::from_slots([
            Some("காய்ச்சல்".into()),
            None,
            Some("vanthi".into()),
        ]);

        assert_eq!(normalizer.normalize(&input), set(&["fever", "vomiting"]));
    }

    #[test]
    fn test_canonical_slots_are_idempotent() {
        let normalizer = normalizer();
        let input = SymptomInput::from_slots([
            Some("fever".into()),
            Some("bloating".into()),
            Some("".into()),
        ]);

        assert_eq!(normalizer.normalize(&input), set(&["bloating", "fever"]));
    }

    #[test]
    fn test_slots_skip_blank_and_dedupe() {
        let normalizer = normalizer();
        let input = SymptomInput::from_slots([
            Some("kaaichal".into()),
            Some("  ".into()),
            Some("kaaitsel".into()),
        ]);

        assert_eq!(normalizer.normalize(&input), set(&["fever"]));
    }

    #[test]
    fn test_slot_case_variants_collapse() {
        let normalizer = normalizer();
        let input = SymptomInput::from_slots([
            Some("Limping".into()),
            Some("limping".into()),
            Some("Bloating".into()),
        ]);

        assert_eq!(normalizer.normalize(&input), set(&["bloating", "limping"]));
    }

    #[test]
    fn test_free_text_tanglish_terms() {
        let normalizer = normalizer();
        assert_eq!(
            normalizer.normalize_text("kaaitsel irumal"),
            set(&["cough", "fever"])
        );
    }

    #[test]
    fn test_free_text_canonical_vocabulary() {
        let normalizer = normalizer();
        let tags = normalizer.normalize_text("My goat has Nasal Discharge since morning");
        assert!(tags.contains("nasal discharge"));
    }

    #[test]
    fn test_free_text_tamil_phrase() {
        let normalizer = normalizer();
        let tags = normalizer.normalize_text("மாட்டுக்கு காய்ச்சல் மற்றும் இருமல் உள்ளது");
        assert!(tags.contains("fever"));
        assert!(tags.contains("cough"));
    }

    #[test]
    fn test_fuzzy_token_spelling_drift() {
        let normalizer = normalizer();
        // "vanthi" without the h
        assert!(normalizer.normalize_text("vanti").contains("vomiting"));
        // Singular of the "blisters" tag
        assert!(normalizer.normalize_text("blister").contains("blisters"));
    }

    #[test]
    fn test_unmatched_text_is_empty() {
        let normalizer = normalizer();
        assert!(normalizer.normalize_text("qqqq zzzz").is_empty());
        assert!(normalizer.normalize_text("   ").is_empty());
        assert!(normalizer.normalize(&SymptomInput::default()).is_empty());
    }

    #[test]
    fn test_slots_and_text_accumulate() {
        let normalizer = normalizer();
        let input = SymptomInput {
            slots: [Some("sorvu".into()), None, None],
            free_text: Some("irumal".into()),
        };

        assert_eq!(normalizer.normalize(&input), set(&["cough", "drowsiness"]));
    }

    #[test]
    fn test_threshold_controls_fuzzy_pass() {
        let strict = normalizer().with_threshold(1.0);
        assert!(!strict.normalize_text("vanti").contains("vomiting"));

        let clamped = normalizer().with_threshold(3.0);
        assert_eq!(clamped.fuzzy_threshold(), 1.0);
    }

    #[test]
    fn test_closest_prefers_first_on_tie() {
        let normalizer = normalizer();
        let candidates = vec!["abcdefghij".to_string(), "abcdefghik".to_string()];
        let (best, score) = normalizer.closest("abcdefghiz", &candidates).unwrap();
        assert_eq!(best, "abcdefghij");
        assert!((score - 0.9).abs() < 1e-9);

        assert!(normalizer.closest("zzzzzzzzzz", &candidates).is_none());
    }

    #[test]
    fn test_similarity() {
        assert!(similarity("fever", "fever") > 0.99);
        assert!(similarity("blister", "blisters") >= 0.8);
        assert!(similarity("kaaitsel", "kaaichal") < 0.8);
        assert!(similarity("", "") > 0.99);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_fuzzy_token_vowel_drift() {
        let normalizer = normalizer();
        // 12 of 15 characters shared in order
        assert!(similarity("kaichel", "kaaichal") >= 0.8);
        assert_eq!(normalizer.normalize_text("kaichel"), set(&["fever"]));
    }
}
