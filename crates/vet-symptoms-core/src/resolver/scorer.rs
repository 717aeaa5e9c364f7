//! Candidate scoring and best-record selection.
//!
//! The shipped scorer counts substring hits: every (query tag, record slot)
//! pair where the tag occurs inside the slot text adds one. A tag can hit
//! several slots and a slot can be hit by several tags. Existing diagnoses
//! depend on these counts, so the scorer sits behind [`SymptomScorer`] and
//! alternatives plug in without touching the pipeline.

use std::collections::BTreeSet;

use crate::models::{MatchResult, Record};

/// Scores a record against a canonical symptom set.
pub trait SymptomScorer: Send + Sync {
    fn score(&self, record: &Record, symptoms: &BTreeSet<String>) -> u32;

    /// Pick the highest-scoring candidate.
    ///
    /// Only a strict improvement replaces the current best, so the first
    /// record reaching the maximum wins. No candidates or a best score of
    /// zero give [`MatchResult::no_match`].
    fn select_best(&self, candidates: &[&Record], symptoms: &BTreeSet<String>) -> MatchResult {
        let mut best: Option<&Record> = None;
        let mut best_score = 0;

        for &record in candidates {
            let score = self.score(record, symptoms);
            if best.is_none() || score > best_score {
                best = Some(record);
                best_score = score;
            }
        }

        match best {
            Some(record) if best_score > 0 => MatchResult {
                record: Some(record.clone()),
                score: best_score,
            },
            _ => MatchResult::no_match(),
        }
    }

    fn name(&self) -> &'static str;
}

/// Substring-containment scorer (case-insensitive).
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentScorer;

impl SymptomScorer for ContainmentScorer {
    fn score(&self, record: &Record, symptoms: &BTreeSet<String>) -> u32 {
        let slots: Vec<String> = record
            .symptom_tags
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        let mut score = 0;
        for symptom in symptoms {
            let symptom = symptom.trim().to_lowercase();
            if symptom.is_empty() {
                continue;
            }
            for slot in &slots {
                if slot.contains(&symptom) {
                    score += 1;
                }
            }
        }
        score
    }

    fn name(&self) -> &'static str {
        "containment"
    }
}

/// Exact-tag scorer: a slot is split on commas and each query tag counts
/// once if it equals one of the resulting terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTagScorer;

impl SymptomScorer for ExactTagScorer {
    fn score(&self, record: &Record, symptoms: &BTreeSet<String>) -> u32 {
        let terms: BTreeSet<String> = record
            .symptom_tags
            .iter()
            .flat_map(|slot| slot.split(','))
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        symptoms
            .iter()
            .filter(|s| terms.contains(&s.trim().to_lowercase()))
            .count() as u32
    }

    fn name(&self) -> &'static str {
        "exact-tag"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(disease: &str, slots: [&str; 3]) -> Record {
        let mut r = Record::new("Cow".into(), disease.into());
        r.symptom_tags = slots.map(String::from);
        r
    }

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_containment_counts_pairs() {
        let r = record("Viral Fever", ["High Fever", "fever, lethargy", "cough"]);
        // "fever" hits two slots, "cough" one
        assert_eq!(ContainmentScorer.score(&r, &set(&["fever", "cough"])), 3);
    }

    #[test]
    fn test_containment_slot_hit_by_several_tags() {
        let r = record("Bloat", ["bloating and pain", "", ""]);
        assert_eq!(ContainmentScorer.score(&r, &set(&["bloating", "pain"])), 2);
    }

    #[test]
    fn test_containment_ignores_blank_tags() {
        let r = record("Bloat", ["bloating", "", ""]);
        assert_eq!(ContainmentScorer.score(&r, &set(&["", "  "])), 0);
    }

    #[test]
    fn test_select_best_no_candidates() {
        let result = ContainmentScorer.select_best(&[], &set(&["fever"]));
        assert_eq!(result, MatchResult::no_match());
    }

    #[test]
    fn test_select_best_zero_overlap() {
        let a = record("Mastitis", ["milk drop", "swelling", ""]);
        let result = ContainmentScorer.select_best(&[&a], &set(&["cough"]));
        assert!(result.record.is_none());
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_select_best_prefers_first_on_tie() {
        let a = record("Viral Fever", ["fever", "", ""]);
        let b = record("Fever Infection", ["fever", "", ""]);
        let result = ContainmentScorer.select_best(&[&a, &b], &set(&["fever"]));
        assert_eq!(result.record.unwrap().disease_name, "Viral Fever");
        assert_eq!(result.score, 1);
    }

    #[test]
    fn test_select_best_strict_improvement() {
        let a = record("Viral Fever", ["fever", "", ""]);
        let b = record("Respiratory Infection", ["fever", "cough", ""]);
        let result = ContainmentScorer.select_best(&[&a, &b], &set(&["fever", "cough"]));
        assert_eq!(result.record.unwrap().disease_name, "Respiratory Infection");
        assert_eq!(result.score, 2);
    }

    #[test]
    fn test_exact_tag_scorer() {
        let r = record("Viral Fever", ["fever, lethargy", "high fever", ""]);
        assert_eq!(ExactTagScorer.score(&r, &set(&["fever", "lethargy"])), 2);
        assert_eq!(ExactTagScorer.score(&r, &set(&["lethar"])), 0);
    }

    proptest! {
        #[test]
        fn prop_select_best_is_deterministic_and_maximal(
            slots in proptest::collection::vec(
                proptest::array::uniform3("((fever|cough|pain|itching) ?){0,2}"),
                0..8,
            ),
            symptoms in proptest::collection::btree_set("(fever|cough|pain|itching)", 0..4),
        ) {
            let records: Vec<Record> = slots
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let mut r = Record::new("Cow".into(), format!("D{}", i));
                    r.symptom_tags = s.clone();
                    r
                })
                .collect();
            let candidates: Vec<&Record> = records.iter().collect();

            let first = ContainmentScorer.select_best(&candidates, &symptoms);
            let second = ContainmentScorer.select_best(&candidates, &symptoms);
            prop_assert_eq!(&first, &second);

            let max = records.iter().map(|r| ContainmentScorer.score(r, &symptoms)).max().unwrap_or(0);
            prop_assert_eq!(first.score, max);
            match &first.record {
                None => prop_assert_eq!(max, 0),
                Some(best) => {
                    let first_max = records
                        .iter()
                        .find(|r| ContainmentScorer.score(r, &symptoms) == max)
                        .unwrap();
                    prop_assert_eq!(&best.disease_name, &first_max.disease_name);
                }
            }
        }
    }
}
