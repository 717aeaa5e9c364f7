//! Candidate narrowing by species and optional attributes.
//!
//! Species is mandatory: no species match means no candidates. Breed, age
//! and sex are refinements that only stick when they leave at least one
//! record, so sparse or mismatched metadata degrades to a wider set rather
//! than a false "not found".

use tracing::debug;

use crate::models::{NormalizedQuery, Record, RecordAttribute};

/// Apply `keep` to `current` unless that would empty it.
///
/// Returns the narrowed set and whether the refinement was applied.
pub fn refine_if_nonempty<'a, F>(current: Vec<&'a Record>, keep: F) -> (Vec<&'a Record>, bool)
where
    F: Fn(&Record) -> bool,
{
    let narrowed: Vec<&'a Record> = current.iter().copied().filter(|r| keep(r)).collect();
    if narrowed.is_empty() {
        (current, false)
    } else {
        (narrowed, true)
    }
}

/// Record filter for the candidate stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter;

impl RecordFilter {
    pub fn new() -> Self {
        Self
    }

    /// Narrow `records` for a species and optional refinements.
    pub fn filter<'a>(
        &self,
        records: &'a [Record],
        species: &str,
        breed: Option<&str>,
        age_group: Option<&str>,
        sex: Option<&str>,
    ) -> Vec<&'a Record> {
        let candidates: Vec<&'a Record> = records.iter().filter(|r| r.is_species(species)).collect();
        if candidates.is_empty() {
            debug!(species, "no records for species");
            return candidates;
        }

        let refinements = RecordAttribute::REFINEMENT_ORDER
            .into_iter()
            .zip([breed, age_group, sex]);

        refinements.fold(candidates, |current, (attribute, value)| {
            let value = match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => v,
                None => return current,
            };
            let (narrowed, applied) =
                refine_if_nonempty(current, |r| r.attribute_matches(attribute, value));
            if !applied {
                debug!(attribute = attribute.name(), value, "refinement dropped, no records match");
            }
            narrowed
        })
    }

    /// Narrow `records` using the attributes of a normalized query.
    pub fn filter_query<'a>(&self, records: &'a [Record], query: &NormalizedQuery) -> Vec<&'a Record> {
        self.filter(
            records,
            &query.species,
            query.breed.as_deref(),
            query.age.as_deref(),
            query.sex.as_deref(),
        )
    }
}
