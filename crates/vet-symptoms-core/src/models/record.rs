//! Reference disease records.

use serde::{Deserialize, Serialize};

/// Optional attributes a query can narrow records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAttribute {
    Breed,
    AgeGroup,
    Sex,
}

impl RecordAttribute {
    /// Refinement order applied by the record filter.
    pub const REFINEMENT_ORDER: [RecordAttribute; 3] =
        [RecordAttribute::Breed, RecordAttribute::AgeGroup, RecordAttribute::Sex];

    pub fn name(&self) -> &'static str {
        match self {
            RecordAttribute::Breed => "breed",
            RecordAttribute::AgeGroup => "age",
            RecordAttribute::Sex => "sex",
        }
    }
}

/// One row of the reference disease table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Animal type (e.g., "Cow", "Cat")
    pub species: String,
    /// Breed
    pub breed: Option<String>,
    /// Age or age group, kept as written in the source
    pub age_group: Option<String>,
    /// Sex (e.g., "Male", "Female")
    pub sex: Option<String>,
    /// Up to three symptom descriptions; unused slots are empty
    pub symptom_tags: [String; 3],
    /// Disease name (English)
    pub disease_name: String,
    /// Medicine
    pub remedy_primary: Option<String>,
    /// First care instruction
    pub remedy_secondary: Option<String>,
    /// Second care instruction
    pub remedy_tertiary: Option<String>,
    /// Recovery duration, kept as text
    pub recovery_days: String,
    /// "Yes"/"No"
    pub vet_required: String,
}

impl Record {
    /// Create a record with required fields.
    pub fn new(species: String, disease_name: String) -> Self {
        Self {
            species,
            breed: None,
            age_group: None,
            sex: None,
            symptom_tags: Default::default(),
            disease_name,
            remedy_primary: None,
            remedy_secondary: None,
            remedy_tertiary: None,
            recovery_days: "-".to_string(),
            vet_required: "Yes".to_string(),
        }
    }

    /// Check if this record belongs to a species (case-insensitive).
    pub fn is_species(&self, species: &str) -> bool {
        self.species.to_lowercase() == species.to_lowercase()
    }

    /// Value of an optional attribute.
    pub fn attribute(&self, attribute: RecordAttribute) -> Option<&str> {
        match attribute {
            RecordAttribute::Breed => self.breed.as_deref(),
            RecordAttribute::AgeGroup => self.age_group.as_deref(),
            RecordAttribute::Sex => self.sex.as_deref(),
        }
    }

    /// Check an optional attribute for a case-insensitive exact match.
    ///
    /// Records without a value never match.
    pub fn attribute_matches(&self, attribute: RecordAttribute, value: &str) -> bool {
        self.attribute(attribute)
            .map(|v| v.to_lowercase() == value.to_lowercase())
            .unwrap_or(false)
    }

    /// Care instructions (secondary and tertiary remedies) that are present.
    pub fn care_instructions(&self) -> Vec<&str> {
        [&self.remedy_secondary, &self.remedy_tertiary]
            .into_iter()
            .filter_map(|r| r.as_deref())
            .filter(|r| !r.trim().is_empty())
            .collect()
    }

    /// Primary remedy if present and non-blank.
    pub fn medicine(&self) -> Option<&str> {
        self.remedy_primary
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }
}
