//! Reference record table loaded from CSV.
//!
//! Header names follow whichever export produced the file, so each field
//! accepts a few aliases (`animal_type`/`animal`/`species`,
//! `symptom_1`/`Symptom1`, `medicine`/`Remedy1`, ...). Columns the matcher
//! does not use are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::Record;

/// Dataset errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing species column (expected one of: animal_type, animal, species)")]
    MissingSpeciesColumn,
}

pub type DatasetResult<T> = Result<T, DatasetError>;

const SPECIES_HEADERS: [&str; 3] = ["animal_type", "animal", "species"];

/// One CSV row as written.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "animal_type", alias = "animal")]
    species: Option<String>,
    #[serde(default)]
    breed: Option<String>,
    #[serde(default, alias = "age_group")]
    age: Option<String>,
    #[serde(default, alias = "gender")]
    sex: Option<String>,
    #[serde(default)]
    disease: Option<String>,
    #[serde(default, alias = "Symptom1")]
    symptom_1: Option<String>,
    #[serde(default, alias = "Symptom2")]
    symptom_2: Option<String>,
    #[serde(default, alias = "Symptom3")]
    symptom_3: Option<String>,
    #[serde(default, alias = "Remedy1")]
    medicine: Option<String>,
    #[serde(default, alias = "Remedy2")]
    care_1: Option<String>,
    #[serde(default, alias = "Remedy3")]
    care_2: Option<String>,
    #[serde(default)]
    recovery_days: Option<String>,
    #[serde(default)]
    vet_required: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Option<Record> {
        let species = cell(self.species)?;
        let mut record = Record::new(species, cell(self.disease).unwrap_or_default());
        record.breed = cell(self.breed);
        record.age_group = cell(self.age);
        record.sex = cell(self.sex);
        record.symptom_tags = [
            cell(self.symptom_1).unwrap_or_default(),
            cell(self.symptom_2).unwrap_or_default(),
            cell(self.symptom_3).unwrap_or_default(),
        ];
        record.remedy_primary = cell(self.medicine);
        record.remedy_secondary = cell(self.care_1);
        record.remedy_tertiary = cell(self.care_2);
        if let Some(days) = cell(self.recovery_days) {
            record.recovery_days = days;
        }
        if let Some(vet) = cell(self.vet_required) {
            record.vet_required = vet;
        }
        Some(record)
    }
}

/// Trimmed cell value; empty and "nan" cells are absent.
fn cell(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Immutable table of reference records.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    /// Wrap already-parsed records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> DatasetResult<Self> {
        let file = File::open(path.as_ref())?;
        let table = Self::from_reader(file)?;
        info!(
            path = %path.as_ref().display(),
            records = table.len(),
            "loaded record table"
        );
        Ok(table)
    }

    /// Load CSV from any reader. Rows without a species are skipped.
    pub fn from_reader<R: Read>(reader: R) -> DatasetResult<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let has_species = reader
            .headers()?
            .iter()
            .any(|h| SPECIES_HEADERS.contains(&h));
        if !has_species {
            return Err(DatasetError::MissingSpeciesColumn);
        }

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<RawRow>().enumerate() {
            match row?.into_record() {
                Some(record) => records.push(record),
                // Header is line 1
                None => warn!(line = index + 2, "skipping row without species"),
            }
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct species in first-seen order.
    pub fn species(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(&record.species)) {
                seen.push(&record.species);
            }
        }
        seen
    }
}
