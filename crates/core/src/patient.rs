//! Patient directory.
//!
//! Resolves a patient identity by phone, national ID or full name, or
//! registers a new patient record. The directory never silently creates a
//! duplicate when a match exists for the searched key: `find_or_create`
//! always resolves by phone before registering.
//!
//! Creation is not idempotent across *concurrent* duplicate submissions by
//! two actors searching different keys. That limitation is documented, not
//! solved here.

use crate::config::CoreConfig;
use crate::storage;
use crate::{ReferralError, ReferralResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const PATIENT_FILE: &str = "patient.json";

/// Patient sex as recorded at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// A registered patient record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when registering a patient.
///
/// Required fields are optional here so that validation can report the
/// complete set of missing ones rather than failing at deserialisation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl PatientInput {
    /// Returns the wire names of every missing required field.
    ///
    /// Required: `fullName`, `sex`, `dateOfBirth`, `phone`. Blank strings
    /// count as missing.
    pub fn missing_fields(&self) -> Vec<String> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        }

        let mut missing = Vec::new();
        if blank(&self.full_name) {
            missing.push("fullName".to_string());
        }
        if self.sex.is_none() {
            missing.push("sex".to_string());
        }
        if self.date_of_birth.is_none() {
            missing.push("dateOfBirth".to_string());
        }
        if blank(&self.phone) {
            missing.push("phone".to_string());
        }
        missing
    }
}

/// A single-key patient lookup.
///
/// Exactly one search key is used per call; callers choose the priority.
/// The referral workflow searches by phone first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatientQuery {
    Phone(String),
    NationalId(String),
    FullName(String),
}

/// In-memory patient index with write-through sharded JSON persistence.
#[derive(Clone)]
pub struct PatientDirectory {
    cfg: Arc<CoreConfig>,
    patients: Arc<RwLock<HashMap<Uuid, Patient>>>,
}

impl PatientDirectory {
    /// Opens the directory, loading any records already on disk.
    ///
    /// # Errors
    ///
    /// Returns a storage error if an existing record file cannot be read.
    /// Unparsable records are skipped with a warning.
    pub fn open(cfg: Arc<CoreConfig>) -> ReferralResult<Self> {
        let loaded: Vec<Patient> = storage::load_records(&cfg.patients_dir(), PATIENT_FILE)?;
        let patients = loaded.into_iter().map(|p| (p.id, p)).collect();

        Ok(Self {
            cfg,
            patients: Arc::new(RwLock::new(patients)),
        })
    }

    /// Returns every patient matching the query key.
    ///
    /// Phone and national ID match exactly; full name matches
    /// case-insensitively on the trimmed value.
    pub fn search(&self, query: &PatientQuery) -> Vec<Patient> {
        let patients = self.patients.read().expect("patient index poisoned");
        let mut matches: Vec<Patient> = patients
            .values()
            .filter(|p| match query {
                PatientQuery::Phone(phone) => p.phone == phone.trim(),
                PatientQuery::NationalId(national_id) => {
                    p.national_id.as_deref() == Some(national_id.trim())
                }
                PatientQuery::FullName(name) => {
                    p.full_name.eq_ignore_ascii_case(name.trim())
                }
            })
            .cloned()
            .collect();
        matches.sort_by_key(|p| p.created_at);
        matches
    }

    /// Resolves a patient by a single key, oldest record winning when more
    /// than one matches.
    pub fn resolve(&self, query: &PatientQuery) -> Option<Patient> {
        self.search(query).into_iter().next()
    }

    /// Resolves by phone, registering a new patient on a miss.
    ///
    /// Two calls with the same phone never create two records, even when
    /// concurrent: the lookup and the insert happen under one write lock,
    /// so the later call returns the record the earlier one made.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Validation`] listing every missing required
    /// field, or a storage error if the new record cannot be persisted (in
    /// which case nothing was registered).
    pub fn find_or_create(&self, input: PatientInput) -> ReferralResult<Patient> {
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(ReferralError::Validation(missing));
        }

        let phone = input.phone.as_deref().unwrap_or_default().trim().to_string();

        // The write lock spans the phone lookup and the insert, so two
        // concurrent submissions of the same phone cannot both miss and
        // both register.
        let mut patients = self.patients.write().expect("patient index poisoned");
        if let Some(existing) = patients
            .values()
            .filter(|p| p.phone == phone)
            .min_by_key(|p| p.created_at)
        {
            return Ok(existing.clone());
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            full_name: input.full_name.unwrap_or_default().trim().to_string(),
            sex: input.sex.expect("validated above"),
            date_of_birth: input.date_of_birth.expect("validated above"),
            phone,
            national_id: input
                .national_id
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            address: input
                .address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            created_at: Utc::now(),
        };

        storage::write_record(&self.cfg.patients_dir(), patient.id, PATIENT_FILE, &patient)?;
        patients.insert(patient.id, patient.clone());
        tracing::info!("registered patient {}", patient.id);

        Ok(patient)
    }

    /// Fetches a patient by id.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::NotFound`] when no such patient exists.
    pub fn get(&self, id: Uuid) -> ReferralResult<Patient> {
        let patients = self.patients.read().expect("patient index poisoned");
        patients
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("patient", id.to_string()))
    }

    /// Returns all registered patients, oldest first.
    pub fn list(&self) -> Vec<Patient> {
        let patients = self.patients.read().expect("patient index poisoned");
        let mut all: Vec<Patient> = patients.values().cloned().collect();
        all.sort_by_key(|p| p.created_at);
        all
    }
}
