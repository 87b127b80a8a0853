//! Hospital directory.
//!
//! Hospitals are referenced by id from users and referrals. The directory
//! only creates and lists; there is no further lifecycle.

use crate::actor::Actor;
use crate::config::CoreConfig;
use crate::storage;
use crate::{ReferralError, ReferralResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const HOSPITAL_FILE: &str = "hospital.json";

/// A registered hospital.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when registering a hospital.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// In-memory hospital index with write-through sharded JSON persistence.
#[derive(Clone)]
pub struct HospitalDirectory {
    cfg: Arc<CoreConfig>,
    hospitals: Arc<RwLock<HashMap<Uuid, Hospital>>>,
}

impl HospitalDirectory {
    /// Opens the directory, loading any records already on disk.
    pub fn open(cfg: Arc<CoreConfig>) -> ReferralResult<Self> {
        let loaded: Vec<Hospital> = storage::load_records(&cfg.hospitals_dir(), HOSPITAL_FILE)?;
        let hospitals = loaded.into_iter().map(|h| (h.id, h)).collect();

        Ok(Self {
            cfg,
            hospitals: Arc::new(RwLock::new(hospitals)),
        })
    }

    /// Registers a hospital. System admins only.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Forbidden`] when the actor cannot manage hospitals.
    /// - [`ReferralError::Validation`] listing every missing required field
    ///   (`name`, `email`).
    /// - [`ReferralError::Conflict`] when a hospital with the same name
    ///   already exists.
    pub fn create(&self, actor: &Actor, input: HospitalInput) -> ReferralResult<Hospital> {
        if !actor.permissions().can_manage_hospitals {
            return Err(ReferralError::Forbidden(format!(
                "role {} cannot manage hospitals",
                actor.role
            )));
        }

        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        }

        let mut missing = Vec::new();
        if blank(&input.name) {
            missing.push("name".to_string());
        }
        if blank(&input.email) {
            missing.push("email".to_string());
        }
        if !missing.is_empty() {
            return Err(ReferralError::Validation(missing));
        }

        let name = input.name.unwrap_or_default().trim().to_string();
        let mut hospitals = self.hospitals.write().expect("hospital index poisoned");
        if hospitals.values().any(|h| h.name.eq_ignore_ascii_case(&name)) {
            return Err(ReferralError::Conflict(format!(
                "hospital {name:?} already exists"
            )));
        }

        let hospital = Hospital {
            id: Uuid::new_v4(),
            name,
            email: input.email.unwrap_or_default().trim().to_string(),
            address: input
                .address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            phone: input
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            created_at: Utc::now(),
        };

        storage::write_record(
            &self.cfg.hospitals_dir(),
            hospital.id,
            HOSPITAL_FILE,
            &hospital,
        )?;
        hospitals.insert(hospital.id, hospital.clone());
        tracing::info!("registered hospital {} ({})", hospital.name, hospital.id);

        Ok(hospital)
    }

    /// Fetches a hospital by id.
    pub fn get(&self, id: Uuid) -> ReferralResult<Hospital> {
        let hospitals = self.hospitals.read().expect("hospital index poisoned");
        hospitals
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("hospital", id.to_string()))
    }

    /// Returns all hospitals, oldest first.
    pub fn list(&self) -> Vec<Hospital> {
        let hospitals = self.hospitals.read().expect("hospital index poisoned");
        let mut all: Vec<Hospital> = hospitals.values().cloned().collect();
        all.sort_by_key(|h| h.created_at);
        all
    }
}
