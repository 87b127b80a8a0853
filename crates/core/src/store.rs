//! Referral persistence.
//!
//! The store is the single mutation path for referral records: creation
//! always lands in DRAFT, and every later change goes through
//! [`ReferralStore::transition`], which applies a state-machine function
//! under an exclusive lock. The lock makes the read-check-write sequence a
//! compare-and-set on `status`: when two actors race the same event, the
//! loser re-reads the winner's state and the state machine fails it with
//! `InvalidTransition` instead of double-applying.
//!
//! Records are written through to sharded JSON files (see
//! [`crate::storage`]) and loaded at open. A failed write leaves the
//! in-memory index unchanged, so callers may retry.

use crate::actor::Actor;
use crate::config::CoreConfig;
use crate::patient::Patient;
use crate::referral::{generate_referral_code, Referral, ReferralDraft};
use crate::storage;
use crate::{ReferralError, ReferralResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const REFERRAL_FILE: &str = "referral.json";

/// How many code collisions to tolerate before giving up. With eight hex
/// characters of entropy a second collision in a row means something is
/// wrong with the environment, not bad luck.
const CODE_ATTEMPTS: usize = 5;

/// In-memory referral index with write-through sharded JSON persistence.
#[derive(Clone)]
pub struct ReferralStore {
    cfg: Arc<CoreConfig>,
    referrals: Arc<RwLock<HashMap<Uuid, Referral>>>,
}

impl ReferralStore {
    /// Opens the store, loading any records already on disk.
    pub fn open(cfg: Arc<CoreConfig>) -> ReferralResult<Self> {
        let loaded: Vec<Referral> = storage::load_records(&cfg.referrals_dir(), REFERRAL_FILE)?;
        let referrals = loaded.into_iter().map(|r| (r.id, r)).collect();

        Ok(Self {
            cfg,
            referrals: Arc::new(RwLock::new(referrals)),
        })
    }

    /// Persists a validated draft against a resolved patient record.
    ///
    /// The referral always begins at DRAFT with no destination, even when
    /// the caller intends to send it immediately; creation and sending are
    /// two calls.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Conflict`] if a display-unique referral code
    /// cannot be allocated, or a storage error if the record cannot be
    /// written (in which case nothing was created).
    pub fn create(&self, draft: ReferralDraft, patient: &Patient) -> ReferralResult<Referral> {
        let mut referrals = self.referrals.write().expect("referral index poisoned");

        let mut code = generate_referral_code();
        let mut attempts = 1;
        while referrals.values().any(|r| r.referral_code == code) {
            if attempts >= CODE_ATTEMPTS {
                return Err(ReferralError::Conflict(
                    "could not allocate a unique referral code".into(),
                ));
            }
            code = generate_referral_code();
            attempts += 1;
        }

        let referral = draft.into_referral(patient, code);
        storage::write_record(
            &self.cfg.referrals_dir(),
            referral.id,
            REFERRAL_FILE,
            &referral,
        )?;
        referrals.insert(referral.id, referral.clone());
        tracing::info!("created referral {} as DRAFT", referral.referral_code);

        Ok(referral)
    }

    /// Fetches a referral by id.
    pub fn get(&self, id: Uuid) -> ReferralResult<Referral> {
        let referrals = self.referrals.read().expect("referral index poisoned");
        referrals
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("referral", id.to_string()))
    }

    /// Applies a lifecycle transition to a stored referral.
    ///
    /// The closure receives the *current* stored record and returns the
    /// updated one (or a domain error). The exclusive lock is held across
    /// read, transition and write: a concurrent transition that committed
    /// first is observed by this call, whose closure then fails on the new
    /// status. The updated record is persisted before the index is touched,
    /// so a storage failure leaves state exactly as it was.
    pub fn transition<F>(&self, id: Uuid, apply: F) -> ReferralResult<Referral>
    where
        F: FnOnce(Referral) -> ReferralResult<Referral>,
    {
        let mut referrals = self.referrals.write().expect("referral index poisoned");

        let current = referrals
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("referral", id.to_string()))?;
        let from = current.status;

        let updated = apply(current)?;
        debug_assert_eq!(updated.id, id, "transitions must not change identity");

        storage::write_record(
            &self.cfg.referrals_dir(),
            updated.id,
            REFERRAL_FILE,
            &updated,
        )?;
        referrals.insert(updated.id, updated.clone());
        tracing::debug!(
            "referral {} moved {from} -> {}",
            updated.referral_code,
            updated.status
        );

        Ok(updated)
    }

    /// Referrals created by the given actor, newest first.
    pub fn list_mine(&self, actor: &Actor) -> Vec<Referral> {
        let referrals = self.referrals.read().expect("referral index poisoned");
        let mut mine: Vec<Referral> = referrals
            .values()
            .filter(|r| r.created_by == actor.id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine
    }

    /// Every referral addressed to the given hospital, regardless of status.
    ///
    /// Never returns a referral addressed elsewhere; status filtering and
    /// triage ordering are the liaison workflow's concern.
    pub fn list_incoming(&self, hospital_id: Uuid) -> Vec<Referral> {
        let referrals = self.referrals.read().expect("referral index poisoned");
        referrals
            .values()
            .filter(|r| r.to_hospital == Some(hospital_id))
            .cloned()
            .collect()
    }

    /// Every referral in the store, oldest first.
    pub fn list_all(&self) -> Vec<Referral> {
        let referrals = self.referrals.read().expect("referral index poisoned");
        let mut all: Vec<Referral> = referrals.values().cloned().collect();
        all.sort_by_key(|r| r.created_at);
        all
    }
}
