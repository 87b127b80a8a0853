//! Referral records and the draft builder.
//!
//! A referral always begins life as a DRAFT assembled by
//! [`ReferralDraft::build`], which validates the clinical details and the
//! patient reference up front and reports *every* missing required field in
//! one error. Sending, triage and completion are owned by the lifecycle
//! state machine in [`crate::lifecycle`]; nothing else mutates `status`.

use crate::actor::Actor;
use crate::patient::{Patient, PatientInput};
use crate::{ReferralError, ReferralResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

/// Clinical urgency of a referral.
///
/// Variant order is the triage order: `Routine < Urgent < Emergency`, so the
/// derived `Ord` ranks emergencies highest.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Routine,
    Urgent,
    Emergency,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Urgency::Routine => "ROUTINE",
            Urgency::Urgent => "URGENT",
            Urgency::Emergency => "EMERGENCY",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle status of a referral.
///
/// The allowed movements between statuses are defined by the transition
/// table in [`crate::lifecycle`]; this enum only names the states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralStatus {
    Draft,
    Pending,
    Accepted,
    Rejected,
    Scheduled,
    CheckedIn,
    Completed,
    Expired,
}

impl ReferralStatus {
    /// True for states with no outgoing transitions.
    ///
    /// REJECTED is terminal: a rejected referral cannot be edited and
    /// resent.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReferralStatus::Rejected | ReferralStatus::Completed | ReferralStatus::Expired
        )
    }
}

impl std::fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferralStatus::Draft => "DRAFT",
            ReferralStatus::Pending => "PENDING",
            ReferralStatus::Accepted => "ACCEPTED",
            ReferralStatus::Rejected => "REJECTED",
            ReferralStatus::Scheduled => "SCHEDULED",
            ReferralStatus::CheckedIn => "CHECKED_IN",
            ReferralStatus::Completed => "COMPLETED",
            ReferralStatus::Expired => "EXPIRED",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Referral record
// ============================================================================

/// A referral record.
///
/// `patient_name` and `patient_phone` are a denormalised snapshot captured
/// at creation time so the referral still displays sensibly if the patient
/// record changes later; `patient_id` is the authoritative reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: Uuid,
    /// System-generated display code, unique within the store.
    pub referral_code: String,
    pub from_hospital: Uuid,
    /// Unset while DRAFT; set by `send` and immutable afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_hospital: Option<Uuid>,
    pub doctor_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub urgency: Urgency,
    pub reason_for_referral: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_bed_type: Option<String>,
    pub status: ReferralStatus,
    /// Notes attached by the liaison at decision time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment details supplied when scheduling an accepted referral.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDetails {
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Generates a display-unique referral code: `REF-` plus eight uppercase
/// hex characters. Uniqueness is enforced by the store at creation.
pub(crate) fn generate_referral_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("REF-{}", hex[..8].to_uppercase())
}

// ============================================================================
// Draft builder
// ============================================================================

/// The patient a referral is about: an existing record or a registration
/// payload for a patient not yet in the directory.
#[derive(Clone, Debug)]
pub enum PatientSelector {
    Existing(Uuid),
    New(PatientInput),
}

/// Clinical details of a referral, as entered by the referring doctor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralDetails {
    pub urgency: Urgency,
    #[serde(default)]
    pub reason_for_referral: String,
    #[serde(default)]
    pub clinical_notes: Option<String>,
    #[serde(default)]
    pub required_specialty: Option<String>,
    #[serde(default)]
    pub required_bed_type: Option<String>,
}

/// A validated, not-yet-persisted referral.
///
/// Produced only by [`ReferralDraft::build`]; holding one means the details
/// passed validation and the actor was allowed to create referrals.
#[derive(Clone, Debug)]
pub struct ReferralDraft {
    pub(crate) from_hospital: Uuid,
    pub(crate) doctor_name: String,
    pub(crate) created_by: Uuid,
    pub(crate) patient: PatientSelector,
    pub(crate) details: ReferralDetails,
}

impl ReferralDraft {
    /// Assembles a draft referral from the actor's input.
    ///
    /// The origin hospital is derived from the actor's affiliation, never
    /// supplied by the caller. The destination stays unset: creation and
    /// sending are two separate calls even when the UI submits directly.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Forbidden`] when the actor's role cannot create
    ///   referrals or the actor has no hospital affiliation.
    /// - [`ReferralError::Validation`] listing every missing required field
    ///   across both the clinical details and a new-patient payload.
    pub fn build(
        actor: &Actor,
        patient: PatientSelector,
        details: ReferralDetails,
    ) -> ReferralResult<Self> {
        if !actor.permissions().can_create_referral {
            return Err(ReferralError::Forbidden(format!(
                "role {} cannot create referrals",
                actor.role
            )));
        }
        let from_hospital = actor.hospital_or_forbidden()?;

        let mut missing = Vec::new();
        if details.reason_for_referral.trim().is_empty() {
            missing.push("reasonForReferral".to_string());
        }
        if let PatientSelector::New(input) = &patient {
            missing.extend(input.missing_fields());
        }
        if !missing.is_empty() {
            return Err(ReferralError::Validation(missing));
        }

        Ok(Self {
            from_hospital,
            doctor_name: actor.full_name.as_str().to_string(),
            created_by: actor.id,
            patient,
            details,
        })
    }

    pub fn patient(&self) -> &PatientSelector {
        &self.patient
    }

    /// Materialises the draft against a resolved patient record.
    ///
    /// Always produces a DRAFT with no destination hospital; the snapshot
    /// fields are captured from the patient record at this moment.
    pub(crate) fn into_referral(self, patient: &Patient, code: String) -> Referral {
        let now = Utc::now();
        Referral {
            id: Uuid::new_v4(),
            referral_code: code,
            from_hospital: self.from_hospital,
            to_hospital: None,
            doctor_name: self.doctor_name,
            patient_id: patient.id,
            patient_name: patient.full_name.clone(),
            patient_phone: patient.phone.clone(),
            urgency: self.details.urgency,
            reason_for_referral: self.details.reason_for_referral.trim().to_string(),
            clinical_notes: self.details.clinical_notes,
            required_specialty: self.details.required_specialty,
            required_bed_type: self.details.required_bed_type,
            status: ReferralStatus::Draft,
            decision_notes: None,
            rejection_reason: None,
            scheduled_for: None,
            schedule_notes: None,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}
