//! Referral lifecycle state machine.
//!
//! Owns every status movement a referral can make:
//!
//! ```text
//! DRAFT --send--> PENDING --accept--> ACCEPTED --schedule--> SCHEDULED
//!                    |                                            |
//!                    +--reject--> REJECTED          --check_in--> CHECKED_IN
//!                                                                 |
//!                                                  --complete--> COMPLETED
//! {DRAFT, PENDING, ACCEPTED, SCHEDULED} --expire--> EXPIRED
//! ```
//!
//! Transitions are total over (status, event): an event fired against any
//! status not listed for it fails with `InvalidTransition` naming both, and
//! never silently no-ops. Each function takes the current referral by value
//! and returns the updated one; persistence and the race-resolving
//! compare-and-set live in [`crate::store`], which is the only place these
//! functions are applied to stored state.

use crate::actor::Actor;
use crate::policy::Role;
use crate::referral::{Referral, ReferralStatus, ScheduleDetails};
use crate::{ReferralError, ReferralResult};
use chrono::Utc;
use uuid::Uuid;

/// Checks the current status against the single status an event accepts.
fn require_status(
    referral: &Referral,
    expected: ReferralStatus,
    event: &'static str,
) -> ReferralResult<()> {
    if referral.status != expected {
        return Err(ReferralError::InvalidTransition {
            status: referral.status,
            event,
        });
    }
    Ok(())
}

/// DRAFT → PENDING. Sends the draft to a destination hospital.
///
/// Guards:
/// - the referral is in DRAFT,
/// - the actor is the referral's creator, or a doctor at the origin hospital,
/// - the destination differs from the origin (`Validation` otherwise).
///
/// Once sent, the destination is immutable: there is no event that changes
/// `to_hospital` again.
pub fn send(mut referral: Referral, actor: &Actor, to_hospital: Uuid) -> ReferralResult<Referral> {
    require_status(&referral, ReferralStatus::Draft, "send")?;

    let is_creator = actor.id == referral.created_by;
    let is_origin_doctor =
        actor.role == Role::Doctor && actor.is_at(referral.from_hospital);
    if !is_creator && !is_origin_doctor {
        return Err(ReferralError::Forbidden(
            "only the creator or a doctor at the origin hospital may send a referral".into(),
        ));
    }

    if to_hospital == referral.from_hospital {
        return Err(ReferralError::invalid(
            "toHospital must differ from fromHospital",
        ));
    }

    referral.to_hospital = Some(to_hospital);
    referral.status = ReferralStatus::Pending;
    referral.updated_at = Utc::now();
    tracing::info!("referral {} sent to hospital {to_hospital}", referral.referral_code);
    Ok(referral)
}

/// Returns the destination hospital of a referral past DRAFT.
///
/// Every transition out of PENDING or later requires a destination. A
/// stored record without one is broken (only a hand-edited file can
/// produce it), so the event fails instead of panicking under the
/// store's write lock.
fn destination_of(referral: &Referral, event: &'static str) -> ReferralResult<Uuid> {
    referral.to_hospital.ok_or(ReferralError::InvalidTransition {
        status: referral.status,
        event,
    })
}

/// Checks that the actor is a liaison officer at the referral's destination.
fn require_destination_liaison(
    referral: &Referral,
    actor: &Actor,
    event: &'static str,
) -> ReferralResult<()> {
    let destination = destination_of(referral, event)?;
    if actor.role != Role::LiaisonOfficer || !actor.is_at(destination) {
        return Err(ReferralError::Forbidden(
            "only a liaison officer at the destination hospital may decide this referral".into(),
        ));
    }
    Ok(())
}

/// PENDING → ACCEPTED. Liaison at the destination accepts the referral.
pub fn accept(
    mut referral: Referral,
    actor: &Actor,
    notes: Option<String>,
) -> ReferralResult<Referral> {
    require_status(&referral, ReferralStatus::Pending, "accept")?;
    require_destination_liaison(&referral, actor, "accept")?;

    referral.status = ReferralStatus::Accepted;
    referral.decision_notes = notes.filter(|n| !n.trim().is_empty());
    referral.updated_at = Utc::now();
    tracing::info!("referral {} accepted", referral.referral_code);
    Ok(referral)
}

/// PENDING → REJECTED. Liaison at the destination rejects the referral.
///
/// The reason is optional but recorded when present. REJECTED is terminal:
/// no event leads out of it.
pub fn reject(
    mut referral: Referral,
    actor: &Actor,
    reason: Option<String>,
) -> ReferralResult<Referral> {
    require_status(&referral, ReferralStatus::Pending, "reject")?;
    require_destination_liaison(&referral, actor, "reject")?;

    referral.status = ReferralStatus::Rejected;
    referral.rejection_reason = reason.filter(|r| !r.trim().is_empty());
    referral.updated_at = Utc::now();
    tracing::info!("referral {} rejected", referral.referral_code);
    Ok(referral)
}

/// ACCEPTED → SCHEDULED. Staff at the destination book the appointment.
///
/// Any role at the destination hospital may schedule; the triage decision
/// already happened at accept time.
pub fn schedule(
    mut referral: Referral,
    actor: &Actor,
    details: ScheduleDetails,
) -> ReferralResult<Referral> {
    require_status(&referral, ReferralStatus::Accepted, "schedule")?;

    let destination = destination_of(&referral, "schedule")?;
    if !actor.is_at(destination) {
        return Err(ReferralError::Forbidden(
            "only staff at the destination hospital may schedule this referral".into(),
        ));
    }

    referral.status = ReferralStatus::Scheduled;
    referral.scheduled_for = Some(details.scheduled_for);
    referral.schedule_notes = details.notes.filter(|n| !n.trim().is_empty());
    referral.updated_at = Utc::now();
    Ok(referral)
}

/// SCHEDULED → CHECKED_IN. The patient physically presents.
///
/// No guard beyond the status: check-in is recorded by whoever operates the
/// desk when the patient arrives.
pub fn check_in(mut referral: Referral, _actor: &Actor) -> ReferralResult<Referral> {
    require_status(&referral, ReferralStatus::Scheduled, "check_in")?;

    referral.status = ReferralStatus::CheckedIn;
    referral.updated_at = Utc::now();
    Ok(referral)
}

/// CHECKED_IN → COMPLETED. Terminal.
pub fn complete(mut referral: Referral, _actor: &Actor) -> ReferralResult<Referral> {
    require_status(&referral, ReferralStatus::CheckedIn, "complete")?;

    referral.status = ReferralStatus::Completed;
    referral.updated_at = Utc::now();
    tracing::info!("referral {} completed", referral.referral_code);
    Ok(referral)
}

/// {DRAFT, PENDING, ACCEPTED, SCHEDULED} → EXPIRED.
///
/// Expiry is an externally triggered event (see
/// [`crate::workflow::expire_overdue`]); the state machine accepts it but
/// never schedules it. A checked-in patient is in the building, so
/// CHECKED_IN does not expire.
pub fn expire(mut referral: Referral) -> ReferralResult<Referral> {
    use ReferralStatus::*;
    if !matches!(referral.status, Draft | Pending | Accepted | Scheduled) {
        return Err(ReferralError::InvalidTransition {
            status: referral.status,
            event: "expire",
        });
    }

    referral.status = Expired;
    referral.updated_at = Utc::now();
    tracing::info!("referral {} expired", referral.referral_code);
    Ok(referral)
}
