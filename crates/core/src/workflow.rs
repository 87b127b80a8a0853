//! Referral workflows.
//!
//! These services compose the directories, the draft builder and the state
//! machine into the operations the two referral-facing roles actually
//! perform:
//!
//! - [`ReferralWorkflow`] — the doctor side: resolve or register the
//!   patient, build the draft, create it, send it.
//! - [`LiaisonWorkflow`] — the receiving side: triage the incoming queue,
//!   apply accept/reject decisions, and walk the accepted referral
//!   through scheduling, check-in and completion.
//!
//! Plus [`expire_overdue`], the externally invoked SLA sweep.

use crate::actor::Actor;
use crate::config::SlaPolicy;
use crate::hospital::HospitalDirectory;
use crate::lifecycle;
use crate::patient::{Patient, PatientDirectory};
use crate::policy::Role;
use crate::referral::{
    PatientSelector, Referral, ReferralDetails, ReferralDraft, ReferralStatus, ScheduleDetails,
};
use crate::store::ReferralStore;
use crate::{ReferralError, ReferralResult};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use uuid::Uuid;

/// A liaison's verdict on a pending referral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

// ============================================================================
// Doctor side
// ============================================================================

/// Creation and sending of referrals by doctors.
#[derive(Clone)]
pub struct ReferralWorkflow {
    store: ReferralStore,
    patients: PatientDirectory,
    hospitals: HospitalDirectory,
}

impl ReferralWorkflow {
    pub fn new(
        store: ReferralStore,
        patients: PatientDirectory,
        hospitals: HospitalDirectory,
    ) -> Self {
        Self {
            store,
            patients,
            hospitals,
        }
    }

    /// Creates a referral as DRAFT.
    ///
    /// Validation happens before any patient record is touched: a draft
    /// that fails validation registers nothing. A new-patient payload goes
    /// through the directory's find-or-create, so submitting the same phone
    /// twice reuses the existing record instead of duplicating it.
    ///
    /// # Errors
    ///
    /// [`ReferralError::Forbidden`] for non-doctors,
    /// [`ReferralError::Validation`] listing every missing field,
    /// [`ReferralError::NotFound`] for a dangling existing-patient id.
    pub fn create_referral(
        &self,
        actor: &Actor,
        patient: PatientSelector,
        details: ReferralDetails,
    ) -> ReferralResult<Referral> {
        let draft = ReferralDraft::build(actor, patient, details)?;

        let patient: Patient = match draft.patient() {
            PatientSelector::Existing(id) => self.patients.get(*id)?,
            PatientSelector::New(input) => self.patients.find_or_create(input.clone())?,
        };

        self.store.create(draft, &patient)
    }

    /// Sends a draft to a destination hospital (DRAFT → PENDING).
    ///
    /// The destination must exist in the hospital directory; the remaining
    /// guards (draft state, origin ≠ destination, actor affiliation) are
    /// the state machine's.
    pub fn send_referral(
        &self,
        actor: &Actor,
        referral_id: Uuid,
        to_hospital: Uuid,
    ) -> ReferralResult<Referral> {
        self.hospitals.get(to_hospital)?;
        self.store
            .transition(referral_id, |r| lifecycle::send(r, actor, to_hospital))
    }

    /// The actor's own referrals, newest first.
    pub fn list_mine(&self, actor: &Actor) -> Vec<Referral> {
        self.store.list_mine(actor)
    }

    /// Every referral visible to the actor, oldest first.
    ///
    /// Requires the view-all capability. System admins see the whole
    /// store; the other viewing roles see referrals that touch their own
    /// hospital, as origin or destination.
    pub fn list_all(&self, actor: &Actor) -> ReferralResult<Vec<Referral>> {
        if !actor.permissions().can_view_all_referrals {
            return Err(ReferralError::Forbidden(format!(
                "role {} cannot view all referrals",
                actor.role
            )));
        }
        if actor.role == Role::SystemAdmin {
            return Ok(self.store.list_all());
        }

        let own = actor.hospital_or_forbidden()?;
        Ok(self
            .store
            .list_all()
            .into_iter()
            .filter(|r| r.from_hospital == own || r.to_hospital == Some(own))
            .collect())
    }

    /// Fetches a single referral the actor may see.
    ///
    /// Visible to its creator, and to view-all roles within the same
    /// hospital scope as [`Self::list_all`].
    pub fn get(&self, actor: &Actor, referral_id: Uuid) -> ReferralResult<Referral> {
        let referral = self.store.get(referral_id)?;
        if referral.created_by == actor.id {
            return Ok(referral);
        }

        if actor.permissions().can_view_all_referrals {
            if actor.role == Role::SystemAdmin {
                return Ok(referral);
            }
            let own = actor.hospital_or_forbidden()?;
            if referral.from_hospital == own || referral.to_hospital == Some(own) {
                return Ok(referral);
            }
        }

        Err(ReferralError::Forbidden(
            "referral is outside the actor's view".into(),
        ))
    }
}

// ============================================================================
// Liaison side
// ============================================================================

/// Triage, decisions and destination-side progress on incoming referrals.
#[derive(Clone)]
pub struct LiaisonWorkflow {
    store: ReferralStore,
}

impl LiaisonWorkflow {
    pub fn new(store: ReferralStore) -> Self {
        Self { store }
    }

    /// The pending queue for the liaison's own hospital.
    ///
    /// Filtered to PENDING referrals addressed to the liaison's hospital,
    /// ordered by urgency (emergencies first) and then oldest first within
    /// the same urgency, so nothing starves at the back of the queue.
    pub fn list_incoming(&self, liaison: &Actor) -> ReferralResult<Vec<Referral>> {
        if !liaison.permissions().can_approve_referral {
            return Err(ReferralError::Forbidden(format!(
                "role {} cannot triage referrals",
                liaison.role
            )));
        }
        let hospital = liaison.hospital_or_forbidden()?;

        let mut queue: Vec<Referral> = self
            .store
            .list_incoming(hospital)
            .into_iter()
            .filter(|r| r.status == ReferralStatus::Pending)
            .collect();
        queue.sort_by_key(|r| (Reverse(r.urgency), r.created_at));
        Ok(queue)
    }

    /// Applies an accept/reject decision to a pending referral.
    ///
    /// Delegates to the state machine; `notes` become decision notes on
    /// accept and the recorded reason on reject.
    ///
    /// # Errors
    ///
    /// [`ReferralError::NotFound`] when no such referral exists,
    /// [`ReferralError::Forbidden`] when it is addressed to another
    /// hospital, [`ReferralError::InvalidTransition`] when it is no longer
    /// pending (including losing a decision race).
    pub fn decide(
        &self,
        liaison: &Actor,
        referral_id: Uuid,
        decision: Decision,
        notes: Option<String>,
    ) -> ReferralResult<Referral> {
        // Affiliation is pre-checked against a read so that a liaison at the
        // wrong hospital gets Forbidden rather than a state error; the
        // authoritative guard runs again inside the transition.
        let current = self.store.get(referral_id)?;
        if let Some(destination) = current.to_hospital {
            if !liaison.is_at(destination) {
                return Err(ReferralError::Forbidden(
                    "referral is addressed to another hospital".into(),
                ));
            }
        }

        self.store.transition(referral_id, |r| match decision {
            Decision::Accept => lifecycle::accept(r, liaison, notes),
            Decision::Reject => lifecycle::reject(r, liaison, notes),
        })
    }

    /// Books the appointment for an accepted referral (ACCEPTED → SCHEDULED).
    ///
    /// Any role at the destination hospital may schedule; the triage
    /// decision already happened at accept time.
    pub fn schedule(
        &self,
        actor: &Actor,
        referral_id: Uuid,
        details: ScheduleDetails,
    ) -> ReferralResult<Referral> {
        self.store
            .transition(referral_id, |r| lifecycle::schedule(r, actor, details))
    }

    /// Records the patient's arrival (SCHEDULED → CHECKED_IN).
    pub fn check_in(&self, actor: &Actor, referral_id: Uuid) -> ReferralResult<Referral> {
        self.store
            .transition(referral_id, |r| lifecycle::check_in(r, actor))
    }

    /// Closes the referral after the visit (CHECKED_IN → COMPLETED).
    pub fn complete(&self, actor: &Actor, referral_id: Uuid) -> ReferralResult<Referral> {
        self.store
            .transition(referral_id, |r| lifecycle::complete(r, actor))
    }
}

// ============================================================================
// Expiry sweep
// ============================================================================

/// Expires referrals that outlived the SLA window for their urgency.
///
/// This is the external trigger the state machine's `expire` event waits
/// for; nothing in the core schedules it. The window is measured from
/// creation. Referrals that race into a non-expirable state between the
/// scan and the transition are skipped, not errors.
///
/// Returns the referrals that were expired by this sweep.
pub fn expire_overdue(
    store: &ReferralStore,
    sla: &SlaPolicy,
    now: DateTime<Utc>,
) -> ReferralResult<Vec<Referral>> {
    let mut expired = Vec::new();

    for referral in store.list_all() {
        if referral.status.is_terminal() || referral.status == ReferralStatus::CheckedIn {
            continue;
        }
        if now - referral.created_at <= sla.window(referral.urgency) {
            continue;
        }

        match store.transition(referral.id, lifecycle::expire) {
            Ok(updated) => expired.push(updated),
            Err(ReferralError::InvalidTransition { .. }) => {
                tracing::debug!(
                    "referral {} changed state during the sweep, skipping",
                    referral.referral_code
                );
            }
            Err(err) => return Err(err),
        }
    }

    if !expired.is_empty() {
        tracing::info!("expired {} overdue referral(s)", expired.len());
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoreConfig, SlaPolicy};
    use crate::hospital::HospitalInput;
    use crate::patient::{PatientInput, Sex};
    use crate::policy::Role;
    use crate::referral::Urgency;
    use chrono::{Duration, NaiveDate};
    use medref_types::{EmailAddress, NonEmptyText};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Env {
        _temp: TempDir,
        cfg: Arc<CoreConfig>,
        workflow: ReferralWorkflow,
        liaison_workflow: LiaisonWorkflow,
        store: ReferralStore,
        hospital_x: Uuid,
        hospital_y: Uuid,
        doctor: Actor,
        liaison_x: Actor,
    }

    fn actor(role: Role, hospital_id: Option<Uuid>, email: &str) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            full_name: NonEmptyText::new("Test Actor").unwrap(),
            email: EmailAddress::new(email).unwrap(),
            role,
            hospital_id,
            is_active: true,
        }
    }

    fn setup() -> Env {
        let temp = TempDir::new().unwrap();
        let cfg =
            Arc::new(CoreConfig::new(temp.path().to_path_buf(), SlaPolicy::default()).unwrap());

        let store = ReferralStore::open(cfg.clone()).unwrap();
        let patients = PatientDirectory::open(cfg.clone()).unwrap();
        let hospitals = HospitalDirectory::open(cfg.clone()).unwrap();

        let system_admin = actor(Role::SystemAdmin, None, "root@moh.gov");
        let hospital_x = hospitals
            .create(
                &system_admin,
                HospitalInput {
                    name: Some("Hospital X".to_string()),
                    email: Some("x@hospital.com".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .id;
        let hospital_y = hospitals
            .create(
                &system_admin,
                HospitalInput {
                    name: Some("Hospital Y".to_string()),
                    email: Some("y@hospital.com".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .id;

        let doctor = actor(Role::Doctor, Some(hospital_y), "doctor@y.hospital.com");
        let liaison_x = actor(Role::LiaisonOfficer, Some(hospital_x), "liaison@x.hospital.com");

        Env {
            _temp: temp,
            cfg,
            workflow: ReferralWorkflow::new(store.clone(), patients, hospitals),
            liaison_workflow: LiaisonWorkflow::new(store.clone()),
            store,
            hospital_x,
            hospital_y,
            doctor,
            liaison_x,
        }
    }

    fn new_patient(phone: &str) -> PatientSelector {
        PatientSelector::New(PatientInput {
            full_name: Some("A B".to_string()),
            sex: Some(Sex::Male),
            date_of_birth: Some(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
            phone: Some(phone.to_string()),
            national_id: None,
            address: None,
        })
    }

    fn details(urgency: Urgency) -> ReferralDetails {
        ReferralDetails {
            urgency,
            reason_for_referral: "Requires specialist assessment".to_string(),
            clinical_notes: None,
            required_specialty: None,
            required_bed_type: None,
        }
    }

    #[test]
    fn blank_reason_fails_validation_naming_the_field() {
        let env = setup();
        let mut bad = details(Urgency::Routine);
        bad.reason_for_referral = "".to_string();

        let err = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1555"), bad)
            .expect_err("blank reason");
        match err {
            ReferralError::Validation(fields) => assert_eq!(fields, vec!["reasonForReferral"]),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn same_phone_twice_reuses_the_patient_record() {
        let env = setup();
        let first = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1555"), details(Urgency::Routine))
            .unwrap();
        let second = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1555"), details(Urgency::Urgent))
            .unwrap();

        assert_eq!(second.patient_id, first.patient_id);
        assert_ne!(second.id, first.id);
    }

    #[test]
    fn send_sets_destination_and_second_send_fails() {
        let env = setup();
        let referral = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1555"), details(Urgency::Urgent))
            .unwrap();

        let sent = env
            .workflow
            .send_referral(&env.doctor, referral.id, env.hospital_x)
            .unwrap();
        assert_eq!(sent.status, ReferralStatus::Pending);
        assert_eq!(sent.to_hospital, Some(env.hospital_x));

        let err = env
            .workflow
            .send_referral(&env.doctor, referral.id, env.hospital_y)
            .expect_err("already pending");
        assert!(matches!(
            err,
            ReferralError::InvalidTransition {
                status: ReferralStatus::Pending,
                event: "send"
            }
        ));
    }

    #[test]
    fn send_to_own_hospital_fails_validation() {
        let env = setup();
        let referral = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1555"), details(Urgency::Urgent))
            .unwrap();

        let err = env
            .workflow
            .send_referral(&env.doctor, referral.id, env.hospital_y)
            .expect_err("origin equals destination");
        assert!(matches!(err, ReferralError::Validation(_)));
    }

    #[test]
    fn send_to_unknown_hospital_is_not_found() {
        let env = setup();
        let referral = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1555"), details(Urgency::Urgent))
            .unwrap();

        let err = env
            .workflow
            .send_referral(&env.doctor, referral.id, Uuid::new_v4())
            .expect_err("no such hospital");
        assert!(matches!(err, ReferralError::NotFound { kind: "hospital", .. }));
    }

    fn send_one(env: &Env, urgency: Urgency, phone: &str) -> Referral {
        let referral = env
            .workflow
            .create_referral(&env.doctor, new_patient(phone), details(urgency))
            .unwrap();
        env.workflow
            .send_referral(&env.doctor, referral.id, env.hospital_x)
            .unwrap()
    }

    #[test]
    fn incoming_queue_orders_by_urgency_then_age() {
        let env = setup();
        let routine = send_one(&env, Urgency::Routine, "+1001");
        let urgent_old = send_one(&env, Urgency::Urgent, "+1002");
        let urgent_new = send_one(&env, Urgency::Urgent, "+1003");
        let emergency = send_one(&env, Urgency::Emergency, "+1004");

        let queue = env.liaison_workflow.list_incoming(&env.liaison_x).unwrap();
        let ids: Vec<Uuid> = queue.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![emergency.id, urgent_old.id, urgent_new.id, routine.id]);
    }

    #[test]
    fn incoming_queue_is_scoped_and_pending_only() {
        let env = setup();
        let pending = send_one(&env, Urgency::Routine, "+1001");
        let decided = send_one(&env, Urgency::Routine, "+1002");
        env.liaison_workflow
            .decide(&env.liaison_x, decided.id, Decision::Accept, None)
            .unwrap();
        // A draft never enters anyone's queue.
        env.workflow
            .create_referral(&env.doctor, new_patient("+1003"), details(Urgency::Routine))
            .unwrap();

        let queue = env.liaison_workflow.list_incoming(&env.liaison_x).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, pending.id);
        assert!(queue.iter().all(|r| r.to_hospital == Some(env.hospital_x)));

        let liaison_y = actor(
            Role::LiaisonOfficer,
            Some(env.hospital_y),
            "liaison@y.hospital.com",
        );
        assert!(env
            .liaison_workflow
            .list_incoming(&liaison_y)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn doctors_cannot_triage() {
        let env = setup();
        assert!(matches!(
            env.liaison_workflow.list_incoming(&env.doctor),
            Err(ReferralError::Forbidden(_))
        ));
    }

    #[test]
    fn decide_accept_then_accept_again_fails_invalid_transition() {
        let env = setup();
        let referral = send_one(&env, Urgency::Urgent, "+1001");

        let second_liaison = actor(
            Role::LiaisonOfficer,
            Some(env.hospital_x),
            "liaison2@x.hospital.com",
        );

        let first = env
            .liaison_workflow
            .decide(&env.liaison_x, referral.id, Decision::Accept, None)
            .unwrap();
        assert_eq!(first.status, ReferralStatus::Accepted);

        let err = env
            .liaison_workflow
            .decide(&second_liaison, referral.id, Decision::Accept, None)
            .expect_err("decision already made");
        assert!(matches!(err, ReferralError::InvalidTransition { .. }));
        assert_eq!(
            env.store.get(referral.id).unwrap().status,
            ReferralStatus::Accepted
        );
    }

    #[test]
    fn decide_records_rejection_reason() {
        let env = setup();
        let referral = send_one(&env, Urgency::Routine, "+1001");

        let rejected = env
            .liaison_workflow
            .decide(
                &env.liaison_x,
                referral.id,
                Decision::Reject,
                Some("No beds available".to_string()),
            )
            .unwrap();
        assert_eq!(rejected.status, ReferralStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("No beds available"));
    }

    #[test]
    fn decide_from_wrong_hospital_is_forbidden() {
        let env = setup();
        let referral = send_one(&env, Urgency::Routine, "+1001");

        let liaison_y = actor(
            Role::LiaisonOfficer,
            Some(env.hospital_y),
            "liaison@y.hospital.com",
        );
        let err = env
            .liaison_workflow
            .decide(&liaison_y, referral.id, Decision::Accept, None)
            .expect_err("wrong hospital");
        assert!(matches!(err, ReferralError::Forbidden(_)));
    }

    #[test]
    fn decide_on_missing_referral_is_not_found() {
        let env = setup();
        let err = env
            .liaison_workflow
            .decide(&env.liaison_x, Uuid::new_v4(), Decision::Accept, None)
            .expect_err("no such referral");
        assert!(matches!(err, ReferralError::NotFound { .. }));
    }

    #[test]
    fn accepted_referral_progresses_to_completed() {
        let env = setup();
        let referral = send_one(&env, Urgency::Urgent, "+1001");
        env.liaison_workflow
            .decide(&env.liaison_x, referral.id, Decision::Accept, None)
            .unwrap();

        let scheduled = env
            .liaison_workflow
            .schedule(
                &env.liaison_x,
                referral.id,
                ScheduleDetails {
                    scheduled_for: Utc::now(),
                    notes: Some("Clinic 3, bring imaging".to_string()),
                },
            )
            .unwrap();
        assert_eq!(scheduled.status, ReferralStatus::Scheduled);
        assert!(scheduled.scheduled_for.is_some());

        let checked_in = env
            .liaison_workflow
            .check_in(&env.liaison_x, referral.id)
            .unwrap();
        assert_eq!(checked_in.status, ReferralStatus::CheckedIn);

        let completed = env
            .liaison_workflow
            .complete(&env.liaison_x, referral.id)
            .unwrap();
        assert_eq!(completed.status, ReferralStatus::Completed);
    }

    #[test]
    fn schedule_from_origin_hospital_is_forbidden() {
        let env = setup();
        let referral = send_one(&env, Urgency::Urgent, "+1001");
        env.liaison_workflow
            .decide(&env.liaison_x, referral.id, Decision::Accept, None)
            .unwrap();

        let err = env
            .liaison_workflow
            .schedule(
                &env.doctor,
                referral.id,
                ScheduleDetails {
                    scheduled_for: Utc::now(),
                    notes: None,
                },
            )
            .expect_err("origin staff cannot schedule");
        assert!(matches!(err, ReferralError::Forbidden(_)));
    }

    #[test]
    fn check_in_before_scheduling_fails_invalid_transition() {
        let env = setup();
        let referral = send_one(&env, Urgency::Urgent, "+1001");
        env.liaison_workflow
            .decide(&env.liaison_x, referral.id, Decision::Accept, None)
            .unwrap();

        let err = env
            .liaison_workflow
            .check_in(&env.liaison_x, referral.id)
            .expect_err("not yet scheduled");
        assert!(matches!(
            err,
            ReferralError::InvalidTransition {
                status: ReferralStatus::Accepted,
                event: "check_in"
            }
        ));
    }

    #[test]
    fn list_all_requires_the_view_capability() {
        let env = setup();
        send_one(&env, Urgency::Routine, "+1001");

        assert!(matches!(
            env.workflow.list_all(&env.doctor),
            Err(ReferralError::Forbidden(_))
        ));
    }

    #[test]
    fn list_all_scopes_viewers_to_their_own_hospital() {
        let env = setup();
        let visible = send_one(&env, Urgency::Routine, "+1001");
        // Unsent draft from hospital Y: origin-side, invisible at X.
        let draft = env
            .workflow
            .create_referral(&env.doctor, new_patient("+1002"), details(Urgency::Routine))
            .unwrap();

        let at_x = env.workflow.list_all(&env.liaison_x).unwrap();
        assert_eq!(at_x.len(), 1);
        assert_eq!(at_x[0].id, visible.id);

        let admin_y = actor(Role::HospitalAdmin, Some(env.hospital_y), "admin@y.hospital.com");
        let at_y = env.workflow.list_all(&admin_y).unwrap();
        assert_eq!(at_y.len(), 2);

        let root = actor(Role::SystemAdmin, None, "root2@moh.gov");
        let everything = env.workflow.list_all(&root).unwrap();
        assert_eq!(everything.len(), 2);
        assert!(everything.iter().any(|r| r.id == draft.id));
    }

    #[test]
    fn get_is_visible_to_creator_and_scoped_viewers_only() {
        let env = setup();
        let referral = send_one(&env, Urgency::Routine, "+1001");

        assert_eq!(
            env.workflow.get(&env.doctor, referral.id).unwrap().id,
            referral.id
        );
        assert_eq!(
            env.workflow.get(&env.liaison_x, referral.id).unwrap().id,
            referral.id
        );

        let stranger = actor(
            Role::LiaisonOfficer,
            Some(Uuid::new_v4()),
            "liaison@elsewhere.com",
        );
        assert!(matches!(
            env.workflow.get(&stranger, referral.id),
            Err(ReferralError::Forbidden(_))
        ));

        let other_doctor = actor(Role::Doctor, Some(env.hospital_y), "doc2@y.hospital.com");
        assert!(matches!(
            env.workflow.get(&other_doctor, referral.id),
            Err(ReferralError::Forbidden(_))
        ));

        assert!(matches!(
            env.workflow.get(&env.doctor, Uuid::new_v4()),
            Err(ReferralError::NotFound { .. })
        ));
    }

    #[test]
    fn expiry_sweep_honours_per_urgency_windows() {
        let env = setup();
        let emergency = send_one(&env, Urgency::Emergency, "+1001");
        let routine = send_one(&env, Urgency::Routine, "+1002");

        let sla = env.cfg.sla();

        // Two days in: the emergency (24h window) is overdue, the routine
        // (30d window) is not.
        let expired = expire_overdue(&env.store, sla, Utc::now() + Duration::days(2)).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, emergency.id);
        assert_eq!(
            env.store.get(routine.id).unwrap().status,
            ReferralStatus::Pending
        );

        // A sweep with nothing overdue does nothing.
        let expired = expire_overdue(&env.store, sla, Utc::now()).unwrap();
        assert!(expired.is_empty());
    }

    #[test]
    fn expiry_sweep_skips_checked_in_and_terminal_referrals() {
        let env = setup();
        let rejected = send_one(&env, Urgency::Emergency, "+1001");
        env.liaison_workflow
            .decide(&env.liaison_x, rejected.id, Decision::Reject, None)
            .unwrap();

        let checked_in = send_one(&env, Urgency::Emergency, "+1002");
        env.liaison_workflow
            .decide(&env.liaison_x, checked_in.id, Decision::Accept, None)
            .unwrap();
        env.liaison_workflow
            .schedule(
                &env.liaison_x,
                checked_in.id,
                ScheduleDetails {
                    scheduled_for: Utc::now(),
                    notes: None,
                },
            )
            .unwrap();
        env.liaison_workflow
            .check_in(&env.liaison_x, checked_in.id)
            .unwrap();

        let expired =
            expire_overdue(&env.store, env.cfg.sla(), Utc::now() + Duration::days(365)).unwrap();
        assert!(expired.is_empty());
        assert_eq!(
            env.store.get(checked_in.id).unwrap().status,
            ReferralStatus::CheckedIn
        );
        assert_eq!(
            env.store.get(rejected.id).unwrap().status,
            ReferralStatus::Rejected
        );
    }
}
