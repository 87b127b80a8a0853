//! User directory and staff management.
//!
//! Management is scoped by the acting user's role: a hospital admin only
//! touches staff of their own hospital and never creates system admins; a
//! system admin manages users globally. The capability check comes from the
//! policy table; the hospital scoping lives here.

use crate::actor::Actor;
use crate::auth::SessionService;
use crate::config::CoreConfig;
use crate::policy::Role;
use crate::storage;
use crate::{ReferralError, ReferralResult};
use chrono::{DateTime, Utc};
use medref_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const USER_FILE: &str = "user.json";

/// A user account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: NonEmptyText,
    pub email: EmailAddress,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The actor context this account acts as.
    pub fn as_actor(&self) -> Actor {
        Actor {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
            hospital_id: self.hospital_id,
            is_active: self.is_active,
        }
    }
}

/// Fields supplied when creating a user.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: NonEmptyText,
    pub email: EmailAddress,
    pub role: Role,
    #[serde(default)]
    pub hospital_id: Option<Uuid>,
}

/// Partial update to a user account.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub full_name: Option<NonEmptyText>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// In-memory user index with write-through sharded JSON persistence.
#[derive(Clone)]
pub struct UserDirectory {
    cfg: Arc<CoreConfig>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl UserDirectory {
    /// Opens the directory, loading any records already on disk.
    pub fn open(cfg: Arc<CoreConfig>) -> ReferralResult<Self> {
        let loaded: Vec<User> = storage::load_records(&cfg.users_dir(), USER_FILE)?;
        let users = loaded.into_iter().map(|u| (u.id, u)).collect();

        Ok(Self {
            cfg,
            users: Arc::new(RwLock::new(users)),
        })
    }

    /// Checks that `actor` may manage an account with the given role and
    /// hospital affiliation.
    fn require_management_scope(
        actor: &Actor,
        target_role: Role,
        target_hospital: Option<Uuid>,
    ) -> ReferralResult<()> {
        if !actor.permissions().can_manage_users {
            return Err(ReferralError::Forbidden(format!(
                "role {} cannot manage users",
                actor.role
            )));
        }

        match actor.role {
            Role::SystemAdmin => Ok(()),
            Role::HospitalAdmin => {
                if target_role == Role::SystemAdmin {
                    return Err(ReferralError::Forbidden(
                        "hospital admins cannot manage system admins".into(),
                    ));
                }
                let own = actor.hospital_or_forbidden()?;
                if target_hospital != Some(own) {
                    return Err(ReferralError::Forbidden(
                        "hospital admins only manage staff of their own hospital".into(),
                    ));
                }
                Ok(())
            }
            // can_manage_users is false for the remaining roles; unreachable
            // through the guard above but spelled out for totality.
            _ => Err(ReferralError::Forbidden(format!(
                "role {} cannot manage users",
                actor.role
            ))),
        }
    }

    /// Creates a user account.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Forbidden`] when the actor's role or scope does
    ///   not cover the new account.
    /// - [`ReferralError::Validation`] when the hospital affiliation does
    ///   not fit the role: every role except system admin requires one, a
    ///   system admin must have none.
    /// - [`ReferralError::Conflict`] on a duplicate email.
    pub fn create(&self, actor: &Actor, new_user: NewUser) -> ReferralResult<User> {
        Self::require_management_scope(actor, new_user.role, new_user.hospital_id)?;

        match (new_user.role, new_user.hospital_id) {
            (Role::SystemAdmin, Some(_)) => {
                return Err(ReferralError::invalid(
                    "hospitalId must be unset for system admins",
                ));
            }
            (Role::SystemAdmin, None) => {}
            (_, None) => {
                return Err(ReferralError::invalid("hospitalId"));
            }
            (_, Some(_)) => {}
        }

        let mut users = self.users.write().expect("user index poisoned");
        if users.values().any(|u| u.email == new_user.email) {
            return Err(ReferralError::Conflict(format!(
                "a user with email {} already exists",
                new_user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            full_name: new_user.full_name,
            email: new_user.email,
            role: new_user.role,
            hospital_id: new_user.hospital_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        storage::write_record(&self.cfg.users_dir(), user.id, USER_FILE, &user)?;
        users.insert(user.id, user.clone());
        tracing::info!("created {} account {}", user.role, user.email);

        Ok(user)
    }

    /// Updates a user's name or active flag.
    pub fn update(&self, actor: &Actor, id: Uuid, update: UserUpdate) -> ReferralResult<User> {
        let mut users = self.users.write().expect("user index poisoned");
        let current = users
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("user", id.to_string()))?;
        Self::require_management_scope(actor, current.role, current.hospital_id)?;

        let mut updated = current;
        if let Some(full_name) = update.full_name {
            updated.full_name = full_name;
        }
        if let Some(is_active) = update.is_active {
            updated.is_active = is_active;
        }
        updated.updated_at = Utc::now();

        storage::write_record(&self.cfg.users_dir(), updated.id, USER_FILE, &updated)?;
        users.insert(updated.id, updated.clone());

        Ok(updated)
    }

    /// Deletes a user account and revokes any sessions it holds.
    pub fn delete(&self, actor: &Actor, id: Uuid, sessions: &SessionService) -> ReferralResult<()> {
        let mut users = self.users.write().expect("user index poisoned");
        let current = users
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("user", id.to_string()))?;
        Self::require_management_scope(actor, current.role, current.hospital_id)?;

        storage::remove_record(&self.cfg.users_dir(), id)?;
        users.remove(&id);
        sessions.revoke_user(id);
        tracing::info!("deleted account {}", current.email);

        Ok(())
    }

    /// Revokes every session the user holds and issues a fresh credential.
    ///
    /// Returned to the managing admin for out-of-band delivery; previously
    /// issued credentials stop authenticating immediately.
    pub fn reset_password(
        &self,
        actor: &Actor,
        id: Uuid,
        sessions: &SessionService,
    ) -> ReferralResult<crate::auth::Credential> {
        let users = self.users.read().expect("user index poisoned");
        let target = users
            .get(&id)
            .ok_or_else(|| ReferralError::not_found("user", id.to_string()))?;
        Self::require_management_scope(actor, target.role, target.hospital_id)?;

        sessions.revoke_user(id);
        Ok(sessions.issue(id))
    }

    /// Lists user accounts visible to the actor.
    ///
    /// System admins see everyone; hospital admins see their own hospital's
    /// staff. Other roles are refused.
    pub fn list(&self, actor: &Actor) -> ReferralResult<Vec<User>> {
        if !actor.permissions().can_manage_users {
            return Err(ReferralError::Forbidden(format!(
                "role {} cannot list users",
                actor.role
            )));
        }

        let users = self.users.read().expect("user index poisoned");
        let mut visible: Vec<User> = match actor.role {
            Role::SystemAdmin => users.values().cloned().collect(),
            _ => {
                let own = actor.hospital_or_forbidden()?;
                users
                    .values()
                    .filter(|u| u.hospital_id == Some(own))
                    .cloned()
                    .collect()
            }
        };
        visible.sort_by_key(|u| u.created_at);
        Ok(visible)
    }

    /// Fetches a user by id. Unscoped; the boundary decides who may ask.
    pub fn get(&self, id: Uuid) -> ReferralResult<User> {
        let users = self.users.read().expect("user index poisoned");
        users
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("user", id.to_string()))
    }

    /// Finds a user by email.
    pub fn find_by_email(&self, email: &EmailAddress) -> Option<User> {
        let users = self.users.read().expect("user index poisoned");
        users.values().find(|u| &u.email == email).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlaPolicy;

    fn setup() -> (tempfile::TempDir, UserDirectory, SessionService) {
        let temp = tempfile::TempDir::new().unwrap();
        let cfg =
            Arc::new(CoreConfig::new(temp.path().to_path_buf(), SlaPolicy::default()).unwrap());
        let directory = UserDirectory::open(cfg).unwrap();
        (temp, directory, SessionService::new())
    }

    fn system_admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            full_name: NonEmptyText::new("Root Admin").unwrap(),
            email: EmailAddress::new("root@moh.gov").unwrap(),
            role: Role::SystemAdmin,
            hospital_id: None,
            is_active: true,
        }
    }

    fn new_user(email: &str, role: Role, hospital_id: Option<Uuid>) -> NewUser {
        NewUser {
            full_name: NonEmptyText::new("Staff Member").unwrap(),
            email: EmailAddress::new(email).unwrap(),
            role,
            hospital_id,
        }
    }

    #[test]
    fn system_admin_creates_users_anywhere() {
        let (_temp, directory, _sessions) = setup();
        let hospital = Uuid::new_v4();
        let user = directory
            .create(
                &system_admin(),
                new_user("doc@hospital.com", Role::Doctor, Some(hospital)),
            )
            .unwrap();
        assert!(user.is_active);
        assert_eq!(user.hospital_id, Some(hospital));
    }

    #[test]
    fn hospital_admin_is_scoped_to_own_hospital() {
        let (_temp, directory, _sessions) = setup();
        let own = Uuid::new_v4();
        let admin_user = directory
            .create(
                &system_admin(),
                new_user("admin@hospital.com", Role::HospitalAdmin, Some(own)),
            )
            .unwrap();
        let admin = admin_user.as_actor();

        assert!(directory
            .create(&admin, new_user("doc@hospital.com", Role::Doctor, Some(own)))
            .is_ok());

        let err = directory
            .create(
                &admin,
                new_user("other@hospital.com", Role::Doctor, Some(Uuid::new_v4())),
            )
            .expect_err("other hospital");
        assert!(matches!(err, ReferralError::Forbidden(_)));

        let err = directory
            .create(&admin, new_user("root2@moh.gov", Role::SystemAdmin, None))
            .expect_err("cannot mint system admins");
        assert!(matches!(err, ReferralError::Forbidden(_)));
    }

    #[test]
    fn doctors_cannot_manage_users() {
        let (_temp, directory, _sessions) = setup();
        let hospital = Uuid::new_v4();
        let doctor = directory
            .create(
                &system_admin(),
                new_user("doc@hospital.com", Role::Doctor, Some(hospital)),
            )
            .unwrap()
            .as_actor();

        assert!(matches!(
            directory.list(&doctor),
            Err(ReferralError::Forbidden(_))
        ));
        assert!(matches!(
            directory.create(&doctor, new_user("x@hospital.com", Role::Doctor, Some(hospital))),
            Err(ReferralError::Forbidden(_))
        ));
    }

    #[test]
    fn hospital_affiliation_must_fit_role() {
        let (_temp, directory, _sessions) = setup();
        let admin = system_admin();

        let err = directory
            .create(&admin, new_user("doc@hospital.com", Role::Doctor, None))
            .expect_err("doctor needs a hospital");
        assert!(matches!(err, ReferralError::Validation(_)));

        let err = directory
            .create(
                &admin,
                new_user("root2@moh.gov", Role::SystemAdmin, Some(Uuid::new_v4())),
            )
            .expect_err("system admin must be unaffiliated");
        assert!(matches!(err, ReferralError::Validation(_)));
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let (_temp, directory, _sessions) = setup();
        let admin = system_admin();
        let hospital = Uuid::new_v4();
        directory
            .create(&admin, new_user("doc@hospital.com", Role::Doctor, Some(hospital)))
            .unwrap();
        let err = directory
            .create(&admin, new_user("doc@hospital.com", Role::LiaisonOfficer, Some(hospital)))
            .expect_err("duplicate email");
        assert!(matches!(err, ReferralError::Conflict(_)));
    }

    #[test]
    fn update_toggles_active_flag() {
        let (_temp, directory, _sessions) = setup();
        let admin = system_admin();
        let user = directory
            .create(
                &admin,
                new_user("doc@hospital.com", Role::Doctor, Some(Uuid::new_v4())),
            )
            .unwrap();

        let updated = directory
            .update(
                &admin,
                user.id,
                UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.is_active);
    }

    #[test]
    fn delete_removes_account_and_sessions() {
        let (_temp, directory, sessions) = setup();
        let admin = system_admin();
        let user = directory
            .create(
                &admin,
                new_user("doc@hospital.com", Role::Doctor, Some(Uuid::new_v4())),
            )
            .unwrap();
        let credential = sessions.issue(user.id);

        directory.delete(&admin, user.id, &sessions).unwrap();
        assert!(matches!(
            directory.get(user.id),
            Err(ReferralError::NotFound { .. })
        ));
        assert!(sessions.authenticate(&credential, &directory).is_err());
    }

    #[test]
    fn reset_password_invalidates_old_credentials() {
        let (_temp, directory, sessions) = setup();
        let admin = system_admin();
        let user = directory
            .create(
                &admin,
                new_user("doc@hospital.com", Role::Doctor, Some(Uuid::new_v4())),
            )
            .unwrap();

        let old = sessions.issue(user.id);
        let fresh = directory.reset_password(&admin, user.id, &sessions).unwrap();

        assert!(sessions.authenticate(&old, &directory).is_err());
        let actor = sessions.authenticate(&fresh, &directory).unwrap();
        assert_eq!(actor.id, user.id);
    }

    #[test]
    fn users_survive_reopen() {
        let (temp, directory, _sessions) = setup();
        let user = directory
            .create(
                &system_admin(),
                new_user("doc@hospital.com", Role::Doctor, Some(Uuid::new_v4())),
            )
            .unwrap();
        drop(directory);

        let cfg =
            Arc::new(CoreConfig::new(temp.path().to_path_buf(), SlaPolicy::default()).unwrap());
        let reopened = UserDirectory::open(cfg).unwrap();
        assert_eq!(reopened.get(user.id).unwrap(), user);
    }
}
