//! Actor context for workflow calls.
//!
//! Every workflow operation takes an explicit [`Actor`]: there is no ambient
//! session, no global current-user singleton. The actor is resolved from a
//! bearer credential at the boundary (see [`crate::auth`]) and then threaded
//! through the call.

use crate::policy::{permissions_for, Permissions, Role};
use crate::{ReferralError, ReferralResult};
use medref_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user performing an operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub full_name: NonEmptyText,
    pub email: EmailAddress,
    pub role: Role,
    /// Hospital affiliation. Absent only for system admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<Uuid>,
    pub is_active: bool,
}

impl Actor {
    /// Returns the capability table for this actor's role.
    pub fn permissions(&self) -> Permissions {
        permissions_for(self.role)
    }

    /// True when the actor is affiliated with `hospital_id`.
    pub fn is_at(&self, hospital_id: Uuid) -> bool {
        self.hospital_id == Some(hospital_id)
    }

    /// Returns the actor's hospital affiliation, or `Forbidden` when absent.
    ///
    /// Used by operations that only make sense for hospital-affiliated staff
    /// (creating referrals, triaging incoming ones).
    pub fn hospital_or_forbidden(&self) -> ReferralResult<Uuid> {
        self.hospital_id.ok_or_else(|| {
            ReferralError::Forbidden(format!(
                "{} has no hospital affiliation",
                self.full_name.as_str()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, hospital_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            full_name: NonEmptyText::new("Dr. James Wilson").unwrap(),
            email: EmailAddress::new("doctor@hospital.com").unwrap(),
            role,
            hospital_id,
            is_active: true,
        }
    }

    #[test]
    fn affiliation_check_matches_exact_hospital() {
        let hospital = Uuid::new_v4();
        let doctor = actor(Role::Doctor, Some(hospital));
        assert!(doctor.is_at(hospital));
        assert!(!doctor.is_at(Uuid::new_v4()));
    }

    #[test]
    fn system_admin_without_hospital_is_forbidden_hospital_scoped_ops() {
        let admin = actor(Role::SystemAdmin, None);
        assert!(admin.hospital_or_forbidden().is_err());
    }
}
