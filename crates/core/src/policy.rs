//! Role-based access policy.
//!
//! Roles form a closed enumeration and map to a static capability table via
//! [`permissions_for`]. Call sites never compare role strings; they either
//! match on [`Role`] or consult the returned [`Permissions`].
//!
//! Hospital scoping (a liaison officer only approving referrals addressed to
//! their own hospital, a hospital admin only managing their own staff) is
//! enforced by the workflows, not by this table.

use serde::{Deserialize, Serialize};

/// The four roles the system recognises.
///
/// Wire form uses the hyphenated lowercase names the frontend exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "system-admin")]
    SystemAdmin,
    #[serde(rename = "hospital-admin")]
    HospitalAdmin,
    #[serde(rename = "doctor")]
    Doctor,
    #[serde(rename = "liaison")]
    LiaisonOfficer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::SystemAdmin => "system-admin",
            Role::HospitalAdmin => "hospital-admin",
            Role::Doctor => "doctor",
            Role::LiaisonOfficer => "liaison",
        };
        write!(f, "{name}")
    }
}

/// Static capability table for a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_create_referral: bool,
    pub can_approve_referral: bool,
    pub can_view_all_referrals: bool,
    pub can_manage_users: bool,
    pub can_manage_hospitals: bool,
}

/// Returns the capability table for `role`.
///
/// This is a pure function: same role in, same table out. DOCTOR creates
/// referrals and nothing else; LIAISON_OFFICER approves and views;
/// HOSPITAL_ADMIN manages staff and views; SYSTEM_ADMIN manages users and
/// hospitals globally.
pub fn permissions_for(role: Role) -> Permissions {
    match role {
        Role::Doctor => Permissions {
            can_create_referral: true,
            can_approve_referral: false,
            can_view_all_referrals: false,
            can_manage_users: false,
            can_manage_hospitals: false,
        },
        Role::LiaisonOfficer => Permissions {
            can_create_referral: false,
            can_approve_referral: true,
            can_view_all_referrals: true,
            can_manage_users: false,
            can_manage_hospitals: false,
        },
        Role::HospitalAdmin => Permissions {
            can_create_referral: false,
            can_approve_referral: false,
            can_view_all_referrals: true,
            can_manage_users: true,
            can_manage_hospitals: false,
        },
        Role::SystemAdmin => Permissions {
            can_create_referral: false,
            can_approve_referral: false,
            can_view_all_referrals: true,
            can_manage_users: true,
            can_manage_hospitals: true,
        },
    }
}
