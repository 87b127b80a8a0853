//! # Medref Core
//!
//! Core business logic for the hospital referral system.
//!
//! This crate contains the referral state machine, the role/permission
//! model and the record directories, backed by sharded JSON storage:
//! - Referral drafting, sending, triage decisions and the SLA expiry sweep
//! - Patient find-or-create keyed on phone number
//! - Hospital and user directories with scoped administration
//! - Bearer-credential sessions resolving to an explicit [`Actor`]
//!
//! **No API concerns**: HTTP routing, status-code mapping and request
//! parsing belong to the binary crate. Everything here takes the acting
//! user as an argument; there is no ambient authentication state.

pub mod actor;
pub mod auth;
pub mod config;
pub mod error;
pub mod hospital;
pub mod lifecycle;
pub mod patient;
pub mod policy;
pub mod referral;
mod storage;
pub mod store;
pub mod users;
pub mod workflow;

pub use actor::Actor;
pub use config::{CoreConfig, SlaPolicy};
pub use error::{ReferralError, ReferralResult};
pub use policy::{permissions_for, Permissions, Role};
pub use referral::{Referral, ReferralStatus, Urgency};
