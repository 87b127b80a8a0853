//! Error taxonomy for the referral core.
//!
//! Every fallible operation in this crate returns [`ReferralError`]. The
//! variants split into two groups:
//! - domain failures surfaced verbatim to the acting user (validation,
//!   missing records, guard failures, illegal state transitions),
//! - storage failures from the persistence boundary, which leave state
//!   unchanged so the caller may retry.

/// Errors raised by referral, patient, hospital and user operations.
#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    /// One or more required fields are missing or malformed. Carries the
    /// complete list of offending fields, not just the first one found.
    #[error("invalid input: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// No record matches the given identifier.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The actor's role or hospital affiliation does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested event is not valid for the referral's current status.
    /// Transitions are total over (status, event); anything outside the
    /// transition table lands here rather than silently no-opping.
    #[error("cannot {event} a referral in status {status}")]
    InvalidTransition {
        status: crate::referral::ReferralStatus,
        event: &'static str,
    },

    /// The request carried no credential, an unknown credential, or a
    /// credential for a deactivated user.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// A uniqueness constraint was violated (duplicate email, duplicate
    /// referral code). State-level races surface as `InvalidTransition`.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

impl ReferralError {
    /// Convenience constructor for a single-field validation failure.
    pub fn invalid(field: impl Into<String>) -> Self {
        ReferralError::Validation(vec![field.into()])
    }

    /// Convenience constructor for a missing record.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ReferralError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type ReferralResult<T> = std::result::Result<T, ReferralError>;
