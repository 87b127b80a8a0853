//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::{ReferralError, ReferralResult};
use chrono::Duration;
use std::path::{Path, PathBuf};

/// Directory names for each record kind under the data directory.
pub const REFERRALS_DIR_NAME: &str = "referrals";
pub const PATIENTS_DIR_NAME: &str = "patients";
pub const HOSPITALS_DIR_NAME: &str = "hospitals";
pub const USERS_DIR_NAME: &str = "users";

/// Expiry windows for unfinished referrals, keyed by urgency.
///
/// Expiry itself is an externally triggered event: the core never runs a
/// timer. These windows are the policy input consumed by the sweep in
/// [`crate::workflow::expire_overdue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlaPolicy {
    pub routine: Duration,
    pub urgent: Duration,
    pub emergency: Duration,
}

impl SlaPolicy {
    /// Returns the window for the given urgency.
    pub fn window(&self, urgency: crate::referral::Urgency) -> Duration {
        use crate::referral::Urgency::*;
        match urgency {
            Routine => self.routine,
            Urgent => self.urgent,
            Emergency => self.emergency,
        }
    }
}

impl Default for SlaPolicy {
    /// Default windows: 30 days routine, 7 days urgent, 24 hours emergency.
    fn default() -> Self {
        Self {
            routine: Duration::days(30),
            urgent: Duration::days(7),
            emergency: Duration::hours(24),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    sla: SlaPolicy,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::Validation` if any SLA window is zero or
    /// negative; such a window would expire referrals at creation time.
    pub fn new(data_dir: PathBuf, sla: SlaPolicy) -> ReferralResult<Self> {
        let mut bad = Vec::new();
        if sla.routine <= Duration::zero() {
            bad.push("sla.routine".to_string());
        }
        if sla.urgent <= Duration::zero() {
            bad.push("sla.urgent".to_string());
        }
        if sla.emergency <= Duration::zero() {
            bad.push("sla.emergency".to_string());
        }
        if !bad.is_empty() {
            return Err(ReferralError::Validation(bad));
        }

        Ok(Self { data_dir, sla })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn referrals_dir(&self) -> PathBuf {
        self.data_dir.join(REFERRALS_DIR_NAME)
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn hospitals_dir(&self) -> PathBuf {
        self.data_dir.join(HOSPITALS_DIR_NAME)
    }

    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join(USERS_DIR_NAME)
    }

    pub fn sla(&self) -> &SlaPolicy {
        &self.sla
    }
}

/// Parse an SLA window from an optional environment value given in hours.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn sla_hours_from_env_value(
    value: Option<String>,
    default: Duration,
) -> ReferralResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(raw) = value else {
        return Ok(default);
    };

    let hours: i64 = raw
        .parse()
        .map_err(|_| ReferralError::invalid(format!("SLA hours must be an integer, got {raw:?}")))?;
    if hours <= 0 {
        return Err(ReferralError::invalid("SLA hours must be positive"));
    }

    Ok(Duration::hours(hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referral::Urgency;

    #[test]
    fn rejects_non_positive_windows() {
        let sla = SlaPolicy {
            routine: Duration::zero(),
            urgent: Duration::days(7),
            emergency: Duration::hours(-1),
        };
        let err = CoreConfig::new(PathBuf::from("/tmp/x"), sla).expect_err("should reject");
        match err {
            ReferralError::Validation(fields) => {
                assert_eq!(fields, vec!["sla.routine", "sla.emergency"]);
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn window_follows_urgency() {
        let sla = SlaPolicy::default();
        assert!(sla.window(Urgency::Emergency) < sla.window(Urgency::Urgent));
        assert!(sla.window(Urgency::Urgent) < sla.window(Urgency::Routine));
    }

    #[test]
    fn sla_env_value_parses_hours() {
        let parsed = sla_hours_from_env_value(Some("48".into()), Duration::days(30)).unwrap();
        assert_eq!(parsed, Duration::hours(48));
    }

    #[test]
    fn sla_env_value_falls_back_on_blank() {
        let parsed = sla_hours_from_env_value(Some("  ".into()), Duration::days(30)).unwrap();
        assert_eq!(parsed, Duration::days(30));
    }

    #[test]
    fn sla_env_value_rejects_garbage() {
        assert!(sla_hours_from_env_value(Some("soon".into()), Duration::days(1)).is_err());
        assert!(sla_hours_from_env_value(Some("0".into()), Duration::days(1)).is_err());
    }
}
