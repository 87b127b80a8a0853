//! Bearer credentials and session resolution.
//!
//! Every boundary call carries an opaque bearer credential; the session
//! service resolves it to an [`Actor`] that is then passed explicitly into
//! the workflow. There is no ambient current-user state anywhere in the
//! core.
//!
//! Sessions are in-memory only: restarting the process signs everyone out,
//! which is acceptable for this service and keeps credentials off disk.

use crate::actor::Actor;
use crate::users::UserDirectory;
use crate::{ReferralError, ReferralResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// An opaque bearer token.
///
/// The token value is random; it encodes nothing and is only meaningful to
/// the session service that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    fn generate() -> Self {
        // Two UUIDs worth of randomness; a single v4 is guessable enough to
        // make people nervous in a bearer token.
        Self(format!(
            "mrf_{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    /// Wraps a token received from a client.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token to hand to the client.
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Issues and resolves bearer credentials.
#[derive(Clone, Default)]
pub struct SessionService {
    tokens: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh credential for the given user.
    pub fn issue(&self, user_id: Uuid) -> Credential {
        let credential = Credential::generate();
        let mut tokens = self.tokens.write().expect("session table poisoned");
        tokens.insert(credential.0.clone(), user_id);
        credential
    }

    /// Resolves a credential to the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Unauthenticated`] when the credential is
    /// unknown or revoked, when the account no longer exists, or when the
    /// account has been deactivated. The error message never distinguishes
    /// those cases to the caller.
    pub fn authenticate(
        &self,
        credential: &Credential,
        users: &UserDirectory,
    ) -> ReferralResult<Actor> {
        let user_id = {
            let tokens = self.tokens.read().expect("session table poisoned");
            tokens.get(&credential.0).copied()
        };

        let Some(user_id) = user_id else {
            return Err(ReferralError::Unauthenticated(
                "invalid or expired credential".into(),
            ));
        };

        let user = users.get(user_id).map_err(|_| {
            ReferralError::Unauthenticated("invalid or expired credential".into())
        })?;
        if !user.is_active {
            return Err(ReferralError::Unauthenticated(
                "invalid or expired credential".into(),
            ));
        }

        Ok(user.as_actor())
    }

    /// Revokes a single credential.
    pub fn revoke(&self, credential: &Credential) {
        let mut tokens = self.tokens.write().expect("session table poisoned");
        tokens.remove(&credential.0);
    }

    /// Revokes every credential issued to the given user.
    pub fn revoke_user(&self, user_id: Uuid) {
        let mut tokens = self.tokens.write().expect("session table poisoned");
        tokens.retain(|_, id| *id != user_id);
    }
}
