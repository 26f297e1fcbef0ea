//! Caller session.
//!
//! Requests carry their identity explicitly: the API layer resolves the
//! bearer token into an [`AuthContext`] and hands it to every data-access
//! call, so authorization never depends on process-wide state.

use serde::{Deserialize, Serialize};

/// The authenticated caller of a data-access operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// Identity (and profile) ID of the caller.
    pub identity_id: String,
    /// Bearer token the session was resolved from.
    pub token: String,
}

impl AuthContext {
    /// Create a new session for an identity.
    #[must_use]
    pub fn new(identity_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            token: token.into(),
        }
    }

    /// Whether this session belongs to the given identity.
    #[must_use]
    pub fn is(&self, identity_id: &str) -> bool {
        self.identity_id == identity_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_matches_identity() {
        let ctx = AuthContext::new("alice", "tok");
        assert!(ctx.is("alice"));
        assert!(!ctx.is("bob"));
    }
}
