//! The authenticated identity bound to a connection or request.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// An authenticated user identity.
///
/// Produced by the credential verifier and carried by value alongside each
/// connection handle; never stored in ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier (the token subject).
    pub user_id: UserId,
    /// Name shown to other users.
    pub display_name: String,
}

impl Principal {
    /// Create a principal.
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}
