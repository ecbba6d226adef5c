//! WebSocket handshake authentication.
//!
//! A connection attempt starts `Pending`. Its first control frame (the
//! upgrade request headers, or a `connect` frame when the upgrade carried
//! none) moves it to `Authenticated` or `Rejected`. Rejected connections
//! stay open for anonymous reads but never carry a principal.

use std::sync::Arc;

use tracing::{debug, info};

use murmur_auth::jwt::{CredentialVerifier, VerifyError, bearer_token};
use murmur_core::types::Principal;

use crate::presence::tracker::PresenceTracker;

/// Why a handshake ended without a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No `Authorization` value was presented.
    MissingCredentials,
    /// The value was not `Bearer <token>`.
    MalformedHeader,
    /// The verifier refused the token.
    InvalidToken(VerifyError),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "no credentials"),
            Self::MalformedHeader => write!(f, "malformed authorization header"),
            Self::InvalidToken(e) => write!(f, "{e}"),
        }
    }
}

/// Handshake state of one connection attempt.
#[derive(Debug)]
pub enum HandshakeState {
    /// Waiting for the first control frame.
    Pending,
    /// Credentials verified; presence counts the user as connecting.
    Authenticated(PendingHandshake),
    /// No principal; the connection may continue anonymously.
    Rejected(RejectReason),
}

impl HandshakeState {
    /// Whether the first control frame is still outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The verified principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(pending) => Some(pending.principal()),
            _ => None,
        }
    }
}

/// An authenticated handshake that has not finished.
///
/// While it lives, the user is counted as connecting. [`complete`] turns
/// that into an open connection; dropping it instead (upgrade failed,
/// client vanished) withdraws the connecting count.
///
/// [`complete`]: PendingHandshake::complete
#[derive(Debug)]
pub struct PendingHandshake {
    principal: Principal,
    presence: Arc<PresenceTracker>,
    settled: bool,
}

impl PendingHandshake {
    fn begin(principal: Principal, presence: Arc<PresenceTracker>) -> Self {
        presence.begin_connecting(principal.user_id);
        Self {
            principal,
            presence,
            settled: false,
        }
    }

    /// The verified principal.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Finish the handshake: the user's open-connection count goes up by one.
    pub fn complete(mut self) -> Principal {
        self.settled = true;
        self.presence.promote_connecting(self.principal.user_id);
        self.principal.clone()
    }
}

impl Drop for PendingHandshake {
    fn drop(&mut self) {
        if !self.settled {
            self.presence.abort_connecting(self.principal.user_id);
        }
    }
}

/// Authenticates WebSocket connections using bearer tokens.
#[derive(Clone)]
pub struct ConnectionAuthenticator {
    verifier: Arc<dyn CredentialVerifier>,
    presence: Arc<PresenceTracker>,
}

impl std::fmt::Debug for ConnectionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionAuthenticator").finish()
    }
}

impl ConnectionAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(verifier: Arc<dyn CredentialVerifier>, presence: Arc<PresenceTracker>) -> Self {
        Self { verifier, presence }
    }

    /// Resolve the `Authorization` value of the first control frame.
    ///
    /// Never returns [`HandshakeState::Pending`].
    pub fn authenticate(&self, authorization: Option<&str>) -> HandshakeState {
        let Some(header) = authorization.map(str::trim).filter(|h| !h.is_empty()) else {
            debug!("Handshake without credentials");
            return HandshakeState::Rejected(RejectReason::MissingCredentials);
        };

        let Some(token) = bearer_token(header) else {
            debug!("Handshake with malformed authorization header");
            return HandshakeState::Rejected(RejectReason::MalformedHeader);
        };

        match self.verifier.verify(token) {
            Ok(principal) => {
                info!(user_id = %principal.user_id, "Handshake authenticated");
                HandshakeState::Authenticated(PendingHandshake::begin(
                    principal,
                    self.presence.clone(),
                ))
            }
            Err(e) => {
                info!(error = %e, "Handshake rejected");
                HandshakeState::Rejected(RejectReason::InvalidToken(e))
            }
        }
    }
}
