// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access-token verification interface.

use crate::error::PulseError;
use crate::types::TokenClaims;

/// Verifies an access token presented at socket-connect time.
///
/// Token issuance is owned by the (external) auth service; this core only
/// needs "verify and resolve claims". Implementations must reject malformed,
/// incorrectly signed, and expired tokens with [`PulseError::Auth`].
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<TokenClaims, PulseError>;
}
