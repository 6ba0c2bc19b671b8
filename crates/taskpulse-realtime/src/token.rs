// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-SHA256 access-token verification.
//!
//! Token format: `base64url(claims-json) "." base64url(hmac-sha256(tag))`
//! with unpadded url-safe base64. The MAC is computed over the encoded
//! claims segment. Verification order is structure, MAC, then expiry, so a
//! forged token never gets its claims inspected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use taskpulse_core::{PulseError, TokenClaims, TokenVerifier};

type HmacSha256 = Hmac<Sha256>;

/// Verifies tokens minted with a shared secret.
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
}

impl HmacTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length")
    }

    /// Mint a token for the given claims. The auth service owns issuance in
    /// production; this exists for tests and local tooling.
    pub fn issue(&self, claims: &TokenClaims) -> String {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));
        let mut mac = self.mac();
        mac.update(body.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{body}.{tag}")
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenClaims, PulseError> {
        let (body, tag) = token
            .split_once('.')
            .ok_or_else(|| PulseError::Auth("malformed token".into()))?;
        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| PulseError::Auth("malformed token".into()))?;

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        mac.verify_slice(&tag_bytes)
            .map_err(|_| PulseError::Auth("invalid token signature".into()))?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| PulseError::Auth("malformed token".into()))?;
        let claims: TokenClaims = serde_json::from_slice(&claims_bytes)
            .map_err(|_| PulseError::Auth("malformed token claims".into()))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(PulseError::Auth("token expired".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(user_id: &str, exp_offset: i64) -> TokenClaims {
        TokenClaims {
            user_id: user_id.into(),
            email: format!("{user_id}@example.com"),
            exp: Utc::now().timestamp() + exp_offset,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let verifier = HmacTokenVerifier::new("dev-secret");
        let claims = claims_for("u1", 3600);
        let token = verifier.issue(&claims);
        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let ours = HmacTokenVerifier::new("dev-secret");
        let theirs = HmacTokenVerifier::new("other-secret");
        let token = theirs.issue(&claims_for("u1", 3600));
        let err = ours.verify(&token).unwrap_err();
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let verifier = HmacTokenVerifier::new("dev-secret");
        let token = verifier.issue(&claims_for("u1", 3600));
        let (_, tag) = token.split_once('.').unwrap();
        let forged_body =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims_for("admin", 3600)).unwrap());
        let forged = format!("{forged_body}.{tag}");
        assert!(verifier.verify(&forged).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = HmacTokenVerifier::new("dev-secret");
        let token = verifier.issue(&claims_for("u1", -60));
        let err = verifier.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let verifier = HmacTokenVerifier::new("dev-secret");
        assert!(verifier.verify("").is_err());
        assert!(verifier.verify("no-dot-here").is_err());
        assert!(verifier.verify("a.b").is_err());
        assert!(verifier.verify("!!!.???").is_err());
    }
}
