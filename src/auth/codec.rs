// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token encoding, signing and verification.
//!
//! Tokens are compact HS256 JWTs issued and decoded with `jsonwebtoken`.
//!
//! ## Verification Order
//!
//! 1. Structure and header (HS256 only)
//! 2. Signature, before any claim is decoded
//! 3. Claims decoding
//! 4. Expiry against the injected [`Clock`]
//! 5. Issuer and audience
//!
//! Expiry is checked here rather than by `jsonwebtoken`, which only knows
//! the system clock.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::claims::{Claims, IssuedToken, ACCESS_TOKEN_TYPE};
use super::clock::Clock;
use super::error::AuthError;
use super::roles::RoleSet;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issuer, audience and lifetime bound into every token.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub audience: String,
    pub validity: Duration,
}

/// Issues and verifies tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Signature, issuer and audience.
    validation: Validation,
    /// Signature only, for revocation of expired or foreign-audience tokens.
    inspection: Validation,
    clock: Arc<dyn Clock>,
    settings: TokenSettings,
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, clock: Arc<dyn Clock>, settings: TokenSettings) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_issuer(&[&settings.issuer]);
        validation.set_audience(&[&settings.audience]);

        let mut inspection = Validation::new(ALGORITHM);
        inspection.leeway = 0;
        inspection.validate_exp = false;
        inspection.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            inspection,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Configured token lifetime.
    pub fn validity(&self) -> Duration {
        self.settings.validity
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Sign a new token for `subject` with `roles`.
    pub fn issue(&self, subject: &str, roles: RoleSet) -> Result<IssuedToken, AuthError> {
        if subject.is_empty() {
            return Err(AuthError::Internal(
                "token subject must not be empty".to_string(),
            ));
        }

        let iat = self.clock.now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            roles,
            iat,
            exp: iat + self.settings.validity.num_seconds(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        if claims.expires_at().is_none() {
            return Err(AuthError::Internal(format!(
                "token expiry {} is out of range",
                claims.exp
            )));
        }

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Fully verify a token: signature, expiry, issuer and audience.
    pub fn verify(&self, raw: &str) -> Result<Claims, AuthError> {
        match decode::<Claims>(raw, &self.decoding_key, &self.validation) {
            Ok(data) => {
                let claims = checked_subject(data.claims)?;
                self.check_expiry(&claims)?;
                Ok(claims)
            }
            Err(e) if matches!(e.kind(), ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience) => {
                // An expired token reports expiry even when it is also foreign
                let claims = self.inspect(raw)?;
                self.check_expiry(&claims)?;
                Err(AuthError::IssuerMismatch)
            }
            Err(e) => Err(map_decode_error(e.kind())),
        }
    }

    /// Check structure and signature and decode the claims, without looking
    /// at expiry or issuer.
    ///
    /// Revocation accepts already-expired tokens but must never accept a
    /// token this service did not sign.
    pub fn inspect(&self, raw: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(raw, &self.decoding_key, &self.inspection)
            .map_err(|e| map_decode_error(e.kind()))?;
        checked_subject(data.claims)
    }

    /// Subject of a fully verified token.
    pub fn subject(&self, raw: &str) -> Result<String, AuthError> {
        self.verify(raw).map(|claims| claims.sub)
    }

    /// Roles of a fully verified token.
    pub fn roles(&self, raw: &str) -> Result<RoleSet, AuthError> {
        self.verify(raw).map(|claims| claims.roles)
    }

    /// Expiry of a fully verified token.
    pub fn expiry(&self, raw: &str) -> Result<chrono::DateTime<chrono::Utc>, AuthError> {
        let claims = self.verify(raw)?;
        claims.expires_at().ok_or(AuthError::Malformed)
    }

    fn check_expiry(&self, claims: &Claims) -> Result<(), AuthError> {
        if claims.is_expired_at(self.clock.now()) {
            return Err(AuthError::Expired);
        }
        Ok(())
    }
}

fn checked_subject(claims: Claims) -> Result<Claims, AuthError> {
    if claims.sub.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(claims)
}

fn map_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => AuthError::IssuerMismatch,
        _ => AuthError::Malformed,
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}
