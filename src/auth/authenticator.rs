// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! The token authenticator: bearer header in, classified outcome out.
//!
//! One instance is built at startup from immutable configuration and shared
//! across all requests. Each call is stateless; concurrent verifications of
//! the same token yield identical principals. Expected failures never
//! escape as errors - they are folded into [`AuthOutcome::Rejected`].

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::{Claims, Principal};
use super::error::AuthError;
use super::keys::{JwksCache, KeySource};
use super::revocation::{HttpRevocationChecker, RevocationCheck};
use crate::config::{AuthConfig, ConfigError};

/// Bearer scheme prefix, case-sensitive with a single space.
const BEARER_PREFIX: &str = "Bearer ";

/// Per-request authentication outcome.
///
/// Created once during the authentication phase, read-only afterward,
/// discarded with the request.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// Signature and claims verified; the principal is trusted.
    Authenticated(Principal),
    /// Verification failed with a classified reason.
    Rejected(AuthError),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthOutcome::Authenticated(principal) => Some(principal),
            AuthOutcome::Rejected(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AuthError> {
        match self {
            AuthOutcome::Authenticated(_) => None,
            AuthOutcome::Rejected(reason) => Some(reason),
        }
    }
}

/// Verifies bearer tokens and derives trusted principals.
pub struct TokenAuthenticator {
    algorithms: Vec<Algorithm>,
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: u64,
    identity_header: Option<String>,
    enforce_identity_match: bool,
    keys: KeySource,
    revocation: Option<Arc<dyn RevocationCheck>>,
}

impl TokenAuthenticator {
    /// Build an authenticator from validated configuration.
    ///
    /// Key material is resolved here: a static HMAC secret, or a JWKS cache
    /// for an HTTPS endpoint. The configuration has already checked that
    /// exactly one source is present and that the algorithm list matches it.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        let keys = match (&config.secret, &config.jwks_url) {
            (Some(secret), None) => {
                KeySource::Secret(jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()))
            }
            (None, Some(url)) => KeySource::Jwks(JwksCache::new(url.as_str())),
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousKeyMaterial),
            (None, None) => return Err(ConfigError::MissingKeyMaterial),
        };

        let revocation: Option<Arc<dyn RevocationCheck>> = config
            .revocation_url
            .as_ref()
            .map(|url| Arc::new(HttpRevocationChecker::new(url.as_str())) as Arc<dyn RevocationCheck>);

        Ok(Self {
            algorithms: config.algorithms.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway_secs: config.leeway_secs,
            identity_header: config.identity_header.clone(),
            enforce_identity_match: config.enforce_identity_match,
            keys,
            revocation,
        })
    }

    /// Replace the revocation checker. Used for dependency injection.
    pub fn with_revocation(mut self, checker: Arc<dyn RevocationCheck>) -> Self {
        self.revocation = Some(checker);
        self
    }

    /// Name of the caller-asserted identity header, if cross-checking is
    /// configured.
    pub fn identity_header(&self) -> Option<&str> {
        self.identity_header.as_deref()
    }

    pub fn key_source(&self) -> &KeySource {
        &self.keys
    }

    /// Authenticate a request from its `Authorization` header value and the
    /// optional caller-asserted identity.
    ///
    /// Never returns an error: every expected failure is classified into the
    /// rejected outcome. The token itself is never logged.
    pub async fn authenticate(
        &self,
        auth_header: Option<&str>,
        asserted_id: Option<&str>,
    ) -> AuthOutcome {
        match self.verify(auth_header, asserted_id).await {
            Ok(principal) => AuthOutcome::Authenticated(principal),
            Err(reason) => {
                tracing::debug!(code = reason.error_code(), "authentication rejected");
                AuthOutcome::Rejected(reason)
            }
        }
    }

    async fn verify(
        &self,
        auth_header: Option<&str>,
        asserted_id: Option<&str>,
    ) -> Result<Principal, AuthError> {
        let header_value = auth_header.ok_or(AuthError::MissingOrMalformedHeader)?;
        let token = header_value
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::MissingOrMalformedHeader)?;
        if token.is_empty() {
            return Err(AuthError::MissingOrMalformedHeader);
        }

        // The declared algorithm must be on the allow-list; a token naming
        // an unexpected algorithm is invalid, not silently accepted.
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidToken);
        }

        let decoding_key = self.keys.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway_secs;
        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;
        let claims = token_data.claims;

        // Cryptographically valid; the issuer may still have revoked it.
        if let (Some(checker), Some(jti)) = (&self.revocation, claims.jti.as_deref()) {
            if checker.is_revoked(jti).await? {
                return Err(AuthError::TokenRevoked);
            }
        }

        let principal = Principal::from_claims(claims)?;

        // The identity header is a confirmation channel, not a trust source:
        // when present under mandatory cross-check it must agree with the
        // verified subject, valid token or not.
        if self.enforce_identity_match {
            if let Some(asserted) = asserted_id {
                if asserted != principal.id {
                    return Err(AuthError::UserMismatch);
                }
            }
        }

        Ok(principal)
    }
}
