// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Revocation lookups against the external identity service.
//!
//! Revocation records are owned by the identity provider, not this service.
//! A token is only checked after its signature verified; the lookup is keyed
//! by the `jti` claim. Lookup failures and timeouts classify as
//! `SECRET_ERROR` so callers can retry after backoff.

use std::time::Duration;

use async_trait::async_trait;

use super::error::AuthError;

/// Upper bound on a single revocation lookup.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Revocation oracle for verified tokens.
#[async_trait]
pub trait RevocationCheck: Send + Sync {
    /// Whether the issuer holds a revocation record for this token id.
    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError>;
}

/// HTTP revocation checker.
///
/// Queries `GET <endpoint>/<jti>`; the service answers with a JSON body
/// `{"revoked": <bool>}`. A 404 means no record, i.e. not revoked.
pub struct HttpRevocationChecker {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct RevocationRecord {
    revoked: bool,
}

impl HttpRevocationChecker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(LOOKUP_TIMEOUT)
                .build()
                .expect("failed to create HTTP client"),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RevocationCheck for HttpRevocationChecker {
    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), jti);

        let request = self.client.get(&url).send();
        let response = tokio::time::timeout(LOOKUP_TIMEOUT, request)
            .await
            .map_err(|_| AuthError::SecretError("revocation lookup timed out".to_string()))?
            .map_err(|e| AuthError::SecretError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(AuthError::SecretError(format!(
                "HTTP {} from revocation endpoint",
                response.status()
            )));
        }

        let record: RevocationRecord = response
            .json()
            .await
            .map_err(|e| AuthError::SecretError(e.to_string()))?;
        Ok(record.revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_creation() {
        let checker = HttpRevocationChecker::new("https://auth.example.com/revoked");
        assert_eq!(checker.endpoint(), "https://auth.example.com/revoked");
    }

    #[tokio::test]
    async fn unreachable_endpoint_classifies_as_secret_error() {
        let checker = HttpRevocationChecker::new("https://192.0.2.1/revoked");
        let err = checker.is_revoked("jti_abc").await.unwrap_err();
        assert!(matches!(err, AuthError::SecretError(_)));
    }
}
