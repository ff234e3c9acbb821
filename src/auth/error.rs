// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Authentication failure taxonomy.
//!
//! Every expected verification failure is classified into one of these
//! variants and handled inside the authenticator. Anything else (malformed
//! configuration, programming error) propagates as a fatal error and is
//! mapped to a generic internal-error response by the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Classified authentication/authorization failure.
///
/// All variants are terminal and user-facing. `SecretError` is the only
/// retryable one: it marks the verification infrastructure (key provider,
/// revocation service) as unavailable rather than the credentials as bad.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, wrong scheme, or empty token.
    #[error("authorization header is missing or malformed (expected 'Bearer <token>')")]
    MissingOrMalformedHeader,
    /// Signature, format, or claim invalid; also unknown signing key.
    #[error("token is invalid")]
    InvalidToken,
    /// Expiry claim is in the past.
    #[error("token has expired")]
    TokenExpired,
    /// The issuer maintains a revocation record for this token.
    #[error("token has been revoked")]
    TokenRevoked,
    /// Caller-asserted identity header conflicts with the verified subject.
    #[error("asserted identity does not match the token subject")]
    UserMismatch,
    /// Key retrieval or revocation lookup failed or timed out.
    #[error("verification infrastructure unavailable: {0}")]
    SecretError(String),
    /// Identity is known but carries none of the accepted roles.
    #[error("insufficient role for this operation")]
    InsufficientRole,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: &'static str,
    retryable: bool,
}

impl AuthError {
    /// Stable error code, suitable for client dispatch.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingOrMalformedHeader => "MISSING_OR_MALFORMED_HEADER",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenRevoked => "TOKEN_REVOKED",
            AuthError::UserMismatch => "USER_MISMATCH",
            AuthError::SecretError(_) => "SECRET_ERROR",
            AuthError::InsufficientRole => "INSUFFICIENT_ROLE",
        }
    }

    /// Whether the caller may retry the same request after backoff.
    ///
    /// Only true for infrastructure failures; every other variant requires
    /// the client to change its credentials first.
    pub fn retryable(&self) -> bool {
        matches!(self, AuthError::SecretError(_))
    }

    /// HTTP status for this failure.
    ///
    /// Unknown identity maps to 401, known-but-underprivileged to 403, and
    /// infrastructure failure to 503 so load balancers treat it as transient.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingOrMalformedHeader
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::UserMismatch => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::SecretError(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code(),
            retryable: self.retryable(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_header_returns_401() {
        let response = AuthError::MissingOrMalformedHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "MISSING_OR_MALFORMED_HEADER");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn insufficient_role_returns_403() {
        let response = AuthError::InsufficientRole.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn secret_error_returns_503_and_is_retryable() {
        let err = AuthError::SecretError("jwks endpoint unreachable".to_string());
        assert!(err.retryable());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "SECRET_ERROR");
        assert_eq!(body["retryable"], true);
    }

    #[test]
    fn only_secret_error_is_retryable() {
        assert!(!AuthError::InvalidToken.retryable());
        assert!(!AuthError::TokenExpired.retryable());
        assert!(!AuthError::TokenRevoked.retryable());
        assert!(!AuthError::UserMismatch.retryable());
    }
}
