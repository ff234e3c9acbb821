// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Axum extractors for the authorization gate.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is a verified Principal
//! }
//! ```
//!
//! The gate fails closed: every non-authenticated outcome is a rejection,
//! and the extractors perform no verification of their own - that is the
//! authenticator's single responsibility.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::authenticator::AuthOutcome;
use super::claims::{authorize_roles, Principal};
use super::error::AuthError;
use crate::state::AppState;

/// Extractor that requires an authenticated principal.
///
/// Prefers the outcome the authentication middleware already attached to
/// the request; without middleware it runs the authenticator against the
/// request headers directly.
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Middleware ran first: the outcome is final, do not re-verify.
        if let Some(outcome) = parts.extensions.get::<AuthOutcome>() {
            return match outcome {
                AuthOutcome::Authenticated(principal) => Ok(Auth(principal.clone())),
                AuthOutcome::Rejected(reason) => Err(reason.clone()),
            };
        }

        let auth_header = header_str(parts, AUTHORIZATION.as_str())?;
        let asserted_id = match state.authenticator.identity_header() {
            Some(name) => header_str(parts, name)?,
            None => None,
        };

        let outcome = state
            .authenticator
            .authenticate(auth_header.as_deref(), asserted_id.as_deref())
            .await;

        match outcome {
            AuthOutcome::Authenticated(principal) => Ok(Auth(principal)),
            AuthOutcome::Rejected(reason) => Err(reason),
        }
    }
}

/// Extractor that additionally requires the `admin` role.
///
/// Rejects with 403 when the principal is authenticated but the role set
/// does not intersect - distinct from the 401 of unknown identity.
pub struct AdminOnly(pub Principal);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;
        authorize_roles(&principal, &["admin"])?;
        Ok(AdminOnly(principal))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` instead of rejecting when no valid credentials are
/// present. For public endpoints that can show principal-specific data.
pub struct OptionalAuth(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(principal)) => Ok(OptionalAuth(Some(principal))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Read a header as a string; a value that is not valid visible ASCII is a
/// malformed header, not an internal error.
fn header_str(parts: &Parts, name: &str) -> Result<Option<String>, AuthError> {
    match parts.headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|s| Some(s.to_string()))
            .map_err(|_| AuthError::MissingOrMalformedHeader),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authenticator::TokenAuthenticator;
    use crate::config::AuthConfig;
    use axum::http::Request;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn test_state() -> AppState {
        let config = AuthConfig {
            secret: Some(SECRET.to_string()),
            jwks_url: None,
            algorithms: vec![Algorithm::HS256],
            issuer: None,
            audience: None,
            leeway_secs: 0,
            revocation_url: None,
            identity_header: None,
            enforce_identity_match: false,
        };
        AppState::new(TokenAuthenticator::new(&config).unwrap())
    }

    fn sign(claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn token_for(sub: &str, roles: &[&str]) -> String {
        sign(&json!({
            "sub": sub,
            "roles": roles,
            "exp": chrono::Utc::now().timestamp() + 3600,
        }))
    }

    fn parts_without_auth() -> Parts {
        Request::builder().uri("/test").body(()).unwrap().into_parts().0
    }

    fn parts_with_token(token: &str) -> Parts {
        Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn auth_rejects_without_header() {
        let state = test_state();
        let mut parts = parts_without_auth();

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingOrMalformedHeader)));
    }

    #[tokio::test]
    async fn auth_succeeds_with_valid_token() {
        let state = test_state();
        let mut parts = parts_with_token(&token_for("u1", &["client"]));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.id, "u1");
    }

    #[tokio::test]
    async fn auth_prefers_middleware_outcome() {
        let state = test_state();
        let mut parts = parts_without_auth();

        let principal = Principal {
            id: "from_middleware".to_string(),
            email: None,
            roles: vec![],
        };
        parts
            .extensions
            .insert(AuthOutcome::Authenticated(principal));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.id, "from_middleware");
    }

    #[tokio::test]
    async fn auth_propagates_middleware_rejection() {
        let state = test_state();
        // Extensions carry a rejection even though the header itself would
        // verify; the middleware outcome is authoritative.
        let mut parts = parts_with_token(&token_for("u1", &[]));
        parts
            .extensions
            .insert(AuthOutcome::Rejected(AuthError::TokenRevoked));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let state = test_state();
        let mut parts = parts_with_token(&token_for("u1", &["client"]));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientRole)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let state = test_state();
        let mut parts = parts_with_token(&token_for("u1", &["admin", "client"]));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.id, "u1");
    }

    #[tokio::test]
    async fn admin_only_without_credentials_is_unauthorized_not_forbidden() {
        let state = test_state();
        let mut parts = parts_without_auth();

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingOrMalformedHeader)));
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_credentials() {
        let state = test_state();
        let mut parts = parts_without_auth();

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert!(result.unwrap().0.is_none());
    }

    #[tokio::test]
    async fn optional_auth_returns_principal_with_credentials() {
        let state = test_state();
        let mut parts = parts_with_token(&token_for("u1", &[]));

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.unwrap().id, "u1");
    }
}
