// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Authentication middleware for Axum.
//!
//! The authenticator runs exactly once per request as an explicit step in
//! the routing pipeline (`axum::middleware::from_fn_with_state`), attaches
//! the outcome to the request's extensions, and short-circuits rejected
//! requests with the classified response. Handlers and extractors behind it
//! read the outcome; none of them re-verify.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::authenticator::AuthOutcome;
use super::error::AuthError;
use crate::state::AppState;

/// Authenticate the request and gate continuation on the outcome.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match header_str(&request, AUTHORIZATION.as_str()) {
        Ok(value) => value,
        Err(reason) => return reason.into_response(),
    };
    let asserted_id = match state.authenticator.identity_header() {
        Some(name) => match header_str(&request, name) {
            Ok(value) => value,
            Err(reason) => return reason.into_response(),
        },
        None => None,
    };

    let outcome = state
        .authenticator
        .authenticate(auth_header.as_deref(), asserted_id.as_deref())
        .await;

    match outcome {
        AuthOutcome::Authenticated(_) => {
            request.extensions_mut().insert(outcome);
            next.run(request).await
        }
        AuthOutcome::Rejected(reason) => reason.into_response(),
    }
}

fn header_str(request: &Request, name: &str) -> Result<Option<String>, AuthError> {
    match request.headers().get(name) {
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
    use crate::auth::extractor::Auth;
    use crate::config::AuthConfig;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    fn test_state(identity_header: Option<&str>) -> AppState {
        let config = AuthConfig {
            secret: Some(SECRET.to_string()),
            jwks_url: None,
            algorithms: vec![Algorithm::HS256],
            issuer: None,
            audience: None,
            leeway_secs: 0,
            revocation_url: None,
            identity_header: identity_header.map(str::to_string),
            enforce_identity_match: identity_header.is_some(),
        };
        AppState::new(TokenAuthenticator::new(&config).unwrap())
    }

    fn protected_app(state: AppState) -> Router {
        async fn whoami(Auth(principal): Auth) -> String {
            principal.id
        }

        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), authenticate))
            .with_state(state)
    }

    fn token_for(sub: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": sub, "exp": chrono::Utc::now().timestamp() + 3600 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_request_without_credentials() {
        let app = protected_app(test_state(None));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn passes_authenticated_request_to_handler() {
        let app = protected_app(test_state(None));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {}", token_for("u1")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"u1");
    }

    #[tokio::test]
    async fn identity_header_mismatch_is_rejected_before_handler() {
        let app = protected_app(test_state(Some("x-user-id")));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {}", token_for("u1")))
                    .header("x-user-id", "u2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error_code"], "USER_MISMATCH");
    }
}
