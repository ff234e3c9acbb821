// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth, state::AppState};

pub mod health;
pub mod session;

pub fn router(state: AppState) -> Router {
    // Everything under /v1 goes through the authentication middleware; the
    // health probes and docs stay public.
    let v1_routes = Router::new()
        .route("/me", get(session::me))
        .route("/admin/ping", get(session::admin_ping))
        .route_layer(from_fn_with_state(
            state.clone(),
            auth::middleware::authenticate,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        session::me,
        session::admin_ping
    ),
    components(
        schemas(
            auth::Principal,
            session::SessionInfo,
            session::PingResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Session", description = "Authenticated session introspection")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenAuthenticator;
    use crate::config::AuthConfig;
    use axum::{body::Body, http::StatusCode};
    use jsonwebtoken::Algorithm;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = AuthConfig {
            secret: Some("test-secret".to_string()),
            jwks_url: None,
            algorithms: vec![Algorithm::HS256],
            issuer: None,
            audience: None,
            leeway_secs: 60,
            revocation_url: None,
            identity_header: None,
            enforce_identity_match: false,
        };
        AppState::new(TokenAuthenticator::new(&config).unwrap())
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(test_state());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = router(test_state());
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn v1_routes_require_authentication() {
        let app = router(test_state());
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/v1/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
