// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Introspection endpoints for the authenticated session.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AdminOnly, Auth, Principal};

/// The caller's verified identity, as the gate sees it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    /// The trusted principal derived from the bearer token.
    pub principal: Principal,
    /// Server time at which this response was produced.
    pub served_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub status: String,
}

/// Return the verified principal for the presented token.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Session",
    responses(
        (status = 200, description = "Verified principal", body = SessionInfo),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "Verification infrastructure unavailable")
    ),
    security(("bearer_token" = []))
)]
pub async fn me(Auth(principal): Auth) -> Json<SessionInfo> {
    Json(SessionInfo {
        principal,
        served_at: Utc::now(),
    })
}

/// Admin-only reachability check.
#[utoipa::path(
    get,
    path = "/v1/admin/ping",
    tag = "Session",
    responses(
        (status = 200, description = "Caller holds the admin role", body = PingResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Authenticated but not an admin")
    ),
    security(("bearer_token" = []))
)]
pub async fn admin_ping(AdminOnly(_principal): AdminOnly) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
    })
}
