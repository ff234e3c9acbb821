// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! JWT claims and the trusted principal derived from them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::AuthError;

/// Claims decoded from a verified JWT payload.
///
/// Registered claims (`exp`, `nbf`, `iss`, `aud`) are validated by the
/// `jsonwebtoken` decoder; the rest feed [`Principal`] construction.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject - the canonical identity of the token holder.
    pub sub: String,

    /// Issued at timestamp.
    #[serde(default)]
    pub iat: i64,

    /// Expiration timestamp.
    #[serde(default)]
    pub exp: i64,

    /// Not before timestamp (optional).
    #[serde(default)]
    pub nbf: Option<i64>,

    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,

    /// Audience (validated by the decoder, not read directly).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,

    /// Email address (optional).
    #[serde(default)]
    pub email: Option<String>,

    /// Role names carried by the token.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Token identifier, used for revocation lookups (optional).
    #[serde(default)]
    pub jti: Option<String>,
}

/// The authenticated identity attached to a request.
///
/// A `Principal` only ever exists for a request whose bearer token passed
/// signature verification; it is never built from an unverified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Opaque subject identifier (the token's `sub` claim).
    pub id: String,

    /// Email address, if the token carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Role names, empty if the token carried none.
    pub roles: Vec<String>,
}

impl Principal {
    /// Build a principal from verified claims.
    ///
    /// A missing or blank subject is an `INVALID_TOKEN` failure, never a
    /// principal with an empty id.
    pub fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Self {
            id: claims.sub,
            email: claims.email,
            roles: claims.roles,
        })
    }

    /// Whether this principal carries at least one of the accepted roles.
    pub fn has_any_role(&self, accepted: &[&str]) -> bool {
        self.roles.iter().any(|r| accepted.contains(&r.as_str()))
    }
}

/// Role-set gate: permit iff the principal's roles intersect the accepted
/// set. Pure check over an already-verified principal; performs no token
/// work of its own.
pub fn authorize_roles(principal: &Principal, accepted: &[&str]) -> Result<(), AuthError> {
    if principal.has_any_role(accepted) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}
