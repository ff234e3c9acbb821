// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! # Authentication Module
//!
//! JWT-based request authentication and authorization gating.
//!
//! ## Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. The [`TokenAuthenticator`]:
//!    - Resolves key material (static secret or cached JWKS)
//!    - Verifies signature, expiry, issuer, audience against an algorithm
//!      allow-list
//!    - Consults the revocation service when the token carries a `jti`
//!    - Cross-checks the caller-asserted identity header, if mandatory
//!    - Derives a trusted [`Principal`] (`sub` → id, `email`, `roles`)
//! 3. The gate (middleware or extractor) permits continuation iff the
//!    outcome is authenticated; role-restricted routes additionally require
//!    a role intersection.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only and cached with a TTL
//! - Remote key and revocation lookups are bounded by timeouts and classify
//!   as `SECRET_ERROR` on failure
//! - Clock skew tolerance defaults to 60 seconds
//! - Tokens and secrets are never logged

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod middleware;
pub mod revocation;

pub use authenticator::{AuthOutcome, TokenAuthenticator};
pub use claims::{authorize_roles, Principal};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use keys::{JwksCache, KeySource};
pub use revocation::RevocationCheck;
