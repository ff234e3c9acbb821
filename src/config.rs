// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into an
//! immutable [`AuthConfig`] value; nothing mutates it afterward.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_SECRET` | Shared HMAC secret for HS* verification | One of `AUTH_SECRET`/`JWKS_URL` required |
//! | `JWKS_URL` | HTTPS JWKS endpoint for RS*/ES* verification | One of `AUTH_SECRET`/`JWKS_URL` required |
//! | `JWT_ALGORITHMS` | Comma-separated accepted algorithms | `HS256` or `RS256` per key source |
//! | `JWT_ISSUER` | Expected issuer claim | Optional |
//! | `JWT_AUDIENCE` | Expected audience claim | Optional |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance in seconds | `60` |
//! | `REVOCATION_URL` | Revocation lookup endpoint | Optional |
//! | `IDENTITY_HEADER` | Caller-asserted identity header name | Optional |
//! | `IDENTITY_HEADER_REQUIRED` | Enforce identity cross-check | `true` when header set |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH_SECRET_ENV: &str = "AUTH_SECRET";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWT_ALGORITHMS_ENV: &str = "JWT_ALGORITHMS";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const REVOCATION_URL_ENV: &str = "REVOCATION_URL";
pub const IDENTITY_HEADER_ENV: &str = "IDENTITY_HEADER";
pub const IDENTITY_HEADER_REQUIRED_ENV: &str = "IDENTITY_HEADER_REQUIRED";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default clock skew tolerance (60 seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Configuration errors, fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no key material configured: set {AUTH_SECRET_ENV} or {JWKS_URL_ENV}")]
    MissingKeyMaterial,
    #[error("both {AUTH_SECRET_ENV} and {JWKS_URL_ENV} are set; configure exactly one")]
    AmbiguousKeyMaterial,
    #[error("unknown JWT algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("{0}")]
    AlgorithmKeyMismatch(String),
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{JWKS_URL_ENV} must use https")]
    InsecureJwksUrl,
    #[error("{var} is not a valid value: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Immutable verification configuration, loaded once at process start.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret (HS* family). Mutually exclusive with `jwks_url`.
    pub secret: Option<String>,
    /// Remote JWKS endpoint. Mutually exclusive with `secret`.
    pub jwks_url: Option<Url>,
    /// Accepted signature algorithms; a token declaring anything else is
    /// rejected.
    pub algorithms: Vec<Algorithm>,
    /// Expected issuer claim, validated when set.
    pub issuer: Option<String>,
    /// Expected audience claim, validated when set.
    pub audience: Option<String>,
    /// Clock skew tolerance for `exp`/`nbf` checks.
    pub leeway_secs: u64,
    /// Revocation lookup endpoint.
    pub revocation_url: Option<Url>,
    /// Name of the caller-asserted identity header.
    pub identity_header: Option<String>,
    /// Whether an asserted identity must match the verified subject.
    pub enforce_identity_match: bool,
}

impl AuthConfig {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env_nonempty(AUTH_SECRET_ENV);
        let jwks_url = env_nonempty(JWKS_URL_ENV)
            .map(|raw| parse_jwks_url(&raw))
            .transpose()?;

        let algorithms = match env_nonempty(JWT_ALGORITHMS_ENV) {
            Some(raw) => parse_algorithms(&raw)?,
            None if secret.is_some() => vec![Algorithm::HS256],
            None => vec![Algorithm::RS256],
        };
        check_algorithm_family(&algorithms, secret.is_some())?;

        let leeway_secs = match env_nonempty(JWT_LEEWAY_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: JWT_LEEWAY_ENV,
                reason: format!("expected integer seconds, got {raw:?}"),
            })?,
            None => DEFAULT_LEEWAY_SECS,
        };

        let revocation_url = env_nonempty(REVOCATION_URL_ENV)
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
                    var: REVOCATION_URL_ENV,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let identity_header = env_nonempty(IDENTITY_HEADER_ENV);
        let enforce_identity_match = identity_header.is_some()
            && env_nonempty(IDENTITY_HEADER_REQUIRED_ENV)
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true);

        Ok(Self {
            secret,
            jwks_url,
            algorithms,
            issuer: env_nonempty(JWT_ISSUER_ENV),
            audience: env_nonempty(JWT_AUDIENCE_ENV),
            leeway_secs,
            revocation_url,
            identity_header,
            enforce_identity_match,
        })
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_jwks_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        var: JWKS_URL_ENV,
        reason: e.to_string(),
    })?;
    if url.scheme() != "https" {
        return Err(ConfigError::InsecureJwksUrl);
    }
    Ok(url)
}

fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_algorithm)
        .collect()
}

fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "PS256" => Ok(Algorithm::PS256),
        "PS384" => Ok(Algorithm::PS384),
        "PS512" => Ok(Algorithm::PS512),
        "ES256" => Ok(Algorithm::ES256),
        "ES384" => Ok(Algorithm::ES384),
        "EdDSA" => Ok(Algorithm::EdDSA),
        other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
    }
}

/// A shared secret only verifies HS* tokens, a JWKS only asymmetric ones.
/// Mismatched configuration would fail every request at runtime, so reject
/// it at startup instead.
fn check_algorithm_family(algorithms: &[Algorithm], has_secret: bool) -> Result<(), ConfigError> {
    let is_hmac = |a: &Algorithm| {
        matches!(a, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
    };
    if has_secret && !algorithms.iter().all(is_hmac) {
        return Err(ConfigError::AlgorithmKeyMismatch(format!(
            "{AUTH_SECRET_ENV} is set but {JWT_ALGORITHMS_ENV} names non-HMAC algorithms"
        )));
    }
    if !has_secret && algorithms.iter().any(is_hmac) {
        return Err(ConfigError::AlgorithmKeyMismatch(format!(
            "{JWKS_URL_ENV} is set but {JWT_ALGORITHMS_ENV} names HMAC algorithms"
        )));
    }
    Ok(())
}
