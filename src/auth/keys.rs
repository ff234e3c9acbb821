// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Signing key material: static HMAC secret or remote JWKS.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only (enforced at authenticator construction)
//! - The key set is cached with a TTL; an unknown `kid` triggers one refresh
//! - At most one refresh is in flight at a time; concurrent verifiers wait
//!   and re-read the cache instead of issuing duplicate fetches
//! - Fetch failures and timeouts classify as `SECRET_ERROR`, never as a
//!   client credential problem

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum age before an unknown `kid` may force another refresh.
///
/// Keeps a stream of tokens with bogus key ids from hammering the endpoint.
const DEFAULT_REFRESH_FLOOR: Duration = Duration::from_secs(10);

/// Upper bound on a single JWKS fetch, including connect time.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where decoding keys come from.
pub enum KeySource {
    /// Shared HMAC secret (HS* family), held in memory for process lifetime.
    Secret(DecodingKey),
    /// Remote JSON Web Key Set, cached with TTL.
    Jwks(JwksCache),
}

impl KeySource {
    /// Resolve the decoding key for a token.
    ///
    /// `kid` comes from the token header; it is ignored for a static secret.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AuthError> {
        match self {
            KeySource::Secret(key) => Ok(key.clone()),
            KeySource::Jwks(cache) => cache.decoding_key(kid).await,
        }
    }
}

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Read-through cache over a remote JWKS endpoint.
#[derive(Clone)]
pub struct JwksCache {
    jwks_url: String,
    cache_ttl: Duration,
    refresh_floor: Duration,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Serializes refreshes; waiters re-check the cache after acquiring.
    refresh_lock: Arc<Mutex<()>>,
    client: reqwest::Client,
}

impl JwksCache {
    /// Create a new cache for the given JWKS endpoint.
    ///
    /// URL scheme validation happens at authenticator construction; this
    /// constructor only wires up the HTTP client and empty cache.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            refresh_floor: DEFAULT_REFRESH_FLOOR,
            cache: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("failed to create HTTP client"),
        }
    }

    /// Override the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the minimum age before an unknown `kid` forces a refresh.
    pub fn with_refresh_floor(mut self, floor: Duration) -> Self {
        self.refresh_floor = floor;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Look up the decoding key for `kid`.
    ///
    /// On an unknown `kid` the key set is refreshed once (the key may have
    /// rotated since the last fetch) before the token is rejected. Tokens
    /// without a `kid` match the first convertible key in the set.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AuthError> {
        let jwks = self.refresh_if_older_than(self.cache_ttl).await?;

        if let Some(key) = find_key(&jwks, kid) {
            return Ok(key);
        }

        // Unknown kid: the set may be stale relative to a key rotation.
        let jwks = self.refresh_if_older_than(self.refresh_floor).await?;
        find_key(&jwks, kid).ok_or(AuthError::InvalidToken)
    }

    /// Return the cached key set, fetching if the entry is absent or older
    /// than `max_age`. At most one fetch runs at a time.
    async fn refresh_if_older_than(&self, max_age: Duration) -> Result<JwkSet, AuthError> {
        if let Some(jwks) = self.cached_younger_than(max_age).await {
            return Ok(jwks);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another verifier may have refreshed while we waited for the lock.
        if let Some(jwks) = self.cached_younger_than(max_age).await {
            return Ok(jwks);
        }

        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    async fn cached_younger_than(&self, max_age: Duration) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < max_age)
            .map(|entry| entry.jwks.clone())
    }

    /// Fetch the key set from the endpoint, bounded by [`FETCH_TIMEOUT`].
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let request = self.client.get(&self.jwks_url).send();
        let response = tokio::time::timeout(FETCH_TIMEOUT, request)
            .await
            .map_err(|_| AuthError::SecretError("jwks fetch timed out".to_string()))?
            .map_err(|e| AuthError::SecretError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::SecretError(format!(
                "HTTP {} from jwks endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::SecretError(e.to_string()))
    }

    /// Force a refresh, ignoring the TTL. Used by readiness checks.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Whether a non-expired key set is cached.
    pub async fn is_cached(&self) -> bool {
        self.cached_younger_than(self.cache_ttl).await.is_some()
    }
}

fn find_key(jwks: &JwkSet, kid: Option<&str>) -> Option<DecodingKey> {
    match kid {
        Some(kid) => jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .and_then(|jwk| jwk_to_decoding_key(jwk).ok()),
        // No kid in the token header: take the first usable key.
        None => jwks.keys.iter().find_map(|jwk| jwk_to_decoding_key(jwk).ok()),
    }
}

/// Convert a JWK to a decoding key. RSA and EC key types are supported.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::SecretError(format!("unusable RSA key in jwks: {e}"))),
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
            .map_err(|e| AuthError::SecretError(format!("unusable EC key in jwks: {e}"))),
        _ => Err(AuthError::SecretError(
            "unsupported key type in jwks".to_string(),
        )),
    }
}
