// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

use std::sync::Arc;

use crate::auth::TokenAuthenticator;

/// Shared application state: the authenticator built once at startup.
///
/// The authenticator is immutable; concurrent requests share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<TokenAuthenticator>,
}

impl AppState {
    pub fn new(authenticator: TokenAuthenticator) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }
}
