// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

//! Gateward - JWT authentication and authorization gateway.
//!
//! Validates bearer tokens, derives trusted principals, and gates requests
//! on the outcome, with a fixed taxonomy of authentication failure modes.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token authenticator, authorization gate, key sources
//! - `config` - Environment-driven immutable configuration
//! - `state` - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
