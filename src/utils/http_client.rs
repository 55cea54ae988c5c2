// ABOUTME: Shared HTTP client utilities with connection pooling and timeout configuration
// ABOUTME: Provides the singleton client plus builders for redirect-following and long calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use reqwest::{redirect, Client};
use std::sync::OnceLock;
use std::time::Duration;

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// User agent sent to video platforms, which reject the bare reqwest default
pub const USER_AGENT: &str = concat!("clipchef/", env!("CARGO_PKG_VERSION"));

fn build(timeout_secs: u64, connect_timeout_secs: u64, redirects: redirect::Policy) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .redirect(redirects)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("HTTP client build failed, using defaults: {e}");
            Client::new()
        })
}

/// Pooled client for short metadata calls (30s total, 10s connect)
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| build(30, 10, redirect::Policy::default()))
}

/// Client with custom deadlines
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    build(timeout_secs, connect_timeout_secs, redirect::Policy::default())
}

/// Client that follows at most `max_redirects` hops
///
/// Used to expand short links (`vm.tiktok.com/...`) to their canonical URL.
#[must_use]
pub fn redirect_client(max_redirects: usize) -> Client {
    build(15, 5, redirect::Policy::limited(max_redirects))
}

/// Client for slow upstream work such as ASR uploads and transcript services
#[must_use]
pub fn api_client() -> Client {
    create_client_with_timeout(300, 10)
}
