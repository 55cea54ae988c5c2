// ABOUTME: Utility modules for common functionality across the application
// ABOUTME: Contains shared HTTP clients and timeout wrappers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

/// HTTP client configuration and helpers
pub mod http_client;
/// Deadline wrappers for awaited external calls
pub mod timeout;
