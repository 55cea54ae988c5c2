// ABOUTME: HTTP middleware for CORS, request ID propagation, and JSON rejection bodies
// ABOUTME: Provides request ID generation and span creation for structured logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

/// CORS layer configuration
pub mod cors;
/// JSON bodies for tower-http rejections
pub mod error_body;
/// Request ID generation and request spans
pub mod request_id;

pub use cors::setup_cors;
pub use error_body::{json_payload_too_large, json_request_timeout};
pub use request_id::{create_request_span, MakeRequestUuid, REQUEST_ID_HEADER};
