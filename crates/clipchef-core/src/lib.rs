// ABOUTME: Core types and constants for the Clipchef recipe service
// ABOUTME: Foundation crate with error handling and shared constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![deny(unsafe_code)]

//! # Clipchef Core
//!
//! Foundation crate providing shared types for the Clipchef workspace. It is
//! meant to change rarely so the calculation and server crates can build on it.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and HTTP error bodies
//! - **constants**: Application-wide constants organized by domain

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;
