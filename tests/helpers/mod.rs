// ABOUTME: Shared test helpers and utilities for integration tests
// ABOUTME: Exports the HTTP request helper, scripted fakes, recipe fixtures, and the service harness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

pub mod axum_test;
pub mod fakes;
pub mod fixtures;
pub mod harness;
