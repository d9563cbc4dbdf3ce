// ABOUTME: Test helper module declarations
// ABOUTME: Exposes the axum request/response helpers to integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

pub mod axum_test;
