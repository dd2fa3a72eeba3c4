// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session management
//!
//! This module provides:
//! - Caller identity handed over by the HTTP layer
//! - Session configuration: routing access mode, impersonation, bookmarks
//! - Scoped session acquisition with guaranteed release

pub mod identity;
pub mod provisioner;

pub use identity::CallerIdentity;
pub use provisioner::{ScopedSession, SessionProvisioner};
