// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Identity of the client on whose behalf statements run

/// Caller identity extracted by the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub username: String,
    /// Different user to impersonate, if the caller asked for one
    pub impersonated_user: Option<String>,
}

impl CallerIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            impersonated_user: None,
        }
    }

    pub fn with_impersonation(mut self, user: impl Into<String>) -> Self {
        self.impersonated_user = Some(user.into());
        self
    }

    /// User whose permissions the session should carry
    pub fn effective_user(&self) -> &str {
        self.impersonated_user.as_deref().unwrap_or(&self.username)
    }
}
