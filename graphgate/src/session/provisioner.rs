// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session provisioning
//!
//! Builds a session configuration from the routing requirements and the
//! caller identity, then acquires the session from the driver. Acquisition
//! failures are surfaced, never retried here.

use std::sync::Arc;
use tokio::sync::OnceCell;

use super::identity::CallerIdentity;
use crate::driver::{
    BookmarkManager, BookmarkSet, DatabaseDriver, DatabaseSession, EditionCapability,
    SessionConfig,
};
use crate::error::{ProxyError, Result};
use crate::routing::ExecutionRequirements;

/// Acquires correctly scoped sessions from the driver
pub struct SessionProvisioner {
    driver: Arc<dyn DatabaseDriver>,
    edition: Arc<dyn EditionCapability>,
    bookmarks: Arc<dyn BookmarkManager>,
    fetch_size: usize,
    impersonation: OnceCell<bool>,
}

impl SessionProvisioner {
    pub fn new(
        driver: Arc<dyn DatabaseDriver>,
        edition: Arc<dyn EditionCapability>,
        bookmarks: Arc<dyn BookmarkManager>,
        fetch_size: usize,
    ) -> Self {
        Self {
            driver,
            edition,
            bookmarks,
            fetch_size,
            impersonation: OnceCell::new(),
        }
    }

    pub fn bookmarks(&self) -> &Arc<dyn BookmarkManager> {
        &self.bookmarks
    }

    /// Whether the server edition supports impersonation
    ///
    /// Probed once; a failed probe is retried by the next caller.
    pub async fn supports_impersonation(&self) -> Result<bool> {
        self.impersonation
            .get_or_try_init(|| async {
                let supported = self
                    .edition
                    .supports_impersonation()
                    .await
                    .map_err(|source| ProxyError::SessionAcquisition { source })?;
                log::debug!("Server edition supports impersonation: {}", supported);
                Ok::<bool, ProxyError>(supported)
            })
            .await
            .copied()
    }

    /// Session configuration for a statement
    pub fn session_config(
        &self,
        identity: &CallerIdentity,
        requirements: &ExecutionRequirements,
        database: &str,
        impersonation_supported: bool,
    ) -> Result<SessionConfig> {
        let impersonated_user = if impersonation_supported {
            Some(identity.effective_user().to_string())
        } else if let Some(requested) = &identity.impersonated_user {
            return Err(ProxyError::SessionAcquisition {
                source: crate::driver::DriverError::ServiceUnavailable(format!(
                    "cannot impersonate '{}': server edition does not support impersonation",
                    requested
                )),
            });
        } else {
            None
        };

        Ok(SessionConfig::new(database)
            .with_access_mode(requirements.access_mode())
            .with_impersonated_user(impersonated_user)
            .with_bookmarks(self.bookmarks.current())
            .with_fetch_size(self.fetch_size))
    }

    /// Acquire a session for one statement
    pub async fn provision(
        &self,
        identity: &CallerIdentity,
        requirements: &ExecutionRequirements,
        database: &str,
    ) -> Result<ScopedSession> {
        let impersonation_supported = self.supports_impersonation().await?;
        let config = self.session_config(identity, requirements, database, impersonation_supported)?;

        log::debug!(
            "Opening {:?} session on '{}' for '{}'",
            config.default_access_mode,
            config.database,
            identity.username
        );

        let started_from = config.bookmarks.clone();
        let session = self
            .driver
            .open_session(config.clone())
            .await
            .map_err(|source| ProxyError::SessionAcquisition { source })?;

        Ok(ScopedSession::new(session, config, started_from))
    }
}

/// A session released on every exit path
///
/// Call [`ScopedSession::close`] on normal paths. A session dropped while
/// still open, e.g. because its consumer went away, is closed on the current
/// tokio runtime.
pub struct ScopedSession {
    session: Option<Box<dyn DatabaseSession>>,
    config: SessionConfig,
    started_from: BookmarkSet,
}

impl ScopedSession {
    pub fn new(
        session: Box<dyn DatabaseSession>,
        config: SessionConfig,
        started_from: BookmarkSet,
    ) -> Self {
        Self {
            session: Some(session),
            config,
            started_from,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Bookmarks the session was opened with
    pub fn started_from(&self) -> &BookmarkSet {
        &self.started_from
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Bookmarks produced by the session's last unit of work
    pub fn last_bookmarks(&self) -> BookmarkSet {
        self.session
            .as_ref()
            .map(|session| session.last_bookmarks())
            .unwrap_or_default()
    }

    /// The underlying session, if not yet closed
    pub fn session_mut(&mut self) -> Result<&mut (dyn DatabaseSession + 'static)> {
        self.session
            .as_deref_mut()
            .ok_or_else(|| ProxyError::Internal("session already closed".to_string()))
    }

    /// Release the session; closing twice is a no-op
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                log::warn!("Failed to close session on '{}': {}", self.config.database, e);
            } else {
                log::debug!("Closed session on '{}'", self.config.database);
            }
        }
    }

    /// Take the session out, leaving this guard closed
    pub(crate) fn take(&mut self) -> Option<Box<dyn DatabaseSession>> {
        self.session.take()
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            let database = self.config.database.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    log::warn!("Session on '{}' dropped while open, closing it", database);
                    handle.spawn(async move {
                        if let Err(e) = session.close().await {
                            log::warn!("Failed to close dropped session on '{}': {}", database, e);
                        }
                    });
                }
                Err(_) => {
                    log::warn!(
                        "Session on '{}' dropped outside a runtime, it cannot be closed",
                        database
                    );
                }
            }
        }
    }
}
