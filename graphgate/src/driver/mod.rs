// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Database driver capability
//!
//! GraphGate does not speak the database wire protocol itself. This module
//! defines the capabilities it consumes from a driver:
//! - Opening sessions with a routing access mode, impersonation and bookmarks
//! - Running a statement in autocommit or inside a managed transaction
//! - Pulling rows in bounded batches and consuming the terminal summary
//! - Probing the server edition for impersonation support
//!
//! The causal bookmark state shared between requests lives in [`bookmarks`].

pub mod bookmarks;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exec::result::{Record, ResultSummary};
use crate::statement::Statement;

pub use bookmarks::{BookmarkManager, BookmarkSet, InMemoryBookmarkManager};

/// Errors reported by the driver capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Connectivity or routing failure
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The database reported an error with a status code
    #[error("{code}: {message}")]
    Database { code: String, message: String },

    /// The result was already consumed or its session was closed
    #[error("Result consumed: {0}")]
    ResultConsumed(String),

    /// The driver broke its own contract
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

/// Routing access mode of a session or transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

/// Configuration for opening a database session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Target database name
    pub database: String,
    /// Default access mode, decides which cluster role serves the session
    pub default_access_mode: AccessMode,
    /// User whose permissions the session runs under, if impersonating
    pub impersonated_user: Option<String>,
    /// Bookmarks the session must observe before running anything
    pub bookmarks: BookmarkSet,
    /// Rows per pull request
    pub fetch_size: usize,
}

impl SessionConfig {
    /// Create a write session configuration for the given database
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            default_access_mode: AccessMode::Write,
            impersonated_user: None,
            bookmarks: BookmarkSet::default(),
            fetch_size: crate::config::DEFAULT_FETCH_SIZE,
        }
    }

    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.default_access_mode = mode;
        self
    }

    pub fn with_impersonated_user(mut self, user: Option<String>) -> Self {
        self.impersonated_user = user;
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: BookmarkSet) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size;
        self
    }
}

/// One batch of rows returned by a pull request
#[derive(Debug, Clone, Default)]
pub struct RowBatch {
    pub records: Vec<Record>,
    /// False once the server has no more rows for this result
    pub has_more: bool,
}

/// Entry point of the driver: opens sessions
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    async fn open_session(
        &self,
        config: SessionConfig,
    ) -> Result<Box<dyn DatabaseSession>, DriverError>;
}

/// Server edition capability
#[async_trait]
pub trait EditionCapability: Send + Sync {
    /// Whether sessions may impersonate another user
    async fn supports_impersonation(&self) -> Result<bool, DriverError>;
}

/// An open database session
#[async_trait]
pub trait DatabaseSession: Send {
    /// Run a statement in an autocommit transaction
    async fn run(&mut self, statement: &Statement) -> Result<Box<dyn RowCursor>, DriverError>;

    /// Open a transaction with the given access mode
    async fn begin_transaction(
        &mut self,
        mode: AccessMode,
    ) -> Result<Box<dyn ManagedTransaction>, DriverError>;

    /// Bookmarks produced by the last completed unit of work
    fn last_bookmarks(&self) -> BookmarkSet;

    /// Release the session and its connection
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// A transaction opened on a session
#[async_trait]
pub trait ManagedTransaction: Send {
    async fn run(&mut self, statement: &Statement) -> Result<Box<dyn RowCursor>, DriverError>;

    async fn commit(self: Box<Self>) -> Result<(), DriverError>;

    async fn rollback(self: Box<Self>) -> Result<(), DriverError>;
}

/// Lazily pulled result of a single statement
#[async_trait]
pub trait RowCursor: Send {
    /// Column names of the result
    fn keys(&self) -> Vec<String>;

    /// Request at most `n` more rows
    async fn pull(&mut self, n: usize) -> Result<RowBatch, DriverError>;

    /// Discard remaining rows and return the terminal summary
    async fn consume(&mut self) -> Result<ResultSummary, DriverError>;
}
