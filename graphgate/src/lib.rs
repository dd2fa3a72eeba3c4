// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphGate - query routing and execution core of a graph database HTTP proxy
//!
//! GraphGate sits between an HTTP front end and a clustered graph database
//! driver. For every submitted statement it decides where and how to run it,
//! acquires a correctly scoped session and executes the statement.
//!
//! # Features
//!
//! - **Read/Write Routing**: Statements recognized as read-only go to read
//!   replicas, everything else to writers
//! - **Transaction Contracts**: Autocommit or managed transactions with commit
//!   on success and rollback on failure
//! - **Bounded Streaming**: Rows are pulled in windows of the configured fetch
//!   size, never buffering whole results
//! - **Ordered Batches**: Statements of one request overlap their I/O, results
//!   come back in submission order, and one failing statement does not stop
//!   the others
//! - **Causal Consistency**: Bookmarks produced by completed statements are
//!   carried into later sessions
//!
//! # Usage
//!
//! The HTTP layer builds a [`QueryCoordinator`] over a driver implementing
//! [`DatabaseDriver`] and calls [`QueryCoordinator::stream`] for streaming
//! responses or [`QueryCoordinator::run`] for batches.

pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod exec;
pub mod logging;
pub mod routing;
pub mod session;
pub mod statement;

// Re-export the public API - QueryCoordinator is the entry point
pub use config::ProxyConfig;
pub use coordinator::QueryCoordinator;
pub use driver::{
    AccessMode, BookmarkManager, BookmarkSet, DatabaseDriver, DatabaseSession, DriverError,
    EditionCapability, InMemoryBookmarkManager, ManagedTransaction, RowBatch, RowCursor,
    SessionConfig,
};
pub use error::{ProxyError, Result};
pub use exec::{
    Notification, Record, RecordStream, ResultContainer, ResultSummary, StatementFailure,
    StatementResult, SummaryCounters,
};
pub use logging::LogLevel;
pub use routing::{ExecutionRequirements, StatementInfo, StatementKind, Target, TransactionMode};
pub use session::CallerIdentity;
pub use statement::{ResultDataContent, Statement};

/// GraphGate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GraphGate crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
