// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for GraphGate

use thiserror::Error;

use crate::driver::DriverError;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Main error type for query routing and execution
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Statement text is empty or cannot be routed; rejected before any I/O
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// A session could not be obtained from the database
    #[error("Session acquisition failed: {source}")]
    SessionAcquisition {
        #[source]
        source: DriverError,
    },

    /// The database rejected or failed the statement
    #[error("{code}: {message}")]
    DatabaseExecution { code: String, message: String },

    /// The row stream broke before it was exhausted
    #[error("Result stream terminated after {rows_received} row(s): {source}")]
    StreamTermination {
        rows_received: usize,
        #[source]
        source: DriverError,
    },

    /// Invalid proxy configuration or capability setup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A statement task panicked or was aborted
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Wire code reported to clients alongside the message
    pub fn code(&self) -> &str {
        match self {
            ProxyError::InvalidStatement(_) => "GraphGate.ClientError.Statement.Invalid",
            ProxyError::SessionAcquisition { .. } => {
                "GraphGate.TransientError.Session.AcquisitionFailed"
            }
            ProxyError::DatabaseExecution { code, .. } => code,
            ProxyError::StreamTermination { .. } => "GraphGate.TransientError.Stream.Terminated",
            ProxyError::Configuration(_) => "GraphGate.DatabaseError.Configuration",
            ProxyError::Internal(_) => "GraphGate.DatabaseError.Internal",
        }
    }

    /// Message without the code prefix
    pub fn message(&self) -> String {
        match self {
            ProxyError::DatabaseExecution { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the caller caused this error (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        match self {
            ProxyError::InvalidStatement(_) => true,
            ProxyError::DatabaseExecution { code, .. } => code.contains(".ClientError."),
            _ => false,
        }
    }

    /// Map a failure that happened while running, consuming or committing a statement
    pub(crate) fn from_execution(error: DriverError) -> Self {
        match error {
            DriverError::Database { code, message } => {
                ProxyError::DatabaseExecution { code, message }
            }
            other => ProxyError::DatabaseExecution {
                code: "GraphGate.DatabaseError.Driver".to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Map a failure that happened while pulling rows
    pub(crate) fn from_pull(error: DriverError, rows_received: usize) -> Self {
        match error {
            DriverError::Database { code, message } => {
                ProxyError::DatabaseExecution { code, message }
            }
            other => ProxyError::StreamTermination {
                rows_received,
                source: other,
            },
        }
    }
}
