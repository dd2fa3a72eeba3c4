// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution requirements derived from a statement

use serde::Serialize;

use super::classifier::{classify, StatementKind};
use crate::driver::AccessMode;
use crate::error::{ProxyError, Result};
use crate::statement::{normalize_text, Statement};

/// Cluster role a statement is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
    Readers,
    Writers,
}

/// Transaction contract a statement runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionMode {
    /// Autocommit: one statement, one round trip
    Implicit,
    /// Managed transaction with commit on success and rollback on failure
    Explicit,
}

/// How a single statement must be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequirements {
    pub target: Target,
    pub transaction_mode: TransactionMode,
}

impl ExecutionRequirements {
    pub fn new(target: Target, transaction_mode: TransactionMode) -> Self {
        Self {
            target,
            transaction_mode,
        }
    }

    /// Session and transaction access mode for the target role
    pub fn access_mode(&self) -> AccessMode {
        match self.target {
            Target::Readers => AccessMode::Read,
            Target::Writers => AccessMode::Write,
        }
    }
}

/// Resolve the requirements of raw statement text
///
/// Pure and deterministic. Anything not recognized as read-only goes to the
/// writers. Blank text is rejected before any I/O happens.
pub fn resolve(statement_text: &str, is_enterprise_capable: bool) -> Result<ExecutionRequirements> {
    let text = normalize_text(statement_text)?;
    let info = classify(text, is_enterprise_capable);

    let target = if info.is_read_only {
        Target::Readers
    } else {
        Target::Writers
    };

    let transaction_mode = match info.kind {
        StatementKind::TransactionControl => TransactionMode::Explicit,
        _ => TransactionMode::Implicit,
    };

    log::debug!(
        "Resolved {:?} statement to {:?}/{:?}",
        info.kind,
        target,
        transaction_mode
    );

    Ok(ExecutionRequirements::new(target, transaction_mode))
}

/// Resolve a statement, honoring the caller's explicit transaction flag
pub fn resolve_statement(
    statement: &Statement,
    is_enterprise_capable: bool,
) -> Result<ExecutionRequirements> {
    let mut requirements = resolve(&statement.text, is_enterprise_capable)?;

    if statement.explicit_transaction {
        if classify(statement.text.trim(), is_enterprise_capable).kind
            == StatementKind::BatchedWrite
        {
            return Err(ProxyError::InvalidStatement(
                "statements committing in inner transactions can only run in autocommit mode"
                    .to_string(),
            ));
        }
        requirements.transaction_mode = TransactionMode::Explicit;
    }

    Ok(requirements)
}
