// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution-requirement resolution
//!
//! Decides, without any I/O, where and how a statement runs:
//! - Target role: read replicas for statements recognized as read-only,
//!   writers for everything else
//! - Transaction mode: autocommit, or an explicit managed transaction for
//!   transaction-control statements and caller-flagged statements

pub mod classifier;
pub mod requirements;

pub use classifier::{classify, StatementInfo, StatementKind};
pub use requirements::{
    resolve, resolve_statement, ExecutionRequirements, Target, TransactionMode,
};
