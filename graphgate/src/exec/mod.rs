// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement execution
//!
//! This module provides:
//! - Result types and the ordered result container
//! - Bounded prefetching of result rows
//! - Single statement execution in autocommit or managed transactions
//! - Lazy record streams and ordered batch orchestration

pub mod batch;
pub mod executor;
pub mod fetch;
pub mod result;
pub mod stream;

pub use batch::BatchOrchestrator;
pub use executor::{ExecutionState, StatementExecution, StatementExecutor};
pub use fetch::FetchWindow;
pub use result::{
    InputPosition, Notification, Record, ResultContainer, ResultSummary, StatementFailure,
    StatementOutcome, StatementResult, SummaryCounters,
};
pub use stream::RecordStream;
