// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Single statement execution
//!
//! A statement moves through `Routed -> Streaming -> Succeeded | Failed`.
//! Implicit statements run in autocommit on the session; explicit statements
//! run inside a transaction opened with the routed access mode, committed once
//! the result is exhausted and rolled back on any error. The session is
//! released whichever terminal state is reached.

use std::sync::Arc;

use super::fetch::FetchWindow;
use super::result::{Record, ResultSummary, StatementOutcome, StatementResult};
use crate::driver::{BookmarkManager, DriverError, ManagedTransaction, RowCursor};
use crate::error::{ProxyError, Result};
use crate::routing::{ExecutionRequirements, TransactionMode};
use crate::session::ScopedSession;
use crate::statement::Statement;

/// Lifecycle state of a statement execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Routed,
    Streaming,
    Succeeded,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Succeeded | ExecutionState::Failed)
    }
}

/// Runs statements on provisioned sessions
#[derive(Clone)]
pub struct StatementExecutor {
    fetch_size: usize,
    bookmarks: Arc<dyn BookmarkManager>,
}

impl StatementExecutor {
    pub fn new(fetch_size: usize, bookmarks: Arc<dyn BookmarkManager>) -> Self {
        Self {
            fetch_size,
            bookmarks,
        }
    }

    pub fn fetch_size(&self) -> usize {
        self.fetch_size
    }

    /// Start a statement and return its lazily pulled execution
    pub async fn start(
        &self,
        mut session: ScopedSession,
        requirements: &ExecutionRequirements,
        statement: &Statement,
    ) -> Result<StatementExecution> {
        let opened = match requirements.transaction_mode {
            TransactionMode::Implicit => session
                .session_mut()?
                .run(statement)
                .await
                .map(|cursor| (None, cursor)),
            TransactionMode::Explicit => {
                match session
                    .session_mut()?
                    .begin_transaction(requirements.access_mode())
                    .await
                {
                    Ok(mut transaction) => match transaction.run(statement).await {
                        Ok(cursor) => Ok((Some(transaction), cursor)),
                        Err(e) => {
                            rollback(transaction).await;
                            Err(e)
                        }
                    },
                    Err(e) => Err(e),
                }
            }
        };

        match opened {
            Ok((transaction, cursor)) => {
                log::debug!(
                    "Started {:?} statement on '{}'",
                    requirements.transaction_mode,
                    session.config().database
                );
                let keys: Arc<[String]> = cursor.keys().into();
                Ok(StatementExecution {
                    session,
                    transaction,
                    cursor,
                    keys,
                    window: FetchWindow::new(self.fetch_size),
                    state: ExecutionState::Routed,
                    bookmarks: self.bookmarks.clone(),
                    rows_received: 0,
                    summary: None,
                })
            }
            Err(e) => {
                session.close().await;
                Err(ProxyError::from_execution(e))
            }
        }
    }

    /// Run a statement to completion, collecting its rows
    pub async fn execute(
        &self,
        session: ScopedSession,
        requirements: &ExecutionRequirements,
        statement: &Statement,
    ) -> StatementOutcome {
        let mut execution = match self.start(session, requirements, statement).await {
            Ok(execution) => execution,
            Err(e) => return StatementOutcome::Failure(e),
        };

        let mut rows = Vec::new();
        loop {
            match execution.next_record().await {
                Ok(Some(record)) => rows.push(record),
                Ok(None) => break,
                Err(e) => return StatementOutcome::Failure(e),
            }
        }

        let summary = execution.take_summary().unwrap_or_default();
        let result = StatementResult {
            index: 0,
            columns: execution.keys().to_vec(),
            rows,
            stats: statement.include_stats.then(|| summary.counters.clone()),
            result_data_contents: statement.result_data_contents.clone(),
        };

        StatementOutcome::Success { result, summary }
    }
}

/// A started statement whose rows are pulled on demand
pub struct StatementExecution {
    session: ScopedSession,
    transaction: Option<Box<dyn ManagedTransaction>>,
    cursor: Box<dyn RowCursor>,
    keys: Arc<[String]>,
    window: FetchWindow,
    state: ExecutionState,
    bookmarks: Arc<dyn BookmarkManager>,
    rows_received: usize,
    summary: Option<ResultSummary>,
}

impl StatementExecution {
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Column names of the result
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn rows_received(&self) -> usize {
        self.rows_received
    }

    /// Summary of the exhausted result, once succeeded
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    pub fn take_summary(&mut self) -> Option<ResultSummary> {
        self.summary.take()
    }

    /// Next row of the result
    ///
    /// Returns `Ok(None)` exactly once the result is exhausted and committed.
    /// After a failure the execution stays failed.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        match self.state {
            ExecutionState::Succeeded => return Ok(None),
            ExecutionState::Failed => {
                return Err(ProxyError::StreamTermination {
                    rows_received: self.rows_received,
                    source: DriverError::ResultConsumed(
                        "statement execution already failed".to_string(),
                    ),
                })
            }
            ExecutionState::Routed => self.state = ExecutionState::Streaming,
            ExecutionState::Streaming => {}
        }

        match self.window.next(self.cursor.as_mut()).await {
            Ok(Some(record)) => {
                self.rows_received += 1;
                Ok(Some(record))
            }
            Ok(None) => {
                self.finish().await?;
                Ok(None)
            }
            Err(e) => {
                let error = ProxyError::from_pull(e, self.rows_received);
                self.fail(&error).await;
                Err(error)
            }
        }
    }

    /// Consume the summary, commit and release the session
    async fn finish(&mut self) -> Result<()> {
        let summary = match self.cursor.consume().await {
            Ok(summary) => summary,
            Err(e) => {
                let error = ProxyError::from_execution(e);
                self.fail(&error).await;
                return Err(error);
            }
        };

        if let Some(transaction) = self.transaction.take() {
            if let Err(e) = transaction.commit().await {
                let error = ProxyError::from_execution(e);
                self.fail(&error).await;
                return Err(error);
            }
        }

        let fresh = self.session.last_bookmarks();
        self.bookmarks.merge(self.session.started_from(), fresh);
        self.session.close().await;

        log::debug!("Statement succeeded after {} row(s)", self.rows_received);
        self.summary = Some(summary);
        self.state = ExecutionState::Succeeded;
        Ok(())
    }

    async fn fail(&mut self, error: &ProxyError) {
        log::debug!(
            "Statement failed after {} row(s): {}",
            self.rows_received,
            error
        );
        if let Some(transaction) = self.transaction.take() {
            rollback(transaction).await;
        }
        self.session.close().await;
        self.state = ExecutionState::Failed;
    }
}

impl Drop for StatementExecution {
    fn drop(&mut self) {
        let transaction = self.transaction.take();
        let session = self.session.take();
        if transaction.is_none() && session.is_none() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::debug!(
                    "Statement dropped after {} row(s), releasing its session",
                    self.rows_received
                );
                handle.spawn(async move {
                    if let Some(transaction) = transaction {
                        rollback(transaction).await;
                    }
                    if let Some(mut session) = session {
                        if let Err(e) = session.close().await {
                            log::warn!("Failed to close abandoned session: {}", e);
                        }
                    }
                });
            }
            Err(_) => {
                log::warn!("Statement dropped outside a runtime, its session cannot be closed");
            }
        }
    }
}

async fn rollback(transaction: Box<dyn ManagedTransaction>) {
    if let Err(e) = transaction.rollback().await {
        log::warn!("Failed to roll back transaction: {}", e);
    }
}
