// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Batch orchestration
//!
//! Every statement of a batch gets its own session and runs as its own task.
//! Tasks overlap their I/O, bounded by a semaphore, and report back tagged
//! with their submission index. Outcomes are folded into the container by
//! index, so a failing statement never stops the rest of the batch and the
//! container always holds exactly one slot per statement.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use super::executor::StatementExecutor;
use super::result::{ResultContainer, StatementOutcome};
use crate::error::{ProxyError, Result};
use crate::routing::{resolve_statement, ExecutionRequirements};
use crate::session::{CallerIdentity, SessionProvisioner};
use crate::statement::Statement;

/// Runs the statements of one request and assembles their results in order
#[derive(Clone)]
pub struct BatchOrchestrator {
    provisioner: Arc<SessionProvisioner>,
    executor: StatementExecutor,
    max_in_flight: usize,
}

impl BatchOrchestrator {
    pub fn new(
        provisioner: Arc<SessionProvisioner>,
        executor: StatementExecutor,
        max_in_flight: usize,
    ) -> Self {
        Self {
            provisioner,
            executor,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Run every statement and return their ordered outcomes
    ///
    /// Fails as a whole only when the first statement is invalid or the
    /// server edition cannot be determined.
    pub async fn run_batch(
        &self,
        identity: &CallerIdentity,
        database: &str,
        statements: Vec<Statement>,
    ) -> Result<ResultContainer> {
        let request_id = Uuid::new_v4();
        let total = statements.len();
        if total == 0 {
            return Ok(ResultContainer::new());
        }

        log::debug!("[{}] Running batch of {} statement(s)", request_id, total);

        let mut slots: Vec<Option<StatementOutcome>> = (0..total).map(|_| None).collect();
        let mut normalized = Vec::with_capacity(total);
        for (index, statement) in statements.iter().enumerate() {
            match statement.normalized() {
                Ok(statement) => normalized.push(Some(statement)),
                Err(e) if index == 0 => return Err(e),
                Err(e) => {
                    slots[index] = Some(StatementOutcome::Failure(e));
                    normalized.push(None);
                }
            }
        }

        let enterprise = self.provisioner.supports_impersonation().await?;

        let mut work: Vec<(usize, Statement, ExecutionRequirements)> = Vec::with_capacity(total);
        for (index, statement) in normalized.into_iter().enumerate() {
            let Some(statement) = statement else { continue };
            match resolve_statement(&statement, enterprise) {
                Ok(requirements) => work.push((index, statement, requirements)),
                Err(e) if index == 0 => return Err(e),
                Err(e) => slots[index] = Some(StatementOutcome::Failure(e)),
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        for (index, statement, requirements) in work {
            let semaphore = semaphore.clone();
            let provisioner = self.provisioner.clone();
            let executor = self.executor.clone();
            let identity = identity.clone();
            let database = database.to_string();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            StatementOutcome::Failure(ProxyError::Internal(
                                "statement scheduler closed".to_string(),
                            )),
                        )
                    }
                };

                let outcome = match provisioner
                    .provision(&identity, &requirements, &database)
                    .await
                {
                    Ok(session) => executor.execute(session, &requirements, &statement).await,
                    Err(e) => StatementOutcome::Failure(e),
                };
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => log::warn!("[{}] Statement task did not complete: {}", request_id, e),
            }
        }

        let mut container = ResultContainer::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let outcome = slot.unwrap_or_else(|| {
                StatementOutcome::Failure(ProxyError::Internal(format!(
                    "statement {} did not complete",
                    index
                )))
            });
            if let StatementOutcome::Failure(error) = &outcome {
                log::warn!("[{}] Statement {} failed: {}", request_id, index, error);
            }
            container.push(index, outcome);
        }

        log::info!(
            "[{}] Batch completed: {} succeeded, {} failed",
            request_id,
            container.results().len(),
            container.errors().len()
        );

        Ok(container)
    }
}
