// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query Coordinator - entry point of the execution core
//!
//! Wires the requirement resolver, session provisioner, statement executor
//! and batch orchestrator behind the two operations the HTTP layer calls:
//! streaming a single statement and running a batch.

use futures::FutureExt;
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::driver::{BookmarkManager, DatabaseDriver, EditionCapability};
use crate::error::Result;
use crate::exec::stream::lazy_record_stream;
use crate::exec::{BatchOrchestrator, RecordStream, ResultContainer, StatementExecutor};
use crate::routing::{classify, resolve_statement, StatementInfo};
use crate::session::{CallerIdentity, SessionProvisioner};
use crate::statement::{normalize_text, Statement};

/// Query Coordinator - orchestrates routing and execution of statements
///
/// This is the main entry point of GraphGate. It handles:
/// - Statement validation and read/write routing
/// - Session provisioning with impersonation and bookmarks
/// - Lazy streaming of single statements
/// - Ordered, failure-tolerant execution of batches
pub struct QueryCoordinator {
    config: ProxyConfig,
    provisioner: Arc<SessionProvisioner>,
    executor: StatementExecutor,
    orchestrator: BatchOrchestrator,
}

impl QueryCoordinator {
    /// Create a coordinator over the given driver capabilities
    ///
    /// # Arguments
    /// * `config` - Validated before use
    /// * `driver` - Opens database sessions
    /// * `edition` - Reports whether the server supports impersonation
    /// * `bookmarks` - Process-wide causal bookmark state
    ///
    /// # Example
    /// ```no_run
    /// use graphgate::{CallerIdentity, InMemoryBookmarkManager, ProxyConfig, QueryCoordinator, Statement};
    /// # async fn demo(driver: std::sync::Arc<dyn graphgate::DatabaseDriver>, edition: std::sync::Arc<dyn graphgate::EditionCapability>) -> graphgate::Result<()> {
    /// let coordinator = QueryCoordinator::new(
    ///     ProxyConfig::default(),
    ///     driver,
    ///     edition,
    ///     std::sync::Arc::new(InMemoryBookmarkManager::new()),
    /// )?;
    ///
    /// let results = coordinator
    ///     .run(&CallerIdentity::new("neo4j"), None, Statement::new("MATCH (n) RETURN n"), vec![])
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        config: ProxyConfig,
        driver: Arc<dyn DatabaseDriver>,
        edition: Arc<dyn EditionCapability>,
        bookmarks: Arc<dyn BookmarkManager>,
    ) -> Result<Self> {
        config.validate()?;

        let provisioner = Arc::new(SessionProvisioner::new(
            driver,
            edition,
            bookmarks.clone(),
            config.fetch_size,
        ));
        let executor = StatementExecutor::new(config.fetch_size, bookmarks);
        let orchestrator = BatchOrchestrator::new(
            provisioner.clone(),
            executor.clone(),
            config.max_in_flight_statements,
        );

        Ok(Self {
            config,
            provisioner,
            executor,
            orchestrator,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Stream the rows of a single statement
    ///
    /// The statement is validated and routed before this returns, so a blank
    /// statement fails without touching the database. The session is only
    /// acquired once the stream is first polled, and is released when the
    /// stream ends, fails or is dropped.
    pub async fn stream(
        &self,
        identity: &CallerIdentity,
        database: Option<&str>,
        statement: Statement,
    ) -> Result<RecordStream> {
        let statement = statement.normalized()?;
        let enterprise = self.provisioner.supports_impersonation().await?;
        let requirements = resolve_statement(&statement, enterprise)?;
        let database = self.database_name(database);

        log::debug!(
            "Streaming statement on '{}' as {:?}/{:?}",
            database,
            requirements.target,
            requirements.transaction_mode
        );

        let provisioner = self.provisioner.clone();
        let executor = self.executor.clone();
        let identity = identity.clone();

        Ok(lazy_record_stream(
            async move {
                let session = provisioner
                    .provision(&identity, &requirements, &database)
                    .await?;
                executor.start(session, &requirements, &statement).await
            }
            .boxed(),
        ))
    }

    /// Run one or more statements and collect their results in order
    ///
    /// # Returns
    /// * `Ok(ResultContainer)` - One slot per statement, results or errors
    /// * `Err(ProxyError)` - The first statement is invalid or the server
    ///   edition could not be determined
    pub async fn run(
        &self,
        identity: &CallerIdentity,
        database: Option<&str>,
        statement: Statement,
        additional_statements: Vec<Statement>,
    ) -> Result<ResultContainer> {
        let mut statements = Vec::with_capacity(additional_statements.len() + 1);
        statements.push(statement);
        statements.extend(additional_statements);
        self.run_all(identity, database, statements).await
    }

    /// Run a batch of statements; an empty batch yields an empty container
    pub async fn run_all(
        &self,
        identity: &CallerIdentity,
        database: Option<&str>,
        statements: Vec<Statement>,
    ) -> Result<ResultContainer> {
        let database = self.database_name(database);
        self.orchestrator
            .run_batch(identity, &database, statements)
            .await
    }

    /// Classify a statement without executing it
    pub async fn analyze(&self, text: &str) -> Result<StatementInfo> {
        let text = normalize_text(text)?;
        let enterprise = self.provisioner.supports_impersonation().await?;
        Ok(classify(text, enterprise))
    }

    fn database_name(&self, database: Option<&str>) -> String {
        database
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.config.default_database.as_str())
            .to_string()
    }
}
