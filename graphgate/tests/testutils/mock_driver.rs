// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scripted in-memory driver recording every interaction

use async_trait::async_trait;
use graphgate::{
    AccessMode, BookmarkSet, DatabaseDriver, DatabaseSession, DriverError, EditionCapability,
    ManagedTransaction, Notification, Record, ResultSummary, RowBatch, RowCursor, SessionConfig,
    Statement, SummaryCounters,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Behavior of the driver for one statement text
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub run_error: Option<DriverError>,
    pub pull_error_after: Option<(usize, DriverError)>,
    pub commit_error: Option<DriverError>,
    pub counters: SummaryCounters,
    pub notifications: Vec<Notification>,
    pub delay: Option<Duration>,
    pub bookmark: Option<String>,
}

impl Script {
    pub fn rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            ..Self::default()
        }
    }

    /// Single column `i` holding 0..count
    pub fn counting(count: usize) -> Self {
        Self::rows(&["i"], (0..count).map(|i| vec![Value::from(i)]).collect())
    }

    pub fn failing(code: &str, message: &str) -> Self {
        Self {
            run_error: Some(DriverError::Database {
                code: code.to_string(),
                message: message.to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn failing_after(mut self, rows: usize, error: DriverError) -> Self {
        self.pull_error_after = Some((rows, error));
        self
    }

    pub fn failing_commit(mut self, error: DriverError) -> Self {
        self.commit_error = Some(error);
        self
    }

    pub fn with_counters(mut self, counters: SummaryCounters) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_notification(mut self, code: &str) -> Self {
        self.notifications.push(notification(code));
        self
    }

    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    pub fn with_bookmark(mut self, bookmark: &str) -> Self {
        self.bookmark = Some(bookmark.to_string());
        self
    }
}

pub fn notification(code: &str) -> Notification {
    Notification {
        code: code.to_string(),
        title: format!("{} title", code),
        description: format!("{} description", code),
        severity: "WARNING".to_string(),
        position: None,
    }
}

/// Something the proxy asked the driver to do
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SessionOpened(SessionConfig),
    Run { text: String, in_transaction: bool },
    Begin(AccessMode),
    Commit,
    Rollback,
    Pull(usize),
    Consume { text: String },
    SessionClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub session: usize,
    pub event: Event,
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<HashMap<String, Script>>,
    events: Mutex<Vec<Recorded>>,
    fail_open: Mutex<Option<(AccessMode, DriverError)>>,
    next_session: AtomicUsize,
    active_sessions: AtomicUsize,
    max_active_sessions: AtomicUsize,
}

impl MockState {
    fn record(&self, session: usize, event: Event) {
        self.events.lock().push(Recorded { session, event });
    }

    fn script(&self, text: &str) -> Script {
        self.scripts.lock().get(text).cloned().unwrap_or_default()
    }
}

/// Driver whose statements follow registered scripts
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the statement with the given (trimmed) text
    pub fn script(&self, text: &str, script: Script) -> &Self {
        self.state.scripts.lock().insert(text.to_string(), script);
        self
    }

    /// Refuse sessions opened with the given access mode
    pub fn fail_open_for(&self, mode: AccessMode, error: DriverError) {
        *self.state.fail_open.lock() = Some((mode, error));
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.state.events.lock().clone()
    }

    pub fn events_for_session(&self, session: usize) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|recorded| recorded.session == session)
            .map(|recorded| recorded.event)
            .collect()
    }

    /// Session that ran the statement with the given text
    pub fn session_for(&self, text: &str) -> Option<usize> {
        self.events().into_iter().find_map(|recorded| match recorded.event {
            Event::Run { text: ran, .. } if ran == text => Some(recorded.session),
            _ => None,
        })
    }

    /// Configuration of the session that ran the given statement
    pub fn config_for(&self, text: &str) -> Option<SessionConfig> {
        let session = self.session_for(text)?;
        self.events_for_session(session)
            .into_iter()
            .find_map(|event| match event {
                Event::SessionOpened(config) => Some(config),
                _ => None,
            })
    }

    pub fn opened_sessions(&self) -> Vec<SessionConfig> {
        self.events()
            .into_iter()
            .filter_map(|recorded| match recorded.event {
                Event::SessionOpened(config) => Some(config),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events()
            .iter()
            .filter(|recorded| predicate(&recorded.event))
            .count()
    }

    pub fn pulls(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|recorded| match recorded.event {
                Event::Pull(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Statement texts in the order their results were consumed
    pub fn consumed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|recorded| match recorded.event {
                Event::Consume { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Sessions opened but not yet closed
    pub fn open_sessions(&self) -> usize {
        self.state.active_sessions.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_sessions(&self) -> usize {
        self.state.max_active_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    async fn open_session(
        &self,
        config: SessionConfig,
    ) -> Result<Box<dyn DatabaseSession>, DriverError> {
        if let Some((mode, error)) = self.state.fail_open.lock().clone() {
            if mode == config.default_access_mode {
                return Err(error);
            }
        }

        let id = self.state.next_session.fetch_add(1, Ordering::SeqCst);
        let active = self.state.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_active_sessions
            .fetch_max(active, Ordering::SeqCst);
        self.state.record(id, Event::SessionOpened(config.clone()));

        Ok(Box::new(MockSession {
            id,
            state: self.state.clone(),
            last_bookmarks: Arc::new(Mutex::new(config.bookmarks.clone())),
            closed: false,
        }))
    }
}

struct MockSession {
    id: usize,
    state: Arc<MockState>,
    last_bookmarks: Arc<Mutex<BookmarkSet>>,
    closed: bool,
}

async fn open_cursor(
    session: usize,
    state: &Arc<MockState>,
    last_bookmarks: &Arc<Mutex<BookmarkSet>>,
    statement: &Statement,
    in_transaction: bool,
) -> Result<(MockCursor, Script), DriverError> {
    state.record(
        session,
        Event::Run {
            text: statement.text.clone(),
            in_transaction,
        },
    );

    let script = state.script(&statement.text);
    if let Some(delay) = script.delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(error) = &script.run_error {
        return Err(error.clone());
    }

    let keys: Arc<[String]> = script.columns.clone().into();
    let cursor = MockCursor {
        session,
        state: state.clone(),
        text: statement.text.clone(),
        rows: script
            .rows
            .iter()
            .map(|values| Record::new(keys.clone(), values.clone()))
            .collect(),
        keys,
        delivered: 0,
        pull_error_after: script.pull_error_after.clone(),
        summary: ResultSummary {
            counters: script.counters.clone(),
            notifications: script.notifications.clone(),
        },
        bookmark: script.bookmark.clone(),
        last_bookmarks: last_bookmarks.clone(),
    };
    Ok((cursor, script))
}

#[async_trait]
impl DatabaseSession for MockSession {
    async fn run(&mut self, statement: &Statement) -> Result<Box<dyn RowCursor>, DriverError> {
        let (cursor, _) =
            open_cursor(self.id, &self.state, &self.last_bookmarks, statement, false).await?;
        Ok(Box::new(cursor))
    }

    async fn begin_transaction(
        &mut self,
        mode: AccessMode,
    ) -> Result<Box<dyn ManagedTransaction>, DriverError> {
        self.state.record(self.id, Event::Begin(mode));
        Ok(Box::new(MockTransaction {
            session: self.id,
            state: self.state.clone(),
            last_bookmarks: self.last_bookmarks.clone(),
            commit_error: None,
        }))
    }

    fn last_bookmarks(&self) -> BookmarkSet {
        self.last_bookmarks.lock().clone()
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.state.active_sessions.fetch_sub(1, Ordering::SeqCst);
            self.state.record(self.id, Event::SessionClosed);
        }
        Ok(())
    }
}

struct MockTransaction {
    session: usize,
    state: Arc<MockState>,
    last_bookmarks: Arc<Mutex<BookmarkSet>>,
    commit_error: Option<DriverError>,
}

#[async_trait]
impl ManagedTransaction for MockTransaction {
    async fn run(&mut self, statement: &Statement) -> Result<Box<dyn RowCursor>, DriverError> {
        let (cursor, script) =
            open_cursor(self.session, &self.state, &self.last_bookmarks, statement, true).await?;
        self.commit_error = script.commit_error;
        Ok(Box::new(cursor))
    }

    async fn commit(self: Box<Self>) -> Result<(), DriverError> {
        self.state.record(self.session, Event::Commit);
        match self.commit_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn rollback(self: Box<Self>) -> Result<(), DriverError> {
        self.state.record(self.session, Event::Rollback);
        Ok(())
    }
}

struct MockCursor {
    session: usize,
    state: Arc<MockState>,
    text: String,
    keys: Arc<[String]>,
    rows: VecDeque<Record>,
    delivered: usize,
    pull_error_after: Option<(usize, DriverError)>,
    summary: ResultSummary,
    bookmark: Option<String>,
    last_bookmarks: Arc<Mutex<BookmarkSet>>,
}

#[async_trait]
impl RowCursor for MockCursor {
    fn keys(&self) -> Vec<String> {
        self.keys.to_vec()
    }

    async fn pull(&mut self, n: usize) -> Result<RowBatch, DriverError> {
        self.state.record(self.session, Event::Pull(n));

        let mut limit = n;
        if let Some((after, error)) = &self.pull_error_after {
            if self.delivered >= *after || self.rows.is_empty() {
                return Err(error.clone());
            }
            limit = limit.min(after - self.delivered);
        }

        let take = limit.min(self.rows.len());
        let records: Vec<Record> = self.rows.drain(..take).collect();
        self.delivered += records.len();

        Ok(RowBatch {
            records,
            has_more: !self.rows.is_empty() || self.pull_error_after.is_some(),
        })
    }

    async fn consume(&mut self) -> Result<ResultSummary, DriverError> {
        self.state.record(
            self.session,
            Event::Consume {
                text: self.text.clone(),
            },
        );
        self.rows.clear();
        if let Some(bookmark) = self.bookmark.take() {
            *self.last_bookmarks.lock() = std::iter::once(bookmark).collect();
        }
        Ok(self.summary.clone())
    }
}

/// Edition capability with a fixed answer
pub struct MockEdition {
    supports_impersonation: bool,
    fail: bool,
    probes: AtomicUsize,
}

impl MockEdition {
    pub fn enterprise() -> Self {
        Self {
            supports_impersonation: true,
            fail: false,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn community() -> Self {
        Self {
            supports_impersonation: false,
            fail: false,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            supports_impersonation: false,
            fail: true,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EditionCapability for MockEdition {
    async fn supports_impersonation(&self) -> Result<bool, DriverError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DriverError::ServiceUnavailable(
                "no routing servers available".to_string(),
            ));
        }
        Ok(self.supports_impersonation)
    }
}
