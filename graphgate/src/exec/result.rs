// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result types for statement execution

use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::statement::ResultDataContent;

/// One row of a statement's result
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(keys: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of the named column
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|index| self.values.get(index))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

/// Update counters reported in a statement's summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounters {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
    pub indexes_added: u64,
    pub indexes_removed: u64,
    pub constraints_added: u64,
    pub constraints_removed: u64,
    pub system_updates: u64,
}

impl SummaryCounters {
    /// Whether the statement changed graph data or schema
    pub fn contains_updates(&self) -> bool {
        self.nodes_created
            + self.nodes_deleted
            + self.relationships_created
            + self.relationships_deleted
            + self.properties_set
            + self.labels_added
            + self.labels_removed
            + self.indexes_added
            + self.indexes_removed
            + self.constraints_added
            + self.constraints_removed
            > 0
    }

    pub fn contains_system_updates(&self) -> bool {
        self.system_updates > 0
    }
}

/// Position in the statement text a notification refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputPosition {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// Warning or hint attached to a statement summary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub code: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<InputPosition>,
}

/// Terminal summary of an exhausted result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSummary {
    pub counters: SummaryCounters,
    pub notifications: Vec<Notification>,
}

/// Eagerly collected result of one statement in a batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResult {
    /// Position of the statement in the submitted batch
    pub index: usize,
    pub columns: Vec<String>,
    #[serde(rename = "data")]
    pub rows: Vec<Record>,
    /// Counters, present only when the statement asked for stats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SummaryCounters>,
    /// Renderings requested by the statement, e.g. `["row", "graph"]`
    pub result_data_contents: Vec<ResultDataContent>,
}

/// Terminal outcome of one statement
#[derive(Debug)]
pub enum StatementOutcome {
    Success {
        result: StatementResult,
        summary: ResultSummary,
    },
    Failure(ProxyError),
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StatementOutcome::Success { .. })
    }
}

/// A statement of the batch that failed
#[derive(Debug)]
pub struct StatementFailure {
    /// Position of the statement in the submitted batch
    pub index: usize,
    pub error: ProxyError,
}

impl Serialize for StatementFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StatementFailure", 3)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("code", self.error.code())?;
        state.serialize_field("message", &self.error.message())?;
        state.end()
    }
}

/// Ordered results of a batch
///
/// Filled in submission order while a batch runs; treat as read-only once
/// returned. Every submitted statement occupies exactly one slot, either in
/// `results` or in `errors`.
#[derive(Debug, Default, Serialize)]
pub struct ResultContainer {
    results: Vec<StatementResult>,
    notifications: Vec<Notification>,
    errors: Vec<StatementFailure>,
}

impl ResultContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of the statement submitted at `index`
    pub(crate) fn push(&mut self, index: usize, outcome: StatementOutcome) {
        match outcome {
            StatementOutcome::Success {
                mut result,
                summary,
            } => {
                result.index = index;
                self.results.push(result);
                for notification in summary.notifications {
                    if !self.notifications.contains(&notification) {
                        self.notifications.push(notification);
                    }
                }
            }
            StatementOutcome::Failure(error) => {
                self.errors.push(StatementFailure { index, error });
            }
        }
    }

    /// Successful results in submission order
    pub fn results(&self) -> &[StatementResult] {
        &self.results
    }

    /// Distinct notifications of all successful statements
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Failures in submission order
    pub fn errors(&self) -> &[StatementFailure] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.errors.is_empty()
    }

    /// Number of statement slots filled
    pub fn len(&self) -> usize {
        self.results.len() + self.errors.len()
    }
}
