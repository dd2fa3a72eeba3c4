// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statements submitted by HTTP clients

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProxyError, Result};

/// Shape in which a statement's rows should be returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultDataContent {
    Row,
    Graph,
}

/// A single statement with its parameters and result annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    #[serde(rename = "statement")]
    pub text: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub include_stats: bool,
    #[serde(default = "default_result_data_contents")]
    pub result_data_contents: Vec<ResultDataContent>,
    /// Run inside an explicit transaction instead of autocommit
    #[serde(default)]
    pub explicit_transaction: bool,
}

fn default_result_data_contents() -> Vec<ResultDataContent> {
    vec![ResultDataContent::Row]
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Map::new(),
            include_stats: false,
            result_data_contents: default_result_data_contents(),
            explicit_transaction: false,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_stats(mut self, include_stats: bool) -> Self {
        self.include_stats = include_stats;
        self
    }

    pub fn with_result_data_contents(mut self, contents: Vec<ResultDataContent>) -> Self {
        self.result_data_contents = contents;
        self
    }

    pub fn in_explicit_transaction(mut self) -> Self {
        self.explicit_transaction = true;
        self
    }

    /// Copy of this statement with surrounding whitespace removed
    ///
    /// Fails when nothing but whitespace is left.
    pub fn normalized(&self) -> Result<Statement> {
        let text = normalize_text(&self.text)?;
        Ok(Statement {
            text: text.to_string(),
            ..self.clone()
        })
    }
}

/// Trim statement text, rejecting blank input
pub fn normalize_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProxyError::InvalidStatement(
            "statement text is empty".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_http_shape() {
        let statement: Statement = serde_json::from_value(json!({
            "statement": "MATCH (n:Person {name: $name}) RETURN n",
            "parameters": {"name": "Alice"},
            "includeStats": true,
            "resultDataContents": ["row", "graph"]
        }))
        .unwrap();

        assert_eq!(statement.text, "MATCH (n:Person {name: $name}) RETURN n");
        assert_eq!(statement.parameters.get("name"), Some(&json!("Alice")));
        assert!(statement.include_stats);
        assert_eq!(
            statement.result_data_contents,
            vec![ResultDataContent::Row, ResultDataContent::Graph]
        );
        assert!(!statement.explicit_transaction);
    }

    #[test]
    fn test_deserialize_defaults() {
        let statement: Statement =
            serde_json::from_value(json!({"statement": "RETURN 1"})).unwrap();
        assert!(statement.parameters.is_empty());
        assert!(!statement.include_stats);
        assert_eq!(statement.result_data_contents, vec![ResultDataContent::Row]);
    }

    #[test]
    fn test_normalized_trims_text() {
        let statement = Statement::new("  \n MATCH (n) RETURN n \t").with_stats(true);
        let normalized = statement.normalized().unwrap();
        assert_eq!(normalized.text, "MATCH (n) RETURN n");
        assert!(normalized.include_stats);
    }

    #[test]
    fn test_blank_text_is_invalid() {
        for text in ["", "   ", "\n\t "] {
            let error = Statement::new(text).normalized().unwrap_err();
            assert!(matches!(error, ProxyError::InvalidStatement(_)));
        }
    }
}
