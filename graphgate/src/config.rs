// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Proxy configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ProxyError, Result};
use crate::logging::LogLevel;

/// Rows requested per streaming window unless configured otherwise
pub const DEFAULT_FETCH_SIZE: usize = 2000;

/// Largest accepted streaming window
pub const MAX_FETCH_SIZE: usize = 1_000_000;

/// Database used when a request names none
pub const DEFAULT_DATABASE: &str = "neo4j";

/// Upper bound of concurrently executing statements per batch
pub const DEFAULT_MAX_IN_FLIGHT_STATEMENTS: usize = 256;

/// Configuration of the query coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Rows per streaming window
    pub fetch_size: usize,
    /// Database used when a request names none
    pub default_database: String,
    /// Statements of one batch executing at the same time
    pub max_in_flight_statements: usize,
    pub log_level: LogLevel,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            fetch_size: DEFAULT_FETCH_SIZE,
            default_database: DEFAULT_DATABASE.to_string(),
            max_in_flight_statements: DEFAULT_MAX_IN_FLIGHT_STATEMENTS,
            log_level: LogLevel::default(),
        }
    }
}

impl ProxyConfig {
    /// Parse configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProxyError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load a JSON config file, apply environment overrides and validate
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ProxyError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut config = Self::from_json_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - GRAPHGATE_FETCH_SIZE: Override fetch_size
    /// - GRAPHGATE_DEFAULT_DATABASE: Override default_database
    /// - GRAPHGATE_MAX_IN_FLIGHT_STATEMENTS: Override max_in_flight_statements
    /// - GRAPHGATE_LOG_LEVEL: Override log_level
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(value) = env::var("GRAPHGATE_FETCH_SIZE") {
            self.fetch_size = value.trim().parse().map_err(|_| {
                ProxyError::Configuration(format!("Invalid GRAPHGATE_FETCH_SIZE value: {}", value))
            })?;
        }

        if let Ok(database) = env::var("GRAPHGATE_DEFAULT_DATABASE") {
            self.default_database = database;
        }

        if let Ok(value) = env::var("GRAPHGATE_MAX_IN_FLIGHT_STATEMENTS") {
            self.max_in_flight_statements = value.trim().parse().map_err(|_| {
                ProxyError::Configuration(format!(
                    "Invalid GRAPHGATE_MAX_IN_FLIGHT_STATEMENTS value: {}",
                    value
                ))
            })?;
        }

        if let Ok(value) = env::var("GRAPHGATE_LOG_LEVEL") {
            self.log_level = value.parse()?;
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.fetch_size == 0 {
            return Err(ProxyError::Configuration(
                "fetch_size cannot be 0".to_string(),
            ));
        }

        if self.fetch_size > MAX_FETCH_SIZE {
            return Err(ProxyError::Configuration(format!(
                "fetch_size {} exceeds the maximum of {}",
                self.fetch_size, MAX_FETCH_SIZE
            )));
        }

        if self.max_in_flight_statements == 0 {
            return Err(ProxyError::Configuration(
                "max_in_flight_statements cannot be 0".to_string(),
            ));
        }

        if self.default_database.trim().is_empty() {
            return Err(ProxyError::Configuration(
                "default_database cannot be blank".to_string(),
            ));
        }

        Ok(())
    }
}
