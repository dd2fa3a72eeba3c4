// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared harness for coordinator integration tests

#![allow(dead_code)]

pub mod mock_driver;

use graphgate::{InMemoryBookmarkManager, ProxyConfig, QueryCoordinator};
use mock_driver::{MockDriver, MockEdition};
use std::sync::Arc;
use std::time::Duration;

/// Coordinator over a mock driver with its collaborators exposed
pub struct Fixture {
    pub driver: MockDriver,
    pub edition: Arc<MockEdition>,
    pub bookmarks: Arc<InMemoryBookmarkManager>,
    pub coordinator: QueryCoordinator,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(ProxyConfig::default(), MockEdition::community())
    }

    pub fn enterprise() -> Self {
        Self::with(ProxyConfig::default(), MockEdition::enterprise())
    }

    pub fn with_fetch_size(fetch_size: usize) -> Self {
        Self::with(
            ProxyConfig {
                fetch_size,
                ..ProxyConfig::default()
            },
            MockEdition::community(),
        )
    }

    pub fn with(config: ProxyConfig, edition: MockEdition) -> Self {
        let driver = MockDriver::new();
        let edition = Arc::new(edition);
        let bookmarks = Arc::new(InMemoryBookmarkManager::new());
        let coordinator = QueryCoordinator::new(
            config,
            Arc::new(driver.clone()),
            edition.clone(),
            bookmarks.clone(),
        )
        .expect("valid test configuration");

        Self {
            driver,
            edition,
            bookmarks,
            coordinator,
        }
    }
}

/// Let tasks spawned from `Drop` run to completion
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
