// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Causal consistency bookmarks shared across requests

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of opaque bookmark tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkSet(BTreeSet<String>);

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, bookmark: &str) -> bool {
        self.0.contains(bookmark)
    }

    pub fn insert(&mut self, bookmark: impl Into<String>) -> bool {
        self.0.insert(bookmark.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for BookmarkSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Accessor for the process-wide bookmark state
///
/// Read when a session is provisioned and updated when a statement completes.
pub trait BookmarkManager: Send + Sync {
    /// Snapshot of the bookmarks new sessions must observe
    fn current(&self) -> BookmarkSet;

    /// Replace the bookmarks a session started from with the ones it produced
    fn merge(&self, superseded: &BookmarkSet, fresh: BookmarkSet);
}

/// Bookmark manager keeping its state in memory
#[derive(Debug, Default)]
pub struct InMemoryBookmarkManager {
    bookmarks: RwLock<BookmarkSet>,
}

impl InMemoryBookmarkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known set, e.g. bookmarks handed over by a client
    pub fn with_initial(bookmarks: BookmarkSet) -> Self {
        Self {
            bookmarks: RwLock::new(bookmarks),
        }
    }
}

impl BookmarkManager for InMemoryBookmarkManager {
    fn current(&self) -> BookmarkSet {
        self.bookmarks.read().clone()
    }

    fn merge(&self, superseded: &BookmarkSet, fresh: BookmarkSet) {
        if fresh.is_empty() {
            return;
        }
        let mut bookmarks = self.bookmarks.write();
        bookmarks.0.retain(|bookmark| !superseded.contains(bookmark));
        bookmarks.0.extend(fresh.0);
        log::trace!("Bookmark set now holds {} bookmark(s)", bookmarks.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_merge_replaces_superseded_bookmarks() {
        let manager = InMemoryBookmarkManager::with_initial(["bm-1", "bm-2"].into_iter().collect());

        let started_from = manager.current();
        manager.merge(&started_from, ["bm-3"].into_iter().collect());

        let current = manager.current();
        assert_eq!(current.len(), 1);
        assert!(current.contains("bm-3"));
    }

    #[test]
    fn test_merge_keeps_bookmarks_from_concurrent_sessions() {
        let manager = InMemoryBookmarkManager::with_initial(["bm-1"].into_iter().collect());

        // Two sessions start from bm-1; only the bookmark they consumed is replaced.
        let started_from = manager.current();
        manager.merge(&started_from, ["bm-2"].into_iter().collect());
        manager.merge(&BookmarkSet::new(), ["bm-3"].into_iter().collect());

        let current = manager.current();
        assert!(current.contains("bm-2"));
        assert!(current.contains("bm-3"));
        assert!(!current.contains("bm-1"));
    }

    #[test]
    fn test_empty_result_does_not_clear_state() {
        let manager = InMemoryBookmarkManager::with_initial(["bm-1"].into_iter().collect());
        let started_from = manager.current();
        manager.merge(&started_from, BookmarkSet::new());
        assert!(manager.current().contains("bm-1"));
    }

    #[test]
    fn test_concurrent_merges() {
        let manager = Arc::new(InMemoryBookmarkManager::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                std::thread::spawn(move || {
                    manager.merge(&BookmarkSet::new(), [format!("bm-{}", i)].into_iter().collect());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(manager.current().len(), 8);
    }
}
