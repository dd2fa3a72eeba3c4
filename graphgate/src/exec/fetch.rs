// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bounded row prefetching
//!
//! Rows are requested from the cursor in windows: the first request asks for
//! the full fetch size, and once half of it has been handed out the window is
//! topped up again. The buffer never holds more than the fetch size.
//!
//! A failed refill does not discard rows already received: the error is held
//! back and returned once the buffer has been drained.

use std::collections::VecDeque;

use crate::driver::{DriverError, RowCursor};
use crate::exec::result::Record;

/// Prefetch buffer between a row cursor and its consumer
#[derive(Debug)]
pub struct FetchWindow {
    high_tide: usize,
    low_tide: usize,
    buffer: VecDeque<Record>,
    emitted_since_request: usize,
    requested: bool,
    exhausted: bool,
    pending_error: Option<DriverError>,
}

impl FetchWindow {
    /// `fetch_size` is clamped to at least one row
    pub fn new(fetch_size: usize) -> Self {
        let high_tide = fetch_size.max(1);
        Self {
            high_tide,
            low_tide: (high_tide / 2).max(1),
            buffer: VecDeque::new(),
            emitted_since_request: 0,
            requested: false,
            exhausted: false,
            pending_error: None,
        }
    }

    /// Rows pulled from the cursor but not yet handed out
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn high_tide(&self) -> usize {
        self.high_tide
    }

    pub fn low_tide(&self) -> usize {
        self.low_tide
    }

    /// Whether the cursor reported its last row
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next row, or `None` once the cursor is exhausted and the buffer drained
    ///
    /// A pull error surfaces only after every buffered row was returned.
    pub async fn next(&mut self, cursor: &mut dyn RowCursor) -> Result<Option<Record>, DriverError> {
        if !self.requested {
            self.requested = true;
            self.request(cursor).await?;
        }

        while self.buffer.is_empty() {
            if let Some(error) = self.pending_error.take() {
                self.exhausted = true;
                return Err(error);
            }
            if self.exhausted {
                return Ok(None);
            }
            self.request(cursor).await?;
        }

        let record = self.buffer.pop_front();
        self.emitted_since_request += 1;

        if self.emitted_since_request >= self.low_tide
            && !self.exhausted
            && self.pending_error.is_none()
        {
            if let Err(error) = self.request(cursor).await {
                log::debug!(
                    "Refill failed with {} row(s) still buffered: {}",
                    self.buffer.len(),
                    error
                );
                self.pending_error = Some(error);
            }
        }

        Ok(record)
    }

    /// Top the buffer up to the high tide
    async fn request(&mut self, cursor: &mut dyn RowCursor) -> Result<(), DriverError> {
        let n = self.high_tide - self.buffer.len();
        self.emitted_since_request = 0;
        if n == 0 {
            return Ok(());
        }

        let batch = cursor.pull(n).await?;
        if batch.records.len() > n {
            return Err(DriverError::Protocol(format!(
                "requested {} rows but received {}",
                n,
                batch.records.len()
            )));
        }

        self.buffer.extend(batch.records);
        self.exhausted = !batch.has_more;
        Ok(())
    }
}
