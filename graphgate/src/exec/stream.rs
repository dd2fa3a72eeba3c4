// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lazy record streams

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};

use super::executor::StatementExecution;
use super::result::Record;
use crate::error::{ProxyError, Result};

/// Rows of a single statement, pulled on demand
///
/// Ends after the last row or after the first error. Dropping it before the
/// end releases the statement's transaction and session.
pub type RecordStream = BoxStream<'static, std::result::Result<Record, ProxyError>>;

enum StreamState {
    Pending(BoxFuture<'static, Result<StatementExecution>>),
    Running(StatementExecution),
}

/// Stream over an execution that is only started on first poll
pub(crate) fn lazy_record_stream(
    start: BoxFuture<'static, Result<StatementExecution>>,
) -> RecordStream {
    stream::try_unfold(StreamState::Pending(start), |state| async move {
        let mut execution = match state {
            StreamState::Pending(start) => start.await?,
            StreamState::Running(execution) => execution,
        };

        let next = execution.next_record().await?;
        Ok::<_, ProxyError>(next.map(|record| (record, StreamState::Running(execution))))
    })
    .boxed()
}
