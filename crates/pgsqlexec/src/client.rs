//! Client trait describing what the executor needs from a connection.

use crate::error::{ExecError, ExecResult};
use bytes::Bytes;
use futures_core::Stream;
use futures_util::TryStreamExt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::{SimpleQueryMessage, SimpleQueryRow};

/// The minimal surface of a PostgreSQL connection used by [`Cursor`](crate::Cursor)
/// and [`SqlExec`](crate::SqlExec).
///
/// Implemented for `tokio_postgres::Client` and, with the `pool` feature, for
/// pooled `deadpool_postgres` clients.
pub trait ExecClient: Send + Sync {
    /// Run one or more `;`-separated statements through the simple query protocol.
    ///
    /// Returns the rows of the **last** statement in the batch, or `None` when that
    /// statement does not produce a result set (e.g. `INSERT`, `CREATE`).
    fn execute_batch(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = ExecResult<Option<Vec<SimpleQueryRow>>>> + Send;

    /// Start a `COPY ... TO STDOUT` and return the raw output chunks.
    fn copy_out(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = ExecResult<CopyStream>> + Send;

    /// Open a transaction block on this connection.
    ///
    /// Called before every batch; a `BEGIN` inside an open transaction only
    /// draws a server warning.
    fn begin(&self) -> impl std::future::Future<Output = ExecResult<()>> + Send;

    /// Commit the transaction in progress on this connection.
    fn commit(&self) -> impl std::future::Future<Output = ExecResult<()>> + Send;
}

/// Collapse simple-query messages into the result set of the final statement.
pub(crate) fn last_result_set(messages: Vec<SimpleQueryMessage>) -> Option<Vec<SimpleQueryRow>> {
    let mut last = None;
    let mut current: Option<Vec<SimpleQueryRow>> = None;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(_) => current = Some(Vec::new()),
            SimpleQueryMessage::Row(row) => current.get_or_insert_with(Vec::new).push(row),
            SimpleQueryMessage::CommandComplete(_) => last = current.take(),
            _ => {}
        }
    }
    last
}

impl ExecClient for tokio_postgres::Client {
    async fn execute_batch(&self, sql: &str) -> ExecResult<Option<Vec<SimpleQueryRow>>> {
        let messages = tokio_postgres::Client::simple_query(self, sql).await?;
        Ok(last_result_set(messages))
    }

    async fn copy_out(&self, sql: &str) -> ExecResult<CopyStream> {
        let stream = tokio_postgres::Client::copy_out(self, sql).await?;
        Ok(CopyStream::new(stream.map_err(ExecError::from)))
    }

    async fn begin(&self) -> ExecResult<()> {
        tokio_postgres::Client::batch_execute(self, "BEGIN").await?;
        Ok(())
    }

    async fn commit(&self) -> ExecResult<()> {
        tokio_postgres::Client::batch_execute(self, "COMMIT").await?;
        Ok(())
    }
}

/// A stream of `COPY ... TO STDOUT` output chunks.
///
/// Type-erased so that every [`ExecClient`] returns the same stream type.
#[must_use]
pub struct CopyStream {
    inner: Pin<Box<dyn Stream<Item = ExecResult<Bytes>> + Send>>,
}

impl CopyStream {
    /// Create a new `CopyStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = ExecResult<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for CopyStream {
    type Item = ExecResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl ExecClient for deadpool_postgres::Client {
    async fn execute_batch(&self, sql: &str) -> ExecResult<Option<Vec<SimpleQueryRow>>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        ExecClient::execute_batch(&**self, sql).await
    }

    async fn copy_out(&self, sql: &str) -> ExecResult<CopyStream> {
        ExecClient::copy_out(&**self, sql).await
    }

    async fn begin(&self) -> ExecResult<()> {
        ExecClient::begin(&**self).await
    }

    async fn commit(&self) -> ExecResult<()> {
        ExecClient::commit(&**self).await
    }
}

#[cfg(feature = "pool")]
impl ExecClient for deadpool_postgres::ClientWrapper {
    async fn execute_batch(&self, sql: &str) -> ExecResult<Option<Vec<SimpleQueryRow>>> {
        ExecClient::execute_batch(&**self, sql).await
    }

    async fn copy_out(&self, sql: &str) -> ExecResult<CopyStream> {
        ExecClient::copy_out(&**self, sql).await
    }

    async fn begin(&self) -> ExecResult<()> {
        ExecClient::begin(&**self).await
    }

    async fn commit(&self) -> ExecResult<()> {
        ExecClient::commit(&**self).await
    }
}
