//! A cursor: a connection handle plus the result set of its last execution.
//!
//! Work done through a cursor runs inside a transaction block that stays open
//! until [`Cursor::commit`]. Closing the connection without committing rolls
//! the work back.

use crate::client::ExecClient;
use crate::error::{ExecError, ExecResult};
use futures_util::TryStreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_postgres::SimpleQueryRow;

/// A handle bound to one connection that remembers the rows of the most recent
/// [`execute`](Cursor::execute).
///
/// Several [`SqlExec`](crate::SqlExec) instances can share a cursor via
/// [`SqlExec::with_cursor`](crate::SqlExec::with_cursor); they then also share
/// its result set.
pub struct Cursor<'c, C: ExecClient> {
    client: &'c C,
    result: Option<Vec<SimpleQueryRow>>,
}

impl<'c, C: ExecClient> Cursor<'c, C> {
    /// Create a cursor on `client`.
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            result: None,
        }
    }

    /// The connection this cursor is bound to.
    pub fn connection(&self) -> &'c C {
        self.client
    }

    /// Execute a (possibly multi-statement) batch and keep its last result set.
    ///
    /// A transaction block is opened first. The previous result set is
    /// discarded before the batch is sent, so a failed batch leaves the cursor
    /// without results.
    pub async fn execute(&mut self, sql: &str) -> ExecResult<()> {
        self.result = None;
        self.client.begin().await?;
        self.result = self.client.execute_batch(sql).await?;
        Ok(())
    }

    /// Run a `COPY ... TO STDOUT` statement and write its output into `writer`.
    ///
    /// Returns the number of bytes written.
    pub async fn copy_expert<W>(&self, sql: &str, writer: &mut W) -> ExecResult<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        self.client.begin().await?;
        let mut stream = self.client.copy_out(sql).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.try_next().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// All rows of the last execution.
    pub fn fetch_all(&self) -> ExecResult<&[SimpleQueryRow]> {
        self.result.as_deref().ok_or(ExecError::NoResults)
    }

    /// Whether the last execution produced a result set (possibly empty).
    pub fn has_result_set(&self) -> bool {
        self.result.is_some()
    }

    /// Commit the open transaction on the owning connection.
    pub async fn commit(&self) -> ExecResult<()> {
        self.client.commit().await
    }
}

impl<C: ExecClient> std::fmt::Debug for Cursor<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("rows", &self.result.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}
