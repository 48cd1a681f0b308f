//! The SQL accumulating executor.
//!
//! # Example
//!
//! ```ignore
//! use pgsqlexec::SqlExec;
//!
//! let total = SqlExec::new(&client)
//!     .append_file("sql/check_append.sql")?
//!     .execute()
//!     .await?
//!     .rows()?[0]
//!     .get(0)
//!     .map(str::to_owned);
//! ```

mod builder;


pub use builder::SqlExecBuilder;

use crate::client::ExecClient;
use crate::cursor::Cursor;
use crate::error::{ExecError, ExecResult};
use crate::loader::{FsLoader, SqlLoader};
use crate::output::{self, CsvTarget};
use crate::safety;
use std::path::{Path, PathBuf};
use tokio_postgres::SimpleQueryRow;

const LOG_TARGET: &str = "pgsqlexec.sql";
const LOG_SQL_MAX_BYTES: usize = 200;

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// The cursor an executor runs on: its own, or one lent by the caller.
enum CursorSlot<'a, 'c, C: ExecClient> {
    Owned(Cursor<'c, C>),
    Borrowed(&'a mut Cursor<'c, C>),
}

impl<'c, C: ExecClient> CursorSlot<'_, 'c, C> {
    fn get(&self) -> &Cursor<'c, C> {
        match self {
            Self::Owned(cur) => cur,
            Self::Borrowed(cur) => &**cur,
        }
    }

    fn get_mut(&mut self) -> &mut Cursor<'c, C> {
        match self {
            Self::Owned(cur) => cur,
            Self::Borrowed(cur) => &mut **cur,
        }
    }
}

/// Accumulates SQL fragments and runs them against PostgreSQL.
///
/// Every fragment is appended as `;fragment;`, so fragments stay separate
/// statements. The whole buffer is sent in one simple-query round trip by
/// [`execute`](SqlExec::execute), or wrapped in `COPY ... TO STDOUT` by
/// [`execute_to_csv_unsafe`](SqlExec::execute_to_csv_unsafe).
///
/// The executor never opens or closes connections; the caller owns them.
pub struct SqlExec<'a, 'c, C: ExecClient> {
    cursor: CursorSlot<'a, 'c, C>,
    sql: String,
    csv: Option<CsvTarget>,
}

impl<'a, 'c, C: ExecClient> SqlExec<'a, 'c, C> {
    /// Create an executor with its own cursor on `connection`.
    pub fn new(connection: &'c C) -> Self {
        Self::from_slot(CursorSlot::Owned(Cursor::new(connection)), None)
    }

    /// Create an executor on a cursor shared with the caller.
    pub fn with_cursor(cursor: &'a mut Cursor<'c, C>) -> Self {
        Self::from_slot(CursorSlot::Borrowed(cursor), None)
    }

    /// Start configuring an executor (connection or cursor, CSV output).
    pub fn builder() -> SqlExecBuilder<'a, 'c, C> {
        SqlExecBuilder::new()
    }

    fn from_slot(cursor: CursorSlot<'a, 'c, C>, csv: Option<CsvTarget>) -> Self {
        Self {
            cursor,
            sql: String::new(),
            csv,
        }
    }

    /// Append a SQL fragment, wrapped in statement separators.
    pub fn append_string(&mut self, sql: &str) -> &mut Self {
        self.sql.reserve(sql.len() + 2);
        self.sql.push(';');
        self.sql.push_str(sql);
        self.sql.push(';');
        self
    }

    /// Append the contents of a SQL file read from the filesystem.
    pub fn append_file(&mut self, path: impl AsRef<Path>) -> ExecResult<&mut Self> {
        self.append_file_with(path, &FsLoader)
    }

    /// Append the contents of a SQL file read through `loader`.
    pub fn append_file_with<L>(&mut self, path: impl AsRef<Path>, loader: &L) -> ExecResult<&mut Self>
    where
        L: SqlLoader + ?Sized,
    {
        let sql = loader.load(path.as_ref())?;
        Ok(self.append_string(&sql))
    }

    /// Send the accumulated SQL to the database in one batch.
    ///
    /// Driver errors are returned as [`ExecError::Query`] unchanged.
    pub async fn execute(&mut self) -> ExecResult<&mut Self> {
        tracing::debug!(
            target: LOG_TARGET,
            bytes = self.sql.len(),
            sql = %truncate_sql_bytes(&self.sql, LOG_SQL_MAX_BYTES),
            "executing accumulated sql"
        );
        self.cursor.get_mut().execute(&self.sql).await?;
        Ok(self)
    }

    /// Export the result of the accumulated SELECT into the configured CSV file.
    ///
    /// The buffer is pasted into `COPY (...) TO STDOUT WITH CSV HEADER` as-is,
    /// guarded only by the keyword checks in [`crate::safety`]. Passing
    /// `allow_unsafe = true` skips those checks. An existing file is overwritten.
    pub async fn execute_to_csv_unsafe(&mut self, allow_unsafe: bool) -> ExecResult<&mut Self> {
        let Some(target) = self.csv.as_ref() else {
            return Err(ExecError::config(
                "CSV output requested, but no output directory is set",
            ));
        };

        let query = safety::copy_query(&self.sql);
        if let Some(bypassed) = safety::screen_copy_query(&query, allow_unsafe)? {
            tracing::warn!(
                target: LOG_TARGET,
                reason = %bypassed,
                "CSV export safety checks overridden"
            );
        }

        let path = target.absolute();
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ExecError::file(&path, e))?;
        let bytes = self
            .cursor
            .get()
            .copy_expert(&safety::copy_statement(&query), &mut file)
            .await?;

        tracing::info!(
            target: LOG_TARGET,
            path = %path.display(),
            bytes,
            "exported csv"
        );
        Ok(self)
    }

    /// Commit on the underlying connection.
    pub async fn commit(&mut self) -> ExecResult<&mut Self> {
        tracing::debug!(target: LOG_TARGET, "commit");
        self.cursor.get().commit().await?;
        Ok(self)
    }

    /// The accumulated SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Path of the CSV file; `kind` is `"abs"`/`"absolute"` or `"rel"`/`"relative"`.
    pub fn csv_path(&self, kind: &str) -> ExecResult<PathBuf> {
        output::csv_path(self.csv.as_ref(), kind)
    }

    /// The CSV target, if an output directory was configured.
    pub fn csv_target(&self) -> Option<&CsvTarget> {
        self.csv.as_ref()
    }

    /// Rows produced by the last statement of the most recent execution.
    pub fn rows(&self) -> ExecResult<&[SimpleQueryRow]> {
        self.cursor.get().fetch_all()
    }

    /// The cursor this executor runs on.
    pub fn cursor(&self) -> &Cursor<'c, C> {
        self.cursor.get()
    }
}

impl<C: ExecClient> std::fmt::Debug for SqlExec<'_, '_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlExec")
            .field("sql", &self.sql)
            .field("csv", &self.csv)
            .field(
                "cursor",
                &match self.cursor {
                    CursorSlot::Owned(_) => "owned",
                    CursorSlot::Borrowed(_) => "borrowed",
                },
            )
            .finish()
    }
}
