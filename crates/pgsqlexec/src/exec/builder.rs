use super::{CursorSlot, SqlExec};
use crate::client::ExecClient;
use crate::cursor::Cursor;
use crate::error::{ExecError, ExecResult};
use crate::output::CsvTarget;
use std::path::PathBuf;

/// Builder for [`SqlExec`].
///
/// Exactly one of [`connection`](Self::connection) or [`cursor`](Self::cursor)
/// must be set; [`build`](Self::build) fails otherwise.
///
/// ```ignore
/// let mut exec = SqlExec::builder()
///     .connection(&client)
///     .output_dir("/var/reports")
///     .name("daily")
///     .build()?;
/// ```
#[must_use]
pub struct SqlExecBuilder<'a, 'c, C: ExecClient> {
    connection: Option<&'c C>,
    cursor: Option<&'a mut Cursor<'c, C>>,
    output_dir: Option<PathBuf>,
    name: Option<String>,
}

impl<C: ExecClient> Default for SqlExecBuilder<'_, '_, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, 'c, C: ExecClient> SqlExecBuilder<'a, 'c, C> {
    pub fn new() -> Self {
        Self {
            connection: None,
            cursor: None,
            output_dir: None,
            name: None,
        }
    }

    /// Run on a fresh cursor over `connection`.
    pub fn connection(mut self, connection: &'c C) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Run on a cursor owned by the caller.
    pub fn cursor(mut self, cursor: &'a mut Cursor<'c, C>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Directory CSV exports are written into.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// CSV file name without the `.csv` suffix. Ignored without an output directory.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> ExecResult<SqlExec<'a, 'c, C>> {
        let slot = match (self.connection, self.cursor) {
            (Some(_), Some(_)) => {
                return Err(ExecError::config(
                    "supply only one of connection or cursor",
                ));
            }
            (None, None) => {
                return Err(ExecError::config(
                    "supply at least one of connection or cursor",
                ));
            }
            (Some(connection), None) => CursorSlot::Owned(Cursor::new(connection)),
            (None, Some(cursor)) => CursorSlot::Borrowed(cursor),
        };

        let csv = self
            .output_dir
            .map(|dir| CsvTarget::new(dir, self.name.as_deref()));

        Ok(SqlExec::from_slot(slot, csv))
    }
}
