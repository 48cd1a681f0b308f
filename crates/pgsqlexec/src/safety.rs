//! Keyword checks applied before the accumulated SQL is wrapped in `COPY`.
//!
//! These are substring heuristics, not a parser. Text that merely mentions a
//! keyword (`updated_at`, `'drop-off'`) is rejected, and a mutating statement
//! that avoids the four keywords is accepted. Do not rely on this as a
//! security boundary.

use crate::error::{ExecError, ExecResult};
use regex::Regex;
use std::sync::OnceLock;

fn select_re() -> &'static Regex {
    static SELECT_RE: OnceLock<Regex> = OnceLock::new();
    SELECT_RE.get_or_init(|| Regex::new(r"(?i)\s*select").expect("invalid built-in select regex"))
}

fn mutating_re() -> &'static Regex {
    static MUTATING_RE: OnceLock<Regex> = OnceLock::new();
    MUTATING_RE.get_or_init(|| {
        Regex::new(r"(?i)(create|drop|delete|update)").expect("invalid built-in keyword regex")
    })
}

fn is_separator(c: char) -> bool {
    matches!(c, ';' | ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Flatten the accumulated buffer into a single query for `COPY (...)`.
///
/// Line breaks become spaces and leading/trailing runs of `;` and whitespace
/// are removed. Separators between statements are left in place.
pub fn copy_query(sql: &str) -> String {
    let flat = sql.replace(['\n', '\r'], " ");
    flat.trim_matches(is_separator).to_string()
}

/// Reject queries that do not look like a lone SELECT.
pub fn check_copy_query(query: &str) -> ExecResult<()> {
    if !select_re().is_match(query) {
        return Err(ExecError::config(
            "CSV export only accepts a single SELECT statement",
        ));
    }
    if mutating_re().is_match(query) {
        return Err(ExecError::config(
            "CSV export must not contain CREATE, DROP, DELETE or UPDATE",
        ));
    }
    Ok(())
}

/// Run [`check_copy_query`], letting failures through when `allow_unsafe` is set.
///
/// Returns the failure that was let through, if any.
pub fn screen_copy_query(query: &str, allow_unsafe: bool) -> ExecResult<Option<ExecError>> {
    match check_copy_query(query) {
        Ok(()) => Ok(None),
        Err(err) if allow_unsafe => Ok(Some(err)),
        Err(err) => Err(err),
    }
}

/// Wrap a query so the server streams it back as CSV with a header row.
pub fn copy_statement(query: &str) -> String {
    format!("COPY ({query}) TO STDOUT WITH CSV HEADER")
}
