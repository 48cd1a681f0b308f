//! # pgsqlexec
//!
//! A minimal chaining wrapper for dumping SQL into PostgreSQL, usually from
//! pre-written static files, and maybe getting some results out.
//!
//! ## Features
//!
//! - **Accumulate**: append SQL strings and files; each fragment is wrapped in `;`
//! - **Execute**: send the whole buffer in one multi-statement round trip
//! - **Rows**: read the result set of the last statement
//! - **CSV export**: stream a SELECT through `COPY ... TO STDOUT WITH CSV HEADER`
//! - **Pluggable loading**: resolve SQL file references through a [`SqlLoader`]
//!
//! ```ignore
//! use pgsqlexec::SqlExec;
//!
//! let mut exec = SqlExec::builder()
//!     .connection(&client)
//!     .output_dir("out")
//!     .name("users")
//!     .build()?;
//!
//! exec.append_string("SELECT id, email FROM users")
//!     .execute_to_csv_unsafe(false)
//!     .await?;
//! println!("wrote {}", exec.csv_path("abs")?.display());
//! ```

pub mod client;
pub mod cursor;
pub mod error;
pub mod exec;
pub mod loader;
pub mod output;
pub mod safety;

pub use client::{CopyStream, ExecClient};
pub use cursor::Cursor;
pub use error::{ExecError, ExecResult};
pub use exec::{SqlExec, SqlExecBuilder};
pub use loader::{DirLoader, FsLoader, SqlLoader};
pub use output::{CsvTarget, PathKind};

// Row type returned by `SqlExec::rows`
pub use tokio_postgres::SimpleQueryRow;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
