use pgsqlexec::{Cursor, ExecError, ExecResult, SqlExec};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::NoTls;

fn database_url(test: &str) -> Option<String> {
    let _ = dotenvy::dotenv();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

async fn connect(database_url: &str) -> ExecResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Ok(client)
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{}_{}", std::process::id(), nanos)
}

#[tokio::test]
async fn select_returns_one_row_in_order() -> ExecResult<()> {
    let Some(url) = database_url("select_returns_one_row_in_order") else {
        return Ok(());
    };
    let client = connect(&url).await?;

    let mut exec = SqlExec::new(&client);
    let rows = exec.append_string("SELECT 1,2,3").execute().await?.rows()?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 3);
    assert_eq!(rows[0].get(0), Some("1"));
    assert_eq!(rows[0].get(1), Some("2"));
    assert_eq!(rows[0].get(2), Some("3"));
    Ok(())
}

#[tokio::test]
async fn rows_come_from_the_last_statement() -> ExecResult<()> {
    let Some(url) = database_url("rows_come_from_the_last_statement") else {
        return Ok(());
    };
    let client = connect(&url).await?;

    let mut exec = SqlExec::new(&client);
    exec.append_string("SELECT 1")
        .append_string("SELECT 'x' AS a UNION ALL SELECT 'y'")
        .execute()
        .await?;
    let values: Vec<_> = exec.rows()?.iter().map(|r| r.get(0)).collect();
    assert_eq!(values, vec![Some("x"), Some("y")]);

    let mut exec = SqlExec::new(&client);
    exec.append_string("SELECT 1").append_string("DO $$ BEGIN END $$");
    exec.execute().await?;
    assert!(matches!(exec.rows(), Err(ExecError::NoResults)));
    Ok(())
}

#[tokio::test]
async fn committed_rows_are_visible_to_another_executor() -> ExecResult<()> {
    let Some(url) = database_url("committed_rows_are_visible_to_another_executor") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    let table = format!("pgsqlexec_roundtrip_{}", unique_suffix());

    SqlExec::new(&client)
        .append_string(&format!("CREATE TEMP TABLE {table} (id int, name text)"))
        .append_string(&format!("INSERT INTO {table} VALUES (1, 'alice'), (2, 'bob')"))
        .execute()
        .await?
        .commit()
        .await?;

    let mut exec = SqlExec::new(&client);
    let rows = exec
        .append_string(&format!("SELECT id, name FROM {table} ORDER BY id"))
        .execute()
        .await?
        .rows()?;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(1), Some("alice"));
    assert_eq!(rows[1].get(0), Some("2"));
    Ok(())
}

#[tokio::test]
async fn uncommitted_work_is_rolled_back_when_the_connection_closes() -> ExecResult<()> {
    let Some(url) = database_url("uncommitted_work_is_rolled_back_when_the_connection_closes")
    else {
        return Ok(());
    };
    let table = format!("pgsqlexec_rollback_{}", unique_suffix());

    let client = connect(&url).await?;
    SqlExec::new(&client)
        .append_string(&format!("CREATE TABLE {table} (id int)"))
        .execute()
        .await?
        .commit()
        .await?;
    SqlExec::new(&client)
        .append_string(&format!("INSERT INTO {table} VALUES (1)"))
        .execute()
        .await?;
    drop(client);

    let client = connect(&url).await?;
    let mut exec = SqlExec::new(&client);
    let count = exec
        .append_string(&format!("SELECT count(*) FROM {table}"))
        .execute()
        .await?
        .rows()?[0]
        .get(0)
        .map(str::to_owned);
    assert_eq!(count.as_deref(), Some("0"));

    SqlExec::new(&client)
        .append_string(&format!("DROP TABLE {table}"))
        .execute()
        .await?
        .commit()
        .await?;
    Ok(())
}

#[tokio::test]
async fn shared_cursor_sees_results_of_a_previous_executor() -> ExecResult<()> {
    let Some(url) = database_url("shared_cursor_sees_results_of_a_previous_executor") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    let mut cursor = Cursor::new(&client);

    SqlExec::with_cursor(&mut cursor)
        .append_string("SELECT 'shared'")
        .execute()
        .await?;

    assert_eq!(cursor.fetch_all()?[0].get(0), Some("shared"));
    Ok(())
}

#[tokio::test]
async fn driver_errors_pass_through() -> ExecResult<()> {
    let Some(url) = database_url("driver_errors_pass_through") else {
        return Ok(());
    };
    let client = connect(&url).await?;

    let mut exec = SqlExec::new(&client);
    let err = exec.append_string("SELEC 1").execute().await.unwrap_err();

    assert!(err.is_query(), "{err:?}");
    let db = err.as_db_error().expect("server error");
    assert_eq!(db.code().code(), "42601");
    assert_eq!(exec.sql(), ";SELEC 1;");
    Ok(())
}

#[tokio::test]
async fn csv_export_writes_header_and_rows() -> ExecResult<()> {
    let Some(url) = database_url("csv_export_writes_header_and_rows") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    let dir = tempfile::tempdir()?;

    let mut exec = SqlExec::builder()
        .connection(&client)
        .output_dir(dir.path())
        .name("numbers")
        .build()?;
    exec.append_string("SELECT n AS num, n * 2 AS twice\nFROM generate_series(1, 3) AS n")
        .execute_to_csv_unsafe(false)
        .await?;

    let csv = std::fs::read_to_string(exec.csv_path("abs")?)?;
    assert_eq!(csv, "num,twice\n1,2\n2,4\n3,6\n");
    Ok(())
}

#[tokio::test]
async fn override_allows_flagged_queries() -> ExecResult<()> {
    let Some(url) = database_url("override_allows_flagged_queries") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    let dir = tempfile::tempdir()?;

    let mut exec = SqlExec::builder()
        .connection(&client)
        .output_dir(dir.path())
        .build()?;
    exec.append_string("SELECT now() AS updated_at");

    let err = exec.execute_to_csv_unsafe(false).await.unwrap_err();
    assert!(err.is_config(), "{err:?}");

    exec.execute_to_csv_unsafe(true).await?;
    let csv = std::fs::read_to_string(exec.csv_path("abs")?)?;
    assert!(csv.starts_with("updated_at\n"));
    Ok(())
}

#[cfg(feature = "pool")]
#[tokio::test]
async fn pooled_clients_execute() -> ExecResult<()> {
    let Some(url) = database_url("pooled_clients_execute") else {
        return Ok(());
    };
    let pool = pgsqlexec::create_pool(&url)?;
    let client = pool.get().await?;

    let mut exec = SqlExec::new(&client);
    let rows = exec.append_string("SELECT 'pooled'").execute().await?.rows()?;
    assert_eq!(rows[0].get(0), Some("pooled"));
    Ok(())
}
