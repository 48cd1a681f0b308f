use crate::cli::{RunArgs, SqlSource};
use crate::config::ProjectConfig;
use anyhow::Context;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use pgsqlexec::{
    CopyStream, DirLoader, ExecClient, ExecError, ExecResult, FsLoader, SimpleQueryRow, SqlExec,
    SqlLoader,
};
use std::path::PathBuf;
use tokio_postgres::NoTls;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = ProjectConfig::discover(args.config.as_deref())?;

    let sql_dir = args
        .sql_dir
        .clone()
        .or_else(|| config.as_ref().and_then(ProjectConfig::sql_dir));
    let loader: Box<dyn SqlLoader> = match sql_dir {
        Some(dir) => Box::new(DirLoader::new(dir)),
        None => Box::new(FsLoader),
    };

    if args.dry_run {
        let mut exec = SqlExec::new(&Offline);
        append_sources(&mut exec, &args.sources, &*loader)?;
        println!("{}", exec.sql());
        return Ok(());
    }

    let database_url = resolve_database_url(&args, config.as_ref())?;
    let client = connect(&database_url).await?;

    let mut builder = SqlExec::builder().connection(&client);
    if args.csv {
        let out_dir = resolve_out_dir(&args, config.as_ref())?;
        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        builder = builder.output_dir(out_dir);
        if let Some(name) = &args.name {
            builder = builder.name(name);
        }
    }
    let mut exec = builder.build()?;
    append_sources(&mut exec, &args.sources, &*loader)?;

    if args.csv {
        exec.execute_to_csv_unsafe(args.allow_unsafe).await?;
        println!("{}", exec.csv_path("abs")?.display());
    } else {
        exec.execute().await?;
    }

    if args.commit {
        exec.commit().await?;
    }

    if args.rows {
        println!("{}", rows_table(exec.rows()?));
    }

    Ok(())
}

fn append_sources<C: ExecClient>(
    exec: &mut SqlExec<'_, '_, C>,
    sources: &[SqlSource],
    loader: &dyn SqlLoader,
) -> anyhow::Result<()> {
    for source in sources {
        match source {
            SqlSource::Literal(sql) => {
                exec.append_string(sql);
            }
            SqlSource::File(path) => {
                exec.append_file_with(path, loader)?;
            }
        }
    }
    Ok(())
}

fn resolve_database_url(args: &RunArgs, config: Option<&ProjectConfig>) -> anyhow::Result<String> {
    if let Some(url) = &args.database {
        return Ok(url.clone());
    }
    if let Some(url) = config.map(ProjectConfig::database_url).transpose()?.flatten() {
        return Ok(url);
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }
    anyhow::bail!("database URL is required: pass --database, set database.url, or set DATABASE_URL")
}

fn resolve_out_dir(args: &RunArgs, config: Option<&ProjectConfig>) -> anyhow::Result<PathBuf> {
    args.out_dir
        .clone()
        .or_else(|| config.and_then(ProjectConfig::output_dir))
        .ok_or_else(|| anyhow::anyhow!("--csv requires --out <DIR> or output.dir in config"))
}

async fn connect(database_url: &str) -> anyhow::Result<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .context("failed to connect to database")?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::error!("postgres connection error: {err}");
        }
    });

    Ok(client)
}

fn rows_table(rows: &[SimpleQueryRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    if let Some(first) = rows.first() {
        table.set_header(
            first
                .columns()
                .iter()
                .map(|c| Cell::new(c.name()).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    }

    for row in rows {
        table.add_row(
            (0..row.len())
                .map(|i| Cell::new(row.get(i).unwrap_or("NULL")))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Stand-in connection for `--dry-run`; only buffer building is allowed.
struct Offline;

impl ExecClient for Offline {
    async fn execute_batch(&self, _sql: &str) -> ExecResult<Option<Vec<SimpleQueryRow>>> {
        Err(ExecError::config("dry run: no database connection"))
    }

    async fn copy_out(&self, _sql: &str) -> ExecResult<CopyStream> {
        Err(ExecError::config("dry run: no database connection"))
    }

    async fn begin(&self) -> ExecResult<()> {
        Err(ExecError::config("dry run: no database connection"))
    }

    async fn commit(&self) -> ExecResult<()> {
        Err(ExecError::config("dry run: no database connection"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn sources_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), "SELECT 'a'").unwrap();

        let mut exec = SqlExec::new(&Offline);
        let sources = vec![
            SqlSource::Literal("SELECT 0".to_string()),
            SqlSource::File(PathBuf::from("a.sql")),
        ];
        append_sources(&mut exec, &sources, &DirLoader::new(dir.path())).unwrap();

        assert_eq!(exec.sql(), ";SELECT 0;;SELECT 'a';");
    }

    #[test]
    fn missing_file_stops_accumulation() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = SqlExec::new(&Offline);
        let sources = vec![SqlSource::File(PathBuf::from("missing.sql"))];

        assert!(append_sources(&mut exec, &sources, &DirLoader::new(dir.path())).is_err());
        assert_eq!(exec.sql(), "");
    }

    #[tokio::test]
    async fn offline_client_refuses_to_execute() {
        let mut exec = SqlExec::new(&Offline);
        let err = exec.append_string("SELECT 1").execute().await.unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn database_flag_beats_config() {
        let args = RunArgs {
            database: Some("postgres://flag/db".to_string()),
            ..RunArgs::default()
        };
        assert_eq!(
            resolve_database_url(&args, None).unwrap(),
            "postgres://flag/db"
        );
    }

    #[test]
    fn database_flag_beats_an_unresolvable_config_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgsqlexec.toml");
        std::fs::write(
            &path,
            "version = \"1\"\n[database]\nurl = \"${PGSQLEXEC_TEST_UNSET_URL}\"\n",
        )
        .unwrap();
        let config = ProjectConfig::load(&path).unwrap();

        let args = RunArgs {
            database: Some("postgres://flag/db".to_string()),
            ..RunArgs::default()
        };
        assert_eq!(
            resolve_database_url(&args, Some(&config)).unwrap(),
            "postgres://flag/db"
        );

        let err = resolve_database_url(&RunArgs::default(), Some(&config)).unwrap_err();
        assert!(err.to_string().contains("PGSQLEXEC_TEST_UNSET_URL"), "{err:#}");
    }

    #[test]
    fn out_dir_falls_back_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgsqlexec.toml");
        std::fs::write(&path, "version = \"1\"\n[output]\ndir = \"exports\"\n").unwrap();
        let config = ProjectConfig::load(&path).unwrap();

        let args = RunArgs::default();
        assert_eq!(
            resolve_out_dir(&args, Some(&config)).unwrap(),
            dir.path().join("exports")
        );
        assert!(resolve_out_dir(&args, None).is_err());

        let args = RunArgs {
            out_dir: Some(PathBuf::from("/elsewhere")),
            ..RunArgs::default()
        };
        assert_eq!(
            resolve_out_dir(&args, Some(&config)).unwrap(),
            Path::new("/elsewhere")
        );
    }
}
