use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Run,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Run(RunArgs),
}

/// One fragment to append, in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlSource {
    Literal(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub database: Option<String>,
    pub sources: Vec<SqlSource>,
    pub sql_dir: Option<PathBuf>,
    pub csv: bool,
    pub out_dir: Option<PathBuf>,
    pub name: Option<String>,
    pub allow_unsafe: bool,
    pub commit: bool,
    pub rows: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "run" => parse_run(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_run<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut args = RunArgs::default();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Run)),
            "--config" => {
                args.config = Some(PathBuf::from(required(&mut it, token)?));
            }
            _ if token.starts_with("--config=") => {
                args.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--database" => {
                args.database = Some(required(&mut it, token)?.to_string());
            }
            _ if token.starts_with("--database=") => {
                args.database = Some(token.trim_start_matches("--database=").to_string());
            }
            "-c" | "--sql" => {
                let sql = required(&mut it, token)?;
                args.sources.push(SqlSource::Literal(sql.to_string()));
            }
            "--sql-dir" => {
                args.sql_dir = Some(PathBuf::from(required(&mut it, token)?));
            }
            "--csv" => args.csv = true,
            "--out" => {
                args.out_dir = Some(PathBuf::from(required(&mut it, token)?));
            }
            "--name" => {
                args.name = Some(required(&mut it, token)?.to_string());
            }
            "--override" => args.allow_unsafe = true,
            "--commit" => args.commit = true,
            "--rows" => args.rows = true,
            "--dry-run" => args.dry_run = true,
            "-v" | "--verbose" => args.verbose = true,
            _ if token.starts_with('-') => anyhow::bail!("unknown option: {token}"),
            _ => args.sources.push(SqlSource::File(PathBuf::from(token))),
        }
    }

    if args.sources.is_empty() {
        anyhow::bail!("nothing to run: pass SQL files or --sql <SQL>");
    }
    if !args.csv {
        if args.name.is_some() || args.out_dir.is_some() {
            anyhow::bail!("--name and --out only apply to CSV export (--csv)");
        }
        if args.allow_unsafe {
            anyhow::bail!("--override only applies to CSV export (--csv)");
        }
    }
    if args.csv && args.rows {
        anyhow::bail!("--rows cannot be combined with --csv");
    }

    Ok(Command::Run(args))
}

fn required<'a>(it: &mut impl Iterator<Item = &'a str>, flag: &str) -> anyhow::Result<&'a str> {
    it.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pgsqlexec - run SQL strings and files against PostgreSQL

USAGE:
  pgsqlexec <COMMAND> [OPTIONS]

COMMANDS:
  run           Execute SQL, optionally exporting a SELECT to CSV

Run `pgsqlexec <command> --help` for more."
            );
        }
        HelpTopic::Run => {
            println!(
                "\
USAGE:
  pgsqlexec run [OPTIONS] [FILES...]

Fragments (files and --sql) are appended in the order given and sent as one batch.

OPTIONS:
  --config <FILE>       Config file path (default: pgsqlexec.toml, if present)
  --database <URL>      Override database.url from config (fallback: DATABASE_URL)
  -c, --sql <SQL>       Append a literal SQL fragment (repeatable)
  --sql-dir <DIR>       Resolve relative SQL files against DIR
  --csv                 Export the SELECT result as CSV instead of executing
  --out <DIR>           CSV output directory (default: output.dir from config)
  --name <NAME>         CSV file name without extension (default: generated)
  --override            Skip the keyword checks of CSV export
  --commit              Commit after executing (otherwise the work is rolled back)
  --rows                Print the rows of the last statement
  --dry-run             Print the accumulated SQL and exit without connecting
  -v, --verbose         Log executed SQL (RUST_LOG takes precedence)
  -h, --help            Print help"
            );
        }
    }
}
