use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "pgsqlexec.toml";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let mut file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        file.expand_env()?;
        file.validate()?;

        Ok(Self { config_dir, file })
    }

    /// Load `explicit`, or the default file when it exists.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Option<Self>> {
        match explicit {
            Some(path) => Self::load(path).map(Some),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    /// `database.url` with `${VAR}` references expanded.
    ///
    /// Expanded on use, so a flag that overrides it never needs the variables.
    pub fn database_url(&self) -> anyhow::Result<Option<String>> {
        self.file
            .database
            .url
            .as_deref()
            .map(expand_env_vars)
            .transpose()
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.file.output.dir.as_ref().map(|d| self.resolve_path(d))
    }

    pub fn sql_dir(&self) -> Option<PathBuf> {
        self.file.sql.dir.as_ref().map(|d| self.resolve_path(d))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub output: DirConfig,

    #[serde(default)]
    pub sql: DirConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirConfig {
    pub dir: Option<String>,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        for value in [
            self.output.dir.as_mut(),
            self.sql.dir.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            *value = expand_env_vars(value)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                anyhow::bail!("database.url must not be empty");
            }
        }
        if self.output.dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
            anyhow::bail!("output.dir must not be empty");
        }
        if self.sql.dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
            anyhow::bail!("sql.dir must not be empty");
        }
        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
