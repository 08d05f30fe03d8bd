use std::path::PathBuf;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Pre-`APP__` variable names that are still honoured when the prefixed
/// variable is absent.
const LEGACY_ENV: [(&str, &str); 2] = [("SERVER_BIND", "bind_addr"), ("DATABASE_URL", "database_url")];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl Settings {
    /// The configured database, if any. Without one the roster lives in memory.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_url: None,
            seed_path: None,
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the process
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from("server", std::env::vars().collect())
}

pub(crate) fn load_settings_from(
    file_stem: &str,
    env: config::Map<String, String>,
) -> anyhow::Result<Settings> {
    let mut builder = Config::builder()
        .set_default("bind_addr", DEFAULT_BIND_ADDR)?
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .source(Some(env.clone())),
        );

    for (legacy, key) in LEGACY_ENV {
        let prefixed = format!("APP__{}", key.to_ascii_uppercase());
        if env.contains_key(&prefixed) {
            continue;
        }
        if let Some(value) = env.get(legacy) {
            builder = builder.set_override(key, value.as_str())?;
        }
    }

    builder
        .build()
        .context("failed to assemble server settings")?
        .try_deserialize()
        .context("invalid server settings")
}

/// Turns plain file paths into `sqlite://` URLs; anything that already names
/// a scheme passes through.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
