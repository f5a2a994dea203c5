use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use rpipe::PipelineOptions;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "rpipe.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub group: String,
    pub states: Vec<String>,
    pub suffix: Option<String>,
    pub max_in_flight: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/rpipe.db".into(),
            group: "default".into(),
            states: vec!["processing".into(), "done".into(), "failed".into()],
            suffix: None,
            max_in_flight: None,
        }
    }
}

impl Settings {
    pub fn pipeline_options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new().with_states(self.states.iter().cloned());
        options.suffix = self.suffix.clone();
        if let Some(max_in_flight) = self.max_in_flight {
            options.max_in_flight = max_in_flight;
        }
        options
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    database_url: Option<String>,
    group: Option<String>,
    states: Option<Vec<String>>,
    #[serde(alias = "postFix", alias = "post_fix")]
    suffix: Option<String>,
    max_in_flight: Option<usize>,
}

/// Defaults, then the toml file at `path` (if present), then the environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.group {
        settings.group = v;
    }
    if let Some(v) = file_cfg.states {
        settings.states = v;
    }
    if let Some(v) = file_cfg.suffix {
        settings.suffix = Some(v);
    }
    if let Some(v) = file_cfg.max_in_flight {
        settings.max_in_flight = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("RPIPE_GROUP") {
        settings.group = v;
    }
    if let Some(v) = var("APP__GROUP") {
        settings.group = v;
    }

    if let Some(v) = var("RPIPE_STATES") {
        settings.states = split_states(&v);
    }
    if let Some(v) = var("APP__STATES") {
        settings.states = split_states(&v);
    }

    if let Some(v) = var("RPIPE_SUFFIX") {
        settings.suffix = Some(v);
    }
    if let Some(v) = var("APP__SUFFIX") {
        settings.suffix = Some(v);
    }

    if let Some(v) = var("APP__MAX_IN_FLIGHT") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_in_flight = Some(parsed);
        }
    }
}

pub fn split_states(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
