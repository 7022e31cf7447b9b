use anyhow::{Context, anyhow};
use chrono::TimeDelta;
use marquee_model::ImageBase;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::SyncError;

/// Source that produced the sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Tuning knobs for the sync core. Every constant the read path depends on
/// lives here so embedders can override it instead of patching code.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Age after which cached details are stale and summaries are swept.
    #[serde(with = "humantime_serde")]
    pub retention_ttl: Duration,
    /// Items per upstream page.
    pub page_size: u32,
    /// How close to the end of the loaded items a scroll position must get
    /// before the next page is requested.
    pub prefetch_distance: u32,
    /// Backup connectivity poll, covering missed platform notifications.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Per-request timeout for the content API and the connectivity probe.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub api_base_url: String,
    pub image_base_url: String,
    pub language: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// URL probed by the backup poll. Without it the monitor relies on
    /// pushed notifications alone.
    pub probe_url: Option<String>,
    /// SQLite file backing the local store; `None` keeps it in memory.
    pub database_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retention_ttl: Duration::from_secs(24 * 60 * 60),
            page_size: 20,
            prefetch_distance: 3,
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            api_base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            language: "en-US".to_string(),
            api_key: None,
            probe_url: None,
            database_path: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration using environment variables.
    /// Evaluation order:
    /// 1) `$MARQUEE_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$MARQUEE_CONFIG_JSON` (inline JSON),
    /// 3) the first existing default file,
    /// 4) defaults.
    ///
    /// A `.env` file is honoured, and `TMDB_API_KEY` always wins over a key
    /// found in the file.
    pub fn load_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        let _ = dotenvy::dotenv();

        let (mut config, source) = Self::resolve_from_env()?;
        if let Ok(key) = env::var("TMDB_API_KEY")
            && !key.trim().is_empty()
        {
            config.api_key = Some(key.trim().to_string());
        }

        config
            .validate()
            .map_err(|err| anyhow!("invalid sync config: {err}"))?;
        Ok((config, source))
    }

    fn resolve_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        if let Ok(path_str) = env::var("MARQUEE_CONFIG_PATH")
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var("MARQUEE_CONFIG_JSON")
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw)
                .context("failed to parse MARQUEE_CONFIG_JSON")?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file() {
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read sync config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid sync config {}", path.display())
            }),
            Some("toml") => toml::from_str(&contents).map_err(|err| {
                anyhow!("invalid sync config {}: {}", path.display(), err)
            }),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> anyhow::Result<Self> {
        // Try TOML first, then JSON for convenience.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse sync config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid sync config json: {err}"))
    }

    fn find_default_file() -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "marquee.toml",
            "marquee.json",
            "config/marquee.toml",
            "config/marquee.json",
        ];

        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(|path| path.to_path_buf())
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.page_size == 0 {
            return Err(SyncError::Config("page_size must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(SyncError::Config(
                "poll_interval must be positive".into(),
            ));
        }
        if self.retention_ttl.is_zero() {
            return Err(SyncError::Config(
                "retention_ttl must be positive".into(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(SyncError::Config("api_base_url is empty".into()));
        }
        Ok(())
    }

    /// Retention window as a signed delta for timestamp arithmetic.
    pub fn retention(&self) -> TimeDelta {
        TimeDelta::from_std(self.retention_ttl).unwrap_or(TimeDelta::MAX)
    }

    pub fn image_base(&self) -> ImageBase {
        ImageBase::new(self.image_base_url.clone())
    }
}
