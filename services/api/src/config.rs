//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use course_core::GenerationPolicy;
use tracing::Level;

/// Accepted range for `SESSION_TTL_DAYS`.
const SESSION_TTL_DAYS: RangeInclusive<i64> = 1..=3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Postgres URL. When unset the server keeps courses in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: String,
    pub generation_model: String,
    pub generation_timeout: Duration,
    pub youtube_api_key: Option<String>,
    pub quiz_max_questions: u32,
    pub videos_per_query: usize,
    pub allowed_origins: Vec<String>,
    pub session_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name to its value.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        // --- Load Server and Database Settings ---
        let bind_address: SocketAddr =
            parse_var(&var, "BIND_ADDRESS", "0.0.0.0:5000".parse().ok())?;
        let database_url = var("DATABASE_URL");

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys ---
        let openai_api_key = var("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let youtube_api_key = var("YOUTUBE_API_KEY");

        // --- Load Generation Settings ---
        let generation_model =
            var("GENERATION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let timeout_secs: u64 = parse_var(&var, "GENERATION_TIMEOUT_SECS", Some(30))?;
        let quiz_max_questions: u32 = parse_var(&var, "QUIZ_MAX_QUESTIONS", Some(10))?;
        let videos_per_query: usize = parse_var(&var, "VIDEOS_PER_QUERY", Some(2))?;

        // --- Load Web Settings ---
        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let session_ttl_days: i64 = parse_var(&var, "SESSION_TTL_DAYS", Some(30))?;

        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "GENERATION_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if !SESSION_TTL_DAYS.contains(&session_ttl_days) {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!(
                    "must be between {} and {}",
                    SESSION_TTL_DAYS.start(),
                    SESSION_TTL_DAYS.end()
                ),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            generation_model,
            generation_timeout: Duration::from_secs(timeout_secs),
            youtube_api_key,
            quiz_max_questions,
            videos_per_query,
            allowed_origins,
            session_ttl_days,
        })
    }

    /// The orchestrator limits derived from this configuration.
    pub fn generation_policy(&self) -> GenerationPolicy {
        GenerationPolicy {
            quiz_max_questions: self.quiz_max_questions,
            default_video_results: self.videos_per_query,
            ..GenerationPolicy::default()
        }
    }
}

impl Default for Config {
    /// Local-development defaults: in-memory storage, no API keys.
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_url: None,
            log_level: Level::INFO,
            openai_api_key: String::new(),
            generation_model: "gpt-4o-mini".to_string(),
            generation_timeout: Duration::from_secs(30),
            youtube_api_key: None,
            quiz_max_questions: 10,
            videos_per_query: 2,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            session_ttl_days: 30,
        }
    }
}

/// Reads and parses `name`, falling back to `default` when it is unset.
fn parse_var<T: FromStr>(
    var: impl Fn(&str) -> Option<String>,
    name: &str,
    default: Option<T>,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(name.to_string())),
    }
}
