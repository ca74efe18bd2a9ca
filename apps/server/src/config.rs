//! Static configuration for the instrument metadata service
//!
//! Layered, lowest precedence first:
//! - built-in defaults
//! - `config.{yaml,toml,json}` in the working directory (or `INSTRUMETA_CONFIG`)
//! - `.env` file values and process environment, `INSTRUMETA__SECTION__KEY`

use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `INSTRUMETA__SEARCH__URL`.
pub const ENV_PREFIX: &str = "INSTRUMETA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search index settings.
///
/// With no `url` the search index is considered absent and every list request
/// takes the relational path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Prepended to every entity index name.
    #[serde(default)]
    pub index_prefix: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: None,
            index_prefix: String::new(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl SearchConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub file_enabled: bool,
    #[serde(default = "default_log_directory")]
    pub file_directory: String,
    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    #[serde(default = "default_log_rotation")]
    pub file_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file_enabled: false,
            file_directory: default_log_directory(),
            file_prefix: default_log_prefix(),
            file_rotation: default_log_rotation(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    10_000
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "instrumeta".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Config {
    /// Load configuration from files and environment.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let file = std::env::var(format!("{}_CONFIG", ENV_PREFIX))
            .unwrap_or_else(|_| "config".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.search.default_page_size == 0 {
            return Err(crate::Error::Validation(
                "search.default_page_size must be at least 1".to_string(),
            ));
        }
        if self.search.default_page_size > self.search.max_page_size {
            return Err(crate::Error::Validation(format!(
                "search.default_page_size ({}) exceeds search.max_page_size ({})",
                self.search.default_page_size, self.search.max_page_size
            )));
        }
        Ok(())
    }
}
