use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use serde_with::serde_as;
use sqlx::sqlite::SqliteConnectOptions;
use strum::{Display, EnumString};

use crate::domain::search::{ComposerConfig, InterpreterConfig, RankerConfig, SearchConfig};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub app_url: String,
    pub cors_allowed_origin_suffix: Option<String>,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub path: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_connections: u32,
    pub create_if_missing: bool,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
    }
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct LlmSettings {
    pub api_base: String,
    /// Without a key every AI stage runs degraded.
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub intent_temperature: f32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub response_temperature: f32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub intent_max_tokens: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub response_max_tokens: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub http_timeout_ms: u64,
}

impl LlmSettings {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct SearchSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub default_top_k: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_top_k: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub chat_top_k: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_history_turns: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub upsell_count: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_filter_rows: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub search_deadline_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub chat_deadline_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub intent_timeout_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub embedding_timeout_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub composer_timeout_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub composer_retries: u32,
}

impl Settings {
    pub fn search_config(&self) -> SearchConfig {
        let search = &self.search;
        let llm = &self.llm;

        SearchConfig {
            default_top_k: search.default_top_k,
            max_top_k: search.max_top_k,
            chat_top_k: search.chat_top_k,
            max_history_turns: search.max_history_turns,
            search_deadline: Duration::from_millis(search.search_deadline_ms),
            chat_deadline: Duration::from_millis(search.chat_deadline_ms),
            interpreter: InterpreterConfig {
                temperature: llm.intent_temperature,
                max_tokens: llm.intent_max_tokens,
                timeout: Duration::from_millis(search.intent_timeout_ms),
            },
            ranker: RankerConfig {
                max_filter_rows: search.max_filter_rows,
                embedding_timeout: Duration::from_millis(search.embedding_timeout_ms),
            },
            composer: ComposerConfig {
                temperature: llm.response_temperature,
                max_tokens: llm.response_max_tokens,
                timeout: Duration::from_millis(search.composer_timeout_ms),
                max_retries: search.composer_retries,
                upsell_count: search.upsell_count,
            },
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {e}"))
    })?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("PARTS")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
