//! Configuration management for the Wordstream server

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::pipeline::PipelineConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// An environment variable that is set but cannot be parsed
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {key}: '{value}'")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Parse `key` if set, otherwise keep `default`
fn var_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let mut pipeline = defaults.pipeline;

        pipeline.limits.max_file_size = var_or("MAX_FILE_SIZE", pipeline.limits.max_file_size)?;
        pipeline.limits.max_paste_length =
            var_or("MAX_PASTE_LENGTH", pipeline.limits.max_paste_length)?;
        pipeline.words_per_minute = var_or("READING_SPEED_WPM", pipeline.words_per_minute)?;
        pipeline.layout.font_size_tolerance =
            var_or("PDF_FONT_SIZE_TOLERANCE", pipeline.layout.font_size_tolerance)?;
        pipeline.layout.paragraph_gap = var_or("PDF_PARAGRAPH_GAP", pipeline.layout.paragraph_gap)?;

        if pipeline.words_per_minute == 0 {
            return Err(ConfigError {
                key: "READING_SPEED_WPM",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: var_or("SERVER_PORT", defaults.server.port)?,
            },
            pipeline,
        })
    }
}
