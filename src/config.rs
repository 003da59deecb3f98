//! Configuration for the Rev gateway
//!
//! Settings come from an optional TOML file merged with environment
//! variables; the API key is only ever read from the environment.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::gemini;
use crate::{Error, Result};

/// Environment variable holding the generative-language API key
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Port the HTTP/WebSocket server listens on
    pub port: u16,

    /// Generative-language API key (from `GEMINI_API_KEY`)
    pub api_key: SecretString,

    /// Generation API base URL
    pub base_url: String,

    /// Initially selected generation model
    pub model: String,

    /// Directory of static web assets to serve, if any
    pub static_dir: Option<PathBuf>,
}

/// On-disk configuration file shape; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    model: Option<String>,
    static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an optional TOML file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the API key is missing or the
    /// configured model is outside the permitted list, and propagates file
    /// read/parse failures.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file_config = match file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str::<ConfigFile>(&raw)?
            }
            None => ConfigFile::default(),
        };

        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::Config(format!("{API_KEY_ENV} is not set")))?;
        if api_key.is_empty() {
            return Err(Error::Config(format!("{API_KEY_ENV} is empty")));
        }

        let model = std::env::var("REV_MODEL")
            .ok()
            .or(file_config.model)
            .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
        if !gemini::is_available(&model) {
            return Err(Error::Config(format!("unknown model in config: {model}")));
        }

        let base_url = std::env::var("REV_BASE_URL")
            .ok()
            .or(file_config.base_url)
            .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string());

        Ok(Self {
            port: 3000,
            api_key: SecretString::from(api_key),
            base_url,
            model,
            static_dir: file_config.static_dir,
        })
    }
}
