use std::path::PathBuf;

use anyhow::{Context, Result};
use diligence::security::SecretString;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_SEARCH_RPS: u32 = 5;

/// Which search provider to call.
#[derive(Debug, Clone)]
pub enum SearchBackend {
    Serper(SecretString),
    Tavily(SecretString),
}

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absent when neither search key is set; only `run` needs it.
    pub search: Option<SearchBackend>,
    /// Absent selects pattern extraction only.
    pub openai_api_key: Option<SecretString>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub data_dir: PathBuf,
    pub search_rps: u32,
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secret = |name: &str| var(name).map(SecretString::new);

        let search = match (secret("SERPER_API_KEY"), secret("TAVILY_API_KEY")) {
            (Some(key), _) => Some(SearchBackend::Serper(key)),
            (None, Some(key)) => Some(SearchBackend::Tavily(key)),
            (None, None) => None,
        };

        let search_rps = match var("DILIGENCE_SEARCH_RPS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("DILIGENCE_SEARCH_RPS must be a valid number")?,
            None => DEFAULT_SEARCH_RPS,
        };

        Ok(Self {
            search,
            openai_api_key: secret("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL"),
            openai_base_url: var("OPENAI_BASE_URL"),
            data_dir: var("DILIGENCE_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            search_rps,
        })
    }
}
