use dotenv::dotenv;
use std::env;
use thiserror::Error;
use url::Url;

#[derive(Debug)]
pub struct Config {
    pub access_token: String,
    pub ad_account_id: String,
    pub graph_base_url: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    MissingEnv(String),
    #[error("Invalid graph base URL: {0}")]
    InvalidBaseUrl(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let access_token = env::var("FB_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnv("FB_ACCESS_TOKEN".to_string()))?;

        let ad_account_id = env::var("FB_AD_ACCOUNT_ID")
            .map_err(|_| ConfigError::MissingEnv("FB_AD_ACCOUNT_ID".to_string()))?;

        // Optional override, mainly for pointing at a test endpoint
        let graph_base_url = env::var("GRAPH_BASE_URL").ok();
        if let Some(base) = &graph_base_url {
            Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        }

        Ok(Self {
            access_token,
            ad_account_id,
            graph_base_url,
        })
    }
}
