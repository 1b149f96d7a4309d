use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use cupid_api::ApiConfig;
use cupid_api::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use cupid_app::guard::DEFAULT_LOGIN_PATH;

pub const DEFAULT_SESSION_PATH: &str = "cupid-session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub session_path: PathBuf,
    pub login_path: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("CUPID_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let session_path = lookup("CUPID_SESSION_PATH").unwrap_or_else(|| DEFAULT_SESSION_PATH.into());
        let login_path = lookup("CUPID_LOGIN_PATH").unwrap_or_else(|| DEFAULT_LOGIN_PATH.into());
        let http_timeout = match lookup("CUPID_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("CUPID_HTTP_TIMEOUT_SECS is not a number: {:?}", raw))?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_url,
            session_path: PathBuf::from(session_path),
            login_path,
            http_timeout,
        })
    }

    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout: self.http_timeout,
        }
    }
}
