mod client;

pub use client::HaHttpClient;

use serde::Deserialize;

const SUPERVISOR_TOKEN_ENV: &str = "SUPERVISOR_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct HomeAssistantConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Falls back to the supervisor token when running as an add-on.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://supervisor/core".to_owned()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HomeAssistantConfig {
    pub fn new_client(&self) -> anyhow::Result<HaHttpClient> {
        let token = self.resolve_token(std::env::var(SUPERVISOR_TOKEN_ENV).ok());
        if token.is_none() {
            tracing::warn!("No Home Assistant token configured, requests will be unauthenticated");
        }

        HaHttpClient::new(&self.url, token, self.timeout_secs)
    }

    fn resolve_token(&self, supervisor_token: Option<String>) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or(supervisor_token.filter(|t| !t.trim().is_empty()))
    }
}
