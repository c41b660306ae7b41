use crate::config::AppConfig;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_TR: &str = "tr-TR,tr;q=0.9,en;q=0.8";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("site returned {0}")]
    Status(StatusCode),
    #[error("site returned an empty page")]
    EmptyBody,
}

/// Where the pipeline gets page markup from
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP page source with a rotated user agent and browser-like headers
pub struct SiteFetcher {
    client: reqwest::Client,
    user_agents: Vec<String>,
}

impl SiteFetcher {
    pub fn new(timeout: Duration, user_agents: Vec<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_TR));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            user_agents,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(config.fetch_timeout, config.user_agents.clone())
    }

    fn pick_user_agent(&self) -> Option<&str> {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}

impl PageSource for SiteFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(agent) = self.pick_user_agent() {
            request = request.header(USER_AGENT, agent);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
