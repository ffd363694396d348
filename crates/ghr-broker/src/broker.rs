use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, warn};

use ghr_core::{TokenBroker, TokenUnavailable};
use ghr_model::RegistrationToken;

use crate::config::BrokerConfig;
use crate::errors::BrokerError;

const ACCEPT_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct RegistrationTokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

/// Token broker backed by the GitHub REST API.
pub struct GithubBroker {
    cfg: BrokerConfig,
    client: reqwest::Client,
}

impl GithubBroker {
    pub fn new(cfg: BrokerConfig) -> Result<Self, BrokerError> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if cfg.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(cfg.timeout_ms));
        }
        let client = builder.build()?;
        Ok(Self { cfg, client })
    }

    fn endpoint(&self, repository: &str) -> String {
        format!(
            "{}/repos/{}/actions/runners/registration-token",
            self.cfg.api_base.trim_end_matches('/'),
            repository
        )
    }

    async fn request_token(
        &self,
        access_token: &str,
        repository: &str,
    ) -> Result<RegistrationToken, BrokerError> {
        let url = self.endpoint(repository);
        debug!(target: "ghr.broker", %url, "requesting registration token");

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header(ACCEPT, ACCEPT_JSON)
            .header(API_VERSION_HEADER, API_VERSION)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let parsed: RegistrationTokenResponse = serde_json::from_str(&body)
            .map_err(|e| BrokerError::InvalidResponse(format!("failed to parse response: {e}")))?;

        if let Some(expires_at) = &parsed.expires_at {
            debug!(target: "ghr.broker", %expires_at, "registration token issued");
        }
        parsed
            .token
            .and_then(|t| RegistrationToken::new(t))
            .ok_or(BrokerError::MissingToken)
    }
}

#[async_trait]
impl TokenBroker for GithubBroker {
    async fn acquire_registration_token(
        &self,
        access_token: &str,
        repository: &str,
    ) -> Result<RegistrationToken, TokenUnavailable> {
        self.request_token(access_token, repository)
            .await
            .map_err(|e| {
                warn!(target: "ghr.broker", %repository, error = %e, "registration token request failed");
                TokenUnavailable::new(e.to_string())
            })
    }
}
