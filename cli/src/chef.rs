use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::ChefSettings;
use recipebox_core::chef::{
    APP_TITLE, ChatResponse, ChefAnswer, ChefError, answer_from_response, build_request,
    error_from_status,
};

/// OpenRouter chat-completions client for the AI Chef.
pub struct ChefClient {
    client: reqwest::Client,
    settings: ChefSettings,
}

impl ChefClient {
    pub fn new(settings: ChefSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "recipebox/{} (AI chef)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    pub async fn ask(&self, query: &str) -> Result<ChefAnswer, ChefError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ChefError::MissingApiKey)?;
        let request = build_request(&self.settings.model, query)?;

        tracing::debug!(model = %self.settings.model, "asking AI chef");
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChefError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = error_from_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "AI chef request failed");
            return Err(err);
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ChefError::Malformed(e.to_string()))?;
        Ok(answer_from_response(data))
    }
}
