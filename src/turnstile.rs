use crate::config::TurnstileConfig;
use crate::errors::AppError;
use serde::Deserialize;
use std::time::Duration;

/// Siteverify response. Only `success` matters; error codes are logged.
#[derive(Debug, Deserialize)]
pub struct SiteverifyResponse {
    pub success: bool,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

/// Client for Cloudflare Turnstile's server-side token verification.
#[derive(Clone)]
pub struct TurnstileClient {
    client: reqwest::Client,
    verify_url: String,
    secret_key: String,
}

impl TurnstileClient {
    /// Creates a new `TurnstileClient` whose requests give up after `timeout`.
    pub fn new(config: &TurnstileConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Turnstile client: {}", e))
            })?;

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Returns true only if Turnstile positively confirmed the token.
    ///
    /// Network, status and parse errors are logged and count as a failed
    /// verification; they are never returned to the caller.
    pub async fn verify(&self, token: &str) -> bool {
        match self.siteverify(token).await {
            Ok(outcome) if outcome.success => {
                tracing::debug!("✓ Turnstile token verified");
                true
            }
            Ok(outcome) => {
                tracing::warn!(
                    "Turnstile rejected token: error-codes={:?}",
                    outcome.error_codes
                );
                false
            }
            Err(e) => {
                tracing::error!("Turnstile verification error: {}", e);
                false
            }
        }
    }

    async fn siteverify(&self, token: &str) -> Result<SiteverifyResponse, AppError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret_key.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Turnstile request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Turnstile returned {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Turnstile response: {}", e))
        })
    }
}
