use crate::config::KlaviyoConfig;
use crate::errors::AppError;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::Duration;

const JSON_API: &str = "application/vnd.api+json";

/// Failed Klaviyo call.
#[derive(Debug)]
pub struct KlaviyoError {
    /// Set when Klaviyo answered with a non-2xx status; `None` for transport,
    /// timeout and decode failures.
    pub status: Option<StatusCode>,
    pub message: String,
}

impl KlaviyoError {
    fn transport(message: String) -> Self {
        Self { status: None, message }
    }

    /// Whether this failure says Klaviyo itself is unhealthy. A 4xx other than
    /// 429 is about the request (e.g. a phone Klaviyo refuses) and says
    /// nothing about availability.
    pub fn is_outage(&self) -> bool {
        match self.status {
            None => true,
            Some(status) => status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl fmt::Display for KlaviyoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for KlaviyoError {}

/// Contact attributes pushed to Klaviyo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmContact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// E.164 phone; when present the profile is also subscribed to SMS.
    pub phone_number: Option<String>,
}

/// Client for the Klaviyo REST API (JSON:API flavoured).
#[derive(Clone)]
pub struct KlaviyoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    revision: String,
}

impl KlaviyoClient {
    /// Creates a new `KlaviyoClient` whose requests give up after `timeout`.
    pub fn new(config: &KlaviyoConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Klaviyo client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            revision: config.revision.clone(),
        })
    }

    /// Creates or updates a profile and returns its Klaviyo id.
    ///
    /// `POST /api/profile-import` matches on email, so resubmitting the form
    /// updates the existing profile instead of duplicating it.
    pub async fn upsert_profile(&self, contact: &CrmContact) -> Result<String, KlaviyoError> {
        let mut attributes = Map::new();
        attributes.insert("email".to_string(), json!(contact.email));
        attributes.insert("first_name".to_string(), json!(contact.first_name));
        attributes.insert("last_name".to_string(), json!(contact.last_name));
        if let Some(ref phone) = contact.phone_number {
            attributes.insert("phone_number".to_string(), json!(phone));
        }

        let body = json!({
            "data": {
                "type": "profile",
                "attributes": attributes
            }
        });

        let data = self.post("/api/profile-import", &body).await?;

        let profile_id = data
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(|i| i.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                tracing::warn!("Unexpected Klaviyo profile response: {:?}", data);
                KlaviyoError::transport("Profile response missing 'data.id'".to_string())
            })?;

        tracing::debug!("Klaviyo profile upserted: {}", profile_id);
        Ok(profile_id)
    }

    /// Subscribes a contact to `list_id`: email marketing always, SMS marketing
    /// only when the contact has a phone number. Klaviyo runs the job
    /// asynchronously and answers `202 Accepted`.
    pub async fn bulk_subscribe(
        &self,
        contact: &CrmContact,
        list_id: &str,
    ) -> Result<(), KlaviyoError> {
        let mut subscriptions = Map::new();
        subscriptions.insert(
            "email".to_string(),
            json!({ "marketing": { "consent": "SUBSCRIBED" } }),
        );

        let mut profile = Map::new();
        profile.insert("email".to_string(), json!(contact.email));
        if let Some(ref phone) = contact.phone_number {
            profile.insert("phone_number".to_string(), json!(phone));
            subscriptions.insert(
                "sms".to_string(),
                json!({ "marketing": { "consent": "SUBSCRIBED" } }),
            );
        }
        profile.insert("subscriptions".to_string(), Value::Object(subscriptions));

        let body = json!({
            "data": {
                "type": "profile-subscription-bulk-create-job",
                "attributes": {
                    "profiles": {
                        "data": [
                            { "type": "profile", "attributes": profile }
                        ]
                    }
                },
                "relationships": {
                    "list": {
                        "data": { "type": "list", "id": list_id }
                    }
                }
            }
        });

        self.post("/api/profile-subscription-bulk-create-jobs", &body)
            .await?;

        tracing::debug!("Klaviyo subscription job accepted for list {}", list_id);
        Ok(())
    }

    /// Sends an authenticated JSON:API POST. Returns the parsed body, or
    /// `Value::Null` for empty bodies (202 responses carry none).
    async fn post(&self, path: &str, body: &Value) -> Result<Value, KlaviyoError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Klaviyo-API-Key {}", self.api_key))
            .header("revision", &self.revision)
            .header("accept", JSON_API)
            .header("content-type", JSON_API)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| KlaviyoError::transport(format!("Klaviyo request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| KlaviyoError::transport(format!("Failed to read Klaviyo response: {}", e)))?;

        if !status.is_success() {
            return Err(KlaviyoError {
                status: Some(status),
                message: format!("Klaviyo {} returned {}: {}", path, status, text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            KlaviyoError::transport(format!("Failed to parse Klaviyo response: {}", e))
        })
    }
}
