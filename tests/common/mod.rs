//! Shared fixtures for integration tests: in-memory stores, config builders
//! and Turnstile/Klaviyo mocks.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::async_trait;
use lead_capture_api::config::{
    Config, CrmSyncMode, KlaviyoConfig, SubmissionConfig, TurnstileConfig,
};
use lead_capture_api::errors::AppError;
use lead_capture_api::models::{LeadForm, Submission};
use lead_capture_api::submission::SubmissionHandler;
use lead_capture_api::submission_store::SubmissionStore;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GOOD_TOKEN: &str = "good-token";
pub const BAD_TOKEN: &str = "bad-token";
pub const PROFILE_ID: &str = "01JPROFILE123";
pub const LIST_ID: &str = "RDWzRd";
pub const API_KEY: &str = "pk_test_123";
pub const REVISION: &str = "2024-10-15";

/// A URL nothing listens on.
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Store keeping rows in memory.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Submission>>,
}

impl MemoryStore {
    pub fn rows(&self) -> Vec<Submission> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert(&self, submission: &Submission) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| row.id == submission.id) {
            return Err(AppError::InternalError(format!(
                "duplicate submission id {}",
                submission.id
            )));
        }
        rows.push(submission.clone());
        Ok(())
    }
}

/// Store whose every insert fails, like a database that is down. Reads go to
/// the same rows a successful insert would have written.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    pub fn rows(&self) -> Vec<Submission> {
        self.inner.rows()
    }
}

#[async_trait]
impl SubmissionStore for FailingStore {
    async fn insert(&self, _submission: &Submission) -> Result<(), AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }
}

pub fn test_config(turnstile_base: &str, klaviyo_base: Option<&str>, submission: SubmissionConfig) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        turnstile: TurnstileConfig {
            secret_key: "turnstile-secret".to_string(),
            verify_url: format!("{}/siteverify", turnstile_base),
        },
        klaviyo: klaviyo_base.map(|base| KlaviyoConfig {
            api_key: API_KEY.to_string(),
            list_id: LIST_ID.to_string(),
            base_url: base.to_string(),
            revision: REVISION.to_string(),
        }),
        submission: SubmissionConfig {
            crm_sync: if klaviyo_base.is_some() {
                submission.crm_sync
            } else {
                CrmSyncMode::Disabled
            },
            ..submission
        },
        outbound_timeout: Duration::from_secs(2),
    }
}

pub fn handler(config: &Config, store: Arc<dyn SubmissionStore>) -> SubmissionHandler {
    SubmissionHandler::from_config(config, store).unwrap()
}

pub fn split_form() -> LeadForm {
    LeadForm {
        firstname: Some("Ada".to_string()),
        lastname: Some("Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        phone: Some("(123) 456-7890".to_string()),
        confirm_policies: Some("on".to_string()),
        captcha_response: Some(GOOD_TOKEN.to_string()),
        ..Default::default()
    }
}

/// Turnstile accepting `GOOD_TOKEN` and rejecting everything else.
pub async fn mount_turnstile(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string_contains(format!("response={}", GOOD_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "error-codes": [],
            "hostname": "example.com"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string_contains(format!("response={}", BAD_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error-codes": ["invalid-input-response"]
        })))
        .mount(server)
        .await;
}

pub async fn mount_profile_import(server: &MockServer, status: u16) {
    let template = if status < 300 {
        ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "data": {
                "type": "profile",
                "id": PROFILE_ID,
                "attributes": { "email": "ada@example.com" }
            }
        }))
    } else {
        ResponseTemplate::new(status).set_body_string("upstream error")
    };

    Mock::given(method("POST"))
        .and(path("/api/profile-import"))
        .respond_with(template)
        .mount(server)
        .await;
}

pub async fn mount_bulk_subscribe(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/profile-subscription-bulk-create-jobs"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Parsed JSON bodies of every request `server` received on `request_path`.
pub async fn bodies(server: &MockServer, request_path: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == request_path)
        .map(|req| serde_json::from_slice(&req.body).unwrap())
        .collect()
}
