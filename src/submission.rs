//! Lead submission pipeline.
//!
//! Flow:
//! 1. Validate the form (no side effects on failure).
//! 2. Verify the Turnstile token (fail closed).
//! 3. Resolve the phone number.
//! 4. Sync the contact to Klaviyo (best effort).
//! 5. Insert the submission (fatal on failure).

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::config::{Config, CrmSyncMode, SubmissionConfig};
use crate::crm_sync::{CrmSync, SyncOutcome};
use crate::errors::AppError;
use crate::klaviyo::CrmContact;
use crate::models::{LeadForm, Submission, SubmitResponse, ValidatedLead};
use crate::phone::resolve_phone;
use crate::submission_store::{generate_submission_id, SubmissionStore};
use crate::turnstile::TurnstileClient;
use crate::validation::validate_lead;

pub const CAPTCHA_FAILED: &str = "CAPTCHA verification failed. Please try again.";
pub const STORE_FAILED: &str = "Failed to store your submission. Please try again.";

/// Where a submission is in the pipeline. Stages only move forward; both
/// `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Validated,
    ChallengeVerified,
    CrmSynced,
    CrmSkipped,
    Stored,
    Succeeded,
    Failed,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionStage::Received => "received",
            SubmissionStage::Validated => "validated",
            SubmissionStage::ChallengeVerified => "challenge_verified",
            SubmissionStage::CrmSynced => "crm_synced",
            SubmissionStage::CrmSkipped => "crm_skipped",
            SubmissionStage::Stored => "stored",
            SubmissionStage::Succeeded => "succeeded",
            SubmissionStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Orchestrates one lead submission end to end.
#[derive(Clone)]
pub struct SubmissionHandler {
    settings: SubmissionConfig,
    verifier: TurnstileClient,
    crm: Option<CrmSync>,
    store: Arc<dyn SubmissionStore>,
}

impl SubmissionHandler {
    /// `crm` is ignored when `settings.crm_sync` is disabled.
    pub fn new(
        settings: SubmissionConfig,
        verifier: TurnstileClient,
        crm: Option<CrmSync>,
        store: Arc<dyn SubmissionStore>,
    ) -> Self {
        let crm = match settings.crm_sync {
            CrmSyncMode::Enabled => crm,
            CrmSyncMode::Disabled => None,
        };

        Self {
            settings,
            verifier,
            crm,
            store,
        }
    }

    /// Builds the Turnstile and Klaviyo clients from `config`.
    pub fn from_config(config: &Config, store: Arc<dyn SubmissionStore>) -> Result<Self, AppError> {
        let verifier = TurnstileClient::new(&config.turnstile, config.outbound_timeout)?;
        let crm = config
            .klaviyo
            .as_ref()
            .map(|k| CrmSync::new(k, config.outbound_timeout))
            .transpose()?;

        Ok(Self::new(config.submission, verifier, crm, store))
    }

    pub fn settings(&self) -> &SubmissionConfig {
        &self.settings
    }

    /// Runs the pipeline for one form post.
    ///
    /// Errors: `Validation` and `Unauthorized` happen before any CRM call or
    /// storage write; `InternalError` means the store rejected the insert and
    /// nothing was persisted.
    pub async fn submit(&self, form: LeadForm) -> Result<SubmitResponse, AppError> {
        let mut stage = SubmissionStage::Received;

        let lead = validate_lead(&form, self.settings.name_mode).map_err(|e| {
            tracing::info!(
                stage = %SubmissionStage::Failed,
                failed_at = %stage,
                "Lead form rejected: {}",
                e
            );
            AppError::Validation(e)
        })?;
        stage = SubmissionStage::Validated;

        if !self.verifier.verify(&lead.captcha_token).await {
            tracing::warn!(
                stage = %SubmissionStage::Failed,
                failed_at = %stage,
                "CAPTCHA verification failed"
            );
            return Err(AppError::Unauthorized(CAPTCHA_FAILED.to_string()));
        }
        stage = SubmissionStage::ChallengeVerified;
        tracing::debug!(%stage, "Lead passed CAPTCHA");

        let phone = resolve_phone(lead.phone.as_deref(), self.settings.phone_mode);

        let outcome = self.sync_contact(&lead, phone.dialable.clone()).await;
        stage = if outcome.is_synced() {
            SubmissionStage::CrmSynced
        } else {
            SubmissionStage::CrmSkipped
        };
        if let SyncOutcome::Degraded(ref reason) = outcome {
            tracing::warn!(%stage, "Continuing without CRM profile: {}", reason);
        }

        let submission = Submission {
            id: generate_submission_id(),
            name: lead.name,
            email: lead.email,
            phone: phone.stored,
            created_at: Utc::now().timestamp(),
            crm_profile_id: outcome.into_value(),
        };

        if let Err(e) = self.store.insert(&submission).await {
            tracing::error!(
                stage = %SubmissionStage::Failed,
                failed_at = %stage,
                submission_id = %submission.id,
                "Database insertion error: {}",
                e
            );
            return Err(AppError::InternalError(STORE_FAILED.to_string()));
        }
        stage = SubmissionStage::Stored;
        tracing::debug!(%stage, submission_id = %submission.id, "Submission persisted");

        stage = SubmissionStage::Succeeded;
        tracing::info!(
            %stage,
            submission_id = %submission.id,
            crm_profile_id = ?submission.crm_profile_id,
            "📨 Lead submission accepted"
        );

        Ok(SubmitResponse {
            success: true,
            external_profile_id: submission.crm_profile_id,
        })
    }

    async fn sync_contact(&self, lead: &ValidatedLead, phone: Option<String>) -> SyncOutcome<String> {
        let Some(ref crm) = self.crm else {
            return SyncOutcome::Disabled;
        };

        let (first_name, last_name) = lead.name.parts();
        let contact = CrmContact {
            email: lead.email.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone_number: phone,
        };

        crm.sync(&contact).await
    }
}
