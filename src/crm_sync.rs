//! Best-effort contact sync to the marketing platform.
//!
//! Failures here never fail a submission. They surface as
//! [`SyncOutcome::Degraded`] so the handler's continue-on-failure branch is
//! explicit.

use crate::circuit_breaker::{create_crm_circuit_breaker, CrmCircuitBreaker};
use crate::config::KlaviyoConfig;
use crate::errors::AppError;
use crate::klaviyo::{CrmContact, KlaviyoClient, KlaviyoError};
use failsafe::futures::CircuitBreaker;
use std::time::Duration;

/// Result of a best-effort external call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome<T> {
    /// The call completed.
    Synced(T),
    /// The call failed or was skipped by the circuit breaker; carries the reason.
    Degraded(String),
    /// CRM sync is not part of this deployment.
    Disabled,
}

impl<T> SyncOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            SyncOutcome::Synced(value) => Some(value),
            SyncOutcome::Degraded(_) | SyncOutcome::Disabled => None,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }
}

/// Upserts a profile and subscribes it to the configured list.
#[derive(Clone)]
pub struct CrmSync {
    client: KlaviyoClient,
    list_id: String,
    breaker: CrmCircuitBreaker,
}

impl CrmSync {
    pub fn new(config: &KlaviyoConfig, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: KlaviyoClient::new(config, timeout)?,
            list_id: config.list_id.clone(),
            breaker: create_crm_circuit_breaker(),
        })
    }

    /// Returns the Klaviyo profile id only if both the upsert and the list
    /// subscription succeeded.
    ///
    /// Only outages trip the breaker. A request Klaviyo refuses because of
    /// this contact's data degrades this submission alone.
    pub async fn sync(&self, contact: &CrmContact) -> SyncOutcome<String> {
        let result = self
            .breaker
            .call_with(KlaviyoError::is_outage, async {
                let profile_id = self.client.upsert_profile(contact).await?;
                self.client.bulk_subscribe(contact, &self.list_id).await?;
                Ok::<_, KlaviyoError>(profile_id)
            })
            .await;

        match result {
            Ok(profile_id) => {
                tracing::info!("✓ Contact synced to Klaviyo: profile_id={}", profile_id);
                SyncOutcome::Synced(profile_id)
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::error!("Klaviyo submission error: {}", e);
                SyncOutcome::Degraded(e.to_string())
            }
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Klaviyo circuit open, skipping CRM sync");
                SyncOutcome::Degraded("CRM circuit breaker open".to_string())
            }
        }
    }
}
