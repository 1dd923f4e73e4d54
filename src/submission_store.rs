use crate::errors::{AppError, ResultExt};
use crate::models::{ContactName, Submission};
use axum::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;

/// Length of generated submission ids.
pub const SUBMISSION_ID_LEN: usize = 16;

/// Generates a URL-safe `[0-9A-Za-z]{16}` id from the thread-local CSPRNG.
pub fn generate_submission_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUBMISSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Durable, write-once storage for accepted submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Inserts `submission` exactly once. Any error means nothing was stored.
    async fn insert(&self, submission: &Submission) -> Result<(), AppError>;
}

/// Postgres-backed store writing to the `submissions` table.
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, submission: &Submission) -> Result<(), AppError> {
        let (first_name, last_name, full_name) = match &submission.name {
            ContactName::Split { first, last } => (Some(first.as_str()), Some(last.as_str()), None),
            ContactName::Full(full) => (None, None, Some(full.as_str())),
        };

        sqlx::query(
            r#"
            INSERT INTO submissions
                (id, first_name, last_name, full_name, email, phone, created_at, crm_profile_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&submission.id)
        .bind(first_name)
        .bind(last_name)
        .bind(full_name)
        .bind(&submission.email)
        .bind(submission.phone.as_deref())
        .bind(submission.created_at)
        .bind(submission.crm_profile_id.as_deref())
        .execute(&self.pool)
        .await
        .context("insert submission")?;

        tracing::debug!("Stored submission {}", submission.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_shape() {
        let id = generate_submission_id();
        assert_eq!(id.len(), SUBMISSION_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_submission_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
