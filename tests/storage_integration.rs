use std::env;

use lead_capture_api::db::Database;
use lead_capture_api::models::{ContactName, Submission};
use lead_capture_api::submission_store::{generate_submission_id, PgSubmissionStore, SubmissionStore};

/// Integration smoke test for the Postgres submission store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn store_submission_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    db.ensure_schema().await?;
    let store = PgSubmissionStore::new(db.pool.clone());

    let submission = Submission {
        id: generate_submission_id(),
        name: ContactName::Split {
            first: "Test".to_string(),
            last: "Lead".to_string(),
        },
        email: "smoke-test@example.com".to_string(),
        phone: Some("+11234567890".to_string()),
        created_at: chrono::Utc::now().timestamp(),
        crm_profile_id: None,
    };

    store.insert(&submission).await?;

    let (email, crm_profile_id): (String, Option<String>) =
        sqlx::query_as("SELECT email, crm_profile_id FROM submissions WHERE id = $1")
            .bind(&submission.id)
            .fetch_one(&db.pool)
            .await?;
    assert_eq!(email, submission.email);
    assert_eq!(crm_profile_id, None);

    // Same id twice must fail rather than overwrite
    assert!(store.insert(&submission).await.is_err());

    Ok(())
}
