use sqlx::{postgres::PgPoolOptions, PgPool};

const CREATE_SUBMISSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    id              TEXT PRIMARY KEY,
    first_name      TEXT,
    last_name       TEXT,
    full_name       TEXT,
    email           TEXT NOT NULL,
    phone           TEXT,
    created_at      BIGINT NOT NULL,
    crm_profile_id  TEXT,
    CONSTRAINT submissions_name_present CHECK (
        (first_name IS NOT NULL AND last_name IS NOT NULL) OR full_name IS NOT NULL
    )
)
"#;

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Creates the `submissions` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_SUBMISSIONS).execute(&self.pool).await?;
        tracing::debug!("submissions table ready");
        Ok(())
    }
}
