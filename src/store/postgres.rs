use tracing::Instrument;

use crate::database::DbManager;

use super::{NewSignup, SignupReceipt, SignupStore, SignupSummary, StoreResult};

/// `SignupStore` backed by the `waitlist_signups` Postgres table.
#[derive(Clone, Debug)]
pub struct PgSignupStore {
    database_mgr: DbManager,
}

impl PgSignupStore {
    pub fn new(database_mgr: DbManager) -> Self {
        PgSignupStore { database_mgr }
    }

    pub fn database_mgr(&self) -> &DbManager {
        &self.database_mgr
    }
}

#[async_trait::async_trait]
impl SignupStore for PgSignupStore {
    async fn upsert_signup(&self, signup: NewSignup) -> StoreResult<SignupReceipt> {
        let q_span = tracing::debug_span!("Upserting waitlist signup");

        // Conflicts only touch `updated_at` and `signup_count`, the rest keeps the first signup's values.
        let receipt = sqlx::query_as::<_, SignupReceipt>(
            r#"
            INSERT INTO waitlist_signups (email, source, ip_address, user_agent)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET
                updated_at = NOW(),
                signup_count = waitlist_signups.signup_count + 1
            RETURNING id, email, created_at
        "#,
        )
        .bind(&signup.email)
        .bind(&signup.source)
        .bind(&signup.ip_address)
        .bind(&signup.user_agent)
        .fetch_one(self.database_mgr.db())
        .instrument(q_span)
        .await?;

        Ok(receipt)
    }

    async fn recent_signups(&self, limit: u32) -> StoreResult<Vec<SignupSummary>> {
        let signups = sqlx::query_as::<_, SignupSummary>(
            r#"
            SELECT id, email, source, created_at, signup_count
            FROM waitlist_signups
            ORDER BY created_at DESC
            LIMIT $1
        "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.database_mgr.db())
        .await?;

        Ok(signups)
    }
}
