use sqlx::{postgres::PgPoolOptions, Connection, PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::DbConfig;

#[derive(Clone, Debug)]
pub struct DbManager {
    db: PgPool,
}

impl DbManager {
    pub async fn init(db_config: &DbConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB pool", "init_db");

        let db_pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(db_config.acquire_timeout())
            .connect_with(db_config.connection_options())
            .await
            .map_err(|ex| Error::FailToCreatePool(ex.to_string()))?;

        let dm = Self { db: db_pool };
        if db_config.run_migrations {
            dm.migrate().await?;
        }

        Ok(dm)
    }

    /// Creates a fresh, randomly named database next to the configured one, migrates it
    /// and returns a manager connected to it.
    pub async fn init_for_test(db_config: &DbConfig) -> Result<Self> {
        let mut db_config = db_config.clone();
        db_config.db_name = format!("waitlist_test_{}", Uuid::new_v4().simple());

        let mut connection =
            PgConnection::connect_with(&db_config.connection_options_without_db()).await?;
        let sql = format!(r#"CREATE DATABASE "{}";"#, db_config.db_name);
        sqlx::query(&sql).execute(&mut connection).await?;

        db_config.run_migrations = true;
        Self::init(&db_config).await
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("{:<20} - Running migrations", "migrate_db");
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create db pool: {0}")]
    FailToCreatePool(String),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
