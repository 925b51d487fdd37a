//! The storage seam for waitlist signups.
//!
//! Handlers only ever talk to a `dyn SignupStore`, so the Postgres backed store can be swapped
//! for the in-memory one (tests, local runs without a database).
//! Every implementation must keep exactly one record per normalized email and perform
//! the insert-or-touch as a single atomic operation.

mod memory;
mod postgres;

pub use memory::MemorySignupStore;
pub use postgres::PgSignupStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How many signups the listing returns at most.
pub const RECENT_SIGNUPS_LIMIT: u32 = 100;

// ###################################
// ->   STRUCTS
// ###################################
/// A signup that passed validation and is ready to be stored.
/// `email` is already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    pub email: String,
    pub source: String,
    pub ip_address: String,
    pub user_agent: String,
}

/// What the store hands back after an upsert.
/// `created_at` is the time of the *first* signup for this email.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SignupReceipt {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A row of the signup listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SignupSummary {
    pub id: Uuid,
    pub email: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub signup_count: i32,
}

/// The full stored record.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SignupRecord {
    pub id: Uuid,
    pub email: String,
    pub source: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub signup_count: i32,
}

impl From<&SignupRecord> for SignupReceipt {
    fn from(record: &SignupRecord) -> Self {
        SignupReceipt {
            id: record.id,
            email: record.email.clone(),
            created_at: record.created_at,
        }
    }
}

impl From<&SignupRecord> for SignupSummary {
    fn from(record: &SignupRecord) -> Self {
        SignupSummary {
            id: record.id,
            email: record.email.clone(),
            source: record.source.clone(),
            created_at: record.created_at,
            signup_count: record.signup_count,
        }
    }
}

// ###################################
// ->   TRAIT
// ###################################
#[async_trait::async_trait]
pub trait SignupStore: Send + Sync {
    /// Inserts a new signup, or, when the email is already known, bumps `updated_at` and
    /// `signup_count` leaving every other column untouched.
    async fn upsert_signup(&self, signup: NewSignup) -> StoreResult<SignupReceipt>;

    /// Returns at most `limit` signups, newest `created_at` first.
    async fn recent_signups(&self, limit: u32) -> StoreResult<Vec<SignupSummary>>;
}

// ###################################
// ->   ERROR
// ###################################
pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}
