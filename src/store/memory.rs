use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use uuid::Uuid;

use super::{
    NewSignup, SignupReceipt, SignupRecord, SignupStore, SignupSummary, StoreError, StoreResult,
};

/// `SignupStore` that keeps every record in a mutex guarded map keyed by the normalized email.
/// The whole upsert runs under one lock, which gives it the same atomicity as `ON CONFLICT`.
#[derive(Debug, Default)]
pub struct MemorySignupStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, StoredSignup>,
    next_seq: u64,
}

/// A record plus its insertion sequence, used to order signups created in the same instant.
#[derive(Debug)]
struct StoredSignup {
    record: SignupRecord,
    seq: u64,
}

impl MemorySignupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stored record for an already normalized `email`.
    pub fn get(&self, email: &str) -> StoreResult<Option<SignupRecord>> {
        let inner = self.lock()?;
        Ok(inner.records.get(email).map(|entry| entry.record.clone()))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|er| StoreError::Unavailable(format!("memory store lock poisoned: {er}")))
    }
}

#[async_trait::async_trait]
impl SignupStore for MemorySignupStore {
    async fn upsert_signup(&self, signup: NewSignup) -> StoreResult<SignupReceipt> {
        let mut inner = self.lock()?;
        let seq = inner.next_seq;
        let now = Utc::now();

        let receipt = match inner.records.entry(signup.email.clone()) {
            Entry::Occupied(mut occupied) => {
                let record = &mut occupied.get_mut().record;
                record.updated_at = now;
                record.signup_count += 1;
                SignupReceipt::from(&*record)
            }
            Entry::Vacant(vacant) => {
                let record = SignupRecord {
                    id: Uuid::new_v4(),
                    email: signup.email,
                    source: signup.source,
                    ip_address: signup.ip_address,
                    user_agent: signup.user_agent,
                    created_at: now,
                    updated_at: now,
                    signup_count: 1,
                };
                let receipt = SignupReceipt::from(&record);
                vacant.insert(StoredSignup { record, seq });
                receipt
            }
        };
        inner.next_seq += 1;

        Ok(receipt)
    }

    async fn recent_signups(&self, limit: u32) -> StoreResult<Vec<SignupSummary>> {
        let inner = self.lock()?;

        let mut entries = inner.records.values().collect::<Vec<_>>();
        entries.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let signups = entries
            .into_iter()
            .take(limit as usize)
            .map(|entry| SignupSummary::from(&entry.record))
            .collect();

        Ok(signups)
    }
}
