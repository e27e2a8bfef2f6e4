use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time;

use async_trait::async_trait;
use member_common::model::{CanonicalMember, DuplicateSet, SourceMember};
use member_common::store::{DestinationStore, InsertError, QueryError, SourceReader};

/// In-memory stand-in for both ends of a migration.
#[derive(Default)]
pub struct FakeStore {
    pub source: Vec<SourceMember>,
    pub existing: Mutex<HashSet<String>>,
    /// Names whose insert is rejected by the "database".
    pub failing_names: HashSet<String>,
    pub insert_delay: time::Duration,
    pub fetch_times_out: bool,
    pub exists_times_out: bool,
    pub exists_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeStore {
    pub fn with_existing(self, names: &[&str]) -> Self {
        self.existing
            .lock()
            .unwrap()
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn with_failing(mut self, names: &[&str]) -> Self {
        self.failing_names
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn with_insert_delay(mut self, delay: time::Duration) -> Self {
        self.insert_delay = delay;
        self
    }

    pub fn stored_names(&self) -> HashSet<String> {
        self.existing.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceReader for FakeStore {
    async fn fetch_all(&self) -> Result<Vec<SourceMember>, QueryError> {
        if self.fetch_times_out {
            return Err(QueryError::Timeout {
                command: "SELECT".to_owned(),
                timeout: time::Duration::from_secs(15),
            });
        }
        Ok(self.source.clone())
    }
}

#[async_trait]
impl DestinationStore for FakeStore {
    async fn exists_by_names(&self, names: &[String]) -> Result<DuplicateSet, QueryError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);

        if self.exists_times_out {
            return Err(QueryError::Timeout {
                command: "SELECT".to_owned(),
                timeout: time::Duration::from_secs(15),
            });
        }

        let existing = self.existing.lock().unwrap();
        Ok(names
            .iter()
            .filter(|name| existing.contains(*name))
            .map(|name| (name.to_owned(), true))
            .collect())
    }

    async fn insert_one(&self, member: &CanonicalMember) -> Result<(), InsertError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.insert_delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_names.contains(&member.name) {
            return Err(InsertError::Database(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint".to_owned(),
            )));
        }

        self.existing.lock().unwrap().insert(member.name.clone());
        Ok(())
    }
}
