use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use member_common::model::{CanonicalMember, DuplicateSet, SourceMember};
use member_common::store::{DestinationStore, InsertError, QueryError, SourceReader};

/// Source and destination kept in memory for end-to-end runs.
#[derive(Default)]
pub struct MemoryStore {
    pub source: Vec<SourceMember>,
    pub destination: Mutex<Vec<CanonicalMember>>,
    pub rejected_names: HashSet<String>,
    pub exists_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(source: Vec<SourceMember>) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    pub fn with_destination(self, names: &[&str]) -> Self {
        self.destination
            .lock()
            .unwrap()
            .extend(names.iter().map(|name| CanonicalMember {
                name: name.to_string(),
                ..Default::default()
            }));
        self
    }

    pub fn rejecting(mut self, names: &[&str]) -> Self {
        self.rejected_names
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn destination_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .destination
            .lock()
            .unwrap()
            .iter()
            .map(|member| member.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceReader for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<SourceMember>, QueryError> {
        Ok(self.source.clone())
    }
}

#[async_trait]
impl DestinationStore for MemoryStore {
    async fn exists_by_names(&self, names: &[String]) -> Result<DuplicateSet, QueryError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        let destination = self.destination.lock().unwrap();

        Ok(destination
            .iter()
            .filter(|member| names.contains(&member.name))
            .map(|member| (member.name.clone(), true))
            .collect())
    }

    async fn insert_one(&self, member: &CanonicalMember) -> Result<(), InsertError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.rejected_names.contains(&member.name) {
            return Err(InsertError::Database(sqlx::Error::Protocol(format!(
                "value too long for {}",
                member.name
            ))));
        }

        self.destination.lock().unwrap().push(member.clone());
        Ok(())
    }
}

pub fn source_member(name: &str, birth_date: &str) -> SourceMember {
    SourceMember {
        name: name.to_owned(),
        birth_date: birth_date.to_owned(),
        baptism_year: "2001".to_owned(),
        has_children: "Sim".to_owned(),
        ..Default::default()
    }
}
