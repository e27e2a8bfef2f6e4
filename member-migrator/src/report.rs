use std::fmt;
use std::path::{Path, PathBuf};
use std::time;

use member_common::model::InsertOutcome;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub const DUPLICATES_FILE: &str = "duplicates.txt";
pub const FAILURES_FILE: &str = "failures.txt";
pub const REJECTED_FILE: &str = "rejected.txt";

/// A member that was not migrated, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMember {
    pub name: String,
    pub reason: String,
}

impl fmt::Display for FailedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Everything a run has to say once it's over.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Names skipped because they already exist at the destination.
    pub duplicates: Vec<String>,
    /// Members whose insert failed.
    pub failures: Vec<FailedMember>,
    /// Members left out because they could not be normalized.
    pub rejected: Vec<FailedMember>,
    pub total_records: usize,
    pub inserted: usize,
    pub elapsed: time::Duration,
}

/// The listings written by `RunReport::write_artifacts`. `None` means the listing was empty.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub duplicates: Option<PathBuf>,
    pub failures: Option<PathBuf>,
    pub rejected: Option<PathBuf>,
}

/// Build the report of a run. Successful outcomes are only counted, failures are kept in full.
pub fn summarize(
    duplicates: Vec<String>,
    outcomes: Vec<InsertOutcome>,
    rejected: Vec<FailedMember>,
    total_records: usize,
    elapsed: time::Duration,
) -> RunReport {
    let mut inserted = 0;
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.failure {
            None => inserted += 1,
            Some(reason) => failures.push(FailedMember {
                name: outcome.name,
                reason,
            }),
        }
    }

    RunReport {
        duplicates,
        failures,
        rejected,
        total_records,
        inserted,
        elapsed,
    }
}

impl RunReport {
    /// Write each non-empty listing to its own file in `dir`, one entry per line.
    /// Empty listings produce no file, only a log line.
    pub async fn write_artifacts(&self, dir: &Path) -> Result<Artifacts, std::io::Error> {
        let duplicates = write_listing(dir, DUPLICATES_FILE, &self.duplicates).await?;
        if duplicates.is_none() {
            info!("0 duplicate members found");
        }

        let failures = write_listing(dir, FAILURES_FILE, &self.failures).await?;
        if failures.is_none() {
            info!("0 members failed to insert");
        }

        let rejected = write_listing(dir, REJECTED_FILE, &self.rejected).await?;

        Ok(Artifacts {
            duplicates,
            failures,
            rejected,
        })
    }

    pub fn log_summary(&self) {
        info!(
            total_records = self.total_records,
            inserted = self.inserted,
            duplicates = self.duplicates.len(),
            failures = self.failures.len(),
            rejected = self.rejected.len(),
            "migration finished in {:?}",
            self.elapsed
        );
    }
}

async fn write_listing<T: fmt::Display>(
    dir: &Path,
    file_name: &str,
    entries: &[T],
) -> Result<Option<PathBuf>, std::io::Error> {
    if entries.is_empty() {
        return Ok(None);
    }

    let path = dir.join(file_name);
    let mut file = tokio::fs::File::create(&path).await?;
    for entry in entries {
        file.write_all(format!("{entry}\n").as_bytes()).await?;
    }
    file.flush().await?;

    info!("wrote {} entries to {}", entries.len(), path.display());

    Ok(Some(path))
}
