use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time;

use member_common::store::{DestinationStore, SourceReader};
use tracing::{debug, enabled, info, Level};

use crate::duplicates;
use crate::error::MigrationError;
use crate::normalizer::{normalize_all, OnInvalidRecord};
use crate::report::{summarize, RunReport};
use crate::scheduler::InsertScheduler;

/// Stages of a migration run, in the only order they can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Idle,
    Fetched,
    Normalized,
    DuplicatesResolved,
    Inserted,
    Reported,
    Done,
}

#[derive(Debug, Clone)]
pub struct MigrationSettings {
    pub max_concurrent_inserts: NonZeroUsize,
    pub on_invalid_record: OnInvalidRecord,
    /// Directory receiving the duplicate, failure and rejected listings.
    pub report_dir: PathBuf,
}

/// A single migration run from a `SourceReader` into a `DestinationStore`.
pub struct Migration {
    source: Arc<dyn SourceReader>,
    destination: Arc<dyn DestinationStore>,
    settings: MigrationSettings,
    stage: PipelineStage,
}

impl Migration {
    pub fn new(
        source: Arc<dyn SourceReader>,
        destination: Arc<dyn DestinationStore>,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            source,
            destination,
            settings,
            stage: PipelineStage::Idle,
        }
    }

    /// The last stage this run completed.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Run every stage to completion.
    ///
    /// Fetch errors, normalization errors (under `OnInvalidRecord::Abort`) and duplicate lookup
    /// errors abort the run before anything is inserted. Insert failures never abort it: they end
    /// up in the returned report.
    pub async fn run(&mut self) -> Result<RunReport, MigrationError> {
        let started = time::Instant::now();

        let source_members = self
            .source
            .fetch_all()
            .await
            .map_err(MigrationError::Fetch)?;
        if enabled!(Level::DEBUG) {
            for (i, member) in source_members.iter().enumerate() {
                match serde_json::to_string_pretty(member) {
                    Ok(document) => debug!("source member #{}:\n{}", i + 1, document),
                    Err(error) => debug!("failed to render source member #{}: {}", i + 1, error),
                }
            }
        }
        let total_records = source_members.len();
        self.advance(PipelineStage::Fetched);

        let batch = normalize_all(source_members, self.settings.on_invalid_record)?;
        self.advance(PipelineStage::Normalized);

        let names: Vec<String> = batch
            .members
            .iter()
            .map(|member| member.name.clone())
            .collect();
        let duplicates = duplicates::detect(self.destination.as_ref(), &names)
            .await
            .map_err(MigrationError::DuplicateDetection)?;
        self.advance(PipelineStage::DuplicatesResolved);

        let scheduler = InsertScheduler::new(
            self.destination.clone(),
            self.settings.max_concurrent_inserts,
        );
        let scheduled = scheduler.schedule(batch.members, &duplicates).await;
        self.advance(PipelineStage::Inserted);

        let report = summarize(
            scheduled.duplicates,
            scheduled.outcomes,
            batch.rejected,
            total_records,
            started.elapsed(),
        );
        report.write_artifacts(&self.settings.report_dir).await?;
        report.log_summary();
        self.advance(PipelineStage::Reported);

        self.advance(PipelineStage::Done);
        Ok(report)
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(next > self.stage, "cannot go from {:?} to {:?}", self.stage, next);
        info!("migration stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}
