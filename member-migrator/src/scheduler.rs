use std::num::NonZeroUsize;
use std::sync::Arc;

use member_common::model::{CanonicalMember, DuplicateSet, InsertOutcome};
use member_common::store::DestinationStore;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Members routed away from insertion, and the outcome of every insert that was attempted.
#[derive(Debug, Default)]
pub struct ScheduleResult {
    pub duplicates: Vec<String>,
    /// In completion order, which differs from submission order.
    pub outcomes: Vec<InsertOutcome>,
}

/// Inserts members into a `DestinationStore` with a bounded number of concurrent inserts.
pub struct InsertScheduler {
    /// The store shared by every insert task.
    store: Arc<dyn DestinationStore>,
    /// Maximum number of inserts in flight at any time.
    max_concurrent_inserts: usize,
}

impl InsertScheduler {
    pub fn new(store: Arc<dyn DestinationStore>, max_concurrent_inserts: NonZeroUsize) -> Self {
        Self {
            store,
            max_concurrent_inserts: max_concurrent_inserts.get(),
        }
    }

    /// Insert every member whose name is not in `duplicates`, and wait for all inserts to finish.
    ///
    /// A permit is acquired before each task is spawned, so submission waits whenever
    /// `max_concurrent_inserts` inserts are already in flight. Each task makes a single insert
    /// attempt; a failed or panicked task is reported as a failed outcome for its member and
    /// never affects the others.
    pub async fn schedule(
        &self,
        members: Vec<CanonicalMember>,
        duplicates: &DuplicateSet,
    ) -> ScheduleResult {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_inserts));
        let (outcome_tx, mut outcome_rx) =
            mpsc::channel::<InsertOutcome>(self.max_concurrent_inserts);

        // Owns the only original sender, so the collector stops once this and every task are done.
        let submit = async move {
            let report_semaphore_utilization = || {
                metrics::gauge!("member_insert_pool_saturation_percent").set(
                    1f64 - semaphore.available_permits() as f64
                        / self.max_concurrent_inserts as f64,
                );
            };
            let mut duplicate_names = Vec::new();
            let mut tasks = Vec::new();

            for member in members {
                if duplicates.contains_key(&member.name) {
                    duplicate_names.push(member.name);
                    continue;
                }

                report_semaphore_utilization();
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("semaphore has been closed");

                let name = member.name.clone();
                let task =
                    spawn_insert_task(self.store.clone(), permit, outcome_tx.clone(), member);
                tasks.push((name, task));
            }

            (duplicate_names, tasks)
        };

        let collect = async {
            let mut outcomes = Vec::new();
            while let Some(outcome) = outcome_rx.recv().await {
                outcomes.push(outcome);
            }
            outcomes
        };

        let ((duplicates, tasks), mut outcomes) = tokio::join!(submit, collect);

        for (name, task) in tasks {
            if let Err(join_error) = task.await {
                error!("insert task for {} did not complete: {}", name, join_error);
                metrics::counter!("member_inserts_failed").increment(1);
                outcomes.push(InsertOutcome::failed(
                    &name,
                    &format!("insert task did not complete: {join_error}"),
                ));
            }
        }

        ScheduleResult {
            duplicates,
            outcomes,
        }
    }
}

/// Spawn a Tokio task that inserts `member` while holding `permit`, then sends its outcome.
fn spawn_insert_task(
    store: Arc<dyn DestinationStore>,
    permit: OwnedSemaphorePermit,
    outcome_tx: mpsc::Sender<InsertOutcome>,
    member: CanonicalMember,
) -> JoinHandle<()> {
    metrics::counter!("member_inserts_total").increment(1);

    tokio::spawn(async move {
        let outcome = insert_member(store.as_ref(), &member).await;
        drop(permit);

        if outcome_tx.send(outcome).await.is_err() {
            error!("outcome collector closed before {} was reported", member.name);
        }
    })
}

async fn insert_member(store: &dyn DestinationStore, member: &CanonicalMember) -> InsertOutcome {
    let now = tokio::time::Instant::now();
    let result = store.insert_one(member).await;
    let elapsed = now.elapsed().as_secs_f64();

    metrics::histogram!("member_inserts_duration_seconds").record(elapsed);

    match result {
        Ok(()) => {
            metrics::counter!("member_inserts_completed").increment(1);
            InsertOutcome::success(&member.name)
        }
        Err(error) => {
            metrics::counter!("member_inserts_failed").increment(1);
            warn!("failed to insert {}: {}", member.name, error);
            InsertOutcome::failed(&member.name, &error.to_string())
        }
    }
}
