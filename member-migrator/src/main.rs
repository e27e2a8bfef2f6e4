//! Migrate members from the source table into the destination table, once.
use std::process::ExitCode;
use std::sync::Arc;

use envconfig::Envconfig;
use member_common::metrics::{setup_metrics_recorder, write_snapshot};
use member_common::pgstore::{self, PgMemberStore};
use member_migrator::config::Config;
use member_migrator::error::MigrationError;
use member_migrator::pipeline::Migration;
use member_migrator::report::RunReport;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

async fn run(config: Config) -> Result<RunReport, MigrationError> {
    let metrics = match &config.metrics_path {
        Some(path) => match setup_metrics_recorder() {
            Ok(handle) => Some((handle, path.clone())),
            Err(e) => {
                warn!("failed to install metrics recorder: {}", e);
                None
            }
        },
        None => None,
    };

    let pool = pgstore::connect(
        &config.database_url,
        config.max_pg_connections,
        config.connect_timeout.0,
    )
    .await?;

    let store = Arc::new(PgMemberStore::new(
        pool,
        config.source_table(),
        config.destination_table(),
        config.operation_timeout.0,
    ));

    let mut migration = Migration::new(store.clone(), store.clone(), config.migration_settings());
    let result = migration.run().await;

    store.close().await;

    if let Some((handle, path)) = metrics {
        if let Err(e) = write_snapshot(&handle, &path).await {
            warn!("failed to write metrics to {}: {}", path.display(), e);
        }
    }

    result
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = match Config::init_from_env() {
        Ok(config) => run(config).await,
        Err(e) => Err(MigrationError::from(e)),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("migration aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
