use std::path::Path;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install a Prometheus recorder for the lifetime of the process.
///
/// A migration run is too short-lived to be scraped, so instead of serving the recorder over HTTP
/// the caller renders it once the run is over (see `write_snapshot`).
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(EXPONENTIAL_SECONDS)?
        .install_recorder()
}

/// Write the rendered metrics in the Prometheus text format, e.g. for a node_exporter textfile collector.
pub async fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<(), std::io::Error> {
    tokio::fs::write(path, handle.render()).await
}
