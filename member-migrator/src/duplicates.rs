use member_common::model::DuplicateSet;
use member_common::store::{DestinationStore, QueryError};
use tracing::info;

/// Ask the destination which of `names` already exist.
///
/// All names are checked with a single query instead of one round-trip per name. The result only
/// holds the names that exist: callers must treat a missing key as "does not exist".
pub async fn detect(
    store: &dyn DestinationStore,
    names: &[String],
) -> Result<DuplicateSet, QueryError> {
    if names.is_empty() {
        return Ok(DuplicateSet::new());
    }

    let duplicates = store.exists_by_names(names).await?;

    info!(
        "{} of {} members already exist at the destination",
        duplicates.len(),
        names.len()
    );

    Ok(duplicates)
}
