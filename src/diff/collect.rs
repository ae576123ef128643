use futures::{Stream, TryStreamExt};

use crate::types::Changes;

/// Concatenate every batch of a diff into one result
///
/// Batches are appended in the order the stream yields them, with no
/// reordering or deduplication. The first error ends collection and is
/// returned.
pub async fn collect_results<S, T, E>(batches: S) -> Result<Changes<T>, E>
where
    S: Stream<Item = Result<Changes<T>, E>>,
{
    batches
        .try_fold(Changes::new(), |mut total, batch| async move {
            total.extend(batch);
            Ok(total)
        })
        .await
}
