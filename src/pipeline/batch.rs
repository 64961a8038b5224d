//! Bounded-concurrency batch execution
//!
//! Items are split into consecutive chunks. Every item of a chunk runs
//! concurrently on the calling task, and the next chunk only starts once the
//! whole current chunk has settled. This caps in-flight requests at the chunk
//! size while keeping wall-clock time near `ceil(N / batch_size)` round trips.

use futures::future::join_all;
use std::future::Future;

/// Position of one item in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemContext {
    /// Index of the item across all batches
    pub item_index: usize,
    pub batch_index: usize,
    pub batch_count: usize,
}

/// Progress reported after each batch settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub batch_count: usize,
}

impl BatchProgress {
    /// Returns true for the last batch of the run
    pub fn is_last(&self) -> bool {
        self.batch_index + 1 == self.batch_count
    }
}

/// Runs `worker` over `items` in chunks of at most `batch_size`
///
/// `on_batch_complete` fires exactly once per chunk with that chunk's results,
/// after all of them have settled and before the next chunk starts. Results
/// within a chunk are in item order, whatever order they completed in.
///
/// Workers return values, not errors: a failing item must turn its failure into
/// a terminal result itself. Nothing is retried here.
///
/// A `batch_size` of 0 is treated as 1.
pub async fn run_batches<T, R, W, Fut, C>(
    items: Vec<T>,
    batch_size: usize,
    worker: W,
    mut on_batch_complete: C,
) -> Vec<R>
where
    W: Fn(T, ItemContext) -> Fut,
    Fut: Future<Output = R>,
    C: FnMut(BatchProgress, &[R]),
{
    let batch_size = batch_size.max(1);
    let batch_count = items.len().div_ceil(batch_size);
    let mut results = Vec::with_capacity(items.len());
    let mut items = items.into_iter();

    for batch_index in 0..batch_count {
        let offset = batch_index * batch_size;
        let chunk = items.by_ref().take(batch_size).enumerate().map(|(i, item)| {
            worker(
                item,
                ItemContext {
                    item_index: offset + i,
                    batch_index,
                    batch_count,
                },
            )
        });

        let batch_results = join_all(chunk).await;

        on_batch_complete(
            BatchProgress {
                batch_index,
                batch_count,
            },
            &batch_results,
        );
        results.extend(batch_results);
    }

    results
}
