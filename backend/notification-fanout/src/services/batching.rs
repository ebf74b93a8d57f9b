/// Batch partitioning and concurrent commit for inbox fan-out
///
/// Splitting is a pure function so the batch layout can be checked without
/// a store; `commit_all` drives the I/O.
use firestore_rest::StoreError;
use futures::future::join_all;
use tracing::{debug, warn};

use super::store::{DocumentStore, DocumentWrite};

/// Upper bound on writes per batch, kept below Firestore's 500-write commit limit.
pub const MAX_BATCH_WRITES: usize = 400;

/// Split `writes` into consecutive chunks of at most `max_chunk` items.
///
/// Order is preserved and only the last chunk may be short. An empty input
/// yields no chunks; a `max_chunk` of zero is treated as one.
pub fn chunk_writes<T>(writes: Vec<T>, max_chunk: usize) -> Vec<Vec<T>> {
    let size = max_chunk.max(1);
    let mut chunks = Vec::with_capacity(writes.len().div_ceil(size));
    let mut iter = writes.into_iter().peekable();

    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }

    chunks
}

/// Outcome of committing every batch
#[derive(Debug, Default)]
pub struct CommitSummary {
    pub committed: usize,
    pub errors: Vec<StoreError>,
}

impl CommitSummary {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn total(&self) -> usize {
        self.committed + self.errors.len()
    }
}

/// Commit every batch concurrently and wait for all of them to settle.
///
/// All commits are issued before any is awaited. A failed batch does not
/// cancel the others.
pub async fn commit_all<S>(store: &S, batches: Vec<Vec<DocumentWrite>>) -> CommitSummary
where
    S: DocumentStore + ?Sized,
{
    let results = join_all(batches.into_iter().map(|batch| store.commit_batch(batch))).await;

    let mut summary = CommitSummary::default();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(()) => {
                debug!(batch = index, "Batch committed");
                summary.committed += 1;
            }
            Err(e) => {
                warn!(batch = index, error = %e, "Batch commit failed");
                summary.errors.push(e);
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_sizes_for_thousand_writes() {
        let chunks = chunk_writes((0..1000).collect::<Vec<_>>(), MAX_BATCH_WRITES);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();

        assert_eq!(sizes, vec![400, 400, 200]);
        assert_eq!(chunks[1][0], 400);
        assert_eq!(chunks[2][199], 999);
    }

    #[test]
    fn test_chunk_exact_multiple() {
        let sizes: Vec<usize> = chunk_writes(vec![(); 800], 400).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![400, 400]);
    }

    #[test]
    fn test_chunk_empty_input() {
        assert!(chunk_writes(Vec::<u8>::new(), 400).is_empty());
    }

    #[test]
    fn test_chunk_zero_size_is_clamped() {
        let chunks = chunk_writes(vec!['a', 'b', 'c'], 0);
        assert_eq!(chunks, vec![vec!['a'], vec!['b'], vec!['c']]);
    }

    #[test]
    fn test_chunk_smaller_than_limit() {
        let chunks = chunk_writes(vec![1, 2, 3], 400);
        assert_eq!(chunks, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_commit_summary_counts() {
        let summary = CommitSummary {
            committed: 2,
            errors: vec![StoreError::Request("reset".to_string())],
        };
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(CommitSummary::default().total(), 0);
    }
}
