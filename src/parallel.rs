//! Fan-out of large import batches across a fixed worker pool
//!
//! Requests are split into contiguous chunks, each chunk runs through its own
//! [`ImportOrchestrator::run_batch`] on a worker thread, and results are
//! stitched back together in chunk order. Workers share nothing; chunks go in
//! and results come back over a channel.

use crate::import::{ImportBatch, ImportOrchestrator, ImportResult};
use assembly_core::{AssemblyError, AssemblyResult, ParallelConfig};
use crossbeam::channel;
use tracing::{debug, info};

/// Split `items` into contiguous chunks of `ceil(len / workers)` items
pub fn split_even<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let chunk_size = items.len().div_ceil(workers.max(1));

    let mut chunks = Vec::with_capacity(workers);
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(chunk_size).collect());
    }
    chunks
}

/// Run `task` over every chunk on a pool of `workers` threads.
///
/// Results are returned in chunk order whatever order the workers finish in.
/// The first failing chunk, in chunk order, fails the whole call.
pub fn fan_out<T, R, F>(chunks: Vec<T>, workers: usize, task: F) -> AssemblyResult<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> AssemblyResult<R> + Sync,
{
    let total = chunks.len();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| AssemblyError::Configuration(format!("Failed to build worker pool: {}", e)))?;

    let (tx, rx) = channel::unbounded();
    pool.scope(|scope| {
        for (idx, chunk) in chunks.into_iter().enumerate() {
            let tx = tx.clone();
            let task = &task;
            scope.spawn(move |_| {
                let result = task(chunk);
                debug!("Chunk {} finished", idx);
                // The receiver outlives the scope
                let _ = tx.send((idx, result));
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<AssemblyResult<R>>> = (0..total).map(|_| None).collect();
    for (idx, result) in rx.iter() {
        slots[idx] = Some(result);
    }

    let mut results = Vec::with_capacity(total);
    for (idx, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(result) => results.push(result?),
            None => {
                return Err(AssemblyError::NoOutput(format!(
                    "worker for chunk {} returned no result",
                    idx
                )))
            }
        }
    }
    Ok(results)
}

/// Runs one orchestrator per chunk of a batch
#[derive(Debug, Clone)]
pub struct FanOutDriver {
    orchestrator: ImportOrchestrator,
    workers: usize,
}

impl FanOutDriver {
    /// Size the pool from the CPUs available to this process
    pub fn new(orchestrator: ImportOrchestrator, config: &ParallelConfig) -> Self {
        let workers = config.worker_count(num_cpus::get());
        Self {
            orchestrator,
            workers,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run(&self, batch: ImportBatch) -> AssemblyResult<Vec<ImportResult>> {
        info!(" - running {} parallel threads", self.workers);

        let chunks: Vec<ImportBatch> = split_even(batch.requests.clone(), self.workers)
            .into_iter()
            .map(|requests| batch.with_requests(requests))
            .collect();
        debug!(
            "Split {} requests into {} chunks",
            batch.len(),
            chunks.len()
        );

        let nested = fan_out(chunks, self.workers, |chunk| {
            self.orchestrator.run_batch(&chunk)
        })?;
        Ok(nested.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_split_even_uses_ceiling_chunks() {
        let chunks = split_even((1..=7).collect::<Vec<_>>(), 3);
        assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);

        let chunks = split_even((1..=6).collect::<Vec<_>>(), 2);
        assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn test_split_even_more_workers_than_items() {
        let chunks = split_even(vec!['a', 'b'], 8);
        assert_eq!(chunks, vec![vec!['a'], vec!['b']]);
        assert!(split_even(Vec::<u8>::new(), 4).is_empty());
    }

    #[test]
    fn test_fan_out_preserves_chunk_order() {
        // Earlier chunks sleep longer, so they finish last
        let chunks = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let results = fan_out(chunks, 2, |chunk: Vec<u32>| {
            let delay = if chunk[0] == 1 { 150 } else { 0 };
            thread::sleep(Duration::from_millis(delay));
            Ok(chunk.into_iter().map(|n| n * 10).collect::<Vec<_>>())
        })
        .unwrap();

        let flat: Vec<u32> = results.into_iter().flatten().collect();
        assert_eq!(flat, vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_fan_out_reports_first_failing_chunk() {
        let result = fan_out(vec![0, 1, 2, 3], 4, |n: usize| {
            if n >= 2 {
                Err(AssemblyError::Parse(format!("chunk {} failed", n)))
            } else {
                Ok(n)
            }
        });
        match result {
            Err(AssemblyError::Parse(msg)) => assert_eq!(msg, "chunk 2 failed"),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_split_even_concatenates_to_input(len in 0usize..60, workers in 1usize..10) {
            let items: Vec<usize> = (0..len).collect();
            let chunks = split_even(items.clone(), workers);

            prop_assert!(chunks.len() <= workers);
            prop_assert!(chunks.iter().all(|c| !c.is_empty()));
            let flat: Vec<usize> = chunks.into_iter().flatten().collect();
            prop_assert_eq!(flat, items);
        }
    }
}
