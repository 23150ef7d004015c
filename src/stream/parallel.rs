//! Bounded scatter/gather execution
//!
//! The source is drained up front, split into contiguous chunks and every
//! chunk is handed to its own worker task. A semaphore sized to the
//! configured concurrency admits at most that many workers into pipeline
//! code at once, however many chunks exist. The coordinator waits for all
//! workers and combines their partial results.
//!
//! Workers share one pipeline instance, so stateful operators enforce their
//! limits across the whole stream rather than per chunk. Output order across
//! chunks is not guaranteed.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::pipeline::Pipeline;
use crate::stream::partition::{chunk_size, partition};

/// Scatter/gather engine configured with an admission bound and an
/// optional explicit chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterGather {
    pub concurrency: usize,
    pub partition_size: Option<usize>,
}

impl ScatterGather {
    pub fn new(concurrency: usize, partition_size: Option<usize>) -> Self {
        Self {
            concurrency: concurrency.max(1),
            partition_size,
        }
    }

    pub async fn count<T>(&self, data: Vec<T>, pipeline: Pipeline<T>) -> usize
    where
        T: Send + 'static,
    {
        self.scatter(data, pipeline, |pipeline, chunk| {
            fold_chunk(pipeline, chunk, 0usize, |n, _| n + 1)
        })
        .await
        .into_iter()
        .sum()
    }

    pub async fn collect<T>(&self, data: Vec<T>, pipeline: Pipeline<T>) -> Vec<T>
    where
        T: Send + 'static,
    {
        self.scatter(data, pipeline, |pipeline, chunk| {
            fold_chunk(pipeline, chunk, Vec::new(), |mut out, element| {
                out.push(element);
                out
            })
        })
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Each worker folds its chunk, then the partial folds are folded with
    /// the same function on the coordinator.
    pub async fn reduce<T, F>(&self, data: Vec<T>, pipeline: Pipeline<T>, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let worker_f = f.clone();
        self.scatter(data, pipeline, move |pipeline, chunk| {
            fold_chunk(pipeline, chunk, None, |acc, element| {
                Some(match acc {
                    Some(acc) => worker_f(acc, element),
                    None => element,
                })
            })
        })
        .await
        .into_iter()
        .flatten()
        .reduce(|a, b| f(a, b))
    }

    /// Survivors are gathered first; `action` runs on the coordinator.
    pub async fn for_each<T, F>(&self, data: Vec<T>, pipeline: Pipeline<T>, action: F)
    where
        T: Send + 'static,
        F: FnMut(T),
    {
        self.collect(data, pipeline).await.into_iter().for_each(action);
    }

    async fn scatter<T, P, W>(&self, data: Vec<T>, pipeline: Pipeline<T>, worker: W) -> Vec<P>
    where
        T: Send + 'static,
        P: Send + 'static,
        W: Fn(&Pipeline<T>, Vec<T>) -> P + Send + Sync + 'static,
    {
        let len = data.len();
        let chunks = partition(data, self.concurrency, self.partition_size);
        log::debug!(
            "Scattering {} elements into {} chunks of up to {} (admission bound {})",
            len,
            chunks.len(),
            chunk_size(len, self.concurrency, self.partition_size),
            self.concurrency
        );

        let admission = Arc::new(Semaphore::new(self.concurrency));
        let pipeline = Arc::new(pipeline);
        let worker = Arc::new(worker);

        let handles: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let admission = admission.clone();
                let pipeline = pipeline.clone();
                let worker = worker.clone();
                tokio::spawn(async move {
                    // The semaphore is never closed, so acquiring only waits.
                    let _permit = admission.acquire_owned().await;
                    log::trace!("Worker {} admitted with {} elements", index, chunk.len());
                    let partial = tokio::task::spawn_blocking(move || worker(&pipeline, chunk)).await;
                    log::trace!("Worker {} finished", index);
                    partial
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| propagate(joined.and_then(|partial| partial)))
            .collect()
    }
}

fn fold_chunk<T, A, F>(pipeline: &Pipeline<T>, chunk: Vec<T>, init: A, mut f: F) -> A
where
    F: FnMut(A, T) -> A,
{
    let mut acc = init;
    for element in chunk {
        if pipeline.is_saturated() {
            break;
        }
        if let Some(survivor) = pipeline.apply(element) {
            acc = f(acc, survivor);
        }
    }
    acc
}

/// Re-raise a worker panic on the coordinator.
///
/// Workers are never aborted by this engine. A cancelled worker only
/// happens while the runtime is shutting down, and then the terminal
/// operation cannot produce a result anyway.
fn propagate<P>(result: Result<P, JoinError>) -> P {
    match result {
        Ok(partial) => partial,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => panic!("stream worker was cancelled: {}", err),
    }
}
