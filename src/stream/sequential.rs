//! Single-threaded, pull-based execution
//!
//! Pulls one element at a time from the source, runs it through the
//! pipeline and feeds survivors to the terminal accumulator in encounter
//! order. Pulling stops early once the pipeline is saturated, which lets a
//! `limit` terminate an infinite source.
//!
//! Nothing here yields to the async runtime: a terminal operation on a
//! sequential stream holds its executor thread for the whole loop, so long
//! or blocking pipelines belong on a concurrent stream or in
//! `tokio::task::spawn_blocking`.

use crate::error::StreamResult;
use crate::pipeline::Pipeline;
use crate::source::Source;

/// Left fold over the survivors of `pipeline`.
pub fn fold<T, A, F>(
    source: &mut (dyn Source<T> + '_),
    pipeline: &Pipeline<T>,
    init: A,
    mut f: F,
) -> StreamResult<A>
where
    F: FnMut(A, T) -> A,
{
    let mut acc = init;
    while !pipeline.is_saturated() && source.has_next() {
        if let Some(element) = pipeline.apply(source.next()?) {
            acc = f(acc, element);
        }
    }
    Ok(acc)
}

pub fn for_each<T, F>(source: &mut (dyn Source<T> + '_), pipeline: &Pipeline<T>, mut action: F) -> StreamResult<()>
where
    F: FnMut(T),
{
    fold(source, pipeline, (), |_, element| action(element))
}

pub fn count<T>(source: &mut (dyn Source<T> + '_), pipeline: &Pipeline<T>) -> StreamResult<usize> {
    fold(source, pipeline, 0, |n, _| n + 1)
}

/// `None` when nothing survived the pipeline.
pub fn reduce<T, F>(source: &mut (dyn Source<T> + '_), pipeline: &Pipeline<T>, f: F) -> StreamResult<Option<T>>
where
    F: Fn(T, T) -> T,
{
    fold(source, pipeline, None, |acc, element| {
        Some(match acc {
            Some(acc) => f(acc, element),
            None => element,
        })
    })
}

pub fn collect<T>(source: &mut (dyn Source<T> + '_), pipeline: &Pipeline<T>) -> StreamResult<Vec<T>> {
    fold(source, pipeline, Vec::new(), |mut out, element| {
        out.push(element);
        out
    })
}
