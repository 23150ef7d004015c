//! The stream handle and its lifecycle
//!
//! A stream is Open until it is either derived from (Closed) or consumed by
//! a terminal operation (Terminated, which implies Closed). Deriving moves
//! the source into the child and gives it a copy of the pipeline extended
//! by one operator, so exactly one live stream exists per lineage.

use std::fmt;
use std::hash::Hash;

use crate::error::{StreamError, StreamResult};
use crate::operator::Operator;
use crate::pipeline::Pipeline;
use crate::source::{drain, Source};
use crate::stream::parallel::ScatterGather;
use crate::stream::sequential;
use crate::stream_configuration::Execution;

/// A lazy, single-use pipeline over a source of `T`.
pub struct Stream<T> {
    source: Option<Box<dyn Source<T>>>,
    pipeline: Option<Pipeline<T>>,
    execution: Execution,
    distinct: bool,
    terminated: bool,
    closed: bool,
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("pipeline", &self.pipeline)
            .field("execution", &self.execution)
            .field("distinct", &self.distinct)
            .field("terminated", &self.terminated)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<T: Send + 'static> Stream<T> {
    pub(crate) fn new(source: Box<dyn Source<T>>, execution: Execution, distinct: bool) -> Self {
        Self {
            source: Some(source),
            pipeline: Some(Pipeline::new()),
            execution,
            distinct,
            terminated: false,
            closed: false,
        }
    }

    // ================================
    // Introspection
    // ================================

    /// Whether a terminal operation consumed this stream.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Whether this stream was derived from or terminated.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_concurrent(&self) -> bool {
        self.execution.is_concurrent()
    }

    /// Whether the elements are already known to be unique under `T`'s own
    /// equality.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Operator names in the order a terminal operation would run them.
    pub fn operators(&self) -> Vec<&'static str> {
        self.pipeline
            .as_ref()
            .map(|pipeline| pipeline.optimized().names())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.terminated {
            Err(StreamError::StreamTerminated)
        } else if self.closed {
            Err(StreamError::StreamClosed)
        } else {
            Ok(())
        }
    }

    fn derive(&mut self, operator: Operator<T>, distinct: bool) -> StreamResult<Stream<T>> {
        self.ensure_open()?;
        let (source, pipeline) = match (self.source.take(), self.pipeline.take()) {
            (Some(source), Some(pipeline)) => (source, pipeline),
            _ => return Err(StreamError::StreamClosed),
        };
        self.closed = true;
        Ok(Stream {
            source: Some(source),
            pipeline: Some(pipeline.with(operator)),
            execution: self.execution,
            distinct,
            terminated: false,
            closed: false,
        })
    }

    // ================================
    // Intermediate operations
    // ================================

    /// Elements matching `predicate`.
    pub fn filter<F>(&mut self, predicate: F) -> StreamResult<Stream<T>>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let distinct = self.distinct;
        self.derive(Operator::filter(predicate), distinct)
    }

    /// Results of applying `transform`. Clears distinct provenance, since a
    /// transform may collapse distinct values.
    pub fn map<F>(&mut self, transform: F) -> StreamResult<Stream<T>>
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.derive(Operator::map(transform), false)
    }

    /// The first `n` elements reaching this step. Fails on negative `n`.
    pub fn limit(&mut self, n: i64) -> StreamResult<Stream<T>> {
        self.ensure_open()?;
        let distinct = self.distinct;
        self.derive(Operator::limit(n)?, distinct)
    }

    /// Everything after the first `n` elements reaching this step. Fails on
    /// negative `n`.
    pub fn skip(&mut self, n: i64) -> StreamResult<Stream<T>> {
        self.ensure_open()?;
        let distinct = self.distinct;
        self.derive(Operator::skip(n)?, distinct)
    }

    /// Distinct elements under the caller supplied `equals`/`hash` pair.
    /// `hash` must agree with `equals`.
    ///
    /// Membership is always tracked, whatever this stream's provenance.
    /// The result keeps that provenance, since it only drops elements.
    pub fn distinct_by<E, H>(&mut self, equals: E, hash: H) -> StreamResult<Stream<T>>
    where
        T: Clone,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
        H: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        let distinct = self.distinct;
        self.derive(Operator::distinct(equals, hash), distinct)
    }

    /// Distinct elements under `T`'s own equality. Passes elements straight
    /// through when the stream is already known to be unique under it.
    pub fn distinct(&mut self) -> StreamResult<Stream<T>>
    where
        T: Clone + Eq + Hash,
    {
        let operator = Operator::distinct_by_value(self.distinct);
        self.derive(operator, true)
    }

    /// Same elements, invoking `action` on each one as it is processed.
    pub fn peek<F>(&mut self, action: F) -> StreamResult<Stream<T>>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let distinct = self.distinct;
        self.derive(Operator::peek(action), distinct)
    }

    // ================================
    // Terminal operations
    // ================================
    //
    // Sequential streams run the pull loop inline on the calling task and
    // occupy its executor thread until the loop ends. Concurrent streams
    // move pipeline work onto the blocking pool (see `ScatterGather`).

    fn terminate(&mut self, operation: &str) -> StreamResult<(Box<dyn Source<T>>, Pipeline<T>)> {
        self.ensure_open()?;
        self.terminated = true;
        self.closed = true;
        match (self.source.take(), self.pipeline.take()) {
            (Some(source), Some(pipeline)) => {
                let pipeline = pipeline.optimized();
                log::debug!(
                    "{} running {:?} on {:?}",
                    operation,
                    pipeline.names(),
                    self.execution
                );
                Ok((source, pipeline))
            }
            _ => Err(StreamError::StreamClosed),
        }
    }

    fn scatter_gather(&self) -> Option<ScatterGather> {
        match self.execution {
            Execution::Sequential => None,
            Execution::Concurrent {
                concurrency,
                partition_size,
            } => Some(ScatterGather::new(concurrency, partition_size)),
        }
    }

    /// Invoke `action` on every surviving element. Sequential streams
    /// preserve encounter order; concurrent ones only within a chunk.
    pub async fn for_each<F>(&mut self, action: F) -> StreamResult<()>
    where
        F: FnMut(T) + Send,
    {
        let (mut source, pipeline) = self.terminate("for_each")?;
        match self.scatter_gather() {
            None => sequential::for_each(source.as_mut(), &pipeline, action),
            Some(engine) => {
                let data = drain(source.as_mut())?;
                engine.for_each(data, pipeline, action).await;
                Ok(())
            }
        }
    }

    /// Number of surviving elements.
    pub async fn count(&mut self) -> StreamResult<usize> {
        let (mut source, pipeline) = self.terminate("count")?;
        match self.scatter_gather() {
            None => sequential::count(source.as_mut(), &pipeline),
            Some(engine) => {
                let data = drain(source.as_mut())?;
                Ok(engine.count(data, pipeline).await)
            }
        }
    }

    /// Fold the surviving elements with `f`, or `None` when nothing
    /// survived. Concurrent streams need an associative and commutative `f`
    /// for a deterministic answer.
    pub async fn reduce<F>(&mut self, f: F) -> StreamResult<Option<T>>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let (mut source, pipeline) = self.terminate("reduce")?;
        match self.scatter_gather() {
            None => sequential::reduce(source.as_mut(), &pipeline, f),
            Some(engine) => {
                let data = drain(source.as_mut())?;
                Ok(engine.reduce(data, pipeline, f).await)
            }
        }
    }

    /// The surviving elements.
    pub async fn collect(&mut self) -> StreamResult<Vec<T>> {
        let (mut source, pipeline) = self.terminate("collect")?;
        match self.scatter_gather() {
            None => sequential::collect(source.as_mut(), &pipeline),
            Some(engine) => {
                let data = drain(source.as_mut())?;
                Ok(engine.collect(data, pipeline).await)
            }
        }
    }

    /// The surviving elements gathered into any `FromIterator` collection.
    pub async fn collect_as<C>(&mut self) -> StreamResult<C>
    where
        C: FromIterator<T>,
    {
        Ok(self.collect().await?.into_iter().collect())
    }
}
