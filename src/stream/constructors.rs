//! Stream constructors
//!
//! Every constructor takes the execution configuration up front. A
//! concurrency of 1 selects the sequential engine, anything larger the
//! scatter/gather engine, and 0 is rejected with `IllegalConfig`.

use std::collections::HashSet;

use crate::error::StreamResult;
use crate::source::{IterSource, Source, SupplierSource};
use crate::stream::core::Stream;
use crate::stream_configuration::StreamConfig;

impl<T: Send + 'static> Stream<T> {
    /// Stream over a custom source.
    pub fn from_source<S>(source: S, concurrency: usize) -> StreamResult<Self>
    where
        S: Source<T> + 'static,
    {
        Self::from_source_with_config(source, StreamConfig::new().concurrency(concurrency))
    }

    pub fn from_source_with_config<S>(source: S, config: StreamConfig) -> StreamResult<Self>
    where
        S: Source<T> + 'static,
    {
        let execution = config.execution("from_source")?;
        Ok(Self::new(Box::new(source), execution, false))
    }

    /// Stream over the records returned by `supplier`. The supplier runs on
    /// the first pull, so changes to the data it reads made before the
    /// terminal operation are visible.
    pub fn from_supplier<F>(supplier: F, concurrency: usize) -> StreamResult<Self>
    where
        F: FnOnce() -> Vec<T> + Send + 'static,
    {
        Self::from_supplier_with_config(supplier, StreamConfig::new().concurrency(concurrency))
    }

    pub fn from_supplier_with_config<F>(supplier: F, config: StreamConfig) -> StreamResult<Self>
    where
        F: FnOnce() -> Vec<T> + Send + 'static,
    {
        let execution = config.execution("from_supplier")?;
        Ok(Self::new(Box::new(SupplierSource::new(supplier)), execution, false))
    }

    /// Stream over an owned sequence of records.
    pub fn from_vec(data: Vec<T>, concurrency: usize) -> StreamResult<Self> {
        Self::from_vec_with_config(data, StreamConfig::new().concurrency(concurrency))
    }

    pub fn from_vec_with_config(data: Vec<T>, config: StreamConfig) -> StreamResult<Self> {
        let execution = config.execution("from_vec")?;
        Ok(Self::new(Box::new(SupplierSource::new(move || data)), execution, false))
    }

    /// Stream over a collection's iterator.
    pub fn from_collection<I>(collection: I, concurrency: usize) -> StreamResult<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_collection_with_config(collection, StreamConfig::new().concurrency(concurrency))
    }

    pub fn from_collection_with_config<I>(collection: I, config: StreamConfig) -> StreamResult<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let execution = config.execution("from_collection")?;
        Ok(Self::new(Box::new(IterSource::new(collection.into_iter())), execution, false))
    }

    /// Stream over a set. Its elements are known to be unique, so a later
    /// `distinct` passes them straight through.
    pub fn from_set(set: HashSet<T>, concurrency: usize) -> StreamResult<Self> {
        Self::from_set_with_config(set, StreamConfig::new().concurrency(concurrency))
    }

    pub fn from_set_with_config(set: HashSet<T>, config: StreamConfig) -> StreamResult<Self> {
        let execution = config.execution("from_set")?;
        Ok(Self::new(Box::new(IterSource::new(set.into_iter())), execution, true))
    }
}
