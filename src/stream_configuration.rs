//! Configuration types for stream execution

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Execution configuration a stream is built with.
///
/// `concurrency == 1` selects the sequential engine. Anything larger
/// selects the scatter/gather engine with at most `concurrency` workers
/// running pipeline code at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub concurrency: usize,
    /// Explicit chunk size for concurrent execution. When unset the
    /// chunk size is derived from the drained length and `concurrency`.
    #[serde(default)]
    pub partition_size: Option<usize>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            partition_size: None,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single worker, pull-based execution.
    pub fn sequential() -> Self {
        Self::default()
    }

    /// One worker per available CPU.
    pub fn parallel() -> Self {
        Self {
            concurrency: num_cpus::get().max(1),
            partition_size: None,
        }
    }

    /// Set the admission bound
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set an explicit chunk size for concurrent execution
    pub fn partition_size(mut self, partition_size: usize) -> Self {
        self.partition_size = Some(partition_size);
        self
    }

    /// Check the configuration, naming `function` as the constructor in the error.
    pub fn validate(&self, function: &str) -> StreamResult<()> {
        if self.concurrency < 1 {
            return Err(StreamError::illegal_config(
                format!("concurrency={}", self.concurrency),
                function,
            ));
        }
        if self.partition_size == Some(0) {
            return Err(StreamError::illegal_config("partition_size=0", function));
        }
        Ok(())
    }

    /// Resolve the engine this configuration selects.
    pub fn execution(&self, function: &str) -> StreamResult<Execution> {
        self.validate(function)?;
        if self.concurrency == 1 {
            Ok(Execution::Sequential)
        } else {
            Ok(Execution::Concurrent {
                concurrency: self.concurrency,
                partition_size: self.partition_size,
            })
        }
    }
}

/// Engine a stream's terminal operations dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Sequential,
    Concurrent {
        concurrency: usize,
        partition_size: Option<usize>,
    },
}

impl Execution {
    pub fn is_concurrent(&self) -> bool {
        matches!(self, Execution::Concurrent { .. })
    }

    pub fn concurrency(&self) -> usize {
        match self {
            Execution::Sequential => 1,
            Execution::Concurrent { concurrency, .. } => *concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sequential() {
        let config = StreamConfig::default();
        assert_eq!(config.execution("test"), Ok(Execution::Sequential));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = StreamConfig::new().concurrency(0).validate("from_vec").unwrap_err();
        assert_eq!(err.code(), crate::error::ILLEGAL_CONFIG);
    }

    #[test]
    fn zero_partition_size_is_rejected() {
        let err = StreamConfig::new()
            .concurrency(4)
            .partition_size(0)
            .validate("from_vec")
            .unwrap_err();
        assert_eq!(err, StreamError::illegal_config("partition_size=0", "from_vec"));
    }

    #[test]
    fn concurrent_execution_keeps_partition_size() {
        let execution = StreamConfig::new()
            .concurrency(3)
            .partition_size(10)
            .execution("test")
            .unwrap();
        assert_eq!(
            execution,
            Execution::Concurrent { concurrency: 3, partition_size: Some(10) }
        );
        assert!(execution.is_concurrent());
        assert_eq!(execution.concurrency(), 3);
    }

    #[test]
    fn parallel_uses_at_least_one_worker() {
        assert!(StreamConfig::parallel().concurrency >= 1);
    }
}
