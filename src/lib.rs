//! Lazy, composable element pipelines.
//!
//! A [`Stream`] combines a pull-based [`Source`] with a pipeline of
//! operators appended by intermediate operations (`filter`, `map`, `limit`,
//! `skip`, `distinct`, `peek`). Nothing runs until a terminal operation
//! (`for_each`, `count`, `reduce`, `collect`) consumes the stream, either on
//! the caller's task or scattered across a bounded set of workers.
//!
//! ```
//! use lazy_stream::Stream;
//!
//! # async fn example() -> lazy_stream::StreamResult<()> {
//! let mut numbers = Stream::from_vec((1..=10).collect(), 1)?;
//! let result = numbers
//!     .filter(|x| x % 2 == 0)?
//!     .map(|x| x * x)?
//!     .limit(3)?
//!     .reduce(|a, b| a + b)
//!     .await?;
//! assert_eq!(result, Some(56));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod operator;
pub mod pipeline;
pub mod source;
pub mod stream;
pub mod stream_configuration;

pub use error::{StreamError, StreamResult};
pub use operator::{Operator, OperatorKind};
pub use pipeline::Pipeline;
pub use source::{FnSource, IterSource, Source, SupplierSource};
pub use stream::Stream;
pub use stream_configuration::{Execution, StreamConfig};
