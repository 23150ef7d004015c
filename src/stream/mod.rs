//! Lazy streams and their execution engines
//!
//! [`Stream`] is the user facing handle. Terminal operations dispatch on the
//! stream's [`Execution`](crate::stream_configuration::Execution) to either
//! the [`sequential`] pull loop or the [`parallel`] scatter/gather engine.

pub mod constructors;
pub mod core;
pub mod parallel;
pub mod partition;
pub mod sequential;

// Re-export core types
pub use self::core::Stream;

// Re-export the concurrent engine
pub use self::parallel::ScatterGather;
